#![forbid(unsafe_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

mod bridge;
mod cli;
mod config;
mod db;
mod parsers;
mod utils;

use bridge::logic;
use bridge::{CodeRequest, LinkCoordinator, LinkOutcome};
use config::Config;
use parsers::{ConsoleCommand, HELP_TEXT, parse_console_command};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    let config = Config::load_from_file(&args.config)
        .with_context(|| format!("failed to load config from {}", args.config.display()))?;
    utils::logging::init_tracing(&config.logging);

    let config = Arc::new(config);
    info!("minecraft-discord link service starting up");

    let coordinator = Arc::new(LinkCoordinator::new(config));
    let ready = coordinator.spawn_initialize();
    let status = ready.await.context("link backend initialisation task ended early")?;
    info!("link backend status: {}", status);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP_TEXT}");
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read console input")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        match parse_console_command(&line) {
            Ok(Some(ConsoleCommand::Quit)) => break,
            Ok(Some(command)) => run_command(&coordinator, command).await,
            Ok(None) => {}
            Err(e) => println!("{e}"),
        }
    }

    info!("minecraft-discord link service shutting down");
    Ok(())
}

async fn run_command(coordinator: &LinkCoordinator, command: ConsoleCommand) {
    match command {
        ConsoleCommand::Link { player_id } => match coordinator.request_code(player_id) {
            CodeRequest::Issued(code) => {
                for message in logic::code_issued_messages(&code) {
                    println!("{message}");
                }
            }
            CodeRequest::Disabled => println!("{}", logic::LINKING_DISABLED_MESSAGE),
        },
        ConsoleCommand::Confirm { code, discord_id } => {
            match coordinator.complete_link(&code, &discord_id).await {
                Ok(LinkOutcome::Linked { .. }) => println!("{}", logic::LINKED_MESSAGE),
                Ok(LinkOutcome::InvalidCode) => println!("{}", logic::INVALID_CODE_MESSAGE),
                Err(e) if e.is_connectivity() => {
                    println!("link failed: {e}. Try `reconnect` once the database is back.")
                }
                Err(e) => println!("link failed: {e}"),
            }
        }
        ConsoleCommand::Lookup { player_id } => match coordinator.lookup(player_id).await {
            Ok(lines) if lines.is_empty() => println!("{}", logic::NO_LINK_DATA_MESSAGE),
            Ok(lines) => {
                println!("{}", logic::LOOKUP_HEADER);
                for (player_id, summary) in lines {
                    println!("{player_id}: {summary}");
                }
            }
            Err(e) => {
                warn!("lookup failed: {}", e);
                println!("{}", logic::NO_LINK_DATA_MESSAGE);
            }
        },
        ConsoleCommand::Whois { player_id } => match coordinator.external_id(player_id).await {
            Ok(Some(discord_id)) => println!("{player_id}: {discord_id}"),
            Ok(None) => println!("{}", logic::NO_LINK_DATA_MESSAGE),
            Err(e) => println!("lookup failed: {e}"),
        },
        ConsoleCommand::Status => {
            let report = coordinator.status_report().await;
            for line in logic::status_lines(&report) {
                println!("{line}");
            }
        }
        ConsoleCommand::Reconnect => {
            println!("{}", logic::RECONNECTING_MESSAGE);
            match coordinator.reconnect().await {
                Ok(_) => println!("{}", logic::RECONNECTED_MESSAGE),
                Err(e) => {
                    warn!("reconnect failed: {}", e);
                    println!("{}", logic::RECONNECT_FAILED_MESSAGE);
                }
            }
        }
        ConsoleCommand::Help => println!("{HELP_TEXT}"),
        ConsoleCommand::Quit => {}
    }
}
