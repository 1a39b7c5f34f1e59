use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// A player asks for a link code (`/link` in game).
    Link { player_id: Uuid },
    /// A Discord user submits a code (`/link <code>` in Discord).
    Confirm { code: String, discord_id: String },
    Lookup { player_id: Option<Uuid> },
    Whois { player_id: Uuid },
    Status,
    Reconnect,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("invalid player uuid: {0}")]
    InvalidPlayer(String),
}

pub const HELP_TEXT: &str = "\
commands:
  link <uuid>                 issue a link code for a player
  confirm <code> <discord-id> redeem a code as a discord user
  lookup [uuid]               show one link or every link
  whois <uuid>                show the discord id linked to a player
  status                      show link backend status
  reconnect                   reconnect the sql backend
  help                        show this text
  quit                        exit";

/// Parses one console line. Blank lines yield `Ok(None)`.
pub fn parse_console_command(line: &str) -> Result<Option<ConsoleCommand>, CommandParseError> {
    let mut parts = line.split_whitespace();
    let Some(name) = parts.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = parts.collect();

    let command = match (name.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("link", [player]) => ConsoleCommand::Link {
            player_id: parse_player(player)?,
        },
        ("link", _) => return Err(CommandParseError::Usage("link <uuid>")),
        ("confirm", [code, discord_id]) => ConsoleCommand::Confirm {
            code: code.to_string(),
            discord_id: discord_id.to_string(),
        },
        ("confirm", _) => return Err(CommandParseError::Usage("confirm <code> <discord-id>")),
        ("lookup", []) => ConsoleCommand::Lookup { player_id: None },
        ("lookup", [player]) => ConsoleCommand::Lookup {
            player_id: Some(parse_player(player)?),
        },
        ("lookup", _) => return Err(CommandParseError::Usage("lookup [uuid]")),
        ("whois", [player]) => ConsoleCommand::Whois {
            player_id: parse_player(player)?,
        },
        ("whois", _) => return Err(CommandParseError::Usage("whois <uuid>")),
        ("status", []) => ConsoleCommand::Status,
        ("reconnect", []) => ConsoleCommand::Reconnect,
        ("help" | "?", _) => ConsoleCommand::Help,
        ("quit" | "exit" | "stop", []) => ConsoleCommand::Quit,
        ("status" | "reconnect" | "quit" | "exit" | "stop", _) => {
            return Err(CommandParseError::Usage("command takes no arguments"));
        }
        _ => return Err(CommandParseError::Unknown(name.to_string())),
    };

    Ok(Some(command))
}

fn parse_player(value: &str) -> Result<Uuid, CommandParseError> {
    Uuid::parse_str(value).map_err(|_| CommandParseError::InvalidPlayer(value.to_string()))
}

#[cfg(test)]
mod tests {
    use test_case::test_case;
    use uuid::Uuid;

    use super::{CommandParseError, ConsoleCommand, parse_console_command};

    const PLAYER: &str = "0f8fad5b-d9cb-469f-a165-70867728950e";

    fn player() -> Uuid {
        Uuid::parse_str(PLAYER).expect("uuid")
    }

    #[test_case("" ; "empty")]
    #[test_case("   \t" ; "whitespace")]
    fn blank_line_is_ignored(line: &str) {
        assert_eq!(parse_console_command(line), Ok(None));
    }

    #[test]
    fn parses_link_and_whois() {
        assert_eq!(
            parse_console_command(&format!("link {PLAYER}")),
            Ok(Some(ConsoleCommand::Link { player_id: player() }))
        );
        assert_eq!(
            parse_console_command(&format!("WHOIS {PLAYER}")),
            Ok(Some(ConsoleCommand::Whois { player_id: player() }))
        );
    }

    #[test]
    fn parses_confirm_with_code_and_discord_id() {
        assert_eq!(
            parse_console_command("confirm 0042 123456789012345678"),
            Ok(Some(ConsoleCommand::Confirm {
                code: "0042".to_string(),
                discord_id: "123456789012345678".to_string(),
            }))
        );
    }

    #[test]
    fn lookup_player_is_optional() {
        assert_eq!(
            parse_console_command("lookup"),
            Ok(Some(ConsoleCommand::Lookup { player_id: None }))
        );
        assert_eq!(
            parse_console_command(&format!("lookup {PLAYER}")),
            Ok(Some(ConsoleCommand::Lookup {
                player_id: Some(player())
            }))
        );
    }

    #[test_case("status", ConsoleCommand::Status ; "status")]
    #[test_case("reconnect", ConsoleCommand::Reconnect ; "reconnect")]
    #[test_case("help", ConsoleCommand::Help ; "help")]
    #[test_case("?", ConsoleCommand::Help ; "question mark")]
    #[test_case("quit", ConsoleCommand::Quit ; "quit")]
    #[test_case("stop", ConsoleCommand::Quit ; "stop alias")]
    fn parses_bare_commands(line: &str, expected: ConsoleCommand) {
        assert_eq!(parse_console_command(line), Ok(Some(expected)));
    }

    #[test_case("link" ; "link without player")]
    #[test_case("confirm 0042" ; "confirm without discord id")]
    #[test_case("lookup a b" ; "lookup with two players")]
    #[test_case("status now" ; "status with argument")]
    fn wrong_arity_is_a_usage_error(line: &str) {
        assert!(matches!(
            parse_console_command(line),
            Err(CommandParseError::Usage(_))
        ));
    }

    #[test]
    fn invalid_player_uuid_is_reported() {
        assert_eq!(
            parse_console_command("link steve"),
            Err(CommandParseError::InvalidPlayer("steve".to_string()))
        );
    }

    #[test]
    fn unknown_command_is_reported() {
        assert_eq!(
            parse_console_command("teleport spawn"),
            Err(CommandParseError::Unknown("teleport".to_string()))
        );
    }
}
