use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "minecraft-discord-link", version, about = "Minecraft and Discord account linking")]
pub struct Args {
    /// Path to the YAML configuration file.
    #[arg(short, long, env = "CONFIG_PATH", default_value = "config.yaml")]
    pub config: PathBuf,
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;

    use super::Args;

    #[test]
    fn config_flag_overrides_default() {
        let args = Args::try_parse_from(["minecraft-discord-link", "--config", "/etc/link.yaml"])
            .expect("parse");
        assert_eq!(args.config, PathBuf::from("/etc/link.yaml"));
    }
}
