use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};

use super::ConfigError;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub linking: LinkingConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LinkingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub use_sql: bool,
    #[serde(default = "default_links_file")]
    pub links_file: PathBuf,
}

impl Default for LinkingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            use_sql: false,
            links_file: default_links_file(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DbDriver {
    Mysql,
    Sqlite,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_driver")]
    pub driver: DbDriver,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(
        alias = "pass",
        default = "default_password",
        deserialize_with = "deserialize_secret"
    )]
    pub password: SecretString,
    #[serde(alias = "name", default = "default_database")]
    pub database: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Socket read/write and statement limit for the MySQL session.
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            host: default_host(),
            port: default_db_port(),
            user: default_user(),
            password: default_password(),
            database: default_database(),
            filename: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            busy_timeout_ms: default_busy_timeout_ms(),
            query_timeout_secs: default_query_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(alias = "console", default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = serde_yaml::from_str(content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("DISCORD_LINK_DB_HOST") {
            self.database.host = value;
        }
        if let Ok(value) = std::env::var("DISCORD_LINK_DB_USER") {
            self.database.user = value;
        }
        if let Ok(value) = std::env::var("DISCORD_LINK_DB_PASSWORD") {
            self.database.password = SecretString::from(value);
        }
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

fn default_links_file() -> PathBuf {
    PathBuf::from("config").join("discord_links.json")
}

fn default_driver() -> DbDriver {
    DbDriver::Mysql
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    3306
}

fn default_user() -> String {
    "root".to_string()
}

fn default_password() -> SecretString {
    SecretString::from("password".to_string())
}

fn default_database() -> String {
    "discord_bridge".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_query_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
