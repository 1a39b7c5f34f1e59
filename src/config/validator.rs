use thiserror::Error;

use super::{Config, DbDriver};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Config {
    /// The database section is only checked when the relational backend is in use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.linking.links_file.as_os_str().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "linking.links_file cannot be empty".to_string(),
            ));
        }

        if !self.linking.use_sql {
            return Ok(());
        }

        let database = &self.database;
        match database.driver {
            DbDriver::Mysql => {
                if database.host.is_empty() {
                    return Err(ConfigError::InvalidConfig(
                        "database.host cannot be empty".to_string(),
                    ));
                }
                if database.port == 0 {
                    return Err(ConfigError::InvalidConfig(
                        "database.port must be between 1 and 65535".to_string(),
                    ));
                }
                if database.database.is_empty() {
                    return Err(ConfigError::InvalidConfig(
                        "database.database cannot be empty".to_string(),
                    ));
                }
            }
            DbDriver::Sqlite => {
                if database.filename.as_deref().is_none_or(str::is_empty) {
                    return Err(ConfigError::InvalidConfig(
                        "database.filename is required for the sqlite driver".to_string(),
                    ));
                }
            }
        }

        if database.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "database.connect_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if database.query_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "database.query_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if database.busy_timeout_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "database.busy_timeout_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
