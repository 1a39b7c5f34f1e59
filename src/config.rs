pub use self::parser::{Config, DatabaseConfig, DbDriver, LinkingConfig, LoggingConfig};
pub use self::validator::ConfigError;

mod parser;
mod validator;
