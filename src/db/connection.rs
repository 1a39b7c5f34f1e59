use chrono::NaiveDate;
use diesel::QueryableByName;
use diesel::sql_types::{BigInt, Date, Integer, Nullable, Text};

use crate::config::{DatabaseConfig, DbDriver};
use crate::db::DatabaseError;

/// One open connection to the relational backend.
///
/// Implemented once per diesel driver so the migrator and the SQL store can
/// stay driver-agnostic. Every call blocks.
pub trait BackendConnection: Send {
    fn driver(&self) -> DbDriver;
    fn run_statement(&mut self, sql: &str) -> Result<(), DatabaseError>;
    fn table_exists(&mut self, table: &str) -> Result<bool, DatabaseError>;
    fn column_exists(&mut self, table: &str, column: &str) -> Result<bool, DatabaseError>;
    /// Column names in declaration order.
    fn column_names(&mut self, table: &str) -> Result<Vec<String>, DatabaseError>;
    fn read_schema_version(&mut self) -> Result<Option<i32>, DatabaseError>;
    fn upsert_link(
        &mut self,
        player_id: &str,
        discord_id: &str,
        linked_at: NaiveDate,
    ) -> Result<(), DatabaseError>;
    fn select_links(&mut self, player_id: Option<&str>) -> Result<Vec<LinkRow>, DatabaseError>;
    fn ping(&mut self) -> bool;
}

#[derive(Debug, Clone, QueryableByName)]
pub struct LinkRow {
    #[diesel(sql_type = Text)]
    pub uuid: String,
    #[diesel(sql_type = Text)]
    pub discord_id: String,
    #[diesel(sql_type = Nullable<Date>)]
    pub linked_at: Option<NaiveDate>,
}

#[derive(Debug, QueryableByName)]
pub(crate) struct CountRow {
    #[diesel(sql_type = BigInt)]
    pub(crate) count: i64,
}

#[derive(Debug, QueryableByName)]
pub(crate) struct NameRow {
    #[diesel(sql_type = Text)]
    pub(crate) name: String,
}

#[derive(Debug, QueryableByName)]
pub(crate) struct VersionRow {
    #[diesel(sql_type = Nullable<Integer>)]
    pub(crate) schema_version: Option<i32>,
}

pub(crate) fn first_count(rows: Vec<CountRow>) -> i64 {
    rows.into_iter().next().map(|row| row.count).unwrap_or(0)
}

/// Opens a blocking connection for the configured driver.
pub fn establish(config: &DatabaseConfig) -> Result<Box<dyn BackendConnection>, DatabaseError> {
    match config.driver {
        #[cfg(feature = "mysql")]
        DbDriver::Mysql => Ok(Box::new(crate::db::mysql::establish(config)?)),
        #[cfg(feature = "sqlite")]
        DbDriver::Sqlite => Ok(Box::new(crate::db::sqlite::establish(config)?)),
        #[cfg(not(feature = "mysql"))]
        DbDriver::Mysql => Err(DatabaseError::Connection(
            "MySQL feature not enabled".to_string(),
        )),
        #[cfg(not(feature = "sqlite"))]
        DbDriver::Sqlite => Err(DatabaseError::Connection(
            "SQLite feature not enabled".to_string(),
        )),
    }
}
