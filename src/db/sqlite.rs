use chrono::NaiveDate;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sql_types::{Date, Text};
use diesel::sqlite::SqliteConnection;

use crate::config::{DatabaseConfig, DbDriver};
use crate::db::DatabaseError;
use crate::db::connection::{
    BackendConnection, CountRow, LinkRow, NameRow, VersionRow, first_count,
};

pub fn establish(config: &DatabaseConfig) -> Result<SqliteConnection, DatabaseError> {
    let path = config
        .filename
        .as_deref()
        .ok_or_else(|| DatabaseError::Connection("database.filename is not set".to_string()))?;
    let mut conn = SqliteConnection::establish(path)?;
    conn.batch_execute(&format!("PRAGMA busy_timeout = {};", config.busy_timeout_ms))
        .map_err(|e| DatabaseError::Connection(e.to_string()))?;
    Ok(conn)
}

impl BackendConnection for SqliteConnection {
    fn driver(&self) -> DbDriver {
        DbDriver::Sqlite
    }

    fn run_statement(&mut self, sql: &str) -> Result<(), DatabaseError> {
        diesel::sql_query(sql).execute(self)?;
        Ok(())
    }

    fn table_exists(&mut self, table: &str) -> Result<bool, DatabaseError> {
        let rows = diesel::sql_query(
            "SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind::<Text, _>(table)
        .load::<CountRow>(self)?;
        Ok(first_count(rows) > 0)
    }

    fn column_exists(&mut self, table: &str, column: &str) -> Result<bool, DatabaseError> {
        let rows = diesel::sql_query("SELECT COUNT(*) AS count FROM pragma_table_info(?) WHERE name = ?")
            .bind::<Text, _>(table)
            .bind::<Text, _>(column)
            .load::<CountRow>(self)?;
        Ok(first_count(rows) > 0)
    }

    fn column_names(&mut self, table: &str) -> Result<Vec<String>, DatabaseError> {
        let rows = diesel::sql_query("SELECT name FROM pragma_table_info(?) ORDER BY cid")
            .bind::<Text, _>(table)
            .load::<NameRow>(self)?;
        Ok(rows.into_iter().map(|row| row.name).collect())
    }

    fn read_schema_version(&mut self) -> Result<Option<i32>, DatabaseError> {
        let rows = diesel::sql_query("SELECT schema_version FROM bridge_metadata LIMIT 1")
            .load::<VersionRow>(self)?;
        Ok(rows.into_iter().next().and_then(|row| row.schema_version))
    }

    fn upsert_link(
        &mut self,
        player_id: &str,
        discord_id: &str,
        linked_at: NaiveDate,
    ) -> Result<(), DatabaseError> {
        diesel::sql_query(
            "INSERT INTO linked_accounts (uuid, discord_id, linked_at) VALUES (?, ?, ?) \
             ON CONFLICT(uuid) DO UPDATE SET discord_id = excluded.discord_id, linked_at = excluded.linked_at",
        )
        .bind::<Text, _>(player_id)
        .bind::<Text, _>(discord_id)
        .bind::<Date, _>(linked_at)
        .execute(self)?;
        Ok(())
    }

    fn select_links(&mut self, player_id: Option<&str>) -> Result<Vec<LinkRow>, DatabaseError> {
        let rows = match player_id {
            Some(player_id) => diesel::sql_query(
                "SELECT uuid, discord_id, linked_at FROM linked_accounts WHERE uuid = ?",
            )
            .bind::<Text, _>(player_id)
            .load::<LinkRow>(self)?,
            None => diesel::sql_query("SELECT uuid, discord_id, linked_at FROM linked_accounts")
                .load::<LinkRow>(self)?,
        };
        Ok(rows)
    }

    fn ping(&mut self) -> bool {
        self.batch_execute("SELECT 1;").is_ok()
    }
}
