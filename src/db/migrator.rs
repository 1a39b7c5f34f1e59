use tracing::{debug, error, info};

use crate::config::DbDriver;
use crate::db::DatabaseError;
use crate::db::connection::BackendConnection;

/// Bump whenever a column is appended to [`REQUIRED_COLUMNS`].
pub const CURRENT_SCHEMA_VERSION: i32 = 3;

pub const METADATA_TABLE: &str = "bridge_metadata";
pub const LINKS_TABLE: &str = "linked_accounts";

const CREATE_METADATA_TABLE: &str = "CREATE TABLE IF NOT EXISTS bridge_metadata (schema_version INT)";
const CREATE_LINKS_TABLE: &str =
    "CREATE TABLE IF NOT EXISTS linked_accounts (uuid VARCHAR(36) PRIMARY KEY)";

/// A column the links table must end up with, beyond the primary key.
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub mysql: &'static str,
    /// SQLite refuses `ADD COLUMN` with a non-constant default or a
    /// `NOT NULL` column without one.
    pub sqlite: &'static str,
}

impl ColumnDef {
    pub fn definition(&self, driver: DbDriver) -> &'static str {
        match driver {
            DbDriver::Mysql => self.mysql,
            DbDriver::Sqlite => self.sqlite,
        }
    }
}

/// Append-only. Existing entries are never changed or removed.
pub const REQUIRED_COLUMNS: &[ColumnDef] = &[
    ColumnDef {
        name: "discord_id",
        mysql: "VARCHAR(20) NOT NULL",
        sqlite: "VARCHAR(20) NOT NULL DEFAULT ''",
    },
    ColumnDef {
        name: "linked_at",
        mysql: "DATE DEFAULT (CURRENT_DATE)",
        sqlite: "DATE",
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: i32,
    pub to_version: i32,
    pub added_columns: Vec<&'static str>,
    pub skipped: bool,
}

pub struct SchemaMigrator<'a> {
    conn: &'a mut dyn BackendConnection,
}

impl<'a> SchemaMigrator<'a> {
    pub fn new(conn: &'a mut dyn BackendConnection) -> Self {
        Self { conn }
    }

    /// Brings the schema up to [`CURRENT_SCHEMA_VERSION`].
    ///
    /// Statements are not wrapped in a transaction: a failure leaves whatever
    /// columns were already added in place and the old version stamp.
    pub fn migrate(&mut self) -> Result<MigrationReport, DatabaseError> {
        let from_version = self.installed_version()?;
        if from_version >= CURRENT_SCHEMA_VERSION {
            info!(
                "database schema is up to date (version {}), skipping validation",
                from_version
            );
            return Ok(MigrationReport {
                from_version,
                to_version: from_version,
                added_columns: Vec::new(),
                skipped: true,
            });
        }

        info!(
            "database schema update detected: version {} -> {}",
            from_version, CURRENT_SCHEMA_VERSION
        );

        match self.apply() {
            Ok(added_columns) => Ok(MigrationReport {
                from_version,
                to_version: CURRENT_SCHEMA_VERSION,
                added_columns,
                skipped: false,
            }),
            Err(e) => {
                error!("error during database schema synchronization: {}", e);
                Err(DatabaseError::Migration(e.to_string()))
            }
        }
    }

    /// 0 when the metadata table is missing or empty.
    pub fn installed_version(&mut self) -> Result<i32, DatabaseError> {
        if !self.conn.table_exists(METADATA_TABLE)? {
            return Ok(0);
        }
        Ok(self.conn.read_schema_version()?.unwrap_or(0))
    }

    fn apply(&mut self) -> Result<Vec<&'static str>, DatabaseError> {
        self.create_tables()?;
        let added = self.reconcile_columns()?;
        self.stamp_version()?;
        Ok(added)
    }

    fn create_tables(&mut self) -> Result<(), DatabaseError> {
        self.conn.run_statement(CREATE_METADATA_TABLE)?;
        self.conn.run_statement(CREATE_LINKS_TABLE)
    }

    fn reconcile_columns(&mut self) -> Result<Vec<&'static str>, DatabaseError> {
        let driver = self.conn.driver();
        let mut added = Vec::new();
        for column in REQUIRED_COLUMNS {
            if self.conn.column_exists(LINKS_TABLE, column.name)? {
                debug!("column {}.{} already present", LINKS_TABLE, column.name);
                continue;
            }
            info!("adding missing column {}.{}", LINKS_TABLE, column.name);
            let statement = format!(
                "ALTER TABLE {} ADD COLUMN {} {}",
                LINKS_TABLE,
                column.name,
                column.definition(driver)
            );
            self.conn.run_statement(&statement)?;
            added.push(column.name);
        }
        Ok(added)
    }

    /// Replaces any existing rows so exactly one version row remains.
    fn stamp_version(&mut self) -> Result<(), DatabaseError> {
        self.conn.run_statement("DELETE FROM bridge_metadata")?;
        self.conn.run_statement(&format!(
            "INSERT INTO bridge_metadata (schema_version) VALUES ({})",
            CURRENT_SCHEMA_VERSION
        ))
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use diesel::prelude::*;
    use diesel::sqlite::SqliteConnection;

    use super::{CURRENT_SCHEMA_VERSION, LINKS_TABLE, SchemaMigrator};
    use crate::db::connection::BackendConnection;

    fn memory_connection() -> SqliteConnection {
        SqliteConnection::establish(":memory:").expect("in-memory sqlite")
    }

    fn metadata_rows(conn: &mut SqliteConnection) -> usize {
        #[derive(QueryableByName)]
        struct Row {
            #[diesel(sql_type = diesel::sql_types::BigInt)]
            count: i64,
        }
        let rows = diesel::sql_query("SELECT COUNT(*) AS count FROM bridge_metadata")
            .load::<Row>(conn)
            .expect("count metadata rows");
        rows[0].count as usize
    }

    #[test]
    fn fresh_database_gets_baseline_and_all_columns() {
        let mut conn = memory_connection();

        let report = SchemaMigrator::new(&mut conn).migrate().expect("migrate");

        assert_eq!(report.from_version, 0);
        assert_eq!(report.to_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(report.added_columns, vec!["discord_id", "linked_at"]);
        assert!(!report.skipped);
        assert_eq!(
            conn.column_names(LINKS_TABLE).expect("columns"),
            vec!["uuid", "discord_id", "linked_at"]
        );
        assert_eq!(conn.read_schema_version().expect("version"), Some(CURRENT_SCHEMA_VERSION));
        assert_eq!(metadata_rows(&mut conn), 1);
    }

    #[test]
    fn second_run_is_skipped_and_leaves_schema_identical() {
        let mut conn = memory_connection();
        SchemaMigrator::new(&mut conn).migrate().expect("first migrate");
        let columns_before = conn.column_names(LINKS_TABLE).expect("columns");

        let report = SchemaMigrator::new(&mut conn).migrate().expect("second migrate");

        assert!(report.skipped);
        assert!(report.added_columns.is_empty());
        assert_eq!(conn.column_names(LINKS_TABLE).expect("columns"), columns_before);
        assert_eq!(conn.read_schema_version().expect("version"), Some(CURRENT_SCHEMA_VERSION));
        assert_eq!(metadata_rows(&mut conn), 1);
    }

    #[test]
    fn missing_linked_at_is_added_without_touching_existing_data() {
        let mut conn = memory_connection();
        conn.run_statement(
            "CREATE TABLE linked_accounts (uuid VARCHAR(36) PRIMARY KEY, discord_id VARCHAR(20) NOT NULL)",
        )
        .expect("legacy table");
        conn.run_statement(
            "INSERT INTO linked_accounts (uuid, discord_id) VALUES ('7d444840-9dc0-11d1-b245-5ffdce74fad2', '424242')",
        )
        .expect("legacy row");

        let report = SchemaMigrator::new(&mut conn).migrate().expect("migrate");

        assert_eq!(report.added_columns, vec!["linked_at"]);
        assert_eq!(
            conn.column_names(LINKS_TABLE).expect("columns"),
            vec!["uuid", "discord_id", "linked_at"]
        );
        let rows = conn.select_links(None).expect("rows");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].discord_id, "424242");
        assert_eq!(rows[0].linked_at, None);
    }

    #[test]
    fn stale_version_rows_collapse_to_one() {
        let mut conn = memory_connection();
        conn.run_statement("CREATE TABLE bridge_metadata (schema_version INT)")
            .expect("metadata table");
        conn.run_statement("INSERT INTO bridge_metadata (schema_version) VALUES (1)")
            .expect("row one");
        conn.run_statement("INSERT INTO bridge_metadata (schema_version) VALUES (2)")
            .expect("row two");

        let report = SchemaMigrator::new(&mut conn).migrate().expect("migrate");

        assert_eq!(report.from_version, 1);
        assert_eq!(metadata_rows(&mut conn), 1);
        assert_eq!(conn.read_schema_version().expect("version"), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn empty_metadata_table_reads_as_version_zero() {
        let mut conn = memory_connection();
        conn.run_statement("CREATE TABLE bridge_metadata (schema_version INT)")
            .expect("metadata table");

        let version = SchemaMigrator::new(&mut conn)
            .installed_version()
            .expect("version");

        assert_eq!(version, 0);
    }

    #[test]
    fn newer_installed_version_is_left_alone() {
        let mut conn = memory_connection();
        conn.run_statement("CREATE TABLE bridge_metadata (schema_version INT)")
            .expect("metadata table");
        conn.run_statement("INSERT INTO bridge_metadata (schema_version) VALUES (99)")
            .expect("future version");

        let report = SchemaMigrator::new(&mut conn).migrate().expect("migrate");

        assert!(report.skipped);
        assert_eq!(report.to_version, 99);
        assert!(!conn.table_exists(LINKS_TABLE).expect("table check"));
    }

    #[test]
    fn failed_statement_aborts_and_keeps_old_version() {
        let mut conn = memory_connection();
        // A view named like the links table makes ALTER TABLE fail after the
        // metadata table was created.
        conn.run_statement("CREATE VIEW linked_accounts AS SELECT 1 AS uuid")
            .expect("blocking view");

        let result = SchemaMigrator::new(&mut conn).migrate();

        assert!(result.is_err());
        assert!(conn.table_exists("bridge_metadata").expect("table check"));
        assert_eq!(conn.read_schema_version().expect("version"), None);
    }
}
