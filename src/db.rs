pub use self::error::DatabaseError;
pub use self::file::FileLinkStore;
pub use self::manager::DatabaseManager;
pub use self::migrator::{CURRENT_SCHEMA_VERSION, MigrationReport, SchemaMigrator};
pub use self::models::{BackendKind, LinkRecord, StoreStatus};
pub use self::sql::SqlLinkStore;
pub use self::stores::LinkStore;

pub mod connection;
pub mod error;
pub mod file;
pub mod manager;
pub mod migrator;
pub mod models;
pub mod sql;
pub mod stores;

#[cfg(feature = "mysql")]
pub mod mysql;

#[cfg(feature = "sqlite")]
pub mod sqlite;
