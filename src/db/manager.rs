use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::db::{BackendKind, DatabaseError, FileLinkStore, LinkStore, SqlLinkStore, StoreStatus};

/// Owns both link backends and decides which one serves requests.
#[derive(Clone)]
pub struct DatabaseManager {
    file_store: Arc<FileLinkStore>,
    sql_store: Arc<SqlLinkStore>,
    backend: BackendKind,
}

impl DatabaseManager {
    /// Loads the link file. The relational backend stays offline until
    /// [`DatabaseManager::initialize`] runs.
    pub fn new(config: Arc<Config>) -> Self {
        let backend = if config.linking.use_sql {
            BackendKind::Sql
        } else {
            BackendKind::File
        };
        let file_store = Arc::new(FileLinkStore::open(&config.linking.links_file));
        let sql_store = Arc::new(SqlLinkStore::new(config));

        info!("link backend selected: {}", backend);
        Self {
            file_store,
            sql_store,
            backend,
        }
    }

    pub async fn initialize(&self) -> Result<StoreStatus, DatabaseError> {
        match self.backend {
            BackendKind::Sql => self.sql_store.initialize().await,
            BackendKind::File => Ok(self.file_store.status().await),
        }
    }

    pub async fn reconnect(&self) -> Result<StoreStatus, DatabaseError> {
        self.sql_store.reconnect().await
    }

    pub fn active_store(&self) -> Arc<dyn LinkStore> {
        match self.backend {
            BackendKind::Sql => self.sql_store.clone(),
            BackendKind::File => self.file_store.clone(),
        }
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn file_store(&self) -> Arc<FileLinkStore> {
        self.file_store.clone()
    }

    pub fn sql_store(&self) -> Arc<SqlLinkStore> {
        self.sql_store.clone()
    }
}
