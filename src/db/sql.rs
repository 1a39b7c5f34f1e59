use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::Config;

use super::connection::{self, BackendConnection, LinkRow};
use super::migrator::SchemaMigrator;
use super::models::{BackendKind, LinkRecord, StoreStatus};
use super::{DatabaseError, LinkStore};

const STATUS_LOCK_WAIT: Duration = Duration::from_millis(250);

type ConnectionSlot = Arc<Mutex<Option<Box<dyn BackendConnection>>>>;

/// Links in the relational backend, over a single shared connection.
///
/// Calls queue on the connection mutex inside `spawn_blocking`. A failed
/// connect leaves the store disabled until [`SqlLinkStore::reconnect`];
/// a failed query does not. Closing swaps in an empty slot, so a query stuck
/// on the old connection never holds up `close`, `reconnect` or `status`.
pub struct SqlLinkStore {
    config: Arc<Config>,
    current: Mutex<ConnectionSlot>,
    enabled: Arc<AtomicBool>,
}

fn empty_slot() -> ConnectionSlot {
    Arc::new(Mutex::new(None))
}

impl SqlLinkStore {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            current: Mutex::new(empty_slot()),
            enabled: Arc::new(AtomicBool::new(false)),
        }
    }

    fn slot(&self) -> ConnectionSlot {
        self.current.lock().clone()
    }

    pub fn enabled_by_config(&self) -> bool {
        self.config.linking.use_sql
    }

    /// Connects, migrates the schema and enables the store.
    ///
    /// Migration failures are logged and do not keep the store offline.
    pub async fn initialize(&self) -> Result<StoreStatus, DatabaseError> {
        if !self.enabled_by_config() {
            debug!("relational link backend disabled by configuration");
            return Ok(StoreStatus::Disabled);
        }

        let timeout = Duration::from_secs(self.config.database.connect_timeout_secs);
        let config = self.config.clone();
        let connect = tokio::task::spawn_blocking(move || connection::establish(&config.database));

        let conn = match tokio::time::timeout(timeout, connect).await {
            Ok(Ok(Ok(conn))) => conn,
            Ok(Ok(Err(e))) => return Err(self.connect_failed(e)),
            Ok(Err(e)) => {
                return Err(self.connect_failed(DatabaseError::Connection(format!(
                    "connect task failed: {e}"
                ))));
            }
            Err(_) => {
                return Err(self.connect_failed(DatabaseError::Connection(format!(
                    "timed out after {}s",
                    timeout.as_secs()
                ))));
            }
        };

        let slot: ConnectionSlot = Arc::new(Mutex::new(Some(conn)));
        let migrate_slot = slot.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = migrate_slot.lock();
            let Some(conn) = guard.as_mut() else {
                return;
            };
            match SchemaMigrator::new(conn.as_mut()).migrate() {
                Ok(report) if !report.skipped => info!(
                    "database schema migrated from version {} to {} (added columns: {:?})",
                    report.from_version, report.to_version, report.added_columns
                ),
                Ok(_) => {}
                Err(e) => warn!("continuing with partially migrated schema: {}", e),
            }
        })
        .await
        .map_err(|e| DatabaseError::Migration(format!("migration task failed: {e}")))?;

        *self.current.lock() = slot;
        self.enabled.store(true, Ordering::SeqCst);
        info!("relational link backend connected");
        Ok(StoreStatus::Connected)
    }

    fn connect_failed(&self, e: DatabaseError) -> DatabaseError {
        self.enabled.store(false, Ordering::SeqCst);
        error!("database connection failed, linking will operate in limited mode: {}", e);
        e
    }

    /// Disables the store and detaches the current connection.
    ///
    /// A query still running on it keeps the old connection until it returns.
    pub async fn close(&self) {
        self.enabled.store(false, Ordering::SeqCst);
        let old = std::mem::replace(&mut *self.current.lock(), empty_slot());
        match old.try_lock() {
            Some(mut guard) => {
                if guard.take().is_some() {
                    info!("relational link backend connection closed");
                }
            }
            None => warn!("abandoning busy relational connection, it closes when its query returns"),
        }
    }

    /// Closes any existing connection and runs [`SqlLinkStore::initialize`] again.
    pub async fn reconnect(&self) -> Result<StoreStatus, DatabaseError> {
        if !self.enabled_by_config() {
            return Err(DatabaseError::Disabled);
        }
        self.close().await;
        self.initialize().await
    }

    async fn with_connection<T, F>(&self, op: F) -> Result<T, DatabaseError>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn BackendConnection) -> Result<T, DatabaseError> + Send + 'static,
    {
        if !self.enabled_by_config() {
            return Err(DatabaseError::Disabled);
        }
        if !self.enabled.load(Ordering::SeqCst) {
            return Err(DatabaseError::Unavailable);
        }

        let slot = self.slot();
        tokio::task::spawn_blocking(move || {
            let mut slot = slot.lock();
            let conn = slot.as_mut().ok_or(DatabaseError::Unavailable)?;
            op(conn.as_mut())
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }
}

fn to_record(row: LinkRow) -> Option<LinkRecord> {
    match Uuid::parse_str(&row.uuid) {
        Ok(player_id) => Some(LinkRecord {
            player_id,
            discord_id: row.discord_id,
            linked_at: row.linked_at,
        }),
        Err(e) => {
            warn!("skipping linked_accounts row with invalid uuid {:?}: {}", row.uuid, e);
            None
        }
    }
}

#[async_trait]
impl LinkStore for SqlLinkStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Sql
    }

    fn is_available(&self) -> bool {
        self.enabled_by_config() && self.enabled.load(Ordering::SeqCst)
    }

    async fn upsert_link(&self, player_id: Uuid, discord_id: &str) -> Result<(), DatabaseError> {
        let discord_id = discord_id.to_string();
        let today = Local::now().date_naive();
        self.with_connection(move |conn| {
            conn.upsert_link(&player_id.to_string(), &discord_id, today)
        })
        .await
        .inspect_err(|e| error!("sql error during link player_id={}: {}", player_id, e))?;
        debug!("sql link saved player_id={}", player_id);
        Ok(())
    }

    async fn lookup(&self, player_id: Option<Uuid>) -> Result<Vec<LinkRecord>, DatabaseError> {
        let rows = self
            .with_connection(move |conn| {
                let player_id = player_id.map(|id| id.to_string());
                conn.select_links(player_id.as_deref())
            })
            .await
            .inspect_err(|e| error!("sql lookup error: {}", e))?;
        Ok(rows.into_iter().filter_map(to_record).collect())
    }

    async fn status(&self) -> StoreStatus {
        if !self.enabled_by_config() {
            return StoreStatus::Disabled;
        }
        if !self.enabled.load(Ordering::SeqCst) {
            return StoreStatus::Offline;
        }

        let slot = self.slot();
        let alive = tokio::task::spawn_blocking(move || match slot.try_lock_for(STATUS_LOCK_WAIT) {
            Some(mut guard) => guard.as_mut().map(|conn| conn.ping()).unwrap_or(false),
            None => {
                debug!("relational connection busy, reporting offline");
                false
            }
        })
        .await
        .unwrap_or(false);

        if alive {
            StoreStatus::Connected
        } else {
            StoreStatus::Offline
        }
    }
}
