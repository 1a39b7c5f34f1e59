use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::db::{BackendKind, DatabaseError, DatabaseManager, LinkStore, StoreStatus};

pub mod codes;
pub(crate) mod logic;

pub use self::codes::PendingCodeRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeRequest {
    Issued(String),
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked { player_id: Uuid },
    InvalidCode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub backend: BackendKind,
    pub status: StoreStatus,
    pub sql_status: StoreStatus,
    pub linking_enabled: bool,
    pub pending_codes: usize,
}

/// Entry point for the linking protocol and operator commands.
#[derive(Clone)]
pub struct LinkCoordinator {
    config: Arc<Config>,
    codes: Arc<PendingCodeRegistry>,
    db_manager: DatabaseManager,
}

impl LinkCoordinator {
    pub fn new(config: Arc<Config>) -> Self {
        let db_manager = DatabaseManager::new(config.clone());
        Self {
            config,
            codes: Arc::new(PendingCodeRegistry::new()),
            db_manager,
        }
    }

    pub fn linking_enabled(&self) -> bool {
        self.config.linking.enabled
    }

    /// Brings the selected backend up in a background task.
    ///
    /// The receiver resolves once with the resulting status.
    pub fn spawn_initialize(self: &Arc<Self>) -> oneshot::Receiver<StoreStatus> {
        let (ready_tx, ready_rx) = oneshot::channel();
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            let status = match coordinator.db_manager.initialize().await {
                Ok(status) => status,
                Err(e) => {
                    warn!("link backend unavailable after startup: {}", e);
                    StoreStatus::Offline
                }
            };
            info!(
                "link backend {} ready with status {}",
                coordinator.db_manager.backend(),
                status
            );
            if ready_tx.send(status).is_err() {
                debug!("startup readiness receiver dropped");
            }
        });
        ready_rx
    }

    pub fn request_code(&self, player_id: Uuid) -> CodeRequest {
        if !self.linking_enabled() {
            debug!("link code refused for {}: linking disabled", player_id);
            return CodeRequest::Disabled;
        }
        let code = self.codes.issue(player_id);
        info!("issued link code for player {}", player_id);
        CodeRequest::Issued(code)
    }

    /// Redeems `code` and stores the link on the active backend.
    ///
    /// A blank `discord_id` is rejected before the code is touched. A code
    /// consumed here stays consumed even if the store write fails.
    pub async fn complete_link(
        &self,
        code: &str,
        discord_id: &str,
    ) -> Result<LinkOutcome, DatabaseError> {
        let discord_id = logic::normalize_discord_id(discord_id).ok_or_else(|| {
            DatabaseError::InvalidInput("discord id cannot be empty".to_string())
        })?;

        let Some(code) = logic::normalize_code(code) else {
            debug!("rejected malformed link code from discord user {}", discord_id);
            return Ok(LinkOutcome::InvalidCode);
        };
        let Some(player_id) = self.codes.redeem(code) else {
            debug!("unknown link code from discord user {}", discord_id);
            return Ok(LinkOutcome::InvalidCode);
        };

        let store = self.db_manager.active_store();
        store
            .upsert_link(player_id, discord_id)
            .await
            .inspect_err(|e| {
                error!(
                    "failed to store link player_id={} discord_id={} backend={}: {}",
                    player_id,
                    discord_id,
                    store.kind(),
                    e
                )
            })?;

        info!("linked player {} to discord user {}", player_id, discord_id);
        Ok(LinkOutcome::Linked { player_id })
    }

    pub async fn reconnect(&self) -> Result<StoreStatus, DatabaseError> {
        info!("reconnecting relational link backend");
        self.db_manager.reconnect().await
    }

    pub async fn status_report(&self) -> StatusReport {
        StatusReport {
            backend: self.db_manager.backend(),
            status: self.db_manager.active_store().status().await,
            sql_status: self.db_manager.sql_store().status().await,
            linking_enabled: self.linking_enabled(),
            pending_codes: self.codes.pending_count(),
        }
    }

    /// Each link as `(player, "ID: <discord> | Linked: <date>")`.
    pub async fn lookup(
        &self,
        player_id: Option<Uuid>,
    ) -> Result<Vec<(Uuid, String)>, DatabaseError> {
        let records = self.db_manager.active_store().lookup(player_id).await?;
        Ok(logic::lookup_lines(&records))
    }

    pub async fn external_id(&self, player_id: Uuid) -> Result<Option<String>, DatabaseError> {
        let records = self.db_manager.active_store().lookup(Some(player_id)).await?;
        Ok(records.into_iter().next().map(|record| record.discord_id))
    }

    pub fn db_manager(&self) -> &DatabaseManager {
        &self.db_manager
    }
}
