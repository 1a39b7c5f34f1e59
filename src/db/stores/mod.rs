use async_trait::async_trait;
use uuid::Uuid;

use super::DatabaseError;
use super::models::{BackendKind, LinkRecord, StoreStatus};

#[async_trait]
pub trait LinkStore: Send + Sync {
    fn kind(&self) -> BackendKind;
    fn is_available(&self) -> bool;
    /// Writes or overwrites the link for `player_id`, stamping today's date.
    async fn upsert_link(&self, player_id: Uuid, discord_id: &str) -> Result<(), DatabaseError>;
    /// `None` returns every stored link.
    async fn lookup(&self, player_id: Option<Uuid>) -> Result<Vec<LinkRecord>, DatabaseError>;
    async fn status(&self) -> StoreStatus;
}
