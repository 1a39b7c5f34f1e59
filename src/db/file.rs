use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::models::{BackendKind, LinkRecord, StoreStatus};
use super::{DatabaseError, LinkStore};

type LinkDocument = BTreeMap<Uuid, String>;

/// Links kept in a single pretty-printed JSON object, `{"<uuid>": "<discord id>"}`.
///
/// The whole document is rewritten after every change. Only one process is
/// expected to own the file. Writers queue on `write_lock`; `links` is only
/// held to copy or swap the map, never across disk I/O.
pub struct FileLinkStore {
    path: Arc<PathBuf>,
    links: Arc<Mutex<LinkDocument>>,
    write_lock: Arc<Mutex<()>>,
}

impl FileLinkStore {
    /// Loads the document, creating an empty one when it is missing. A corrupt
    /// or unreadable document is logged and treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let links = if path.exists() {
            match read_document(&path) {
                Ok(links) => {
                    info!("loaded {} discord links from {}", links.len(), path.display());
                    links
                }
                Err(e) => {
                    error!("failed to load discord links from {}: {}", path.display(), e);
                    LinkDocument::new()
                }
            }
        } else {
            let links = LinkDocument::new();
            if let Err(e) = write_document(&path, &links) {
                error!("failed to create link file {}: {}", path.display(), e);
            }
            links
        };

        Self {
            path: Arc::new(path),
            links: Arc::new(Mutex::new(links)),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_document(path: &Path) -> Result<LinkDocument, DatabaseError> {
    let contents = std::fs::read_to_string(path)?;
    let links: Option<LinkDocument> = serde_json::from_str(&contents)?;
    Ok(links.unwrap_or_default())
}

fn write_document(path: &Path, links: &LinkDocument) -> Result<(), DatabaseError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(links)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[async_trait]
impl LinkStore for FileLinkStore {
    fn kind(&self) -> BackendKind {
        BackendKind::File
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn upsert_link(&self, player_id: Uuid, discord_id: &str) -> Result<(), DatabaseError> {
        let discord_id = discord_id.to_string();
        let path = self.path.clone();
        let links = self.links.clone();
        let write_lock = self.write_lock.clone();
        tokio::task::spawn_blocking(move || {
            let _writer = write_lock.lock();
            let mut updated = links.lock().clone();
            updated.insert(player_id, discord_id);
            if let Err(e) = write_document(&path, &updated) {
                error!("failed to save discord links to {}: {}", path.display(), e);
                return Err(e);
            }
            *links.lock() = updated;
            debug!("file link saved player_id={}", player_id);
            Ok(())
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("link file task failed: {e}")))?
    }

    async fn lookup(&self, player_id: Option<Uuid>) -> Result<Vec<LinkRecord>, DatabaseError> {
        let links = self.links.lock();
        let record = |(player_id, discord_id): (&Uuid, &String)| LinkRecord {
            player_id: *player_id,
            discord_id: discord_id.clone(),
            linked_at: None,
        };
        let records = match player_id {
            Some(player_id) => links
                .get_key_value(&player_id)
                .map(record)
                .into_iter()
                .collect(),
            None => links.iter().map(record).collect(),
        };
        Ok(records)
    }

    async fn status(&self) -> StoreStatus {
        StoreStatus::Connected
    }
}
