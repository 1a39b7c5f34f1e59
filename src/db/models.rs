use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A player's link to a Discord account.
///
/// `linked_at` is `None` when the backend does not track it (the JSON file)
/// or when the row predates the `linked_at` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub player_id: Uuid,
    pub discord_id: String,
    pub linked_at: Option<NaiveDate>,
}

impl LinkRecord {
    pub fn summary(&self) -> String {
        let linked = self
            .linked_at
            .map(|date| date.to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        format!("ID: {} | Linked: {}", self.discord_id, linked)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreStatus {
    Disabled,
    Connected,
    Offline,
}

impl fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StoreStatus::Disabled => "DISABLED (Config)",
            StoreStatus::Connected => "CONNECTED",
            StoreStatus::Offline => "OFFLINE",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    File,
    Sql,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::File => f.write_str("file"),
            BackendKind::Sql => f.write_str("sql"),
        }
    }
}
