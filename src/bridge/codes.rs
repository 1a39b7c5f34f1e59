use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

pub const CODE_LENGTH: usize = 4;
const CODE_SPACE: u128 = 10_000;
const MAX_COLLISION_RETRIES: usize = 8;

/// Single-use link codes waiting to be confirmed from Discord.
///
/// Every operation takes the map lock for one lookup or mutation only.
/// Codes never expire; a player who asks twice holds two valid codes.
#[derive(Debug, Default)]
pub struct PendingCodeRegistry {
    codes: Mutex<HashMap<String, Uuid>>,
}

impl PendingCodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a fresh code for `player_id`.
    ///
    /// Draws avoid codes that are already pending, up to a fixed number of
    /// attempts. If every attempt collides the last draw replaces the older
    /// entry.
    pub fn issue(&self, player_id: Uuid) -> String {
        let mut codes = self.codes.lock();
        let mut code = random_code();
        for _ in 0..MAX_COLLISION_RETRIES {
            if !codes.contains_key(&code) {
                break;
            }
            code = random_code();
        }
        if let Some(previous) = codes.insert(code.clone(), player_id) {
            debug!("link code reissued, replacing pending entry for {}", previous);
        }
        code
    }

    /// Removes and returns the player waiting on `code`.
    pub fn redeem(&self, code: &str) -> Option<Uuid> {
        self.codes.lock().remove(code)
    }

    pub fn pending_count(&self) -> usize {
        self.codes.lock().len()
    }
}

/// The low 62 bits of a v4 UUID are random, so the remainder is uniform enough for the code space.
fn random_code() -> String {
    let value = Uuid::new_v4().as_u128() % CODE_SPACE;
    format!("{:0width$}", value, width = CODE_LENGTH)
}
