// Favorites Index - in-memory membership over the favorites table
use std::collections::HashSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::models::{Favorite, FavoriteKey, FavoriteKind};
use crate::store::FavoriteRepository;
use crate::Result;

/// Membership snapshot of all favorites
///
/// Storage is the source of truth. The snapshot is only ever changed after
/// the matching storage write succeeded, so a completed `toggle` leaves the
/// two in agreement. Not meant for concurrent togglers of the same pair.
pub struct FavoritesIndex {
    repo: FavoriteRepository,
    clock: Arc<dyn Clock>,
    snapshot: RwLock<HashSet<FavoriteKey>>,
}

impl FavoritesIndex {
    pub fn new(repo: FavoriteRepository) -> Self {
        Self::with_clock(repo, Arc::new(SystemClock))
    }

    pub fn with_clock(repo: FavoriteRepository, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            clock,
            snapshot: RwLock::new(HashSet::new()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashSet<FavoriteKey>> {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashSet<FavoriteKey>> {
        self.snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the snapshot with what is currently persisted
    pub fn load(&self) -> Result<usize> {
        let keys: HashSet<FavoriteKey> = self.repo.get_all()?.iter().map(Favorite::key).collect();
        let count = keys.len();
        *self.write() = keys;

        info!("Loaded {} favorites", count);
        Ok(count)
    }

    /// Pure lookup against the snapshot
    pub fn is_favorite(&self, kind: FavoriteKind, item_id: &str) -> bool {
        self.read().contains(&FavoriteKey::new(kind, item_id))
    }

    /// Flip the persisted state of a pair and mirror it in the snapshot.
    /// Returns the new state: `true` when the pair is now a favorite.
    pub fn toggle(&self, kind: FavoriteKind, item_id: &str) -> Result<bool> {
        let key = FavoriteKey::new(kind, item_id);

        let now_favorite = if self.repo.find(&key)?.is_some() {
            self.repo.delete(&key)?;
            false
        } else {
            self.repo.insert(&Favorite {
                id: Uuid::new_v4().to_string(),
                item_type: kind,
                item_id: item_id.to_string(),
                created_at: self.clock.now(),
            })?;
            true
        };

        let mut snapshot = self.write();
        if now_favorite {
            snapshot.insert(key);
        } else {
            snapshot.remove(&key);
        }

        debug!("Toggled favorite {} {} -> {}", kind, item_id, now_favorite);
        Ok(now_favorite)
    }

    /// Snapshot ids of one kind, in no particular order
    pub fn favorites_of(&self, kind: FavoriteKind) -> Vec<String> {
        self.read()
            .iter()
            .filter(|key| key.kind == kind)
            .map(|key| key.item_id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
