//! Store Manager: one live SQLite handle per process, plus the typed
//! repositories built on top of it.
//!
//! The handle is an explicit value created at startup and cloned into every
//! repository. Nothing here is global, so tests can run against independent
//! in-memory stores side by side.

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info};

use crate::models::{Hotel, Itinerary, Place, PracticalTip, Tour};
use crate::{Error, Result};

mod favorites;
mod hotels;
mod itineraries;
mod places;
mod repository;
mod schema;
mod sql;
mod tips;
mod tours;
mod weather;

pub use favorites::FavoriteRepository;
pub use itineraries::ResolvedStop;
pub use repository::{Record, Repository, WriteOutcome};
pub use schema::SCHEMA_VERSION;
pub use weather::WeatherCacheRepository;

pub type PlaceRepository = Repository<Place>;
pub type ItineraryRepository = Repository<Itinerary>;
pub type TourRepository = Repository<Tour>;
pub type HotelRepository = Repository<Hotel>;
pub type TipRepository = Repository<PracticalTip>;

/// Where the store lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    Memory,
}

/// Shared handle to the embedded database
///
/// Cloning is cheap and every clone talks to the same connection.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl Store {
    /// Open (creating if needed) a store file and make sure the schema exists
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).map_err(|e| {
            error!("Failed to open store at {}: {}", path.display(), e);
            Error::DatabaseError(e)
        })?;
        schema::init_schema(&conn)?;
        info!("Opened store at {}", path.display());

        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::init_schema(&conn)?;
        debug!("Opened in-memory store");

        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    // A panic while holding the lock leaves the connection itself intact,
    // so a poisoned lock is recovered rather than reported.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.lock();
        f(&conn)
    }

    pub fn places(&self) -> PlaceRepository {
        Repository::new(self.clone())
    }

    pub fn itineraries(&self) -> ItineraryRepository {
        Repository::new(self.clone())
    }

    pub fn tours(&self) -> TourRepository {
        Repository::new(self.clone())
    }

    pub fn hotels(&self) -> HotelRepository {
        Repository::new(self.clone())
    }

    pub fn tips(&self) -> TipRepository {
        Repository::new(self.clone())
    }

    pub fn favorites(&self) -> FavoriteRepository {
        FavoriteRepository::new(self.clone())
    }

    pub fn weather_cache(&self) -> WeatherCacheRepository {
        WeatherCacheRepository::new(self.clone())
    }
}

/// Owns the process-wide store handle
///
/// `open` is idempotent: the first call creates the database, later calls
/// hand back the same handle. `handle` never opens anything.
#[derive(Debug)]
pub struct StoreManager {
    location: StoreLocation,
    store: Mutex<Option<Store>>,
}

impl StoreManager {
    pub fn new(location: StoreLocation) -> Self {
        Self {
            location,
            store: Mutex::new(None),
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(StoreLocation::File(path.into()))
    }

    pub fn in_memory() -> Self {
        Self::new(StoreLocation::Memory)
    }

    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    fn slot(&self) -> MutexGuard<'_, Option<Store>> {
        self.store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Open the store, or return the already open handle
    pub fn open(&self) -> Result<Store> {
        let mut slot = self.slot();
        if let Some(store) = slot.as_ref() {
            return Ok(store.clone());
        }

        let store = match &self.location {
            StoreLocation::File(path) => Store::open(path)?,
            StoreLocation::Memory => Store::open_in_memory()?,
        };
        *slot = Some(store.clone());

        Ok(store)
    }

    /// The open handle; fails with `NotInitialized` before `open` succeeded
    pub fn handle(&self) -> Result<Store> {
        self.slot().as_ref().cloned().ok_or(Error::NotInitialized)
    }

    pub fn is_open(&self) -> bool {
        self.slot().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_before_open_fails() {
        let manager = StoreManager::in_memory();
        assert!(matches!(manager.handle(), Err(Error::NotInitialized)));
        assert!(!manager.is_open());
    }

    #[test]
    fn test_open_is_idempotent_and_shares_the_handle() {
        let manager = StoreManager::in_memory();
        let first = manager.open().unwrap();
        let second = manager.open().unwrap();

        assert!(Arc::ptr_eq(&first.conn, &second.conn));
        assert!(Arc::ptr_eq(&first.conn, &manager.handle().unwrap().conn));
    }

    #[test]
    fn test_open_creates_missing_file_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("wayfarer.db");

        let manager = StoreManager::file(&path);
        manager.open().unwrap();

        assert!(path.exists());
    }
}
