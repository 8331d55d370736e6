// Local-first travel guide data layer: store, repositories, favorites,
// weather cache and placemark ingestion
pub mod clock;
pub mod config;
pub mod error;
pub mod favorites;
pub mod ingest;
pub mod models;
pub mod providers;
pub mod seed;
pub mod store;
pub mod weather;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::Error;
pub use favorites::FavoritesIndex;
pub use ingest::{ImportMode, ImportReport, Importer};
pub use store::{Store, StoreManager};
pub use weather::{WeatherOutcome, WeatherProvider, WeatherService};

/// Result type alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;
