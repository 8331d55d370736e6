use rusqlite::{params, OptionalExtension};

use super::sql::{json_column, to_iso, to_json};
use super::Store;
use crate::models::Weather;
use crate::Result;

const CURRENT_ROW: &str = "current";

/// The durable copy of the last weather snapshot
#[derive(Clone, Debug)]
pub struct WeatherCacheRepository {
    store: Store,
}

impl WeatherCacheRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn get(&self) -> Result<Option<Weather>> {
        self.store.with_conn(|conn| {
            let weather = conn
                .query_row(
                    "SELECT data FROM weather_cache WHERE id = ?1",
                    params![CURRENT_ROW],
                    |row| json_column::<Weather>(row, 0),
                )
                .optional()?;
            Ok(weather)
        })
    }

    /// Replace the snapshot in one statement
    pub fn put(&self, weather: &Weather) -> Result<()> {
        let data = to_json(weather)?;
        self.store.with_conn(|conn| {
            conn.execute(
                "INSERT INTO weather_cache (id, location, data, last_updated)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                    location = excluded.location,
                    data = excluded.data,
                    last_updated = excluded.last_updated",
                params![
                    CURRENT_ROW,
                    weather.location,
                    data,
                    to_iso(&weather.last_updated)
                ],
            )?;
            Ok(())
        })
    }
}
