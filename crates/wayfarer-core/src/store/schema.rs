use rusqlite::Connection;
use tracing::{debug, error};

use crate::{Error, Result};

/// Version written to `PRAGMA user_version` once the schema below exists
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS places (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    short_description TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    practical_tips TEXT NOT NULL DEFAULT '',
    category TEXT NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    opening_hours TEXT,
    images TEXT NOT NULL DEFAULT '[]',
    address TEXT,
    estimated_visit_duration INTEGER,
    price_range TEXT,
    is_premium INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_places_category ON places(category);
CREATE INDEX IF NOT EXISTS idx_places_premium ON places(is_premium);

CREATE TABLE IF NOT EXISTS itineraries (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    type TEXT NOT NULL,
    theme TEXT,
    places TEXT NOT NULL DEFAULT '[]',
    estimated_duration INTEGER NOT NULL,
    walking_distance REAL,
    transport_hints TEXT,
    difficulty TEXT,
    is_premium INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_itineraries_type ON itineraries(type);
CREATE INDEX IF NOT EXISTS idx_itineraries_theme ON itineraries(theme);

CREATE TABLE IF NOT EXISTS tours (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    short_description TEXT,
    description TEXT,
    duration TEXT,
    price_range TEXT,
    affiliate_link TEXT NOT NULL,
    provider TEXT,
    category TEXT,
    rating REAL,
    image_url TEXT,
    requires_online INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tips (
    id TEXT PRIMARY KEY,
    category TEXT NOT NULL,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    icon TEXT,
    priority INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_tips_category ON tips(category);

CREATE TABLE IF NOT EXISTS hotels (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    area TEXT NOT NULL,
    description TEXT,
    price_range TEXT,
    affiliate_link TEXT NOT NULL,
    image_url TEXT,
    rating REAL,
    features TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS favorites (
    id TEXT PRIMARY KEY,
    item_type TEXT NOT NULL,
    item_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE(item_type, item_id)
);
CREATE INDEX IF NOT EXISTS idx_favorites_item ON favorites(item_type, item_id);

CREATE TABLE IF NOT EXISTS weather_cache (
    id TEXT PRIMARY KEY DEFAULT 'current',
    location TEXT NOT NULL,
    data TEXT NOT NULL,
    last_updated TEXT NOT NULL
);
";

/// Create every table and index that is missing. Safe to run on every open.
pub(crate) fn init_schema(conn: &Connection) -> Result<()> {
    let current: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if current > SCHEMA_VERSION {
        error!(
            "Store schema version {} is newer than supported {}",
            current, SCHEMA_VERSION
        );
        return Err(Error::SchemaError(format!(
            "database schema version {} is newer than supported {}",
            current, SCHEMA_VERSION
        )));
    }

    conn.execute_batch(SCHEMA_SQL)?;

    if current < SCHEMA_VERSION {
        conn.execute_batch(&format!("PRAGMA user_version = {};", SCHEMA_VERSION))?;
        debug!("Store schema set to version {}", SCHEMA_VERSION);
    }

    Ok(())
}
