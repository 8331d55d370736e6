use rusqlite::{params, Connection, Row};
use tracing::debug;

use super::repository::{Record, Repository};
use super::sql::{iso_column, json_column, json_column_or_default, to_iso, to_json};
use crate::models::{Itinerary, ItineraryKind, ItineraryPlace, Place};
use crate::{Error, Result};

impl Record for Itinerary {
    const TABLE: &'static str = "itineraries";
    const COLUMNS: &'static str = "id, title, description, type, theme, places, \
         estimated_duration, walking_distance, transport_hints, difficulty, is_premium, \
         created_at, updated_at";
    const ORDER_BY: &'static str = "created_at, id";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Itinerary {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            kind: row.get(3)?,
            theme: row.get(4)?,
            places: json_column(row, 5)?,
            estimated_duration: row.get(6)?,
            walking_distance: row.get(7)?,
            transport_hints: json_column_or_default(row, 8)?,
            difficulty: row.get(9)?,
            is_premium: row.get(10)?,
            created_at: iso_column(row, 11)?,
            updated_at: iso_column(row, 12)?,
        })
    }

    fn insert_row(&self, conn: &Connection) -> Result<usize> {
        Ok(conn.execute(
            "INSERT INTO itineraries (
                id, title, description, type, theme, places, estimated_duration,
                walking_distance, transport_hints, difficulty, is_premium, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                self.id,
                self.title,
                self.description,
                self.kind,
                self.theme,
                to_json(&self.places)?,
                self.estimated_duration,
                self.walking_distance,
                to_json(&self.transport_hints)?,
                self.difficulty,
                self.is_premium,
                to_iso(&self.created_at),
                to_iso(&self.updated_at),
            ],
        )?)
    }

    fn update_row(&self, conn: &Connection) -> Result<usize> {
        Ok(conn.execute(
            "UPDATE itineraries SET
                title = ?2, description = ?3, type = ?4, theme = ?5, places = ?6,
                estimated_duration = ?7, walking_distance = ?8, transport_hints = ?9,
                difficulty = ?10, is_premium = ?11, updated_at = ?12
             WHERE id = ?1",
            params![
                self.id,
                self.title,
                self.description,
                self.kind,
                self.theme,
                to_json(&self.places)?,
                self.estimated_duration,
                self.walking_distance,
                to_json(&self.transport_hints)?,
                self.difficulty,
                self.is_premium,
                to_iso(&self.updated_at),
            ],
        )?)
    }

    fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::ValidationError("itinerary id is empty".into()));
        }
        Ok(())
    }
}

/// An itinerary stop paired with its place, if the place still exists
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStop {
    pub stop: ItineraryPlace,
    pub place: Option<Place>,
}

impl Repository<Itinerary> {
    pub fn get_by_type(&self, kind: ItineraryKind) -> Result<Vec<Itinerary>> {
        self.select("WHERE type = ?1", params![kind])
    }

    pub fn get_by_theme(&self, theme: &str) -> Result<Vec<Itinerary>> {
        self.select("WHERE theme = ?1", params![theme])
    }

    /// Look up each stop's place in stored order. A dangling reference
    /// yields `place: None` rather than an error.
    pub fn resolve_stops(&self, itinerary: &Itinerary) -> Result<Vec<ResolvedStop>> {
        let places: Repository<Place> = Repository::new(self.store.clone());

        itinerary
            .places
            .iter()
            .map(|stop| {
                let place = places.get_by_id(&stop.place_id)?;
                if place.is_none() {
                    debug!(
                        "Itinerary {} references missing place {}",
                        itinerary.id, stop.place_id
                    );
                }
                Ok(ResolvedStop {
                    stop: stop.clone(),
                    place,
                })
            })
            .collect()
    }
}
