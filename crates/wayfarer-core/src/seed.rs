// Seed bundles: the curated catalog shipped with the guide, applied idempotently
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::models::{Hotel, Itinerary, Place, PracticalTip, Tour};
use crate::store::{Record, Repository, Store, WriteOutcome};
use crate::Result;

/// Everything a seed file can carry. Missing sections are empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedBundle {
    #[serde(default)]
    pub places: Vec<Place>,
    #[serde(default)]
    pub itineraries: Vec<Itinerary>,
    #[serde(default)]
    pub tours: Vec<Tour>,
    #[serde(default)]
    pub hotels: Vec<Hotel>,
    #[serde(default)]
    pub tips: Vec<PracticalTip>,
}

/// Per-entity write counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedCounts {
    pub inserted: usize,
    pub updated: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub places: SeedCounts,
    pub itineraries: SeedCounts,
    pub tours: SeedCounts,
    pub hotels: SeedCounts,
    pub tips: SeedCounts,
}

impl SeedReport {
    pub fn total_failed(&self) -> usize {
        [self.places, self.itineraries, self.tours, self.hotels, self.tips]
            .iter()
            .map(|c| c.failed)
            .sum()
    }
}

impl SeedBundle {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Upsert every record. Running the same bundle twice changes nothing
    /// beyond the second run reporting updates instead of inserts.
    pub fn apply(&self, store: &Store) -> Result<SeedReport> {
        let report = SeedReport {
            places: upsert_all(&store.places(), &self.places),
            itineraries: upsert_all(&store.itineraries(), &self.itineraries),
            tours: upsert_all(&store.tours(), &self.tours),
            hotels: upsert_all(&store.hotels(), &self.hotels),
            tips: upsert_all(&store.tips(), &self.tips),
        };

        info!(
            "Seeded {} places, {} itineraries, {} tours, {} hotels, {} tips",
            self.places.len(),
            self.itineraries.len(),
            self.tours.len(),
            self.hotels.len(),
            self.tips.len()
        );
        Ok(report)
    }
}

fn upsert_all<E: Record>(repo: &Repository<E>, records: &[E]) -> SeedCounts {
    let mut counts = SeedCounts::default();

    for record in records {
        match repo.upsert(record) {
            Ok(WriteOutcome::Inserted) => counts.inserted += 1,
            Ok(WriteOutcome::Updated) => counts.updated += 1,
            Err(e) => {
                warn!("Seed record {} {} rejected: {}", E::TABLE, record.id(), e);
                counts.failed += 1;
            }
        }
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLE: &str = r#"{
        "places": [{
            "id": "belem-tower",
            "name": "Belém Tower",
            "shortDescription": "Fortified tower on the Tagus",
            "description": "",
            "practicalTips": "",
            "category": "sightseeing",
            "latitude": 38.6916,
            "longitude": -9.216,
            "images": [],
            "isPremium": false,
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        }],
        "tips": [{
            "id": "tip-metro",
            "category": "transport",
            "title": "Get a Viva Viagem card",
            "content": "Reloadable and valid on metro, trams and ferries.",
            "priority": 10,
            "updatedAt": "2024-01-01T00:00:00Z"
        }]
    }"#;

    #[test]
    fn test_missing_sections_default_to_empty() {
        let bundle = SeedBundle::from_json(BUNDLE).unwrap();
        assert_eq!(bundle.places.len(), 1);
        assert_eq!(bundle.tips.len(), 1);
        assert!(bundle.tours.is_empty());
        assert!(bundle.hotels.is_empty());
    }

    #[test]
    fn test_apply_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        let bundle = SeedBundle::from_json(BUNDLE).unwrap();

        let first = bundle.apply(&store).unwrap();
        assert_eq!(first.places.inserted, 1);
        assert_eq!(first.tips.inserted, 1);

        let second = bundle.apply(&store).unwrap();
        assert_eq!(second.places.updated, 1);
        assert_eq!(second.places.inserted, 0);
        assert_eq!(second.total_failed(), 0);
        assert_eq!(store.places().count().unwrap(), 1);
    }

    #[test]
    fn test_invalid_record_is_counted() {
        let store = Store::open_in_memory().unwrap();
        let mut bundle = SeedBundle::from_json(BUNDLE).unwrap();
        bundle.places[0].latitude = 120.0;

        let report = bundle.apply(&store).unwrap();
        assert_eq!(report.places.failed, 1);
        assert_eq!(store.places().count().unwrap(), 0);
    }
}
