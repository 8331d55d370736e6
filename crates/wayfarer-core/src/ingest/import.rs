use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::kml::parse_document;
use super::normalize::normalize_placemark;
use crate::clock::{Clock, SystemClock};
use crate::models::Place;
use crate::store::{PlaceRepository, Store, WriteOutcome};
use crate::{Error, Result};

/// How an import treats places already in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// Delete every place, then insert the parsed records
    #[default]
    Replace,
    /// Insert new records and update ones whose id already exists
    Merge,
}

impl std::str::FromStr for ImportMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "replace" => Ok(ImportMode::Replace),
            "merge" => Ok(ImportMode::Merge),
            other => Err(Error::ValidationError(format!(
                "unknown import mode {:?} (expected replace or merge)",
                other
            ))),
        }
    }
}

/// Counts from one import run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub inserted: usize,
    pub updated: usize,
    /// Placemarks skipped during normalization plus records the store refused
    pub failed: usize,
}

impl ImportReport {
    pub fn succeeded(&self) -> usize {
        self.inserted + self.updated
    }

    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }

    /// `PartialImport` when any record failed, for callers that want
    /// partial failure as an error
    pub fn into_result(self) -> Result<Self> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(Error::PartialImport {
                succeeded: self.succeeded(),
                failed: self.failed,
            })
        }
    }
}

/// One-shot batch import of placemark documents into the place table
pub struct Importer {
    places: PlaceRepository,
    clock: Arc<dyn Clock>,
}

impl Importer {
    pub fn new(store: &Store) -> Self {
        Self {
            places: store.places(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Parse and normalize without touching the store.
    /// Returns the usable places and the number skipped.
    pub fn prepare(&self, xml: &str) -> Result<(Vec<Place>, usize)> {
        let raw = parse_document(xml)?;
        let now = self.clock.now();

        let mut places = Vec::with_capacity(raw.len());
        let mut skipped = 0;

        for (index, placemark) in raw.iter().enumerate() {
            match normalize_placemark(placemark, now) {
                Ok(place) => places.push(place),
                Err(e) => {
                    warn!("Skipping placemark #{}: {}", index + 1, e);
                    skipped += 1;
                }
            }
        }

        Ok((places, skipped))
    }

    /// Import a document held in memory.
    ///
    /// Only a malformed document is an error. With no usable placemarks the
    /// store is left untouched. Otherwise every record is written on its
    /// own and failures are counted in the report. Replace mode is not
    /// transactional: an interrupted run leaves a partly filled table.
    pub fn import_document(&self, xml: &str, mode: ImportMode) -> Result<ImportReport> {
        let (places, skipped) = self.prepare(xml)?;
        let mut report = ImportReport {
            failed: skipped,
            ..Default::default()
        };

        if places.is_empty() {
            warn!("No usable placemarks in document; existing places left as they are");
            return Ok(report);
        }

        if mode == ImportMode::Replace {
            let removed = self.places.delete_all()?;
            debug!("Replace import removed {} existing places", removed);
        }

        for place in &places {
            let written = match mode {
                ImportMode::Replace => self.places.insert(place).map(|_| WriteOutcome::Inserted),
                ImportMode::Merge => self.places.upsert(place),
            };

            match written {
                Ok(WriteOutcome::Inserted) => report.inserted += 1,
                Ok(WriteOutcome::Updated) => report.updated += 1,
                Err(e) => {
                    warn!("Failed to store place {} ({}): {}", place.id, place.name, e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Import finished: {} inserted, {} updated, {} failed",
            report.inserted, report.updated, report.failed
        );
        Ok(report)
    }

    /// Read a document from disk and import it
    pub fn import_file(&self, path: impl AsRef<Path>, mode: ImportMode) -> Result<ImportReport> {
        let path = path.as_ref();
        info!("Importing placemarks from {}", path.display());
        let xml = std::fs::read_to_string(path)?;
        self.import_document(&xml, mode)
    }
}
