use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Error, Result};

text_enum! {
    /// What kind of point of interest a place is
    pub enum Category {
        Sightseeing => "sightseeing",
        Food => "food",
        Nature => "nature",
        Viewpoints => "viewpoints",
        HiddenGems => "hidden-gems",
        Museums => "museums",
        Shopping => "shopping",
        Nightlife => "nightlife",
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Sightseeing
    }
}

text_enum! {
    /// Price tier
    pub enum PriceRange {
        Free => "free",
        Budget => "budget",
        Moderate => "moderate",
        Expensive => "expensive",
    }
}

impl PriceRange {
    /// Lenient parse for hand-written sources: accepts canonical names in any
    /// case and currency-symbol tiers like `$$` or `€€€`.
    pub fn parse_loose(raw: &str) -> Option<Self> {
        let trimmed = raw.trim().to_lowercase();
        if let Ok(tier) = trimmed.parse() {
            return Some(tier);
        }

        let symbols = trimmed.chars().filter(|c| matches!(c, '$' | '€' | '£')).count();
        if symbols != trimmed.chars().count() {
            return None;
        }

        match symbols {
            1 => Some(PriceRange::Budget),
            2 => Some(PriceRange::Moderate),
            3 | 4 => Some(PriceRange::Expensive),
            _ => None,
        }
    }
}

text_enum! {
    pub enum Weekday {
        Monday => "monday",
        Tuesday => "tuesday",
        Wednesday => "wednesday",
        Thursday => "thursday",
        Friday => "friday",
        Saturday => "saturday",
        Sunday => "sunday",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    pub open: String,
    pub close: String,
}

/// Per-weekday schedule and/or free-text notes. A weekday absent from the
/// schedule is closed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OpeningHours {
    #[serde(default)]
    pub schedule: BTreeMap<Weekday, DayHours>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A point of interest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub practical_tips: String,
    #[serde(default)]
    pub category: Category,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub opening_hours: Option<OpeningHours>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// Minutes
    #[serde(default)]
    pub estimated_visit_duration: Option<u32>,
    #[serde(default)]
    pub price_range: Option<PriceRange>,
    #[serde(default)]
    pub is_premium: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Place {
    /// Reject records that must never reach the store
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::ValidationError("place id is empty".into()));
        }
        if self.name.trim().is_empty() {
            return Err(Error::ValidationError(format!("place {} has no name", self.id)));
        }
        validate_coordinates(self.latitude, self.longitude)
    }
}

/// Latitude in [-90, 90], longitude in [-180, 180], both finite
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<()> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(Error::ValidationError(format!(
            "latitude {} is outside [-90, 90]",
            latitude
        )));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(Error::ValidationError(format!(
            "longitude {} is outside [-180, 180]",
            longitude
        )));
    }
    Ok(())
}
