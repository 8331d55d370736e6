use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

text_enum! {
    /// Duration or thematic flavour of an itinerary
    pub enum ItineraryKind {
        OneDay => "1-day",
        TwoDay => "2-day",
        ThreeDay => "3-day",
        Thematic => "thematic",
    }
}

text_enum! {
    pub enum Difficulty {
        Easy => "easy",
        Moderate => "moderate",
        Challenging => "challenging",
    }
}

text_enum! {
    pub enum TransportMode {
        Walk => "walk",
        Metro => "metro",
        Bus => "bus",
        Tram => "tram",
        Train => "train",
        Taxi => "taxi",
        Bike => "bike",
    }
}

/// One ordered stop. `place_id` is a weak reference: the place may be gone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryPlace {
    pub place_id: String,
    pub order: u32,
    /// Minutes spent at the stop
    pub estimated_duration: u32,
    /// Minutes to reach the next stop
    #[serde(default)]
    pub transport_time: Option<u32>,
    #[serde(default)]
    pub transport_mode: Option<TransportMode>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ItineraryKind,
    #[serde(default)]
    pub theme: Option<String>,
    /// Stops in visiting order; the order is part of the value
    #[serde(default)]
    pub places: Vec<ItineraryPlace>,
    /// Minutes for the whole plan
    pub estimated_duration: u32,
    /// Kilometres
    #[serde(default)]
    pub walking_distance: Option<f64>,
    #[serde(default)]
    pub transport_hints: Vec<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub is_premium: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
