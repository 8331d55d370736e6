// Flat descriptive records: tours, hotels and practical tips
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PriceRange;

/// A bookable tour. The affiliate link is owned by the partner site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Free text such as "3 hours"
    #[serde(default)]
    pub duration: Option<String>,
    /// Free text such as "from €25"
    #[serde(default)]
    pub price_range: Option<String>,
    pub affiliate_link: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub requires_online: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotel {
    pub id: String,
    pub name: String,
    pub area: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price_range: Option<PriceRange>,
    pub affiliate_link: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    /// Set-like amenity tags, kept in the order given
    #[serde(default)]
    pub features: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

text_enum! {
    pub enum TipCategory {
        Transport => "transport",
        Money => "money",
        Safety => "safety",
        Etiquette => "etiquette",
        Language => "language",
        Emergency => "emergency",
        General => "general",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticalTip {
    pub id: String,
    pub category: TipCategory,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub icon: Option<String>,
    /// Higher sorts first
    #[serde(default)]
    pub priority: i32,
    pub updated_at: DateTime<Utc>,
}
