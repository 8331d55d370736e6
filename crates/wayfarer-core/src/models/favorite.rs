use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

text_enum! {
    /// Which entity table a favorite points into
    pub enum FavoriteKind {
        Place => "place",
        Itinerary => "itinerary",
        Tour => "tour",
        Hotel => "hotel",
    }
}

/// Composite identity of a favorite
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FavoriteKey {
    pub kind: FavoriteKind,
    pub item_id: String,
}

impl FavoriteKey {
    pub fn new(kind: FavoriteKind, item_id: impl Into<String>) -> Self {
        Self {
            kind,
            item_id: item_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: String,
    pub item_type: FavoriteKind,
    pub item_id: String,
    pub created_at: DateTime<Utc>,
}

impl Favorite {
    pub fn key(&self) -> FavoriteKey {
        FavoriteKey::new(self.item_type, self.item_id.clone())
    }
}
