// Entity shapes shared by the store, the favorites index, ingestion and weather
use thiserror::Error;

/// Raised when a stored or supplied tag is not one of the known values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} value: {value:?}")]
pub struct ParseTagError {
    pub kind: &'static str,
    pub value: String,
}

/// Closed set of string tags with one canonical spelling each.
///
/// The canonical spelling is what gets persisted and what serde reads and writes.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.pad(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::models::ParseTagError;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err($crate::models::ParseTagError {
                        kind: stringify!($name),
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> ::std::result::Result<Self, D::Error> {
                let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

pub mod catalog;
pub mod favorite;
pub mod itinerary;
pub mod place;
pub mod weather;

pub use catalog::{Hotel, PracticalTip, TipCategory, Tour};
pub use favorite::{Favorite, FavoriteKey, FavoriteKind};
pub use itinerary::{Difficulty, Itinerary, ItineraryKind, ItineraryPlace, TransportMode};
pub use place::{Category, DayHours, OpeningHours, Place, PriceRange, Weekday};
pub use weather::{CurrentWeather, ForecastDay, Weather, WeatherCondition};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_round_trip_through_strings() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), *category);
        }
        assert_eq!("hidden-gems".parse::<Category>().unwrap(), Category::HiddenGems);
        assert_eq!("1-day".parse::<ItineraryKind>().unwrap(), ItineraryKind::OneDay);
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let err = "castles".parse::<Category>().unwrap_err();
        assert_eq!(err.kind, "Category");
        assert_eq!(err.value, "castles");
    }

    #[test]
    fn test_tags_serialize_as_canonical_strings() {
        let json = serde_json::to_string(&WeatherCondition::PartlyCloudy).unwrap();
        assert_eq!(json, "\"partly-cloudy\"");

        let kind: FavoriteKind = serde_json::from_str("\"itinerary\"").unwrap();
        assert_eq!(kind, FavoriteKind::Itinerary);
    }
}
