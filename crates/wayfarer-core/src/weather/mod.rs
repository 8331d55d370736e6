//! Weather Cache: fetch-or-reuse over a remote provider with an hourly
//! freshness policy and a two-tier cache (key-value tier + durable row).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

mod conditions;
mod forecast;
mod service;

pub use conditions::{condition_from_code, condition_from_icon, map_condition};
pub use forecast::{aggregate_forecast, MAX_FORECAST_DAYS};
pub use service::{FetchFailure, RefreshHandle, WeatherOutcome, WeatherService, WeatherSource};

/// Unit system requested from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
    Standard,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
            Units::Standard => "standard",
        }
    }
}

/// The fixed location weather is fetched for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub units: Units,
}

/// Current conditions as reported by a provider
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentSample {
    pub temperature: f64,
    pub humidity: u8,
    pub wind_speed: f64,
    pub condition_code: Option<u16>,
    pub description: String,
    pub icon: String,
}

/// One sub-daily forecast sample
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSample {
    /// Unix seconds
    pub timestamp: i64,
    pub temperature: f64,
    pub condition_code: Option<u16>,
    pub description: String,
    pub icon: String,
    /// 0.0 to 1.0
    pub precipitation_probability: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForecastReport {
    pub samples: Vec<ForecastSample>,
    /// Offset of the location's local time from UTC, used to split days
    pub utc_offset_seconds: i32,
}

/// Remote source of weather data
///
/// Implementations report a rejected or missing credential as
/// `Error::AuthError` and everything else as `Error::NetworkError`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, location: &WeatherLocation) -> Result<CurrentSample>;
    async fn forecast(&self, location: &WeatherLocation) -> Result<ForecastReport>;
}
