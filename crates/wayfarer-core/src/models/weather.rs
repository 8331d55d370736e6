use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

text_enum! {
    pub enum WeatherCondition {
        Sunny => "sunny",
        PartlyCloudy => "partly-cloudy",
        Cloudy => "cloudy",
        Rain => "rain",
        Snow => "snow",
        Storm => "storm",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeather {
    pub temperature: f64,
    pub condition: WeatherCondition,
    #[serde(default)]
    pub description: String,
    /// Percent
    pub humidity: u8,
    pub wind_speed: f64,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub high: f64,
    pub low: f64,
    pub condition: WeatherCondition,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    /// Chance of precipitation, whole percent
    pub precipitation: u8,
}

/// A complete snapshot; always replaced as a whole
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weather {
    pub location: String,
    pub current: CurrentWeather,
    pub forecast: Vec<ForecastDay>,
    pub last_updated: DateTime<Utc>,
}
