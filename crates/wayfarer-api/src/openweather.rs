use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const OPENWEATHER_API_BASE: &str = "https://api.openweathermap.org/data/2.5";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Error, Debug)]
pub enum WeatherApiError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Location not found: {0}")]
    NotFound(String),

    #[error("Authentication required")]
    AuthRequired,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WeatherApiError>;

/// Client for the OpenWeather 2.5 REST API
pub struct OpenWeatherClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenWeatherClient {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_base_url(api_key, OPENWEATHER_API_BASE.to_string())
    }

    /// For proxies and test servers
    pub fn with_base_url(api_key: Option<String>, base_url: String) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("Wayfarer/0.1.0"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Current conditions at a coordinate
    pub async fn current(&self, lat: f64, lon: f64, units: &str) -> Result<CurrentResponse> {
        let url = format!("{}/weather", self.base_url);
        let body = self.get(&url, lat, lon, units).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Five day forecast in three-hour steps
    pub async fn forecast(&self, lat: f64, lon: f64, units: &str) -> Result<ForecastResponse> {
        let url = format!("{}/forecast", self.base_url);
        let body = self.get(&url, lat, lon, units).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get(&self, url: &str, lat: f64, lon: f64, units: &str) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or(WeatherApiError::AuthRequired)?;

        debug!("GET {} lat={} lon={} units={}", url, lat, lon, units);
        let response = self
            .client
            .get(url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("units", units.to_string()),
                ("appid", api_key.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();

        if status == 401 {
            return Err(WeatherApiError::AuthRequired);
        }

        if status == 404 {
            return Err(WeatherApiError::NotFound(format!("{},{}", lat, lon)));
        }

        if status == 429 {
            return Err(WeatherApiError::RateLimitExceeded);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WeatherApiError::RequestFailed(format!(
                "Status {}: {}",
                status, body
            )));
        }

        Ok(response.text().await?)
    }
}

/// Response of `GET /weather`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentResponse {
    #[serde(default)]
    pub name: String,
    pub main: MainReadings,
    #[serde(default)]
    pub wind: Wind,
    #[serde(default)]
    pub weather: Vec<ConditionEntry>,
    pub dt: i64,
}

/// Response of `GET /forecast`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub list: Vec<ForecastItem>,
    #[serde(default)]
    pub city: Option<City>,
}

/// One three-hour forecast sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastItem {
    pub dt: i64,
    pub main: MainReadings,
    #[serde(default)]
    pub wind: Wind,
    #[serde(default)]
    pub weather: Vec<ConditionEntry>,
    /// Probability of precipitation, 0.0 to 1.0
    #[serde(default)]
    pub pop: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    #[serde(default)]
    pub humidity: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Wind {
    #[serde(default)]
    pub speed: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionEntry {
    pub id: u16,
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct City {
    #[serde(default)]
    pub name: String,
    /// Shift in seconds from UTC
    #[serde(default)]
    pub timezone: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_current_response() {
        let body = r#"{
            "weather": [{"id": 801, "main": "Clouds", "description": "few clouds", "icon": "02d"}],
            "main": {"temp": 21.4, "feels_like": 20.9, "humidity": 56, "pressure": 1016},
            "wind": {"speed": 4.1, "deg": 320},
            "dt": 1714564800,
            "name": "Lisbon"
        }"#;

        let current: CurrentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(current.name, "Lisbon");
        assert_eq!(current.main.humidity, 56);
        assert_eq!(current.weather[0].id, 801);
        assert_eq!(current.weather[0].icon, "02d");
        assert!((current.wind.speed - 4.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_forecast_response() {
        let body = r#"{
            "cod": "200",
            "list": [
                {"dt": 1714564800, "main": {"temp": 18.0, "humidity": 70},
                 "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
                 "wind": {"speed": 3.0}, "pop": 0.35},
                {"dt": 1714575600, "main": {"temp": 16.5, "humidity": 75},
                 "weather": [{"id": 800, "main": "Clear", "description": "clear sky", "icon": "01n"}]}
            ],
            "city": {"name": "Lisbon", "timezone": 3600}
        }"#;

        let forecast: ForecastResponse = serde_json::from_str(body).unwrap();
        assert_eq!(forecast.list.len(), 2);
        assert!((forecast.list[0].pop - 0.35).abs() < f64::EPSILON);
        // pop is optional on some samples
        assert_eq!(forecast.list[1].pop, 0.0);
        assert_eq!(forecast.city.unwrap().timezone, 3600);
    }

    #[test]
    fn test_missing_api_key_is_not_configured() {
        let client = OpenWeatherClient::new(Some("   ".to_string())).unwrap();
        assert!(!client.has_api_key());

        let client = OpenWeatherClient::new(Some("abc123".to_string())).unwrap();
        assert!(client.has_api_key());
    }
}
