// OpenWeather provider - bridges the API client with the WeatherProvider trait
use async_trait::async_trait;
use wayfarer_api::{CurrentResponse, ForecastResponse, OpenWeatherClient, WeatherApiError};

use crate::{
    weather::{CurrentSample, ForecastReport, ForecastSample, WeatherLocation, WeatherProvider},
    Error, Result,
};

/// Wrapper around OpenWeatherClient that implements WeatherProvider
pub struct OpenWeatherProvider {
    client: OpenWeatherClient,
}

impl OpenWeatherProvider {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let client = OpenWeatherClient::new(api_key).map_err(map_api_error)?;
        Ok(Self { client })
    }

    pub fn with_base_url(api_key: Option<String>, base_url: String) -> Result<Self> {
        let client = OpenWeatherClient::with_base_url(api_key, base_url).map_err(map_api_error)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, location: &WeatherLocation) -> Result<CurrentSample> {
        let response = self
            .client
            .current(location.latitude, location.longitude, location.units.as_str())
            .await
            .map_err(map_api_error)?;

        Ok(current_to_sample(response))
    }

    async fn forecast(&self, location: &WeatherLocation) -> Result<ForecastReport> {
        let response = self
            .client
            .forecast(location.latitude, location.longitude, location.units.as_str())
            .await
            .map_err(map_api_error)?;

        Ok(forecast_to_report(response))
    }
}

fn map_api_error(e: WeatherApiError) -> Error {
    match e {
        WeatherApiError::AuthRequired => Error::AuthError(e.to_string()),
        other => Error::NetworkError(other.to_string()),
    }
}

/// Convert the `/weather` payload to our current-conditions sample
fn current_to_sample(resp: CurrentResponse) -> CurrentSample {
    let condition = resp.weather.into_iter().next();

    CurrentSample {
        temperature: resp.main.temp,
        humidity: resp.main.humidity,
        wind_speed: resp.wind.speed,
        condition_code: condition.as_ref().map(|c| c.id),
        description: condition
            .as_ref()
            .map(|c| c.description.clone())
            .unwrap_or_default(),
        icon: condition.map(|c| c.icon).unwrap_or_default(),
    }
}

/// Convert the `/forecast` payload; the city offset decides day boundaries
fn forecast_to_report(resp: ForecastResponse) -> ForecastReport {
    let samples = resp
        .list
        .into_iter()
        .map(|item| {
            let condition = item.weather.into_iter().next();
            ForecastSample {
                timestamp: item.dt,
                temperature: item.main.temp,
                condition_code: condition.as_ref().map(|c| c.id),
                description: condition
                    .as_ref()
                    .map(|c| c.description.clone())
                    .unwrap_or_default(),
                icon: condition.map(|c| c.icon).unwrap_or_default(),
                precipitation_probability: item.pop,
            }
        })
        .collect();

    ForecastReport {
        samples,
        utc_offset_seconds: resp.city.map(|c| c.timezone).unwrap_or(0),
    }
}
