// Remote API clients
pub mod openweather;

pub use openweather::{
    CurrentResponse, ForecastItem, ForecastResponse, OpenWeatherClient, WeatherApiError,
};
