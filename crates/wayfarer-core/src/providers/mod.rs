// Weather provider implementations
pub mod openweather;

pub use openweather::OpenWeatherProvider;
