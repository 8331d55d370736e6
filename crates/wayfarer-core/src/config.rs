use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ingest::ImportMode;
use crate::weather::{Units, WeatherLocation};
use crate::{Error, Result};

/// Environment variable that overrides `weather.api_key`
pub const API_KEY_ENV: &str = "WAYFARER_WEATHER_API_KEY";

/// Main configuration structure
///
/// Loaded from the config file, then environment overrides.
/// Priority: CLI > Env > File > Defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub import: ImportConfig,
}

impl Config {
    /// Load config from the default location, or defaults if there is none
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str(&contents)
                .map_err(|e| Error::ConfigError(format!("Failed to parse config: {}", e)))?
        } else {
            Self::default()
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                config.weather.api_key = Some(key);
            }
        }

        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// `<config_dir>/wayfarer/config.toml`
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::ConfigError("Could not find config directory".into()))?;
        Ok(config_dir.join("wayfarer").join("config.toml"))
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.store.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join("wayfarer.db")),
        }
    }

    pub fn cache_path(&self) -> Result<PathBuf> {
        match &self.store.cache_path {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join("cache.db")),
        }
    }
}

fn data_dir() -> Result<PathBuf> {
    Ok(dirs::data_dir()
        .ok_or_else(|| Error::ConfigError("Could not find data directory".into()))?
        .join("wayfarer"))
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    /// Defaults to `<data_dir>/wayfarer/wayfarer.db`
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Weather key-value tier; defaults to `<data_dir>/wayfarer/cache.db`
    #[serde(default)]
    pub cache_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeather API key
    /// Get one at https://home.openweathermap.org/api_keys
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_location")]
    pub location: String,

    #[serde(default = "default_latitude")]
    pub latitude: f64,

    #[serde(default = "default_longitude")]
    pub longitude: f64,

    #[serde(default)]
    pub units: Units,

    /// How often the background refresh checks freshness
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_minutes: u64,
}

fn default_api_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_location() -> String {
    "Lisbon".to_string()
}

fn default_latitude() -> f64 {
    38.7223
}

fn default_longitude() -> f64 {
    -9.1393
}

fn default_refresh_interval() -> u64 {
    60
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            location: default_location(),
            latitude: default_latitude(),
            longitude: default_longitude(),
            units: Units::default(),
            refresh_interval_minutes: default_refresh_interval(),
        }
    }
}

impl WeatherConfig {
    pub fn location(&self) -> WeatherLocation {
        WeatherLocation {
            name: self.location.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            units: self.units,
        }
    }

    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.refresh_interval_minutes.max(1) * 60)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ImportConfig {
    #[serde(default)]
    pub default_mode: ImportMode,
}
