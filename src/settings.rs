use crate::error::SettingsError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub feed: FeedSettings,
    #[serde(default)]
    pub geocoder: GeocoderSettings,
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub globe: GlobeSettings,
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedSettings {
    pub url: Option<String>,         // Collector endpoint, e.g. http://localhost:5000/data
    pub timeout_ms: Option<u64>,
    pub demo: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GeocoderSettings {
    pub url: Option<String>,         // Nominatim base URL
    pub user_agent: Option<String>,
    pub timeout_ms: Option<u64>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EngineSettings {
    pub max_age: Option<f64>,        // Seconds a point stays on the globe
    pub poll_interval_ms: Option<u64>,
    pub leaderboard_size: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GlobeSettings {
    pub min_zoom: Option<f32>,
    pub max_zoom: Option<f32>,
    pub tilt: Option<f32>,           // Initial tilt in degrees
    pub log_file: Option<PathBuf>,
}

impl Settings {
    /// Load the user's settings file. A missing file is not an error.
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("packetglobe")
            .join("config.toml")
    }
}
