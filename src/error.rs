//! Error types for the network collaborators and settings.
//!
//! None of these ever escape the engine: feed errors skip one poll, geocode
//! errors become "Unknown", settings errors fall back to defaults.

use std::path::PathBuf;
use thiserror::Error;

/// The packet feed could not produce a batch this tick.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Transport(String),

    #[error("feed returned HTTP {0}")]
    Status(u16),

    #[error("feed response could not be decoded: {0}")]
    Decode(String),

    #[error("feed worker is gone")]
    WorkerGone,
}

impl From<ureq::Error> for FeedError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, _) => FeedError::Status(code),
            ureq::Error::Transport(t) => FeedError::Transport(t.to_string()),
        }
    }
}

/// Reverse geocoding failed; the coordinate is recorded as "Unknown".
#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("geocoder request failed: {0}")]
    Transport(String),

    #[error("geocoder returned HTTP {0}")]
    Status(u16),

    #[error("geocoder response could not be decoded: {0}")]
    Decode(String),
}

impl From<ureq::Error> for GeocodeError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, _) => GeocodeError::Status(code),
            ureq::Error::Transport(t) => GeocodeError::Transport(t.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("logger already initialized: {0}")]
    AlreadySet(#[from] log::SetLoggerError),

    #[error("cannot open log file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
