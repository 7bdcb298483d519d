//! Logger setup
//!
//! `RUST_LOG` is honoured unless `--log-level` is given. The interactive
//! globe owns the terminal, so there the log goes to a file instead.

use crate::error::LoggerError;
use env_logger::{Builder, Env};
use log::LevelFilter;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

pub fn default_log_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("packetglobe.log")
}

// Used when neither RUST_LOG nor --log-level is set
const DEFAULT_FILTER: &str = "info,ureq=warn,rustls=warn";

fn filter_builder(level: Option<LevelFilter>, env: Env<'_>) -> Builder {
    let mut builder = Builder::from_env(env);

    if let Some(level) = level {
        builder.filter_level(level);
        builder.filter_module("ureq", LevelFilter::Warn);
        builder.filter_module("rustls", LevelFilter::Warn);
    }
    builder
}

pub fn init_logger(level: Option<LevelFilter>, target: LogTarget) -> Result<(), LoggerError> {
    let env = Env::new().filter_or(env_logger::DEFAULT_FILTER_ENV, DEFAULT_FILTER);
    let mut builder = filter_builder(level, env);

    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} {:<5} [{}] {}",
            chrono::Local::now().format("%H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        )
    });

    if let LogTarget::File(path) = target {
        let file = open_log_file(&path).map_err(|source| LoggerError::File { path, source })?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.try_init()?;
    Ok(())
}

fn open_log_file(path: &Path) -> std::io::Result<fs::File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_parent_is_created() {
        let dir = std::env::temp_dir().join(format!("packetglobe-log-{}", std::process::id()));
        let path = dir.join("nested").join("run.log");
        assert!(open_log_file(&path).is_ok());
        assert!(path.exists());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn default_path_names_the_app() {
        assert!(default_log_path().ends_with("packetglobe.log"));
    }

    #[test]
    fn env_filter_is_kept_without_flag() {
        std::env::set_var("PACKETGLOBE_TEST_LOG_ENV", "debug");
        let env = Env::new().filter_or("PACKETGLOBE_TEST_LOG_ENV", DEFAULT_FILTER);
        assert_eq!(filter_builder(None, env).build().filter(), LevelFilter::Debug);
    }

    #[test]
    fn flag_overrides_env_filter() {
        std::env::set_var("PACKETGLOBE_TEST_LOG_FLAG", "debug");
        let env = Env::new().filter_or("PACKETGLOBE_TEST_LOG_FLAG", DEFAULT_FILTER);
        let logger = filter_builder(Some(LevelFilter::Warn), env).build();
        assert_eq!(logger.filter(), LevelFilter::Warn);
    }

    #[test]
    fn info_when_nothing_is_set() {
        let env = Env::new().filter_or("PACKETGLOBE_TEST_LOG_UNSET", DEFAULT_FILTER);
        assert_eq!(filter_builder(None, env).build().filter(), LevelFilter::Info);
    }

    #[test]
    fn second_init_fails_without_panicking() {
        let _ = init_logger(Some(LevelFilter::Info), LogTarget::Stderr);
        let result = init_logger(Some(LevelFilter::Debug), LogTarget::Stderr);
        assert!(matches!(result, Err(LoggerError::AlreadySet(_))));
    }
}
