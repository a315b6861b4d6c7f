#![allow(clippy::module_name_repetitions)]

//! Client configuration loading.
//!
//! Configuration layers, later wins: built-in defaults, then
//! `disaster-watch.toml` when present, then environment overrides. CLI flags
//! layer on top of all of these in the binary.

use std::path::Path;

use disaster_watch_feed_models::FeedConfig;

use crate::FeedError;

/// Config file name looked up in the working directory when no explicit
/// path is given.
pub const CONFIG_FILE: &str = "disaster-watch.toml";

/// Environment variable overriding the backend origin.
pub const BASE_URL_ENV: &str = "DISASTER_WATCH_BASE_URL";

/// Loads configuration.
///
/// An explicitly given path must exist; the implicit `disaster-watch.toml`
/// lookup silently falls back to defaults when the file is absent.
///
/// # Errors
///
/// Returns [`FeedError`] if the file cannot be read or parsed.
pub fn load(path: Option<&Path>) -> Result<FeedConfig, FeedError> {
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => {
            let default = Path::new(CONFIG_FILE);
            if default.exists() {
                read_file(default)?
            } else {
                FeedConfig::default()
            }
        }
    };
    if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
        config.base_url = base_url;
    }
    Ok(config)
}

/// Parses a configuration document.
///
/// # Errors
///
/// Returns [`FeedError::Toml`] if the document is not valid TOML or carries
/// keys of the wrong type.
pub fn from_toml(raw: &str) -> Result<FeedConfig, FeedError> {
    Ok(toml::from_str(raw)?)
}

fn read_file(path: &Path) -> Result<FeedConfig, FeedError> {
    log::debug!("loading config from {}", path.display());
    from_toml(&std::fs::read_to_string(path)?)
}
