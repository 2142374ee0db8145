//! # Settings Loader
//!
//! Centralized settings loading for the expense analyzer. Settings live in a
//! JSON file (`settings.json` by default) and cover the record store location,
//! the chart output directory, forecast tuning and the API server address.
//! Every field is optional; missing ones take the defaults from
//! [`models::Settings`].
//!
//! ## Usage Examples
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//!
//! // Load settings from a specific path
//! let settings = settings_loader::load_settings("config/my_settings.json")?;
//!
//! // Load optional settings (returns None if no path is given)
//! let path = Some(PathBuf::from("settings.json"));
//! let settings = settings_loader::load_optional_settings(path.as_ref())?;
//!
//! // Apply environment overrides on top
//! let settings = settings_loader::apply_overrides(
//!     settings.unwrap_or_default(),
//!     |key| std::env::var(key).ok(),
//! );
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use models::Settings;
use tracing::{debug, warn};

pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

/// Loads settings from a JSON file
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Reading settings file: {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&raw)
        .with_context(|| format!("Parsing settings JSON in {}", path.display()))?;
    debug!(path = %path.display(), "loaded settings");
    Ok(settings)
}

/// Loads settings from the default location (settings.json in the current directory)
pub fn load_default_settings() -> Result<Settings> {
    load_settings(DEFAULT_SETTINGS_FILE)
}

/// Loads settings from an optional path, returning None if no path is provided
pub fn load_optional_settings(path: Option<&PathBuf>) -> Result<Option<Settings>> {
    match path {
        Some(settings_path) => Ok(Some(load_settings(settings_path)?)),
        None => Ok(None),
    }
}

/// Tries the provided path first, then the default location.
/// Returns None only if no readable settings file is found anywhere.
pub fn load_settings_with_fallback(path: Option<&PathBuf>) -> Result<Option<Settings>> {
    if let Some(settings_path) = path {
        match load_settings(settings_path) {
            Ok(settings) => return Ok(Some(settings)),
            Err(e) => warn!("{:#}; falling back to {}", e, DEFAULT_SETTINGS_FILE),
        }
    }

    match load_default_settings() {
        Ok(settings) => Ok(Some(settings)),
        Err(_) => Ok(None),
    }
}

/// Overrides individual settings from `DATABASE_PATH`, `CHARTS_DIR`, `HOST`
/// and `PORT`, looked up through `lookup`. An unparseable `PORT` is ignored.
pub fn apply_overrides<F>(mut settings: Settings, lookup: F) -> Settings
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup("DATABASE_PATH") {
        settings.database_path = PathBuf::from(path);
    }
    if let Some(dir) = lookup("CHARTS_DIR") {
        settings.charts_dir = PathBuf::from(dir);
    }
    if let Some(host) = lookup("HOST") {
        settings.server.host = host;
    }
    if let Some(port) = lookup("PORT") {
        match port.trim().parse::<u16>() {
            Ok(p) => settings.server.port = p,
            Err(_) => warn!("Ignoring invalid PORT '{}'", port),
        }
    }
    settings
}

/// Makes relative store and chart paths relative to `base` instead of the
/// current directory.
pub fn resolve_relative_paths(mut settings: Settings, base: &Path) -> Settings {
    if settings.database_path.is_relative() {
        settings.database_path = base.join(&settings.database_path);
    }
    if settings.charts_dir.is_relative() {
        settings.charts_dir = base.join(&settings.charts_dir);
    }
    settings
}

/// Checks if a settings file exists at the given path
pub fn settings_file_exists<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().exists() && path.as_ref().is_file()
}
