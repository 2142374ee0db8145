//! Shared plumbing for the command-line tools: logging setup, settings
//! resolution and the store validator.

pub mod validate;

use std::path::PathBuf;

use anyhow::Result;
use models::Settings;

pub use validate::{Report, validate_database};

/// Logs go to stderr so stdout stays clean for JSON output.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// Settings from `--settings` (or `./settings.json`), defaults otherwise.
pub fn load_cli_settings(path: Option<&PathBuf>) -> Result<Settings> {
    if let Some(path) = path {
        return settings_loader::load_settings(path);
    }
    Ok(settings_loader::load_settings_with_fallback(None)?.unwrap_or_default())
}
