// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Run configuration.
//!
//! Settings are layered from lowest to highest precedence: built-in defaults,
//! the JSON config file, environment variables, then command-line flags. The
//! merged [`Settings`] are validated once into an immutable [`Config`] that is
//! passed by reference to everything that needs it.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::months::YearMonth;
use crate::remote::http::DEFAULT_SERVICE_URL;

/// Account identity (email) used to sign in.
pub const ENV_IDENTITY: &str = "ICLOUD_USER";
/// Base output directory.
pub const ENV_OUTPUT_DIR: &str = "ICLOUD_OUT";
/// Photo service base URL.
pub const ENV_SERVICE_URL: &str = "ICLOUD_SERVICE_URL";

pub const DEFAULT_START_MONTH: &str = "2026-01";
pub const DEFAULT_END_MONTH: &str = "2026-01";
pub const DEFAULT_OUTPUT_DIR: &str = "Downloads/Photos";
pub const DEFAULT_SLEEP_BETWEEN_DOWNLOADS_SECS: f64 = 0.3;
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Name of the config file inside the config directory.
const CONFIG_FILE_NAME: &str = "config.json";

/// Raw, possibly partial settings from one configuration source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// First month to process, `YYYY-MM`
    pub start_month: Option<String>,
    /// Last month to process (inclusive), `YYYY-MM`
    pub end_month: Option<String>,
    /// Pause after each successful download, in seconds
    pub sleep_between_downloads: Option<f64>,
    /// Do not download videos at all
    pub skip_videos: Option<bool>,
    /// Download attempts per asset
    pub max_retries: Option<u32>,
    pub output_dir: Option<PathBuf>,
    pub identity: Option<String>,
    pub service_url: Option<String>,
}

impl Settings {
    /// Read settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Read `~/.photo-monthly/config.json` if it exists, otherwise empty settings.
    pub fn load_default() -> Result<Self> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Settings taken from environment variables. Empty values are ignored.
    pub fn from_env<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            identity: non_empty(ENV_IDENTITY).map(|v| v.trim().to_string()),
            output_dir: non_empty(ENV_OUTPUT_DIR).map(PathBuf::from),
            service_url: non_empty(ENV_SERVICE_URL),
            ..Self::default()
        }
    }

    /// Layer `overrides` on top of `self`; any value set in `overrides` wins.
    pub fn merge(self, overrides: Settings) -> Settings {
        Settings {
            start_month: overrides.start_month.or(self.start_month),
            end_month: overrides.end_month.or(self.end_month),
            sleep_between_downloads: overrides.sleep_between_downloads.or(self.sleep_between_downloads),
            skip_videos: overrides.skip_videos.or(self.skip_videos),
            max_retries: overrides.max_retries.or(self.max_retries),
            output_dir: overrides.output_dir.or(self.output_dir),
            identity: overrides.identity.or(self.identity),
            service_url: overrides.service_url.or(self.service_url),
        }
    }
}

/// `~/.photo-monthly/config.json`, if a home directory can be found.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".photo-monthly").join(CONFIG_FILE_NAME))
}

/// Validated configuration for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub start_month: YearMonth,
    pub end_month: YearMonth,
    pub sleep_between_downloads: Duration,
    pub skip_videos: bool,
    /// Download attempts per asset, at least 1
    pub max_retries: u32,
    /// Absolute base output directory
    pub output_dir: PathBuf,
    pub identity: Option<String>,
    pub service_url: String,
}

impl Config {
    /// Validate merged settings, filling gaps with the built-in defaults.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let start_month: YearMonth = settings
            .start_month
            .as_deref()
            .unwrap_or(DEFAULT_START_MONTH)
            .parse()
            .context("Invalid start month")?;
        let end_month: YearMonth = settings
            .end_month
            .as_deref()
            .unwrap_or(DEFAULT_END_MONTH)
            .parse()
            .context("Invalid end month")?;

        if start_month > end_month {
            tracing::warn!(%start_month, %end_month, "Start month is after end month; nothing will be downloaded");
        }

        let sleep_secs = settings
            .sleep_between_downloads
            .unwrap_or(DEFAULT_SLEEP_BETWEEN_DOWNLOADS_SECS);
        let sleep_between_downloads = Duration::try_from_secs_f64(sleep_secs).with_context(|| {
            format!("sleep_between_downloads must be a non-negative number of seconds, got {}", sleep_secs)
        })?;

        let max_retries = settings.max_retries.unwrap_or(DEFAULT_MAX_RETRIES);
        if max_retries == 0 {
            bail!("max_retries must be at least 1");
        }

        let output_dir = absolute_path(
            settings
                .output_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        )?;

        Ok(Self {
            start_month,
            end_month,
            sleep_between_downloads,
            skip_videos: settings.skip_videos.unwrap_or(false),
            max_retries,
            output_dir,
            identity: settings.identity.filter(|id| !id.trim().is_empty()),
            service_url: settings
                .service_url
                .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string()),
        })
    }
}

fn absolute_path(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir().context("Could not determine current directory")?;
    Ok(cwd.join(path))
}
