//! Run configuration.
//!
//! The orchestrator (or the standalone binary) builds a [`Config`] once and
//! hands it to the pipeline; nothing reads process-wide settings after that.

use crate::error::{Error, Result};
use dotenv::dotenv;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Public Data API v3 root.
pub const DEFAULT_BASE_URL: &str = "https://youtube.googleapis.com/youtube/v3";
/// Channel extracted when no handle is configured.
pub const DEFAULT_CHANNEL_HANDLE: &str = "MrBeast";
/// Upstream per-request item limit for both playlist pages and video lookups.
pub const MAX_RESULTS: usize = 50;
/// Page ceiling for a single playlist.
pub const DEFAULT_MAX_PAGES: usize = 10_000;

/// Settings for one extraction run
#[derive(Clone, Debug)]
pub struct Config {
    /// Static API credential
    pub api_key: String,
    /// Channel whose uploads are extracted
    pub channel_handle: String,
    /// API root, overridable for mock servers
    pub base_url: String,
    /// Items requested per playlist page
    pub page_size: usize,
    /// Ids per video lookup
    pub batch_size: usize,
    /// Maximum playlist page requests before giving up
    pub max_pages: usize,
    /// Concurrent video lookups (1 = sequential)
    pub num_workers: usize,
    /// Per-request HTTP timeout
    pub timeout: Duration,
    /// Directory the dated JSON file is written to
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            channel_handle: DEFAULT_CHANNEL_HANDLE.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: MAX_RESULTS,
            batch_size: MAX_RESULTS,
            max_pages: DEFAULT_MAX_PAGES,
            num_workers: 1,
            timeout: Duration::from_secs(30),
            output_dir: PathBuf::from("./data"),
        }
    }
}

impl Config {
    /// Build a config with the given credential and defaults for everything else.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Load `.env` (if any) and read settings from the environment.
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, falling back to defaults.
    ///
    /// `API_KEY` is required; every other key is optional. Values are only
    /// parsed here; call [`Config::validate`] once all overrides are applied.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::config("API_KEY", "API_KEY must be set"))?;

        let mut config = Config::new(api_key);
        if let Some(handle) = lookup("CHANNEL_HANDLE") {
            config.channel_handle = normalize_handle(&handle);
        }
        if let Some(url) = lookup("YT_BASE_URL") {
            config.base_url = url;
        }
        if let Some(dir) = lookup("OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        config.page_size = parse_or(&lookup, "PAGE_SIZE", config.page_size)?;
        config.batch_size = parse_or(&lookup, "BATCH_SIZE", config.batch_size)?;
        config.max_pages = parse_or(&lookup, "MAX_PAGES", config.max_pages)?;
        config.num_workers = parse_or(&lookup, "NUM_WORKERS", config.num_workers)?;
        let timeout_secs = parse_or(&lookup, "HTTP_TIMEOUT_SECS", config.timeout.as_secs())?;
        config.timeout = Duration::from_secs(timeout_secs);
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with.
    ///
    /// A page size above [`MAX_RESULTS`] is allowed through; the upstream
    /// decides what to do with it.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::config("API_KEY", "API key must not be empty"));
        }
        if self.channel_handle.trim().is_empty() {
            return Err(Error::config("CHANNEL_HANDLE", "channel handle must not be empty"));
        }
        for (key, value) in [
            ("PAGE_SIZE", self.page_size),
            ("BATCH_SIZE", self.batch_size),
            ("MAX_PAGES", self.max_pages),
            ("NUM_WORKERS", self.num_workers),
        ] {
            if value == 0 {
                return Err(Error::config(key, "must be at least 1"));
            }
        }
        Ok(())
    }
}

/// `@MrBeast` and `MrBeast` name the same channel.
pub fn normalize_handle(handle: &str) -> String {
    handle.trim().trim_start_matches('@').to_string()
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::config(key, format!("{key} must be a number: {e}"))),
        None => Ok(default),
    }
}
