//! Configuration file and environment settings

use friendkit::{DEFAULT_API_BASE, DEFAULT_API_VERSION, DEFAULT_PAGE_SIZE, DEFAULT_REQUEST_DELAY};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Prefix of environment variables overriding file settings
pub const ENV_PREFIX: &str = "FRIENDKIT";

/// Settings read from `friendkit.toml` and `FRIENDKIT_*` variables
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Token used when the credential source is the configuration file
    pub access_token: Option<String>,
    /// Friends requested per page
    pub page_size: u32,
    pub api_base: String,
    pub api_version: String,
    /// Pause between two API requests, in milliseconds
    pub request_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            access_token: None,
            page_size: DEFAULT_PAGE_SIZE,
            api_base: DEFAULT_API_BASE.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            request_delay_ms: DEFAULT_REQUEST_DELAY.as_millis() as u64,
        }
    }
}

impl Settings {
    /// Load settings; a missing file leaves the defaults in place
    pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from(path.to_path_buf()).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}
