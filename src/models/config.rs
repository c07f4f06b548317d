//! Application configuration structures.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Source CRM API settings
    #[serde(default)]
    pub imoview: ImoviewConfig,

    /// Destination marketing API settings
    #[serde(default)]
    pub rdstation: RdStationConfig,

    /// Run behavior settings
    #[serde(default)]
    pub sync: SyncConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if Url::parse(&self.imoview.base_url).is_err() {
            return Err(AppError::validation("imoview.base_url is not a valid URL"));
        }
        if self.imoview.page_size == 0 {
            return Err(AppError::validation("imoview.page_size must be > 0"));
        }
        if self.imoview.max_pages == 0 {
            return Err(AppError::validation("imoview.max_pages must be > 0"));
        }
        if self.imoview.timeout_secs == 0 {
            return Err(AppError::validation("imoview.timeout_secs must be > 0"));
        }
        if Url::parse(&self.rdstation.events_url).is_err() {
            return Err(AppError::validation(
                "rdstation.events_url is not a valid URL",
            ));
        }
        if Url::parse(&self.rdstation.legacy_url).is_err() {
            return Err(AppError::validation(
                "rdstation.legacy_url is not a valid URL",
            ));
        }
        if self.rdstation.timeout_secs == 0 {
            return Err(AppError::validation("rdstation.timeout_secs must be > 0"));
        }
        if self.sync.lookback_hours == 0 {
            return Err(AppError::validation("sync.lookback_hours must be > 0"));
        }
        if self.sync.send_test_event && !self.sync.test_event_email.contains('@') {
            return Err(AppError::validation(
                "sync.test_event_email must contain '@'",
            ));
        }
        Ok(())
    }
}

/// Source CRM API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImoviewConfig {
    /// Base URL of the Imoview API
    #[serde(default = "defaults::imoview_base_url")]
    pub base_url: String,

    /// Records requested per page
    #[serde(default = "defaults::page_size")]
    pub page_size: u32,

    /// Fixed deal purpose code sent with every query
    #[serde(default = "defaults::purpose")]
    pub purpose: u32,

    /// Fixed deal situation code sent with every query
    #[serde(default = "defaults::situation")]
    pub situation: u32,

    /// Upper bound on pages fetched per stage
    #[serde(default = "defaults::max_pages")]
    pub max_pages: u32,

    /// Delay between page requests in milliseconds
    #[serde(default = "defaults::page_delay")]
    pub page_delay_ms: u64,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for ImoviewConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::imoview_base_url(),
            page_size: defaults::page_size(),
            purpose: defaults::purpose(),
            situation: defaults::situation(),
            max_pages: defaults::max_pages(),
            page_delay_ms: defaults::page_delay(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Destination marketing API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RdStationConfig {
    /// Conversion endpoint of the current events API
    #[serde(default = "defaults::events_url")]
    pub events_url: String,

    /// Conversion endpoint of the legacy API
    #[serde(default = "defaults::legacy_url")]
    pub legacy_url: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for RdStationConfig {
    fn default() -> Self {
        Self {
            events_url: defaults::events_url(),
            legacy_url: defaults::legacy_url(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Run behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Where date filtering happens
    #[serde(default)]
    pub filter_mode: FilterMode,

    /// Client-mode lookback window in hours
    #[serde(default = "defaults::lookback_hours")]
    pub lookback_hours: u32,

    /// Delay between event dispatches in milliseconds
    #[serde(default = "defaults::dispatch_delay")]
    pub dispatch_delay_ms: u64,

    /// Send one diagnostic event when a run delivers nothing
    #[serde(default)]
    pub send_test_event: bool,

    /// Recipient address for the diagnostic event
    #[serde(default = "defaults::test_event_email")]
    pub test_event_email: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            filter_mode: FilterMode::default(),
            lookback_hours: defaults::lookback_hours(),
            dispatch_delay_ms: defaults::dispatch_delay(),
            send_test_event: false,
            test_event_email: defaults::test_event_email(),
        }
    }
}

/// Date filtering strategy for a run.
///
/// `Client` fetches unfiltered pages and filters against a lookback
/// cutoff locally; `Server` asks the API for records since the start of
/// the current day and trusts the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    Client,
    Server,
}

impl FilterMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterMode::Client => "client",
            FilterMode::Server => "server",
        }
    }
}

impl Default for FilterMode {
    fn default() -> Self {
        FilterMode::Client
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

mod defaults {
    // Imoview defaults
    pub fn imoview_base_url() -> String {
        "https://api.imoview.com.br".into()
    }
    pub fn page_size() -> u32 {
        20
    }
    pub fn purpose() -> u32 {
        2
    }
    pub fn situation() -> u32 {
        0
    }
    pub fn max_pages() -> u32 {
        5
    }
    pub fn page_delay() -> u64 {
        1000
    }
    pub fn timeout() -> u64 {
        15
    }

    // RD Station defaults
    pub fn events_url() -> String {
        "https://api.rd.services/platform/events?event_type=conversion".into()
    }
    pub fn legacy_url() -> String {
        "https://www.rdstation.com.br/api/1.3/conversions".into()
    }

    // Sync defaults
    pub fn lookback_hours() -> u32 {
        24
    }
    pub fn dispatch_delay() -> u64 {
        500
    }
    pub fn test_event_email() -> String {
        "teste@example.com".into()
    }
}
