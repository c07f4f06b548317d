// src/config.rs

//! Environment-provided configuration.
//!
//! API credentials never live in the config file; they are read from the
//! environment at startup and missing values abort the run before any
//! network call is made.

use std::env;

use crate::error::{AppError, Result};

/// Environment variable holding the Imoview API key.
pub const IMOVIEW_API_KEY_VAR: &str = "IMOVIEW_API_KEY";

/// Environment variable holding the RD Station public token.
pub const RD_TOKEN_VAR: &str = "RD_TOKEN_PUBLICO";

/// Environment variable overriding the configured lookback window.
pub const LOOKBACK_VAR: &str = "HOURS_LOOKBACK";

/// API credentials for both external services.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Key sent in the `chave` header on Imoview requests
    pub imoview_api_key: String,

    /// Public token embedded in legacy RD Station payloads
    pub rd_public_token: String,
}

impl Credentials {
    /// Read credentials from the environment.
    ///
    /// Both variables are required; an unset or blank value is a fatal
    /// startup condition.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            imoview_api_key: require_env(IMOVIEW_API_KEY_VAR)?,
            rd_public_token: require_env(RD_TOKEN_VAR)?,
        })
    }
}

/// Optional lookback-window override from the environment, in hours.
pub fn lookback_override() -> Result<Option<u32>> {
    match env::var(LOOKBACK_VAR) {
        Ok(raw) => raw.trim().parse::<u32>().map(Some).map_err(|_| {
            AppError::config(format!("{LOOKBACK_VAR} is not a valid hour count: {raw:?}"))
        }),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(AppError::config(format!("{LOOKBACK_VAR}: {e}"))),
    }
}

fn require_env(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AppError::config(format!(
            "{name} is not set in the environment"
        ))),
    }
}
