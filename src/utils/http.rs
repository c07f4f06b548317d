// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;

/// User agent sent on every outbound request.
pub const USER_AGENT: &str = concat!("dealsync/", env!("CARGO_PKG_VERSION"));

/// Maximum number of characters of a response body quoted in logs.
const BODY_SNIPPET_CHARS: usize = 200;

/// Create a configured asynchronous HTTP client.
///
/// Every request made through the client is bounded by `timeout_secs` so a
/// stalled endpoint cannot hang the run.
pub fn create_client(timeout_secs: u64) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;
    Ok(client)
}

/// Truncate a response body for log output.
///
/// Error bodies from the APIs can be arbitrarily large; only the leading
/// characters are worth quoting.
pub fn body_snippet(body: &str) -> &str {
    match body.char_indices().nth(BODY_SNIPPET_CHARS) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
