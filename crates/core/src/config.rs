//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Request handling never reads process-wide environment
//! variables; binaries read them once and hand the raw values to the parsing helpers below.

use crate::constants::{
    DEFAULT_CID_DEBOUNCE_MS, DEFAULT_CID_SEARCH_URL, DEFAULT_LOCALITY,
    DEFAULT_SESSION_IDLE_SECS, DEFAULT_STYLE_SCRIPT_URL,
};
use crate::validation::{validate_locality, validate_search_url};
use crate::{AtestadoError, AtestadoResult};
use reqwest::Url;
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    cid_search_url: Url,
    cid_debounce: Duration,
    locality: String,
    style_script_url: String,
    session_idle_ttl: Duration,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(
        cid_search_url: Url,
        cid_debounce: Duration,
        locality: String,
        style_script_url: String,
    ) -> AtestadoResult<Self> {
        validate_locality(&locality)?;

        Ok(Self {
            cid_search_url,
            cid_debounce,
            locality,
            style_script_url,
            session_idle_ttl: Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
        })
    }

    /// Build a configuration from optional raw values, falling back to defaults for any
    /// value that is `None` or blank.
    pub fn from_env_values(
        cid_search_url: Option<String>,
        cid_debounce_ms: Option<String>,
        locality: Option<String>,
        style_script_url: Option<String>,
    ) -> AtestadoResult<Self> {
        let cid_search_url = non_blank(cid_search_url);
        let cid_search_url =
            validate_search_url(cid_search_url.as_deref().unwrap_or(DEFAULT_CID_SEARCH_URL))?;
        let cid_debounce = debounce_from_env_value(cid_debounce_ms)?;
        let locality = non_blank(locality).unwrap_or_else(|| DEFAULT_LOCALITY.into());
        let style_script_url =
            non_blank(style_script_url).unwrap_or_else(|| DEFAULT_STYLE_SCRIPT_URL.into());

        Self::new(cid_search_url, cid_debounce, locality, style_script_url)
    }

    pub fn cid_search_url(&self) -> &Url {
        &self.cid_search_url
    }

    pub fn cid_debounce(&self) -> Duration {
        self.cid_debounce
    }

    pub fn locality(&self) -> &str {
        &self.locality
    }

    pub fn style_script_url(&self) -> &str {
        &self.style_script_url
    }

    /// How long a session may go untouched before it is evicted.
    pub fn session_idle_ttl(&self) -> Duration {
        self.session_idle_ttl
    }

    pub fn with_session_idle_ttl(mut self, ttl: Duration) -> Self {
        self.session_idle_ttl = ttl;
        self
    }
}

/// Parse the CID debounce window (milliseconds) from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default 500 ms window.
pub fn debounce_from_env_value(value: Option<String>) -> AtestadoResult<Duration> {
    let Some(value) = non_blank(value) else {
        return Ok(Duration::from_millis(DEFAULT_CID_DEBOUNCE_MS));
    };

    let millis = value.parse::<u64>().map_err(|e| {
        AtestadoError::InvalidInput(format!("invalid CID debounce '{}': {}", value, e))
    })?;

    Ok(Duration::from_millis(millis))
}

/// Parse the session idle timeout (seconds) from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default of 30 minutes. Zero is
/// rejected since it would evict every session on the next sweep.
pub fn session_idle_ttl_from_env_value(value: Option<String>) -> AtestadoResult<Duration> {
    let Some(value) = non_blank(value) else {
        return Ok(Duration::from_secs(DEFAULT_SESSION_IDLE_SECS));
    };

    let secs = value.parse::<u64>().map_err(|e| {
        AtestadoError::InvalidInput(format!("invalid session idle timeout '{}': {}", value, e))
    })?;
    if secs == 0 {
        return Err(AtestadoError::InvalidInput(
            "session idle timeout must be at least one second".into(),
        ));
    }

    Ok(Duration::from_secs(secs))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
