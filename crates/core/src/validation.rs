//! Input validation utilities.
//!
//! This module contains functions for validating configuration inputs before they are
//! used to build outbound requests or printed onto a certificate.

use crate::{AtestadoError, AtestadoResult};
use reqwest::Url;

/// Validates that a CID search endpoint is an absolute HTTP(S) URL.
///
/// # Arguments
///
/// * `value` - The endpoint string to validate.
///
/// # Errors
///
/// Returns `AtestadoError::InvalidInput` if the value does not parse as a URL, uses a
/// scheme other than `http`/`https`, or has no host.
pub fn validate_search_url(value: &str) -> AtestadoResult<Url> {
    let url = Url::parse(value.trim())
        .map_err(|e| AtestadoError::InvalidInput(format!("invalid CID search URL: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(AtestadoError::InvalidInput(format!(
            "CID search URL must use http or https (got {})",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(AtestadoError::InvalidInput(
            "CID search URL must include a host".into(),
        ));
    }

    Ok(url)
}

/// Validates the locality line printed before the attestation date.
///
/// - Rejects empty or whitespace-only strings
/// - Bounds the length so the line fits on the certificate
/// - Rejects control characters, which would break the printed layout
///
/// # Errors
///
/// Returns `AtestadoError::InvalidInput` if the locality is invalid.
pub fn validate_locality(locality: &str) -> AtestadoResult<()> {
    const MAX_LOCALITY_LEN: usize = 64;

    if locality.trim().is_empty() {
        return Err(AtestadoError::InvalidInput("locality cannot be empty".into()));
    }

    if locality.chars().count() > MAX_LOCALITY_LEN {
        return Err(AtestadoError::InvalidInput(format!(
            "locality exceeds maximum length of {} characters",
            MAX_LOCALITY_LEN
        )));
    }

    if locality.chars().any(char::is_control) {
        return Err(AtestadoError::InvalidInput(
            "locality cannot contain control characters".into(),
        ));
    }

    Ok(())
}
