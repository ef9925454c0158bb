//! CID (ICD-10) code search.
//!
//! A code field either already holds a code (`A15`, `A15.2`) or free text to search for.
//! Free text is sent to a public ICD-10 search endpoint which answers with a four-element
//! JSON array; element 3 lists `[code, name]` pairs.

use crate::config::CoreConfig;
use crate::constants::{CID_SEARCH_FIELDS, CID_SEARCH_TIMEOUT, MIN_CID_SEARCH_LEN};
use crate::{AtestadoError, AtestadoResult};
use regex::Regex;
use reqwest::{Client, Url};
use serde::Serialize;
use std::future::Future;
use std::sync::OnceLock;
use utoipa::ToSchema;

fn code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Z][0-9]{2}(\.[0-9]{1,2})?$").expect("static CID code pattern")
    })
}

/// `true` if `value` already looks like a CID code: one capital letter, two digits, and
/// an optional one- or two-digit decimal part.
pub fn is_code_shaped(value: &str) -> bool {
    code_pattern().is_match(value)
}

/// `true` if `value` should be sent to the search endpoint.
pub fn should_search(value: &str) -> bool {
    value.chars().count() >= MIN_CID_SEARCH_LEN && !is_code_shaped(value)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CidSuggestion {
    pub code: String,
    pub name: String,
}

/// Extracts suggestions from a search response.
///
/// # Errors
///
/// Returns `AtestadoError::MalformedCidPayload` unless the payload is an array of more than
/// three elements whose element 3 is an array of `[code, name]` string pairs.
pub fn parse_search_payload(payload: &serde_json::Value) -> AtestadoResult<Vec<CidSuggestion>> {
    let pairs = payload
        .as_array()
        .filter(|items| items.len() > 3)
        .and_then(|items| items[3].as_array())
        .ok_or(AtestadoError::MalformedCidPayload)?;

    pairs
        .iter()
        .map(|pair| match pair.as_array().map(Vec::as_slice) {
            Some([code, name, ..]) => match (code.as_str(), name.as_str()) {
                (Some(code), Some(name)) => Ok(CidSuggestion {
                    code: code.to_string(),
                    name: name.to_string(),
                }),
                _ => Err(AtestadoError::MalformedCidPayload),
            },
            _ => Err(AtestadoError::MalformedCidPayload),
        })
        .collect()
}

/// A source of CID suggestions.
pub trait CidSearch: Send + Sync {
    fn search(
        &self,
        term: &str,
    ) -> impl Future<Output = AtestadoResult<Vec<CidSuggestion>>> + Send;
}

/// [`CidSearch`] backed by the HTTP search endpoint.
#[derive(Debug, Clone)]
pub struct HttpCidSearch {
    endpoint: Url,
    client: Client,
}

impl HttpCidSearch {
    pub fn new(endpoint: Url) -> AtestadoResult<Self> {
        let client = Client::builder().timeout(CID_SEARCH_TIMEOUT).build()?;
        Ok(Self { endpoint, client })
    }

    pub fn from_config(config: &CoreConfig) -> AtestadoResult<Self> {
        Self::new(config.cid_search_url().clone())
    }
}

impl CidSearch for HttpCidSearch {
    async fn search(&self, term: &str) -> AtestadoResult<Vec<CidSuggestion>> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("sf", CID_SEARCH_FIELDS), ("terms", term)])
            .send()
            .await?
            .error_for_status()?;

        let payload: serde_json::Value = response.json().await?;
        parse_search_payload(&payload)
    }
}
