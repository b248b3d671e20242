//! Request specification and outbound URL construction
//!
//! The destination scheme, host and base path are constants. The only variable
//! parts of an outbound URL are the allowlisted endpoint path and the
//! percent-encoded query string, so nothing a caller supplies can change where
//! a request goes.

use std::collections::BTreeMap;

use crate::allowlist::EndpointDescriptor;

pub const YOUTUBE_DATA_API_SCHEME: &str = "https";
pub const YOUTUBE_DATA_API_HOST: &str = "www.googleapis.com";
pub const YOUTUBE_DATA_API_BASE_PATH: &str = "/youtube/v3";

/// Query parameter name the credential is sent under
pub const API_KEY_PARAM: &str = "key";

const SENSITIVE_PARAMS: [&str; 5] = ["key", "api_key", "apikey", "token", "access_token"];

pub const REDACTED: &str = "[REDACTED]";

/// A single query parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl std::fmt::Display for QueryValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryValue::Str(s) => write!(f, "{s}"),
            QueryValue::Int(n) => write!(f, "{n}"),
            QueryValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Str(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Str(value)
    }
}

impl From<usize> for QueryValue {
    fn from(value: usize) -> Self {
        QueryValue::Int(value as i64)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Int(value)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Bool(value)
    }
}

/// One upstream call: endpoint name, query parameters and optional page cursor
///
/// Built per call by a domain operation and consumed once by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub endpoint: String,
    pub params: BTreeMap<String, QueryValue>,
    pub page_token: Option<String>,
}

impl RequestSpec {
    pub fn new(endpoint: &EndpointDescriptor) -> Self {
        Self::named(endpoint.name)
    }

    /// Build a spec for an endpoint by raw name; the transport rejects names
    /// that are not allowlisted.
    pub fn named(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            params: BTreeMap::new(),
            page_token: None,
        }
    }

    pub fn part(self, part: &str) -> Self {
        self.param("part", part)
    }

    pub fn param(mut self, key: &str, value: impl Into<QueryValue>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn page_token(mut self, token: Option<String>) -> Self {
        self.page_token = token.filter(|t| !t.is_empty());
        self
    }
}

/// Build the outbound URL for an allowlisted endpoint, without the credential
///
/// A caller-supplied `key` or `pageToken` parameter is dropped; the page cursor
/// only travels through [`RequestSpec::page_token`] and the credential is
/// appended separately by [`with_api_key`].
pub fn build_url(endpoint: &EndpointDescriptor, spec: &RequestSpec) -> String {
    let mut pairs: Vec<(String, String)> = spec
        .params
        .iter()
        .filter(|(k, _)| k.as_str() != API_KEY_PARAM && k.as_str() != "pageToken")
        .map(|(k, v)| (k.clone(), v.to_string()))
        .collect();

    if let Some(token) = &spec.page_token {
        pairs.push(("pageToken".to_string(), token.clone()));
    }

    let query = encode_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    let mut url = format!(
        "{YOUTUBE_DATA_API_SCHEME}://{YOUTUBE_DATA_API_HOST}{YOUTUBE_DATA_API_BASE_PATH}/{}",
        endpoint.path
    );
    if !query.is_empty() {
        url.push('?');
        url.push_str(&query);
    }
    url
}

/// Append the credential to a URL produced by [`build_url`]
pub fn with_api_key(url: &str, api_key: &str) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!(
        "{url}{sep}{API_KEY_PARAM}={}",
        urlencoding::encode(api_key)
    )
}

fn encode_pairs<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    pairs
        .map(|(k, v)| {
            format!(
                "{}={}",
                urlencoding::encode(k),
                // Comma-separated `part`/`id` lists stay readable.
                urlencoding::encode(v).replace("%2C", ",")
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Mask sensitive query parameters (`key`, `token`, ...) in a URL for logging
pub fn redact_url(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };

    let redacted: Vec<String> = query
        .split('&')
        .map(|pair| {
            let name = pair.split('=').next().unwrap_or_default();
            let decoded = urlencoding::decode(name)
                .map(|n| n.to_ascii_lowercase())
                .unwrap_or_default();
            if SENSITIVE_PARAMS.contains(&decoded.as_str()) {
                format!("{name}={REDACTED}")
            } else {
                pair.to_string()
            }
        })
        .collect();

    format!("{base}?{}", redacted.join("&"))
}

/// Replace every occurrence of `secret` in `text`; used before surfacing any
/// free-form upstream text.
pub fn scrub_secret(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        return text.to_string();
    }
    text.replace(secret, REDACTED)
}
