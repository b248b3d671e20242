//! Runtime configuration: credential loading and settings derived from the
//! global CLI flags.

use std::time::Duration;

use ytmcp_core::quota::{EstimationPolicy, ToolBudget};
use ytmcp_core::retry::RetryPolicy;

use crate::error::Error;

pub const API_KEY_ENV: &str = "YOUTUBE_API_KEY";

/// The upstream credential. `Debug` and `Display` never print the value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Load the key from `YOUTUBE_API_KEY`
    pub fn from_env() -> Result<Self, Error> {
        Self::from_value(std::env::var(API_KEY_ENV).ok())
    }

    pub fn from_value(value: Option<String>) -> Result<Self, Error> {
        let value = value.unwrap_or_default();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(Error::MissingApiKey);
        }
        if trimmed.starts_with("${") && trimmed.ends_with('}') {
            return Err(Error::PlaceholderApiKey);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Raw value, for attaching to the outbound request only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

impl std::fmt::Display for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// How the quota budgeting period is keyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodMode {
    /// Calendar day in the upstream's reset timezone
    Daily,
    /// One period for the lifetime of the process
    Session,
}

/// Per-call transport settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientSettings {
    /// Bound on a single attempt
    pub attempt_timeout: Duration,
    /// Bound on the whole logical call, retries and backoff included
    pub call_deadline: Duration,
    pub retry: RetryPolicy,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(10),
            call_deadline: Duration::from_secs(60),
            retry: RetryPolicy::default(),
        }
    }
}

/// Everything the YouTube layer needs, validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub client: ClientSettings,
    pub quota_ceiling: u64,
    pub period_mode: PeriodMode,
    pub tool_budget: ToolBudget,
    pub estimation_policy: EstimationPolicy,
}

impl Settings {
    pub fn from_global(global: &crate::Global) -> Result<Self, Error> {
        if global.quota_ceiling == 0 {
            return Err(Error::InvalidConfig(
                "--quota-ceiling must be greater than zero".to_string(),
            ));
        }
        if global.http_timeout_secs == 0 {
            return Err(Error::InvalidConfig(
                "--http-timeout-secs must be greater than zero".to_string(),
            ));
        }
        if global.max_attempts == 0 {
            return Err(Error::InvalidConfig(
                "--max-attempts must be at least 1".to_string(),
            ));
        }
        if global.call_deadline_secs < global.http_timeout_secs {
            return Err(Error::InvalidConfig(
                "--call-deadline-secs must be at least --http-timeout-secs".to_string(),
            ));
        }

        Ok(Self {
            client: ClientSettings {
                attempt_timeout: Duration::from_secs(global.http_timeout_secs),
                call_deadline: Duration::from_secs(global.call_deadline_secs),
                retry: RetryPolicy {
                    max_attempts: global.max_attempts,
                    ..RetryPolicy::default()
                },
            },
            quota_ceiling: global.quota_ceiling,
            period_mode: global.quota_period,
            tool_budget: ToolBudget::default(),
            estimation_policy: global.estimation_policy,
        })
    }
}
