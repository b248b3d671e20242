//! Typed failures for upstream calls and tool operations
//!
//! Every variant carries a stable, machine-readable reason code (see
//! [`ApiError::reason`]) plus a human-readable `Display`. None of them ever hold
//! the API credential, a full request URL, or a raw upstream payload.

use crate::quota::QuotaError;

/// What triggered a retry, kept to report the last observed failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransientCause {
    Status {
        status: u16,
        reason: Option<String>,
    },
    Timeout,
    Network(String),
}

impl std::fmt::Display for TransientCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransientCause::Status {
                status,
                reason: Some(reason),
            } => write!(f, "HTTP {status} ({reason})"),
            TransientCause::Status { status, reason: None } => write!(f, "HTTP {status}"),
            TransientCause::Timeout => write!(f, "request timed out"),
            TransientCause::Network(kind) => write!(f, "network error: {kind}"),
        }
    }
}

/// Failures surfaced by the transport and the quota budgeter
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("Endpoint is not allowlisted: {endpoint:?}")]
    PolicyViolation { endpoint: String },

    #[error(transparent)]
    QuotaExceeded(#[from] QuotaError),

    #[error("YouTube API rejected {endpoint} request with status {status}{}", fmt_reason(.reason))]
    Upstream {
        endpoint: String,
        status: u16,
        reason: Option<String>,
        message: Option<String>,
    },

    #[error("YouTube API {endpoint} failed after {attempts} attempts; last failure: {last}")]
    RetriesExhausted {
        endpoint: String,
        attempts: u32,
        last: TransientCause,
    },

    #[error("YouTube API {endpoint} request timed out")]
    Timeout { endpoint: String },

    #[error("Network error calling YouTube API {endpoint}: {detail}")]
    Network { endpoint: String, detail: String },

    #[error("Deadline passed while calling YouTube API {endpoint} after {attempts} attempts")]
    DeadlineExceeded {
        endpoint: String,
        attempts: u32,
        last: Option<TransientCause>,
    },

    #[error("Invalid response from YouTube API {endpoint}: {detail}")]
    Decode { endpoint: String, detail: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

fn fmt_reason(reason: &Option<String>) -> String {
    match reason {
        Some(r) => format!(" ({r})"),
        None => String::new(),
    }
}

impl ApiError {
    /// Stable reason code callers can branch on
    pub fn reason(&self) -> &'static str {
        match self {
            ApiError::PolicyViolation { .. } => "policy_violation",
            ApiError::QuotaExceeded(_) => "quota_exceeded",
            ApiError::Upstream { .. } => "upstream_error",
            ApiError::RetriesExhausted { .. } => "transient_exhausted",
            ApiError::Timeout { .. } => "timeout",
            ApiError::Network { .. } => "network_error",
            ApiError::DeadlineExceeded { .. } => "deadline_exceeded",
            ApiError::Decode { .. } => "decode_error",
            ApiError::InvalidRequest(_) => "invalid_request",
        }
    }

    /// HTTP status of the failure, when one was observed
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Upstream { status, .. } => Some(*status),
            ApiError::RetriesExhausted {
                last: TransientCause::Status { status, .. },
                ..
            } => Some(*status),
            _ => None,
        }
    }

    /// Upstream-provided reason (e.g. `commentsDisabled`, `quotaExceeded`)
    pub fn upstream_reason(&self) -> Option<&str> {
        match self {
            ApiError::Upstream { reason, .. } => reason.as_deref(),
            ApiError::RetriesExhausted {
                last: TransientCause::Status { reason, .. },
                ..
            } => reason.as_deref(),
            _ => None,
        }
    }

    /// True for an upstream 403 whose reason says the feature is turned off
    pub fn is_disabled(&self, upstream_reason: &str) -> bool {
        matches!(self, ApiError::Upstream { status: 403, .. })
            && self.upstream_reason() == Some(upstream_reason)
    }
}

/// Failures of a tool-level operation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ToolError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Resolution(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<QuotaError> for ToolError {
    fn from(err: QuotaError) -> Self {
        ToolError::Api(ApiError::QuotaExceeded(err))
    }
}

impl ToolError {
    pub fn reason(&self) -> &'static str {
        match self {
            ToolError::Api(e) => e.reason(),
            ToolError::InvalidArgument(_) => "invalid_argument",
            ToolError::Resolution(_) => "channel_resolution",
            ToolError::NotFound(_) => "not_found",
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        ToolError::InvalidArgument(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes_are_distinct_for_hard_and_transient_failures() {
        let hard = ApiError::Upstream {
            endpoint: "videos".to_string(),
            status: 404,
            reason: Some("videoNotFound".to_string()),
            message: None,
        };
        let transient = ApiError::RetriesExhausted {
            endpoint: "videos".to_string(),
            attempts: 4,
            last: TransientCause::Status {
                status: 503,
                reason: None,
            },
        };

        assert_eq!(hard.reason(), "upstream_error");
        assert_eq!(transient.reason(), "transient_exhausted");
        assert_eq!(transient.status(), Some(503));
    }

    #[test]
    fn test_display_includes_upstream_reason() {
        let err = ApiError::Upstream {
            endpoint: "commentThreads".to_string(),
            status: 403,
            reason: Some("commentsDisabled".to_string()),
            message: Some("comments are off".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("403"));
        assert!(msg.contains("commentsDisabled"));
        assert!(err.is_disabled("commentsDisabled"));
        assert!(!err.is_disabled("forbidden"));
    }

    #[test]
    fn test_exhausted_reports_last_failure() {
        let err = ApiError::RetriesExhausted {
            endpoint: "search".to_string(),
            attempts: 3,
            last: TransientCause::Network("connect".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("3 attempts"));
        assert!(msg.contains("network error: connect"));
    }

    #[test]
    fn test_tool_error_reasons() {
        assert_eq!(ToolError::invalid("x").reason(), "invalid_argument");
        assert_eq!(
            ToolError::Resolution("ambiguous".to_string()).reason(),
            "channel_resolution"
        );
        let policy: ToolError = ApiError::PolicyViolation {
            endpoint: "nope".to_string(),
        }
        .into();
        assert_eq!(policy.reason(), "policy_violation");
        assert_eq!(
            ToolError::NotFound("video abc".to_string()).to_string(),
            "Not found: video abc"
        );
    }
}
