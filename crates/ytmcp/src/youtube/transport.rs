//! Resilient transport for the YouTube Data API
//!
//! [`YouTubeClient::execute`] is the only way an upstream request leaves the
//! process. It checks the allowlist before any I/O, builds the URL from the
//! fixed destination, retries transient failures with backoff bounded by a
//! whole-call deadline, and decodes (gzip-aware) JSON bodies.
//!
//! Sending and waiting are behind the [`HttpSend`] and [`Clock`] traits so the
//! retry loop can be driven deterministically in tests.

use std::future::Future;
use std::time::{Duration, Instant};

use log::{debug, warn};
use serde_json::Value;
use ytmcp_core::allowlist::{self, EndpointDescriptor, HttpMethod};
use ytmcp_core::decode::{decode_body, parse_error_body};
use ytmcp_core::error::{ApiError, TransientCause};
use ytmcp_core::request::{build_url, redact_url, scrub_secret, with_api_key, RequestSpec};
use ytmcp_core::retry::{classify_status, AttemptOutcome, Decision, RetryState};

use crate::config::{ApiKey, ClientSettings};

/// A single HTTP attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub url: String,
    pub timeout: Duration,
}

/// Status, encoding and raw bytes of a response, before any decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub content_encoding: Option<String>,
    pub body: Vec<u8>,
}

/// Failure below the HTTP layer. Details never contain the request URL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("request timed out")]
    Timeout,

    #[error("{0}")]
    Network(String),
}

pub trait HttpSend: Send + Sync {
    fn send(
        &self,
        request: OutboundRequest,
    ) -> impl Future<Output = Result<RawResponse, SendError>> + Send;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// [`HttpSend`] over a shared `reqwest::Client`
///
/// Compression is negotiated explicitly and bodies are returned undecoded;
/// decompression happens in [`decode_body`].
#[derive(Debug, Clone)]
pub struct ReqwestSender {
    client: reqwest::Client,
}

impl ReqwestSender {
    pub fn new() -> Result<Self, crate::error::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("ytmcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| crate::error::Error::HttpClient(e.without_url().to_string()))?;
        Ok(Self { client })
    }
}

fn send_error(err: reqwest::Error) -> SendError {
    if err.is_timeout() {
        return SendError::Timeout;
    }
    let kind = if err.is_connect() {
        "connection failed"
    } else if err.is_body() || err.is_decode() {
        "failed to read response body"
    } else {
        "request failed"
    };
    SendError::Network(format!("{kind}: {}", err.without_url()))
}

impl HttpSend for ReqwestSender {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, SendError> {
        let builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
        };

        let response = builder
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::ACCEPT_ENCODING, "gzip")
            .timeout(request.timeout)
            .send()
            .await
            .map_err(send_error)?;

        let status = response.status().as_u16();
        let content_encoding = response
            .headers()
            .get(reqwest::header::CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(send_error)?.to_vec();

        Ok(RawResponse {
            status,
            content_encoding,
            body,
        })
    }
}

/// Allowlisted, retrying YouTube Data API client
pub struct YouTubeClient<S, C> {
    sender: S,
    clock: C,
    api_key: ApiKey,
    settings: ClientSettings,
}

impl<S: HttpSend, C: Clock> YouTubeClient<S, C> {
    pub fn new(sender: S, clock: C, api_key: ApiKey, settings: ClientSettings) -> Self {
        Self {
            sender,
            clock,
            api_key,
            settings,
        }
    }

    /// Execute one logical call, retries included, and return the decoded body
    pub async fn execute(&self, spec: &RequestSpec) -> Result<Value, ApiError> {
        let endpoint = allowlist::lookup(&spec.endpoint).ok_or_else(|| {
            ApiError::PolicyViolation {
                endpoint: spec.endpoint.clone(),
            }
        })?;

        let url = build_url(endpoint, spec);
        let log_url = redact_url(&url);
        let url = with_api_key(&url, self.api_key.expose());

        let deadline = self.clock.now() + self.settings.call_deadline;
        let mut state = RetryState::new(self.settings.retry);

        loop {
            let now = self.clock.now();
            if now >= deadline {
                return Err(ApiError::DeadlineExceeded {
                    endpoint: endpoint.name.to_string(),
                    attempts: state.attempt(),
                    last: state.last_failure().cloned(),
                });
            }

            let attempt = state.begin_attempt();
            debug!(
                "{} {log_url} (attempt {attempt})",
                endpoint.method.as_str()
            );

            let request = OutboundRequest {
                method: endpoint.method,
                url: url.clone(),
                timeout: self.settings.attempt_timeout.min(deadline - now),
            };

            let cause = match self.sender.send(request).await {
                Ok(response) => match self.classify(endpoint, response) {
                    Ok(value) => {
                        state.record(AttemptOutcome::Success);
                        debug!("{} succeeded after {attempt} attempt(s)", endpoint.name);
                        return Ok(value);
                    }
                    Err(Attempt::Fatal(err)) => {
                        state.record(AttemptOutcome::Fatal);
                        return Err(err);
                    }
                    Err(Attempt::Retryable(cause)) => cause,
                },
                Err(SendError::Timeout) => TransientCause::Timeout,
                Err(SendError::Network(detail)) => {
                    TransientCause::Network(scrub_secret(&detail, self.api_key.expose()))
                }
            };

            let decision = state.record(AttemptOutcome::Retryable(cause.clone()));
            let Decision::Retry { delay } = decision else {
                warn!(
                    "{} failed after {attempt} attempt(s): {cause}",
                    endpoint.name
                );
                return Err(exhausted(endpoint, attempt, cause));
            };

            if self.clock.now() + delay >= deadline {
                warn!(
                    "{} deadline reached before retry {}: {cause}",
                    endpoint.name,
                    attempt + 1
                );
                return Err(ApiError::DeadlineExceeded {
                    endpoint: endpoint.name.to_string(),
                    attempts: attempt,
                    last: Some(cause),
                });
            }

            warn!(
                "{} attempt {attempt} failed ({cause}); retrying in {delay:?}",
                endpoint.name
            );
            self.clock.sleep(delay).await;
        }
    }

    fn classify(
        &self,
        endpoint: &EndpointDescriptor,
        response: RawResponse,
    ) -> Result<Value, Attempt> {
        let encoding = response.content_encoding.as_deref();

        if (200..300).contains(&response.status) {
            return decode_body(encoding, &response.body).map_err(|e| {
                Attempt::Fatal(ApiError::Decode {
                    endpoint: endpoint.name.to_string(),
                    detail: e.to_string(),
                })
            });
        }

        let info = parse_error_body(encoding, &response.body);
        match classify_status(response.status, info.reason.clone()) {
            AttemptOutcome::Retryable(cause) => Err(Attempt::Retryable(cause)),
            AttemptOutcome::Fatal | AttemptOutcome::Success => {
                Err(Attempt::Fatal(ApiError::Upstream {
                    endpoint: endpoint.name.to_string(),
                    status: response.status,
                    reason: info.reason,
                    message: info
                        .message
                        .map(|m| scrub_secret(&m, self.api_key.expose())),
                }))
            }
        }
    }
}

enum Attempt {
    Fatal(ApiError),
    Retryable(TransientCause),
}

/// Map the last transient failure to the error surfaced to the caller
fn exhausted(endpoint: &EndpointDescriptor, attempts: u32, last: TransientCause) -> ApiError {
    let endpoint = endpoint.name.to_string();
    match (attempts, last) {
        (1, TransientCause::Timeout) => ApiError::Timeout { endpoint },
        (1, TransientCause::Network(detail)) => ApiError::Network { endpoint, detail },
        (attempts, last) => ApiError::RetriesExhausted {
            endpoint,
            attempts,
            last,
        },
    }
}
