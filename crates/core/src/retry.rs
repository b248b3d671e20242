//! Retry policy and per-call retry state machine
//!
//! The state machine moves through `Attempting -> (Backoff -> Attempting)* ->
//! Succeeded | Failed`. It never sleeps; the transport asks it what to do next
//! and performs the wait itself through an injected clock, which keeps every
//! transition testable without timers.

use std::time::Duration;

use crate::error::TransientCause;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(4);
pub const DEFAULT_MAX_TOTAL_BACKOFF: Duration = Duration::from_secs(15);

/// Bounds for retrying one logical call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Cap for a single backoff delay
    pub max_delay: Duration,
    /// Cap for the sum of all backoff delays
    pub max_total_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            max_total_backoff: DEFAULT_MAX_TOTAL_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry that follows failed attempt `attempt` (1-indexed):
    /// `base * 2^(attempt - 1)`, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        self.base_delay
            .checked_mul(1u32 << exp)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Classification of a single attempt's outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Retryable(TransientCause),
    /// Non-retryable failure; returned to the caller as-is
    Fatal,
}

/// Classify an HTTP status: 2xx success, 429 and 5xx retryable, rest fatal
pub fn classify_status(status: u16, reason: Option<String>) -> AttemptOutcome {
    match status {
        200..=299 => AttemptOutcome::Success,
        429 | 500..=599 => AttemptOutcome::Retryable(TransientCause::Status { status, reason }),
        _ => AttemptOutcome::Fatal,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPhase {
    Attempting,
    Backoff(Duration),
    Succeeded,
    Failed,
}

/// What the transport should do after recording an outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Hand the response back to the caller
    Return,
    /// Wait `delay`, then attempt again
    Retry { delay: Duration },
    /// Retry budget spent; surface the last transient failure
    Exhausted(TransientCause),
}

/// Per-call retry bookkeeping. Owned by one in-flight call, never shared.
#[derive(Debug, Clone)]
pub struct RetryState {
    policy: RetryPolicy,
    attempt: u32,
    elapsed_backoff: Duration,
    last_failure: Option<TransientCause>,
    phase: RetryPhase,
    delays: Vec<Duration>,
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempt: 0,
            elapsed_backoff: Duration::ZERO,
            last_failure: None,
            phase: RetryPhase::Attempting,
            delays: Vec::new(),
        }
    }

    /// Mark the start of the next attempt and return its 1-indexed number
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempt += 1;
        self.phase = RetryPhase::Attempting;
        self.attempt
    }

    /// Record the outcome of the current attempt and decide what happens next
    pub fn record(&mut self, outcome: AttemptOutcome) -> Decision {
        match outcome {
            AttemptOutcome::Success | AttemptOutcome::Fatal => {
                self.phase = if outcome == AttemptOutcome::Success {
                    RetryPhase::Succeeded
                } else {
                    RetryPhase::Failed
                };
                Decision::Return
            }
            AttemptOutcome::Retryable(cause) => {
                self.last_failure = Some(cause.clone());
                let delay = self.policy.delay_for(self.attempt);

                if self.attempt >= self.policy.max_attempts
                    || self.elapsed_backoff + delay > self.policy.max_total_backoff
                {
                    self.phase = RetryPhase::Failed;
                    return Decision::Exhausted(cause);
                }

                self.elapsed_backoff += delay;
                self.delays.push(delay);
                self.phase = RetryPhase::Backoff(delay);
                Decision::Retry { delay }
            }
        }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn phase(&self) -> RetryPhase {
        self.phase
    }

    pub fn elapsed_backoff(&self) -> Duration {
        self.elapsed_backoff
    }

    pub fn last_failure(&self) -> Option<&TransientCause> {
        self.last_failure.as_ref()
    }

    /// Backoff delays scheduled so far, in order
    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }
}
