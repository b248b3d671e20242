//! Budget-gated access to the YouTube Data API
//!
//! Domain operations depend on [`YouTubeApi`] only. The production
//! implementation, [`Gateway`], reserves each call's quota cost with the shared
//! [`QuotaBudgeter`] before handing it to the transport, so an over-budget call
//! never reaches the network.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use ytmcp_core::allowlist;
use ytmcp_core::error::ApiError;
use ytmcp_core::quota::{EstimationPolicy, ToolBudget};
use ytmcp_core::request::RequestSpec;
use ytmcp_core::youtube::ListEnvelope;

use super::budget::QuotaBudgeter;
use super::transport::{Clock, HttpSend, YouTubeClient};

pub trait YouTubeApi: Send + Sync {
    /// Reserve quota for, then execute, one upstream call
    fn call(&self, spec: RequestSpec) -> impl Future<Output = Result<Value, ApiError>> + Send;

    /// Check that a plan estimated at `units` still fits the remaining budget
    fn preflight(&self, units: u64) -> Result<(), ApiError>;

    fn tool_budget(&self) -> ToolBudget {
        ToolBudget::default()
    }

    fn estimation_policy(&self) -> EstimationPolicy {
        EstimationPolicy::default()
    }
}

pub struct Gateway<S, C> {
    client: YouTubeClient<S, C>,
    budgeter: Arc<QuotaBudgeter>,
    tool_budget: ToolBudget,
    estimation_policy: EstimationPolicy,
}

impl<S: HttpSend, C: Clock> Gateway<S, C> {
    pub fn new(
        client: YouTubeClient<S, C>,
        budgeter: Arc<QuotaBudgeter>,
        tool_budget: ToolBudget,
        estimation_policy: EstimationPolicy,
    ) -> Self {
        Self {
            client,
            budgeter,
            tool_budget,
            estimation_policy,
        }
    }
}

impl<S: HttpSend, C: Clock> YouTubeApi for Gateway<S, C> {
    async fn call(&self, spec: RequestSpec) -> Result<Value, ApiError> {
        let endpoint = allowlist::lookup(&spec.endpoint).ok_or_else(|| {
            ApiError::PolicyViolation {
                endpoint: spec.endpoint.clone(),
            }
        })?;

        // Charged up front; a failed call keeps its charge.
        let reservation = self
            .budgeter
            .check_and_reserve(endpoint.name, endpoint.unit_cost)?;

        let result = self.client.execute(&spec).await;
        // API-key traffic never reports its actual cost.
        self.budgeter.record_actual(&reservation, None);
        result
    }

    fn preflight(&self, units: u64) -> Result<(), ApiError> {
        Ok(self.budgeter.ensure_available(units)?)
    }

    fn tool_budget(&self) -> ToolBudget {
        self.tool_budget
    }

    fn estimation_policy(&self) -> EstimationPolicy {
        self.estimation_policy
    }
}

/// Execute a `*.list` call and parse its envelope
pub async fn fetch_list<A: YouTubeApi>(api: &A, spec: RequestSpec) -> Result<ListEnvelope, ApiError> {
    let endpoint = spec.endpoint.clone();
    let value = api.call(spec).await?;
    ListEnvelope::from_value(value).map_err(|detail| ApiError::Decode { endpoint, detail })
}
