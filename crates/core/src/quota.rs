//! Quota ledger and per-tool quota estimation
//!
//! The ledger is a best-effort estimator for abuse prevention, not a billing
//! record. It charges the estimated cost of a call before the call is made and
//! rejects any reservation that would push the period total past the ceiling.
//! It holds no lock of its own; the shell wraps it in a mutex so that every
//! check-and-reserve is a single critical section.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::allowlist::{QUOTA_COST_READ, QUOTA_COST_SEARCH};

/// Commonly documented default daily allowance of the upstream API
pub const DEFAULT_DAILY_CEILING: u64 = 10_000;

pub const DEFAULT_MAX_VIDEOS: usize = 200;
pub const DEFAULT_MAX_PAGES: usize = 10;
pub const DEFAULT_MAX_QUOTA_UNITS: u64 = 1_000;

/// Items per upstream list page (`maxResults` upper bound)
pub const PAGE_SIZE: usize = 50;

/// Ids per `videos.list` hydration call
pub const VIDEOS_LIST_BATCH: usize = 50;

/// The upstream caps channel-scoped video search at this many results
pub const SEARCH_RESULT_CAP: usize = 500;

/// Period key used when the ledger never rolls over
pub const SESSION_PERIOD: &str = "session";

/// Offset of the upstream's quota reset timezone, DST ignored
const RESET_OFFSET_SECS: i32 = -8 * 3600;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuotaError {
    #[error(
        "Quota ceiling reached: {endpoint} needs {requested} units but only {remaining} of {ceiling} remain for period {period}"
    )]
    CeilingExceeded {
        endpoint: String,
        requested: u64,
        remaining: u64,
        ceiling: u64,
        period: String,
    },

    #[error("Estimated quota {estimated} exceeds the per-call limit of {limit} units")]
    PlanExceedsBudget { estimated: u64, limit: u64 },
}

/// Units charged for one approved call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub endpoint: String,
    pub units: u64,
    pub period: String,
}

/// Serializable view of the ledger for status reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaSnapshot {
    pub ceiling: u64,
    pub consumed: u64,
    pub remaining: u64,
    pub period: Option<String>,
    pub per_endpoint: BTreeMap<String, u64>,
}

/// Running total of consumed units for the current budgeting period
#[derive(Debug, Clone)]
pub struct QuotaLedger {
    ceiling: u64,
    period: Option<String>,
    consumed: u64,
    per_endpoint: BTreeMap<String, u64>,
}

impl Default for QuotaLedger {
    fn default() -> Self {
        Self::new(DEFAULT_DAILY_CEILING)
    }
}

impl QuotaLedger {
    pub fn new(ceiling: u64) -> Self {
        Self {
            ceiling,
            period: None,
            consumed: 0,
            per_endpoint: BTreeMap::new(),
        }
    }

    /// Start the ledger at a known consumption level for `period`
    pub fn with_consumed(ceiling: u64, period: &str, consumed: u64) -> Self {
        Self {
            ceiling,
            period: Some(period.to_string()),
            consumed: consumed.min(ceiling),
            per_endpoint: BTreeMap::new(),
        }
    }

    fn roll_over(&mut self, period: &str) {
        if self.period.as_deref() != Some(period) {
            self.period = Some(period.to_string());
            self.consumed = 0;
            self.per_endpoint.clear();
        }
    }

    /// Approve and charge `units` for `endpoint`, or reject without charging
    ///
    /// A new `period` key resets the running total before the check.
    pub fn check_and_reserve(
        &mut self,
        period: &str,
        endpoint: &str,
        units: u64,
    ) -> Result<Reservation, QuotaError> {
        self.roll_over(period);

        let remaining = self.remaining();
        if units > remaining {
            return Err(QuotaError::CeilingExceeded {
                endpoint: endpoint.to_string(),
                requested: units,
                remaining,
                ceiling: self.ceiling,
                period: period.to_string(),
            });
        }

        self.consumed += units;
        *self.per_endpoint.entry(endpoint.to_string()).or_insert(0) += units;

        Ok(Reservation {
            endpoint: endpoint.to_string(),
            units,
            period: period.to_string(),
        })
    }

    /// Check that `units` would fit without charging anything
    pub fn ensure_available(&mut self, period: &str, units: u64) -> Result<(), QuotaError> {
        self.roll_over(period);
        let remaining = self.remaining();
        if units > remaining {
            return Err(QuotaError::CeilingExceeded {
                endpoint: "plan".to_string(),
                requested: units,
                remaining,
                ceiling: self.ceiling,
                period: period.to_string(),
            });
        }
        Ok(())
    }

    /// Replace a reservation's estimate with the actual cost, when known
    ///
    /// `None` keeps the estimate. Reservations from a past period are ignored,
    /// and the adjusted total never exceeds the ceiling.
    pub fn record_actual(&mut self, reservation: &Reservation, actual: Option<u64>) {
        let Some(actual) = actual else {
            return;
        };
        if self.period.as_deref() != Some(reservation.period.as_str()) {
            return;
        }

        self.consumed = self
            .consumed
            .saturating_sub(reservation.units)
            .saturating_add(actual)
            .min(self.ceiling);

        let entry = self
            .per_endpoint
            .entry(reservation.endpoint.clone())
            .or_insert(0);
        *entry = entry.saturating_sub(reservation.units).saturating_add(actual);
    }

    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }

    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn remaining(&self) -> u64 {
        self.ceiling.saturating_sub(self.consumed)
    }

    pub fn snapshot(&mut self, period: &str) -> QuotaSnapshot {
        self.roll_over(period);
        QuotaSnapshot {
            ceiling: self.ceiling,
            consumed: self.consumed,
            remaining: self.remaining(),
            period: self.period.clone(),
            per_endpoint: self.per_endpoint.clone(),
        }
    }
}

/// Daily period key: the calendar date at the upstream's reset offset
pub fn daily_period_key(now: DateTime<Utc>) -> String {
    match FixedOffset::east_opt(RESET_OFFSET_SECS) {
        Some(offset) => now.with_timezone(&offset).format("%Y-%m-%d").to_string(),
        None => now.format("%Y-%m-%d").to_string(),
    }
}

/// Limits applied to a single tool invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolBudget {
    pub max_videos: usize,
    pub max_pages: usize,
    pub max_quota_units: u64,
}

impl Default for ToolBudget {
    fn default() -> Self {
        Self {
            max_videos: DEFAULT_MAX_VIDEOS,
            max_pages: DEFAULT_MAX_PAGES,
            max_quota_units: DEFAULT_MAX_QUOTA_UNITS,
        }
    }
}

/// How a listing plan is priced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EstimationPolicy {
    /// Pages rounded up to whole upstream pages
    #[default]
    PageRounded,
    /// Every underlying request, including channel resolution
    PerRequest,
}

impl std::str::FromStr for EstimationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "page_rounded" => Ok(EstimationPolicy::PageRounded),
            "per_request" => Ok(EstimationPolicy::PerRequest),
            other => Err(format!(
                "Unknown estimation policy: {other} (expected page_rounded or per_request)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStrategy {
    UploadsPlaylist,
    LocalSort,
    SearchApi,
}

impl OrderStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStrategy::UploadsPlaylist => "uploads_playlist",
            OrderStrategy::LocalSort => "local_sort",
            OrderStrategy::SearchApi => "search_api",
        }
    }
}

impl std::str::FromStr for OrderStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploads_playlist" => Ok(OrderStrategy::UploadsPlaylist),
            "local_sort" => Ok(OrderStrategy::LocalSort),
            "search_api" => Ok(OrderStrategy::SearchApi),
            other => Err(format!(
                "Unknown strategy: {other} (expected uploads_playlist, local_sort or search_api)"
            )),
        }
    }
}

/// Estimated upper bound on the quota a tool invocation will consume
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaEstimate {
    pub estimated_units: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<OrderStrategy>,
    pub notes: Vec<String>,
}

impl QuotaEstimate {
    pub fn units(estimated_units: u64) -> Self {
        Self {
            estimated_units,
            strategy: None,
            notes: Vec::new(),
        }
    }
}

fn pages_for(items: usize) -> usize {
    items.div_ceil(PAGE_SIZE)
}

/// Estimate, and enforce against `budget`, the cost of listing channel videos
pub fn estimate_channel_videos(
    strategy: OrderStrategy,
    requested_max_videos: usize,
    budget: &ToolBudget,
    include_video_details: bool,
    policy: EstimationPolicy,
) -> Result<QuotaEstimate, QuotaError> {
    let mut notes = Vec::new();

    let max_videos = requested_max_videos.min(budget.max_videos);
    if requested_max_videos > budget.max_videos {
        notes.push("requested max_videos truncated to budget max_videos".to_string());
    }

    let (videos, page_cost) = match strategy {
        OrderStrategy::UploadsPlaylist | OrderStrategy::LocalSort => (max_videos, QUOTA_COST_READ),
        OrderStrategy::SearchApi => {
            let capped = max_videos.min(SEARCH_RESULT_CAP);
            if capped < max_videos {
                notes.push("search_api is capped to 500 videos by API behavior".to_string());
            }
            (capped, QUOTA_COST_SEARCH)
        }
    };

    let pages = pages_for(videos).min(budget.max_pages);
    if pages < pages_for(videos) {
        notes.push("pages truncated to budget max_pages".to_string());
    }

    let mut units = pages as u64 * page_cost;
    if include_video_details {
        units += videos.div_ceil(VIDEOS_LIST_BATCH) as u64 * QUOTA_COST_READ;
    }
    if policy == EstimationPolicy::PerRequest {
        // channels.list lookup that precedes every channel listing
        units += QUOTA_COST_READ;
    }

    if units > budget.max_quota_units {
        return Err(QuotaError::PlanExceedsBudget {
            estimated: units,
            limit: budget.max_quota_units,
        });
    }

    Ok(QuotaEstimate {
        estimated_units: units,
        strategy: Some(strategy),
        notes,
    })
}

/// Estimate for a listing that makes `reads` one-unit calls per page
///
/// `resolves_channel` marks operations that look the channel up first; that
/// lookup is only charged under [`EstimationPolicy::PerRequest`].
pub fn estimate_reads(reads: u64, resolves_channel: bool, policy: EstimationPolicy) -> QuotaEstimate {
    let mut units = reads * QUOTA_COST_READ;
    if resolves_channel && policy == EstimationPolicy::PerRequest {
        units += QUOTA_COST_READ;
    }
    QuotaEstimate::units(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const DAY: &str = "2026-10-19";

    #[test]
    fn test_rejects_over_ceiling_without_charging() {
        let mut ledger = QuotaLedger::with_consumed(1000, DAY, 950);

        let err = ledger.check_and_reserve(DAY, "search", 100).unwrap_err();
        assert!(matches!(
            err,
            QuotaError::CeilingExceeded {
                requested: 100,
                remaining: 50,
                ..
            }
        ));
        assert_eq!(ledger.consumed(), 950);

        let reservation = ledger.check_and_reserve(DAY, "videos", 40).unwrap();
        assert_eq!(reservation.units, 40);
        assert_eq!(ledger.consumed(), 990);
    }

    #[test]
    fn test_exact_fit_is_approved() {
        let mut ledger = QuotaLedger::with_consumed(100, DAY, 90);
        assert!(ledger.check_and_reserve(DAY, "videos", 10).is_ok());
        assert_eq!(ledger.remaining(), 0);
        assert!(ledger.check_and_reserve(DAY, "videos", 1).is_err());
    }

    #[test]
    fn test_period_rollover_resets_total() {
        let mut ledger = QuotaLedger::with_consumed(100, DAY, 100);
        assert!(ledger.check_and_reserve(DAY, "videos", 1).is_err());

        ledger.check_and_reserve("2026-10-20", "videos", 1).unwrap();
        assert_eq!(ledger.consumed(), 1);
        assert_eq!(ledger.snapshot("2026-10-20").per_endpoint["videos"], 1);
    }

    #[test]
    fn test_per_endpoint_tracking() {
        let mut ledger = QuotaLedger::new(10_000);
        ledger.check_and_reserve(DAY, "search", 100).unwrap();
        ledger.check_and_reserve(DAY, "videos", 1).unwrap();
        ledger.check_and_reserve(DAY, "videos", 1).unwrap();

        let snap = ledger.snapshot(DAY);
        assert_eq!(snap.consumed, 102);
        assert_eq!(snap.remaining, 9_898);
        assert_eq!(snap.per_endpoint["search"], 100);
        assert_eq!(snap.per_endpoint["videos"], 2);
        assert_eq!(snap.period.as_deref(), Some(DAY));
    }

    #[test]
    fn test_record_actual_refines_estimate() {
        let mut ledger = QuotaLedger::new(1000);
        let r = ledger.check_and_reserve(DAY, "search", 100).unwrap();

        ledger.record_actual(&r, None);
        assert_eq!(ledger.consumed(), 100);

        ledger.record_actual(&r, Some(60));
        assert_eq!(ledger.consumed(), 60);
        assert_eq!(ledger.snapshot(DAY).per_endpoint["search"], 60);
    }

    #[test]
    fn test_record_actual_ignores_stale_period() {
        let mut ledger = QuotaLedger::new(1000);
        let r = ledger.check_and_reserve(DAY, "videos", 5).unwrap();
        ledger.check_and_reserve("2026-10-20", "videos", 3).unwrap();

        ledger.record_actual(&r, Some(0));
        assert_eq!(ledger.consumed(), 3);
    }

    #[test]
    fn test_record_actual_never_exceeds_ceiling() {
        let mut ledger = QuotaLedger::new(100);
        let r = ledger.check_and_reserve(DAY, "videos", 90).unwrap();
        ledger.record_actual(&r, Some(500));
        assert_eq!(ledger.consumed(), 100);
    }

    #[test]
    fn test_ensure_available_does_not_charge() {
        let mut ledger = QuotaLedger::with_consumed(1000, DAY, 950);
        assert!(ledger.ensure_available(DAY, 50).is_ok());
        assert!(ledger.ensure_available(DAY, 51).is_err());
        assert_eq!(ledger.consumed(), 950);
    }

    #[test]
    fn test_daily_period_key_uses_reset_offset() {
        // 05:00 UTC is still the previous day at UTC-8
        let early = Utc.with_ymd_and_hms(2026, 10, 19, 5, 0, 0).unwrap();
        assert_eq!(daily_period_key(early), "2026-10-18");

        let late = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
        assert_eq!(daily_period_key(late), "2026-10-19");
    }

    #[test]
    fn test_estimate_uploads_playlist() {
        let est = estimate_channel_videos(
            OrderStrategy::UploadsPlaylist,
            120,
            &ToolBudget::default(),
            true,
            EstimationPolicy::PageRounded,
        )
        .unwrap();
        // 3 playlistItems pages + 3 videos batches
        assert_eq!(est.estimated_units, 6);
        assert_eq!(est.strategy, Some(OrderStrategy::UploadsPlaylist));
        assert!(est.notes.is_empty());
    }

    #[test]
    fn test_estimate_per_request_adds_resolution_call() {
        let rounded = estimate_channel_videos(
            OrderStrategy::LocalSort,
            50,
            &ToolBudget::default(),
            true,
            EstimationPolicy::PageRounded,
        )
        .unwrap();
        let per_request = estimate_channel_videos(
            OrderStrategy::LocalSort,
            50,
            &ToolBudget::default(),
            true,
            EstimationPolicy::PerRequest,
        )
        .unwrap();
        assert_eq!(rounded.estimated_units, 2);
        assert_eq!(per_request.estimated_units, 3);
    }

    #[test]
    fn test_estimate_truncates_to_budget() {
        let est = estimate_channel_videos(
            OrderStrategy::UploadsPlaylist,
            5_000,
            &ToolBudget::default(),
            false,
            EstimationPolicy::PageRounded,
        )
        .unwrap();
        // 200 videos -> 4 pages
        assert_eq!(est.estimated_units, 4);
        assert_eq!(est.notes.len(), 1);
    }

    #[test]
    fn test_estimate_search_is_expensive() {
        let est = estimate_channel_videos(
            OrderStrategy::SearchApi,
            50,
            &ToolBudget::default(),
            true,
            EstimationPolicy::PageRounded,
        )
        .unwrap();
        assert_eq!(est.estimated_units, 101);
    }

    #[test]
    fn test_estimate_search_over_budget_rejected() {
        let est = estimate_channel_videos(
            OrderStrategy::SearchApi,
            200,
            &ToolBudget::default(),
            true,
            EstimationPolicy::PageRounded,
        )
        .unwrap();
        // 4 search pages + 4 hydration batches
        assert_eq!(est.estimated_units, 404);

        let budget = ToolBudget {
            max_videos: 1_000,
            max_pages: 20,
            max_quota_units: 999,
        };
        let err = estimate_channel_videos(
            OrderStrategy::SearchApi,
            1_000,
            &budget,
            false,
            EstimationPolicy::PageRounded,
        )
        .unwrap_err();
        // capped at 500 results -> 10 pages
        assert_eq!(
            err,
            QuotaError::PlanExceedsBudget {
                estimated: 1_000,
                limit: 999,
            }
        );
    }

    #[test]
    fn test_estimate_reads() {
        assert_eq!(
            estimate_reads(2, true, EstimationPolicy::PageRounded).estimated_units,
            2
        );
        assert_eq!(
            estimate_reads(2, true, EstimationPolicy::PerRequest).estimated_units,
            3
        );
        assert_eq!(
            estimate_reads(1, false, EstimationPolicy::PerRequest).estimated_units,
            1
        );
    }

    #[test]
    fn test_parse_strategy_and_policy() {
        assert_eq!(
            "local_sort".parse::<OrderStrategy>().unwrap(),
            OrderStrategy::LocalSort
        );
        assert!("fastest".parse::<OrderStrategy>().is_err());
        assert_eq!(
            "per_request".parse::<EstimationPolicy>().unwrap(),
            EstimationPolicy::PerRequest
        );
    }
}
