//! Process-wide quota budgeter
//!
//! Wraps the [`QuotaLedger`] in a mutex so that check-and-reserve is a single
//! critical section: concurrent tool calls can never both pass a check that
//! only one of them fits in. The lock is never held across an await point.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use log::warn;
use ytmcp_core::quota::{
    daily_period_key, QuotaError, QuotaLedger, QuotaSnapshot, Reservation, SESSION_PERIOD,
};

use crate::config::PeriodMode;

#[derive(Debug, Clone, PartialEq, Eq)]
enum PeriodSource {
    Daily,
    Session,
    #[cfg(test)]
    Fixed(String),
}

#[derive(Debug)]
pub struct QuotaBudgeter {
    ledger: Mutex<QuotaLedger>,
    period: PeriodSource,
}

impl QuotaBudgeter {
    pub fn new(ceiling: u64, mode: PeriodMode) -> Self {
        let period = match mode {
            PeriodMode::Daily => PeriodSource::Daily,
            PeriodMode::Session => PeriodSource::Session,
        };
        Self {
            ledger: Mutex::new(QuotaLedger::new(ceiling)),
            period,
        }
    }

    /// Budgeter over an existing ledger with a caller-chosen period key
    #[cfg(test)]
    pub fn fixed(ledger: QuotaLedger, period: &str) -> Self {
        Self {
            ledger: Mutex::new(ledger),
            period: PeriodSource::Fixed(period.to_string()),
        }
    }

    fn period_key(&self) -> String {
        match &self.period {
            PeriodSource::Daily => daily_period_key(Utc::now()),
            PeriodSource::Session => SESSION_PERIOD.to_string(),
            #[cfg(test)]
            PeriodSource::Fixed(key) => key.clone(),
        }
    }

    // A panic while holding the lock cannot leave the ledger half-updated.
    fn ledger(&self) -> MutexGuard<'_, QuotaLedger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reserve `units` for one call to `endpoint`, or reject without charging
    pub fn check_and_reserve(&self, endpoint: &str, units: u64) -> Result<Reservation, QuotaError> {
        let period = self.period_key();
        let result = self.ledger().check_and_reserve(&period, endpoint, units);
        if let Err(err) = &result {
            warn!("Quota reservation rejected: {err}");
        }
        result
    }

    /// Reject a multi-call plan up front when its estimate cannot fit
    pub fn ensure_available(&self, units: u64) -> Result<(), QuotaError> {
        let period = self.period_key();
        let result = self.ledger().ensure_available(&period, units);
        if let Err(err) = &result {
            warn!("Quota plan rejected: {err}");
        }
        result
    }

    /// Refine a reservation once the real cost is known; `None` keeps the estimate
    pub fn record_actual(&self, reservation: &Reservation, actual: Option<u64>) {
        self.ledger().record_actual(reservation, actual);
    }

    pub fn snapshot(&self) -> QuotaSnapshot {
        let period = self.period_key();
        self.ledger().snapshot(&period)
    }
}
