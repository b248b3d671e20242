use crate::prelude::{println, *};
use colored::Colorize;
use serde::Serialize;
use ytmcp_core::quota::QuotaSnapshot;

use crate::config::PeriodMode;

use super::QuotaBudgeter;

#[derive(Debug, clap::Args, Clone)]
pub struct QuotaOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Quota consumption of this process for the current period
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    #[serde(flatten)]
    pub snapshot: QuotaSnapshot,
    pub period_mode: PeriodMode,
}

pub fn run(options: QuotaOptions, context: &super::Context) -> Result<()> {
    let status = quota_status_data(context.budgeter(), context.settings().period_mode);

    if options.json {
        super::output_json(&status)
    } else {
        println!("{}", format_quota_text(&status));
        Ok(())
    }
}

/// Snapshot the budgeter; never calls the upstream
///
/// Only this process's spending is visible. Other processes sharing the same
/// API key are not counted.
pub fn quota_status_data(budgeter: &QuotaBudgeter, period_mode: PeriodMode) -> QuotaStatus {
    QuotaStatus {
        snapshot: budgeter.snapshot(),
        period_mode,
    }
}

fn format_quota_text(status: &QuotaStatus) -> String {
    let snapshot = &status.snapshot;
    let mut result = String::new();

    result.push_str(&format!(
        "{} {}\n",
        "Quota period".bright_cyan().bold(),
        snapshot.period.as_deref().unwrap_or("-").bright_white()
    ));
    result.push_str(&format!(
        "{}: {} / {} ({} remaining)\n",
        "Consumed".green(),
        snapshot.consumed.to_string().bright_yellow(),
        snapshot.ceiling,
        snapshot.remaining.to_string().bright_green()
    ));

    if !snapshot.per_endpoint.is_empty() {
        let mut table = new_table(["Endpoint", "Units"]);
        for (endpoint, units) in &snapshot.per_endpoint {
            table.add_row(prettytable::row![endpoint, units]);
        }
        result.push_str(&table.to_string());
    }

    result
}
