use crate::prelude::*;
use clap::Parser;
use ytmcp_core::quota::EstimationPolicy;

mod config;
mod error;
mod mcp;
mod prelude;
mod youtube;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Quota-guarded YouTube Data API v3 tools, as a CLI and as an MCP server"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Quota units that may be consumed per budgeting period
    #[clap(
        long,
        env = "YTMCP_QUOTA_CEILING",
        global = true,
        default_value_t = ytmcp_core::quota::DEFAULT_DAILY_CEILING
    )]
    quota_ceiling: u64,

    /// How the budgeting period is keyed
    #[clap(
        long,
        env = "YTMCP_QUOTA_PERIOD",
        global = true,
        value_enum,
        default_value = "daily"
    )]
    quota_period: config::PeriodMode,

    /// Timeout for a single HTTP attempt, in seconds
    #[clap(long, env = "YTMCP_HTTP_TIMEOUT_SECS", global = true, default_value = "10")]
    http_timeout_secs: u64,

    /// Attempts per upstream call, including the first
    #[clap(long, env = "YTMCP_MAX_ATTEMPTS", global = true, default_value = "4")]
    max_attempts: u32,

    /// Deadline for a whole upstream call including retries, in seconds
    #[clap(long, env = "YTMCP_CALL_DEADLINE_SECS", global = true, default_value = "60")]
    call_deadline_secs: u64,

    /// Quota estimation policy: page_rounded or per_request
    #[clap(
        long,
        env = "YTMCP_ESTIMATION_POLICY",
        global = true,
        default_value = "page_rounded",
        value_parser = parse_estimation_policy
    )]
    estimation_policy: EstimationPolicy,

    /// Whether to display additional information.
    #[clap(long, env = "YTMCP_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

fn parse_estimation_policy(value: &str) -> Result<EstimationPolicy, String> {
    value.parse()
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// YouTube Data API operations
    YT(crate::youtube::App),

    /// Model Context Protocol server
    MCP(crate::mcp::App),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::YT(sub_app) => crate::youtube::run(sub_app, app.global).await,
        SubCommands::MCP(sub_app) => crate::mcp::run(sub_app, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimation_policy_parsed_by_clap() {
        let app = App::try_parse_from([
            "ytmcp",
            "yt",
            "quota",
            "--estimation-policy",
            "per_request",
        ])
        .unwrap();
        assert_eq!(app.global.estimation_policy, EstimationPolicy::PerRequest);

        let err = App::try_parse_from(["ytmcp", "yt", "quota", "--estimation-policy", "exact"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        assert!(err.to_string().contains("page_rounded or per_request"));
    }
}
