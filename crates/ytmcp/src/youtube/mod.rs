use crate::prelude::{println, *};
use std::sync::Arc;

use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use ytmcp_core::allowlist::VIDEOS;
use ytmcp_core::error::{ApiError, ToolError};
use ytmcp_core::pagination::{normalize_page, ListingPage};
use ytmcp_core::quota::VIDEOS_LIST_BATCH;
use ytmcp_core::request::RequestSpec;
use ytmcp_core::youtube::PartsLevel;

use crate::config::{ApiKey, Settings};

pub mod budget;
pub mod channel;
pub mod comments;
pub mod gateway;
pub mod playlists;
pub mod quota;
pub mod search;
pub mod transport;
pub mod video;
pub mod videos;

pub use budget::QuotaBudgeter;
pub use gateway::{fetch_list, Gateway, YouTubeApi};
pub use transport::{ReqwestSender, TokioClock, YouTubeClient};

#[derive(Debug, clap::Parser)]
#[command(name = "yt")]
#[command(about = "YouTube Data API v3 operations (public data, API key auth)")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Resolve a channel reference (@handle, URL, id) to a channel id
    #[clap(name = "channel")]
    Channel(channel::ChannelOptions),

    /// List a channel's videos
    #[clap(name = "videos")]
    Videos(videos::VideosOptions),

    /// Search a channel's videos by keyword
    #[clap(name = "search")]
    Search(search::SearchOptions),

    /// List a channel's public playlists
    #[clap(name = "playlists")]
    Playlists(playlists::PlaylistsOptions),

    /// List the videos in a playlist
    #[clap(name = "playlist")]
    Playlist(playlists::PlaylistVideosOptions),

    /// List a video's comment threads
    #[clap(name = "comments")]
    Comments(comments::CommentsOptions),

    /// Show a single video
    #[clap(name = "video")]
    Video(video::VideoOptions),

    /// Show quota consumed by this process in the current period
    ///
    /// The ledger lives in memory, so a one-off CLI run always starts from
    /// zero. The `youtube_quota_status` tool of a running MCP server reports
    /// what that server has spent.
    #[clap(name = "quota")]
    Quota(quota::QuotaOptions),
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let context = Context::from_global(&global)?;

    if global.verbose {
        println!(
            "Quota ceiling: {} ({:?} period)",
            context.settings().quota_ceiling,
            context.settings().period_mode
        );
        println!();
    }

    match app.command {
        Commands::Channel(options) => channel::run(options, &context).await,
        Commands::Videos(options) => videos::run(options, &context).await,
        Commands::Search(options) => search::run(options, &context).await,
        Commands::Playlists(options) => playlists::run(options, &context).await,
        Commands::Playlist(options) => playlists::run_playlist(options, &context).await,
        Commands::Comments(options) => comments::run(options, &context).await,
        Commands::Video(options) => video::run(options, &context).await,
        Commands::Quota(options) => quota::run(options, &context),
    }
}

/// Shared state for YouTube operations: validated settings, the process-wide
/// quota budgeter and a pooled HTTP sender.
///
/// The credential is read on every [`Context::gateway`] call so a missing key
/// fails the call that needs it, not the process.
#[derive(Debug, Clone)]
pub struct Context {
    settings: Settings,
    budgeter: Arc<QuotaBudgeter>,
    sender: ReqwestSender,
}

impl Context {
    pub fn from_global(global: &crate::Global) -> std::result::Result<Self, Error> {
        let settings = Settings::from_global(global)?;
        Ok(Self {
            budgeter: Arc::new(QuotaBudgeter::new(
                settings.quota_ceiling,
                settings.period_mode,
            )),
            sender: ReqwestSender::new()?,
            settings,
        })
    }

    pub fn gateway(&self) -> std::result::Result<Gateway<ReqwestSender, TokioClock>, Error> {
        let api_key = ApiKey::from_env()?;
        let client = YouTubeClient::new(
            self.sender.clone(),
            TokioClock,
            api_key,
            self.settings.client,
        );
        Ok(Gateway::new(
            client,
            Arc::clone(&self.budgeter),
            self.settings.tool_budget,
            self.settings.estimation_policy,
        ))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn budgeter(&self) -> &QuotaBudgeter {
        &self.budgeter
    }
}

/// Fetch full video resources for `ids`, in batches of 50, preserving order
pub async fn hydrate_videos<A: YouTubeApi>(
    api: &A,
    ids: &[String],
    parts: PartsLevel,
) -> std::result::Result<Vec<Value>, ApiError> {
    let mut videos = Vec::with_capacity(ids.len());
    for batch in ids.chunks(VIDEOS_LIST_BATCH) {
        let spec = RequestSpec::new(&VIDEOS)
            .part(parts.video_part())
            .param("id", batch.join(","));
        videos.extend(fetch_list(api, spec).await?.items);
    }
    Ok(videos)
}

/// Resolve a channel reference strictly and return its channel id
pub async fn require_channel_id<A: YouTubeApi>(
    api: &A,
    channel_ref: &str,
    include_uploads_playlist: bool,
) -> std::result::Result<ytmcp_core::youtube::ResolvedChannel, ToolError> {
    let resolved = channel::resolve_channel_data(
        api,
        channel_ref,
        ytmcp_core::youtube::ResolutionMode::Strict,
        include_uploads_playlist,
    )
    .await?;

    if resolved.channel_id.is_none() {
        return Err(ToolError::Resolution("Channel not found".to_string()));
    }
    Ok(resolved)
}

/// Print any serializable output as pretty JSON
pub fn output_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| eyre!("JSON serialization failed: {}", e))?;
    println!("{json}");
    Ok(())
}

/// Print a listing page, cursor included, as pretty JSON
pub fn output_page_json<T: Serialize>(page: ListingPage<T>) -> Result<()> {
    output_json(&normalize_page(page))
}

fn str_at<'a>(value: &'a Value, pointer: &str) -> &'a str {
    value.pointer(pointer).and_then(Value::as_str).unwrap_or("")
}

fn count_at(value: &Value, pointer: &str) -> String {
    match value.pointer(pointer) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "-".to_string(),
    }
}

/// One colored block per video resource
pub fn format_videos_text(title: &str, page: &ListingPage<Value>) -> String {
    let mut result = String::new();

    result.push_str(&format!("\n{}\n", "=".repeat(80).bright_cyan()));
    result.push_str(&format!("{}\n", title.to_uppercase().bright_cyan().bold()));
    result.push_str(&format!("{}\n", "=".repeat(80).bright_cyan()));

    if page.items.is_empty() {
        result.push_str(&format!("\n{}\n", "No videos on this page.".yellow()));
    }

    for (idx, video) in page.items.iter().enumerate() {
        let id = video
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default();
        result.push_str(&format!(
            "\n{} {}\n",
            format!("[{}]", idx + 1).yellow().bold(),
            str_at(video, "/snippet/title").white().bold()
        ));
        result.push_str(&format!(
            "    {}: {}\n",
            "URL".green(),
            format!("https://www.youtube.com/watch?v={id}").cyan().underline()
        ));
        result.push_str(&format!(
            "    {}: {} | {}: {} | {}: {} | {}: {}\n",
            "Published".green(),
            str_at(video, "/snippet/publishedAt").bright_black(),
            "Duration".green(),
            str_at(video, "/contentDetails/duration").bright_white(),
            "Views".green(),
            count_at(video, "/statistics/viewCount").bright_yellow(),
            "Likes".green(),
            count_at(video, "/statistics/likeCount").bright_magenta()
        ));
    }

    result.push_str(&format_page_footer(page));
    result
}

/// Quota estimate, warnings and the command hint for the next page
pub fn format_page_footer<T>(page: &ListingPage<T>) -> String {
    let mut result = String::new();

    result.push_str(&format!("\n{}\n", "=".repeat(80).bright_yellow()));
    result.push_str(&format!(
        "{}: {} {}",
        "Estimated quota".bright_white(),
        page.quota_estimate.estimated_units.to_string().bright_cyan().bold(),
        "units".bright_white()
    ));
    if page.truncated == Some(true) {
        result.push_str(&format!(" {}", "(truncated)".yellow()));
    }
    result.push('\n');

    for note in page.quota_estimate.notes.iter().chain(&page.warnings) {
        result.push_str(&format!("  {} {}\n", "!".yellow().bold(), note.yellow()));
    }

    match &page.next_page_token {
        Some(token) => result.push_str(&format!(
            "{}: {}\n",
            "Next page".green(),
            format!("--page-token {token}").cyan()
        )),
        None => result.push_str(&format!("{}\n", "No more pages.".bright_black())),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::gateway::testing::FakeApi;
    use super::*;
    use serde_json::json;
    use ytmcp_core::quota::QuotaEstimate;

    #[tokio::test]
    async fn test_hydrate_batches_by_fifty() {
        let ids: Vec<String> = (0..120).map(|i| format!("v{i:03}")).collect();
        let api = FakeApi::ok(vec![
            json!({"items": [{"id": "v000"}]}),
            json!({"items": [{"id": "v050"}]}),
            json!({"items": [{"id": "v100"}]}),
        ]);

        let videos = hydrate_videos(&api, &ids, PartsLevel::Basic).await.unwrap();
        assert_eq!(videos.len(), 3);

        let calls = api.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|c| c.endpoint == "videos"));
        let last_ids = calls[2].params.get("id").unwrap().to_string();
        assert_eq!(last_ids.split(',').count(), 20);
    }

    #[tokio::test]
    async fn test_hydrate_nothing_makes_no_call() {
        let api = FakeApi::ok(vec![]);
        assert!(hydrate_videos(&api, &[], PartsLevel::Full).await.unwrap().is_empty());
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_footer_shows_next_page_hint() {
        let page: ListingPage<Value> =
            ListingPage::new(vec![], Some("CAUQAA".to_string()), QuotaEstimate::units(2));
        let footer = format_page_footer(&page);
        assert!(footer.contains("CAUQAA"));

        let page: ListingPage<Value> = ListingPage::new(vec![], None, QuotaEstimate::units(2));
        assert!(format_page_footer(&page).contains("No more pages."));
    }
}
