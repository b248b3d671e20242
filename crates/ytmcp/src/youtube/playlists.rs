use crate::prelude::{println, *};
use colored::Colorize;
use serde_json::Value;
use ytmcp_core::allowlist::{PLAYLISTS, PLAYLIST_ITEMS};
use ytmcp_core::error::ToolError;
use ytmcp_core::pagination::ListingPage;
use ytmcp_core::quota::{estimate_reads, QuotaError, PAGE_SIZE};
use ytmcp_core::request::RequestSpec;
use ytmcp_core::youtube::classify::filter_videos;
use ytmcp_core::youtube::extract::playlist_video_ids;
use ytmcp_core::youtube::PartsLevel;

use super::{fetch_list, hydrate_videos, require_channel_id, YouTubeApi};

pub const DEFAULT_MAX_ITEMS: usize = 50;

#[derive(Debug, clap::Args, Clone)]
pub struct PlaylistsOptions {
    /// @handle, channel URL, /user/ URL or UC... channel id
    #[arg(value_name = "CHANNEL")]
    pub channel_ref: String,

    /// Page token from a previous response
    #[arg(long)]
    pub page_token: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct PlaylistVideosOptions {
    /// Playlist id (PL..., UU..., ...)
    #[arg(value_name = "PLAYLIST_ID")]
    pub playlist_id: String,

    /// Maximum number of items for this page
    #[arg(short, long, default_value_t = DEFAULT_MAX_ITEMS)]
    pub max_items: usize,

    /// Page token from a previous response
    #[arg(long)]
    pub page_token: Option<String>,

    /// Include Shorts (60 seconds or less)
    #[arg(long)]
    pub include_shorts: bool,

    /// Include live and upcoming broadcasts
    #[arg(long)]
    pub include_live: bool,

    /// basic or full
    #[arg(long, default_value = "basic")]
    pub parts_level: PartsLevel,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(options: PlaylistsOptions, context: &super::Context) -> Result<()> {
    let api = context.gateway()?;
    let page = list_channel_playlists_data(&api, &options.channel_ref, options.page_token).await?;

    if options.json {
        super::output_page_json(page)
    } else {
        println!("{}", format_playlists_text(&page));
        Ok(())
    }
}

pub async fn run_playlist(options: PlaylistVideosOptions, context: &super::Context) -> Result<()> {
    let api = context.gateway()?;
    let page = list_playlist_videos_data(
        &api,
        &options.playlist_id,
        options.page_token,
        options.max_items,
        options.include_shorts,
        options.include_live,
        options.parts_level,
    )
    .await?;

    if options.json {
        super::output_page_json(page)
    } else {
        let title = format!("Playlist {}", options.playlist_id);
        println!("{}", super::format_videos_text(&title, &page));
        Ok(())
    }
}

/// One page of a channel's public playlists
pub async fn list_channel_playlists_data<A: YouTubeApi>(
    api: &A,
    channel_ref: &str,
    page_token: Option<String>,
) -> Result<ListingPage<Value>, ToolError> {
    let estimate = estimate_reads(1, true, api.estimation_policy());
    api.preflight(estimate.estimated_units)?;

    let resolved = require_channel_id(api, channel_ref, false).await?;

    let spec = RequestSpec::new(&PLAYLISTS)
        .part("snippet,contentDetails")
        .param("channelId", resolved.channel_id.unwrap_or_default())
        .param("maxResults", PAGE_SIZE)
        .page_token(page_token);
    let envelope = fetch_list(api, spec).await?;
    let next = envelope.next_token();

    Ok(ListingPage::new(envelope.items, next, estimate))
}

/// One page of a playlist's videos, hydrated and filtered
pub async fn list_playlist_videos_data<A: YouTubeApi>(
    api: &A,
    playlist_id: &str,
    page_token: Option<String>,
    max_items: usize,
    include_shorts: bool,
    include_live: bool,
    parts_level: PartsLevel,
) -> Result<ListingPage<Value>, ToolError> {
    let playlist_id = playlist_id.trim();
    if playlist_id.is_empty() {
        return Err(ToolError::invalid("playlist_id is required"));
    }
    if max_items == 0 {
        return Err(ToolError::invalid("max_items must be positive"));
    }

    // playlistItems.list plus one videos.list batch
    let estimate = estimate_reads(2, false, api.estimation_policy());
    let limit = api.tool_budget().max_quota_units;
    if estimate.estimated_units > limit {
        return Err(QuotaError::PlanExceedsBudget {
            estimated: estimate.estimated_units,
            limit,
        }
        .into());
    }
    api.preflight(estimate.estimated_units)?;

    let spec = RequestSpec::new(&PLAYLIST_ITEMS)
        .part("snippet,contentDetails")
        .param("playlistId", playlist_id)
        .param("maxResults", max_items.min(PAGE_SIZE))
        .page_token(page_token);
    let envelope = fetch_list(api, spec).await?;

    let ids = playlist_video_ids(&envelope.items, Some(max_items));
    let videos = filter_videos(
        hydrate_videos(api, &ids, parts_level).await?,
        include_shorts,
        include_live,
    );

    Ok(ListingPage::new(videos, envelope.next_token(), estimate))
}

fn format_playlists_text(page: &ListingPage<Value>) -> String {
    let mut result = String::new();

    result.push_str(&format!("\n{}\n", "=".repeat(80).bright_cyan()));
    result.push_str(&format!("{}\n", "PLAYLISTS".bright_cyan().bold()));
    result.push_str(&format!("{}\n", "=".repeat(80).bright_cyan()));

    for (idx, playlist) in page.items.iter().enumerate() {
        let id = playlist.get("id").and_then(Value::as_str).unwrap_or_default();
        let title = playlist
            .pointer("/snippet/title")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let count = playlist
            .pointer("/contentDetails/itemCount")
            .and_then(Value::as_u64)
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());

        result.push_str(&format!(
            "\n{} {}\n",
            format!("[{}]", idx + 1).yellow().bold(),
            title.white().bold()
        ));
        result.push_str(&format!(
            "    {}: {} | {}: {}\n",
            "ID".green(),
            id.bright_white(),
            "Videos".green(),
            count.bright_yellow()
        ));
    }

    result.push_str(&super::format_page_footer(page));
    result
}
