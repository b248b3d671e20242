use crate::prelude::{println, *};
use serde_json::Value;
use ytmcp_core::allowlist::{PLAYLIST_ITEMS, SEARCH};
use ytmcp_core::error::ToolError;
use ytmcp_core::pagination::{AppliedOrder, ListingPage};
use ytmcp_core::quota::{estimate_channel_videos, OrderStrategy, DEFAULT_MAX_VIDEOS, PAGE_SIZE};
use ytmcp_core::request::RequestSpec;
use ytmcp_core::youtube::classify::{filter_videos, sort_videos};
use ytmcp_core::youtube::extract::{playlist_video_ids, search_video_ids};
use ytmcp_core::youtube::{PartsLevel, VideoOrderBy};

use super::{fetch_list, hydrate_videos, require_channel_id, YouTubeApi};

#[derive(Debug, clap::Args, Clone)]
pub struct VideosOptions {
    /// @handle, channel URL, /user/ URL or UC... channel id
    #[arg(value_name = "CHANNEL")]
    pub channel_ref: String,

    /// Maximum number of videos for this call
    #[arg(short, long, default_value_t = DEFAULT_MAX_VIDEOS)]
    pub max_videos: usize,

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

    /// uploads_playlist, local_sort or search_api
    #[arg(long, default_value = "uploads_playlist")]
    pub order_strategy: OrderStrategy,

    /// date, viewCount, likeCount, commentCount or duration
    #[arg(long, default_value = "date")]
    pub order_by: VideoOrderBy,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Inputs of a channel video listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelVideosParams {
    pub channel_ref: String,
    pub max_videos: usize,
    pub page_token: Option<String>,
    pub include_shorts: bool,
    pub include_live: bool,
    pub parts_level: PartsLevel,
    pub order_strategy: OrderStrategy,
    pub order_by: VideoOrderBy,
}

impl From<VideosOptions> for ChannelVideosParams {
    fn from(options: VideosOptions) -> Self {
        Self {
            channel_ref: options.channel_ref,
            max_videos: options.max_videos,
            page_token: options.page_token,
            include_shorts: options.include_shorts,
            include_live: options.include_live,
            parts_level: options.parts_level,
            order_strategy: options.order_strategy,
            order_by: options.order_by,
        }
    }
}

pub async fn run(options: VideosOptions, context: &super::Context) -> Result<()> {
    let json = options.json;
    let api = context.gateway()?;
    let page = list_channel_videos_data(&api, options.into()).await?;

    if json {
        super::output_page_json(page)
    } else {
        println!("{}", super::format_videos_text("Channel videos", &page));
        Ok(())
    }
}

/// List one page of a channel's videos
///
/// - `uploads_playlist` walks the uploads playlist page by page (1 unit per
///   page plus hydration).
/// - `local_sort` fetches up to `max_pages` playlist pages, sorts locally and
///   is not paginated.
/// - `search_api` lets the search endpoint order results (100 units per page,
///   `date` or `viewCount` only).
pub async fn list_channel_videos_data<A: YouTubeApi>(
    api: &A,
    params: ChannelVideosParams,
) -> Result<ListingPage<Value>, ToolError> {
    if params.max_videos == 0 {
        return Err(ToolError::invalid("max_videos must be positive"));
    }
    if params.order_strategy == OrderStrategy::LocalSort && params.page_token.is_some() {
        return Err(ToolError::invalid("page_token is not supported for local_sort"));
    }
    if params.order_strategy == OrderStrategy::SearchApi
        && !matches!(params.order_by, VideoOrderBy::Date | VideoOrderBy::ViewCount)
    {
        return Err(ToolError::invalid(
            "search_api supports only order_by in {date, viewCount}",
        ));
    }

    let budget = api.tool_budget();
    let estimate = estimate_channel_videos(
        params.order_strategy,
        params.max_videos,
        &budget,
        true,
        api.estimation_policy(),
    )?;
    api.preflight(estimate.estimated_units)?;

    let applied = params.max_videos.min(budget.max_videos);
    let capped = params.max_videos > budget.max_videos;

    let resolved = require_channel_id(
        api,
        &params.channel_ref,
        params.order_strategy != OrderStrategy::SearchApi,
    )
    .await?;

    let (ids, next_page_token, truncated) = match params.order_strategy {
        OrderStrategy::UploadsPlaylist => {
            let uploads = uploads_playlist(&resolved)?;
            let spec = RequestSpec::new(&PLAYLIST_ITEMS)
                .part("snippet,contentDetails")
                .param("playlistId", uploads)
                .param("maxResults", applied.min(PAGE_SIZE))
                .page_token(params.page_token);
            let envelope = fetch_list(api, spec).await?;
            let next = envelope.next_token();
            (playlist_video_ids(&envelope.items, Some(applied)), next, capped)
        }
        OrderStrategy::LocalSort => {
            let uploads = uploads_playlist(&resolved)?;
            let (ids, more) = collect_uploads(api, uploads, applied, budget.max_pages).await?;
            (ids, None, capped || more)
        }
        OrderStrategy::SearchApi => {
            let channel_id = resolved.channel_id.clone().unwrap_or_default();
            let spec = RequestSpec::new(&SEARCH)
                .part("snippet")
                .param("channelId", channel_id)
                .param("type", "video")
                .param("order", params.order_by.as_str())
                .param("maxResults", applied.min(PAGE_SIZE))
                .page_token(params.page_token);
            let envelope = fetch_list(api, spec).await?;
            let next = envelope.next_token();
            (search_video_ids(&envelope.items, applied), next, capped)
        }
    };

    let mut videos = filter_videos(
        hydrate_videos(api, &ids, params.parts_level).await?,
        params.include_shorts,
        params.include_live,
    );
    if params.order_strategy == OrderStrategy::LocalSort {
        sort_videos(&mut videos, params.order_by);
    }

    let mut page = ListingPage::new(videos, next_page_token, estimate);
    page.truncated = Some(truncated);
    page.applied_max_videos = Some(applied);
    page.applied_order = Some(AppliedOrder {
        strategy: params.order_strategy,
        by: params.order_by.as_str().to_string(),
    });
    page.warnings = resolved.warnings;
    Ok(page)
}

fn uploads_playlist(resolved: &ytmcp_core::youtube::ResolvedChannel) -> Result<&str, ToolError> {
    resolved
        .uploads_playlist_id
        .as_deref()
        .ok_or_else(|| ToolError::Resolution("uploadsPlaylistId not available for this channel".to_string()))
}

/// Walk the uploads playlist until `limit` ids or `max_pages` pages
///
/// Returns the ids (at most `limit`) and whether more were left behind.
async fn collect_uploads<A: YouTubeApi>(
    api: &A,
    playlist_id: &str,
    limit: usize,
    max_pages: usize,
) -> Result<(Vec<String>, bool), ToolError> {
    let mut items = Vec::new();
    let mut token: Option<String> = None;
    let mut pages = 0;

    loop {
        let spec = RequestSpec::new(&PLAYLIST_ITEMS)
            .part("snippet,contentDetails")
            .param("playlistId", playlist_id)
            .param("maxResults", PAGE_SIZE)
            .page_token(token.take());
        let envelope = fetch_list(api, spec).await?;
        pages += 1;
        token = envelope.next_token();
        items.extend(envelope.items);

        let collected = playlist_video_ids(&items, None).len();
        if token.is_none() || collected >= limit || pages >= max_pages {
            break;
        }
    }

    let ids = playlist_video_ids(&items, None);
    let more = ids.len() > limit || token.is_some();
    Ok((ids.into_iter().take(limit).collect(), more))
}
