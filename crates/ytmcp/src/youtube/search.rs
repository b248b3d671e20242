use crate::prelude::{println, *};
use serde_json::Value;
use ytmcp_core::allowlist::SEARCH;
use ytmcp_core::error::ToolError;
use ytmcp_core::pagination::{AppliedOrder, ListingPage};
use ytmcp_core::quota::{estimate_channel_videos, OrderStrategy, PAGE_SIZE};
use ytmcp_core::request::RequestSpec;
use ytmcp_core::youtube::classify::filter_videos;
use ytmcp_core::youtube::extract::search_video_ids;
use ytmcp_core::youtube::{PartsLevel, SearchOrder};

use super::{fetch_list, hydrate_videos, require_channel_id, YouTubeApi};

/// Default page size of a keyword search
pub const DEFAULT_SEARCH_MAX_VIDEOS: usize = 50;

#[derive(Debug, clap::Args, Clone)]
pub struct SearchOptions {
    /// @handle, channel URL, /user/ URL or UC... channel id
    #[arg(value_name = "CHANNEL")]
    pub channel_ref: String,

    /// Keywords to search for
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Maximum number of videos for this call
    #[arg(short, long, default_value_t = DEFAULT_SEARCH_MAX_VIDEOS)]
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

    /// relevance, date, viewCount, rating or title
    #[arg(long, default_value = "relevance")]
    pub order: SearchOrder,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSearchParams {
    pub channel_ref: String,
    pub query: String,
    pub max_videos: usize,
    pub page_token: Option<String>,
    pub include_shorts: bool,
    pub include_live: bool,
    pub parts_level: PartsLevel,
    pub order: SearchOrder,
}

impl From<SearchOptions> for ChannelSearchParams {
    fn from(options: SearchOptions) -> Self {
        Self {
            channel_ref: options.channel_ref,
            query: options.query,
            max_videos: options.max_videos,
            page_token: options.page_token,
            include_shorts: options.include_shorts,
            include_live: options.include_live,
            parts_level: options.parts_level,
            order: options.order,
        }
    }
}

pub async fn run(options: SearchOptions, context: &super::Context) -> Result<()> {
    let json = options.json;
    let title = format!("Search: {}", options.query);
    let api = context.gateway()?;
    let page = search_channel_videos_data(&api, options.into()).await?;

    if json {
        super::output_page_json(page)
    } else {
        println!("{}", super::format_videos_text(&title, &page));
        Ok(())
    }
}

/// Keyword search within one channel, hydrated through `videos.list`
///
/// Every page costs a `search.list` call (100 units).
pub async fn search_channel_videos_data<A: YouTubeApi>(
    api: &A,
    params: ChannelSearchParams,
) -> Result<ListingPage<Value>, ToolError> {
    let query = params.query.trim();
    if query.is_empty() {
        return Err(ToolError::invalid("query is required"));
    }
    if params.max_videos == 0 {
        return Err(ToolError::invalid("max_videos must be positive"));
    }

    let budget = api.tool_budget();
    let estimate = estimate_channel_videos(
        OrderStrategy::SearchApi,
        params.max_videos,
        &budget,
        true,
        api.estimation_policy(),
    )?;
    api.preflight(estimate.estimated_units)?;

    let applied = params.max_videos.min(budget.max_videos);
    let resolved = require_channel_id(api, &params.channel_ref, false).await?;

    let spec = RequestSpec::new(&SEARCH)
        .part("snippet")
        .param("channelId", resolved.channel_id.clone().unwrap_or_default())
        .param("type", "video")
        .param("q", query)
        .param("order", params.order.as_str())
        .param("maxResults", applied.min(PAGE_SIZE))
        .page_token(params.page_token);
    let envelope = fetch_list(api, spec).await?;

    let ids = search_video_ids(&envelope.items, applied);
    let videos = filter_videos(
        hydrate_videos(api, &ids, params.parts_level).await?,
        params.include_shorts,
        params.include_live,
    );

    let mut page = ListingPage::new(videos, envelope.next_token(), estimate);
    page.truncated = Some(params.max_videos > budget.max_videos);
    page.applied_max_videos = Some(applied);
    page.applied_order = Some(AppliedOrder {
        strategy: OrderStrategy::SearchApi,
        by: params.order.as_str().to_string(),
    });
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube::gateway::testing::FakeApi;
    use serde_json::json;
    use ytmcp_core::request::QueryValue;

    fn params(query: &str) -> ChannelSearchParams {
        ChannelSearchParams {
            channel_ref: "UC_x5XG1OV2P6uZZ5FSM9Ttw".to_string(),
            query: query.to_string(),
            max_videos: DEFAULT_SEARCH_MAX_VIDEOS,
            page_token: None,
            include_shorts: false,
            include_live: false,
            parts_level: PartsLevel::Basic,
            order: SearchOrder::Relevance,
        }
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected_without_calls() {
        let api = FakeApi::ok(vec![]);
        let err = search_channel_videos_data(&api, params("  ")).await.unwrap_err();
        assert_eq!(err.reason(), "invalid_argument");
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_search_hydrates_and_filters_live() {
        let api = FakeApi::ok(vec![
            json!({"items": [{"id": "UC_x5XG1OV2P6uZZ5FSM9Ttw"}]}),
            json!({
                "items": [{"id": {"videoId": "a"}}, {"id": {"videoId": "b"}}, {"id": {"channelId": "UCz"}}],
                "nextPageToken": "S2"
            }),
            json!({"items": [
                {"id": "a", "snippet": {"liveBroadcastContent": "none"}, "contentDetails": {"duration": "PT4M"}},
                {"id": "b", "snippet": {"liveBroadcastContent": "upcoming"}, "contentDetails": {"duration": "PT0S"}}
            ]}),
        ]);

        let mut p = params(" rust async ");
        p.page_token = Some("S1".to_string());
        let page = search_channel_videos_data(&api, p).await.unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0]["id"], "a");
        assert_eq!(page.next_page_token.as_deref(), Some("S2"));
        assert_eq!(page.quota_estimate.estimated_units, 101);
        assert_eq!(page.applied_order.as_ref().unwrap().by, "relevance");

        let calls = api.calls();
        assert_eq!(calls[1].endpoint, "search");
        assert_eq!(calls[1].params.get("q"), Some(&QueryValue::from("rust async")));
        assert_eq!(calls[1].params.get("type"), Some(&QueryValue::from("video")));
        assert_eq!(calls[1].page_token.as_deref(), Some("S1"));
        assert_eq!(
            calls[2].params.get("id"),
            Some(&QueryValue::from("a,b"))
        );
    }

    #[tokio::test]
    async fn test_empty_search_page_skips_hydration() {
        let api = FakeApi::ok(vec![
            json!({"items": [{"id": "UC_x5XG1OV2P6uZZ5FSM9Ttw"}]}),
            json!({"items": []}),
        ]);
        let page = search_channel_videos_data(&api, params("nothing")).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.next_page_token, None);
        assert_eq!(api.endpoints(), vec!["channels", "search"]);
    }
}
