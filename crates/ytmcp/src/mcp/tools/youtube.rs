//! YouTube tools exposed over MCP
//!
//! Every paginated tool accepts its cursor as `page_token` or
//! `next_page_token` and returns it under both `nextPageToken` and
//! `next_page_token`. The API key is read from the environment only; no tool
//! takes it as an argument.

use serde::Deserialize;
use serde::Serialize;
use serde_json::{json, Value};
use ytmcp_core::error::ToolError;
use ytmcp_core::pagination::{normalize_page, ListingPage, PageTokenArgs};
use ytmcp_core::quota::{OrderStrategy, DEFAULT_MAX_VIDEOS};
use ytmcp_core::youtube::{
    CommentOrder, PartsLevel, ResolutionMode, SearchOrder, TextFormat, VideoOrderBy,
};

use super::{parse_arguments, to_call_result, tool_error, JsonRpcError, Tool};
use crate::youtube::comments::{self, CommentsParams, MAX_THREADS_PER_PAGE};
use crate::youtube::playlists::{self, DEFAULT_MAX_ITEMS};
use crate::youtube::search::{self, ChannelSearchParams, DEFAULT_SEARCH_MAX_VIDEOS};
use crate::youtube::videos::{self, ChannelVideosParams};
use crate::youtube::{channel, quota, video, Context, YouTubeApi};

pub const RESOLVE_CHANNEL: &str = "resolve_youtube_channel";
pub const CHANNEL_VIDEOS: &str = "list_youtube_channel_videos";
pub const SEARCH_CHANNEL_VIDEOS: &str = "search_youtube_channel_videos";
pub const CHANNEL_PLAYLISTS: &str = "list_youtube_channel_playlists";
pub const PLAYLIST_VIDEOS: &str = "list_youtube_playlist_videos";
pub const VIDEO_COMMENTS: &str = "list_youtube_video_comments";
pub const VIDEO_INFO: &str = "get_yt_video_info";
pub const QUOTA_STATUS: &str = "youtube_quota_status";

const API_TOOLS: [&str; 7] = [
    RESOLVE_CHANNEL,
    CHANNEL_VIDEOS,
    SEARCH_CHANNEL_VIDEOS,
    CHANNEL_PLAYLISTS,
    PLAYLIST_VIDEOS,
    VIDEO_COMMENTS,
    VIDEO_INFO,
];

/// True for tools that call the YouTube API and so need a credential
pub fn is_api_tool(name: &str) -> bool {
    API_TOOLS.contains(&name)
}

fn default_true() -> bool {
    true
}

fn default_max_videos() -> usize {
    DEFAULT_MAX_VIDEOS
}

fn default_search_max_videos() -> usize {
    DEFAULT_SEARCH_MAX_VIDEOS
}

fn default_max_items() -> usize {
    DEFAULT_MAX_ITEMS
}

fn default_max_threads() -> usize {
    MAX_THREADS_PER_PAGE
}

fn default_order_strategy() -> OrderStrategy {
    OrderStrategy::UploadsPlaylist
}

#[derive(Debug, Deserialize)]
struct ResolveChannelArgs {
    channel_ref: String,
    #[serde(default)]
    resolution_mode: ResolutionMode,
    #[serde(default = "default_true")]
    include_uploads_playlist: bool,
}

#[derive(Debug, Deserialize)]
struct ChannelVideosArgs {
    channel_ref: String,
    #[serde(default = "default_max_videos")]
    max_videos: usize,
    #[serde(flatten)]
    cursor: PageTokenArgs,
    #[serde(default)]
    include_shorts: bool,
    #[serde(default)]
    include_live: bool,
    #[serde(default)]
    parts_level: PartsLevel,
    #[serde(default = "default_order_strategy")]
    order_strategy: OrderStrategy,
    #[serde(default)]
    order_by: VideoOrderBy,
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    channel_ref: String,
    query: String,
    #[serde(default = "default_search_max_videos")]
    max_videos: usize,
    #[serde(flatten)]
    cursor: PageTokenArgs,
    #[serde(default)]
    include_shorts: bool,
    #[serde(default)]
    include_live: bool,
    #[serde(default)]
    parts_level: PartsLevel,
    #[serde(default)]
    order: SearchOrder,
}

#[derive(Debug, Deserialize)]
struct ChannelPlaylistsArgs {
    channel_ref: String,
    #[serde(flatten)]
    cursor: PageTokenArgs,
}

#[derive(Debug, Deserialize)]
struct PlaylistVideosArgs {
    playlist_id: String,
    #[serde(default = "default_max_items")]
    max_items: usize,
    #[serde(flatten)]
    cursor: PageTokenArgs,
    #[serde(default)]
    include_shorts: bool,
    #[serde(default)]
    include_live: bool,
    #[serde(default)]
    parts_level: PartsLevel,
}

#[derive(Debug, Deserialize)]
struct CommentsArgs {
    video_id: String,
    #[serde(default = "default_max_threads")]
    max_threads: usize,
    #[serde(flatten)]
    cursor: PageTokenArgs,
    #[serde(default)]
    order: CommentOrder,
    #[serde(default)]
    text_format: TextFormat,
    #[serde(default)]
    include_replies: bool,
}

#[derive(Debug, Deserialize)]
struct VideoInfoArgs {
    video_id: String,
    #[serde(default = "full_parts")]
    parts_level: PartsLevel,
}

fn full_parts() -> PartsLevel {
    PartsLevel::Full
}

/// Route a call to one of the API-backed tools
pub async fn dispatch<A: YouTubeApi>(
    name: &str,
    arguments: Option<Value>,
    api: &A,
) -> Result<Value, JsonRpcError> {
    match name {
        RESOLVE_CHANNEL => {
            let args: ResolveChannelArgs = parse_arguments(arguments)?;
            let resolved = channel::resolve_channel_data(
                api,
                &args.channel_ref,
                args.resolution_mode,
                args.include_uploads_playlist,
            )
            .await;
            respond(resolved)
        }
        CHANNEL_VIDEOS => {
            let args: ChannelVideosArgs = parse_arguments(arguments)?;
            let params = ChannelVideosParams {
                page_token: args.cursor.effective_cursor(),
                channel_ref: args.channel_ref,
                max_videos: args.max_videos,
                include_shorts: args.include_shorts,
                include_live: args.include_live,
                parts_level: args.parts_level,
                order_strategy: args.order_strategy,
                order_by: args.order_by,
            };
            respond_page(videos::list_channel_videos_data(api, params).await)
        }
        SEARCH_CHANNEL_VIDEOS => {
            let args: SearchArgs = parse_arguments(arguments)?;
            let params = ChannelSearchParams {
                page_token: args.cursor.effective_cursor(),
                channel_ref: args.channel_ref,
                query: args.query,
                max_videos: args.max_videos,
                include_shorts: args.include_shorts,
                include_live: args.include_live,
                parts_level: args.parts_level,
                order: args.order,
            };
            respond_page(search::search_channel_videos_data(api, params).await)
        }
        CHANNEL_PLAYLISTS => {
            let args: ChannelPlaylistsArgs = parse_arguments(arguments)?;
            respond_page(
                playlists::list_channel_playlists_data(
                    api,
                    &args.channel_ref,
                    args.cursor.effective_cursor(),
                )
                .await,
            )
        }
        PLAYLIST_VIDEOS => {
            let args: PlaylistVideosArgs = parse_arguments(arguments)?;
            respond_page(
                playlists::list_playlist_videos_data(
                    api,
                    &args.playlist_id,
                    args.cursor.effective_cursor(),
                    args.max_items,
                    args.include_shorts,
                    args.include_live,
                    args.parts_level,
                )
                .await,
            )
        }
        VIDEO_COMMENTS => {
            let args: CommentsArgs = parse_arguments(arguments)?;
            let params = CommentsParams {
                page_token: args.cursor.effective_cursor(),
                video: args.video_id,
                max_threads: args.max_threads,
                order: args.order,
                text_format: args.text_format,
                include_replies: args.include_replies,
            };
            respond_page(comments::list_video_comments_data(api, params).await)
        }
        VIDEO_INFO => {
            let args: VideoInfoArgs = parse_arguments(arguments)?;
            respond(video::get_video_data(api, &args.video_id, args.parts_level).await)
        }
        other => Err(JsonRpcError {
            code: -32602,
            message: format!("Unknown tool: {other}"),
            data: None,
        }),
    }
}

pub fn handle_quota_status(context: &Context) -> Result<Value, JsonRpcError> {
    let status = quota::quota_status_data(context.budgeter(), context.settings().period_mode);
    to_call_result(&status)
}

fn respond<T: Serialize>(result: Result<T, ToolError>) -> Result<Value, JsonRpcError> {
    to_call_result(&result.map_err(tool_error)?)
}

// The single place a listing page gets its dual-named cursor.
fn respond_page<T: Serialize>(result: Result<ListingPage<T>, ToolError>) -> Result<Value, JsonRpcError> {
    to_call_result(&normalize_page(result.map_err(tool_error)?))
}

/// Add the two cursor properties to an input schema
fn paginated(mut schema: Value) -> Value {
    schema["properties"]["page_token"] = json!({
        "type": "string",
        "description": "Page token from a previous response (nextPageToken). Omit for the first page."
    });
    schema["properties"]["next_page_token"] = json!({
        "type": "string",
        "description": "Alias of page_token. page_token wins when both are given."
    });
    schema
}

fn tool(name: &str, description: &str, input_schema: Value) -> Tool {
    Tool {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

const CHANNEL_REF_DESCRIPTION: &str =
    "Channel reference: @handle, https://www.youtube.com/@handle, https://www.youtube.com/channel/UC..., \
     https://www.youtube.com/user/<name>, or a raw UC... channel id";

pub fn tools() -> Vec<Tool> {
    vec![
        tool(
            RESOLVE_CHANNEL,
            "Resolve a YouTube channel reference to a channelId and uploads playlist id. Costs 1 quota unit in strict mode. best_effort mode searches for candidates (about 100 units) and never picks one for you.",
            json!({
                "type": "object",
                "properties": {
                    "channel_ref": {"type": "string", "description": CHANNEL_REF_DESCRIPTION},
                    "resolution_mode": {
                        "type": "string",
                        "enum": ["strict", "best_effort"],
                        "description": "strict (default) rejects ambiguous references; best_effort returns candidates"
                    },
                    "include_uploads_playlist": {
                        "type": "boolean",
                        "description": "Also return uploadsPlaylistId (default: true)"
                    }
                },
                "required": ["channel_ref"]
            }),
        ),
        tool(
            CHANNEL_VIDEOS,
            "List a channel's public videos, hydrated with videos.list. Shorts and live/upcoming videos are excluded unless requested. order_strategy: uploads_playlist (cheap, newest first, paginated), local_sort (fetches up to the page budget and sorts locally, no pagination), search_api (about 100 units per page, order_by date or viewCount). Returns items, nextPageToken/next_page_token, quotaEstimate, truncated, appliedMaxVideos and appliedOrder.",
            paginated(json!({
                "type": "object",
                "properties": {
                    "channel_ref": {"type": "string", "description": CHANNEL_REF_DESCRIPTION},
                    "max_videos": {"type": "number", "description": "Maximum videos for this call (default: 200, capped at 200)"},
                    "include_shorts": {"type": "boolean", "description": "Include Shorts (default: false)"},
                    "include_live": {"type": "boolean", "description": "Include live and upcoming broadcasts (default: false)"},
                    "parts_level": {"type": "string", "enum": ["basic", "full"], "description": "Detail level (default: basic)"},
                    "order_strategy": {"type": "string", "enum": ["uploads_playlist", "local_sort", "search_api"], "description": "Default: uploads_playlist"},
                    "order_by": {"type": "string", "enum": ["date", "viewCount", "likeCount", "commentCount", "duration"], "description": "Default: date"}
                },
                "required": ["channel_ref"]
            })),
        ),
        tool(
            SEARCH_CHANNEL_VIDEOS,
            "Search a channel's videos by keyword using search.list (about 100 quota units per page), hydrated with videos.list.",
            paginated(json!({
                "type": "object",
                "properties": {
                    "channel_ref": {"type": "string", "description": CHANNEL_REF_DESCRIPTION},
                    "query": {"type": "string", "description": "Keywords to search for"},
                    "max_videos": {"type": "number", "description": "Maximum videos for this page (default: 50)"},
                    "include_shorts": {"type": "boolean", "description": "Include Shorts (default: false)"},
                    "include_live": {"type": "boolean", "description": "Include live and upcoming broadcasts (default: false)"},
                    "parts_level": {"type": "string", "enum": ["basic", "full"], "description": "Detail level (default: basic)"},
                    "order": {"type": "string", "enum": ["relevance", "date", "viewCount", "rating", "title"], "description": "Default: relevance"}
                },
                "required": ["channel_ref", "query"]
            })),
        ),
        tool(
            CHANNEL_PLAYLISTS,
            "List a channel's public playlists (50 per page).",
            paginated(json!({
                "type": "object",
                "properties": {
                    "channel_ref": {"type": "string", "description": CHANNEL_REF_DESCRIPTION}
                },
                "required": ["channel_ref"]
            })),
        ),
        tool(
            PLAYLIST_VIDEOS,
            "List one page of a playlist's videos, hydrated with videos.list. Costs about 2 quota units per page.",
            paginated(json!({
                "type": "object",
                "properties": {
                    "playlist_id": {"type": "string", "description": "Playlist id (PL..., UU..., ...)"},
                    "max_items": {"type": "number", "description": "Maximum items for this page (default: 50)"},
                    "include_shorts": {"type": "boolean", "description": "Include Shorts (default: false)"},
                    "include_live": {"type": "boolean", "description": "Include live and upcoming broadcasts (default: false)"},
                    "parts_level": {"type": "string", "enum": ["basic", "full"], "description": "Detail level (default: basic)"}
                },
                "required": ["playlist_id"]
            })),
        ),
        tool(
            VIDEO_COMMENTS,
            "List a video's public comment threads. When comments are disabled the result is an empty page with commentsDisabled: true.",
            paginated(json!({
                "type": "object",
                "properties": {
                    "video_id": {"type": "string", "description": "Video id or YouTube video URL"},
                    "max_threads": {"type": "number", "description": "Threads per page (default: 100, max: 100)"},
                    "order": {"type": "string", "enum": ["time", "relevance"], "description": "Default: relevance"},
                    "text_format": {"type": "string", "enum": ["plainText", "html"], "description": "Default: plainText"},
                    "include_replies": {"type": "boolean", "description": "Include inline replies (default: false)"}
                },
                "required": ["video_id"]
            })),
        ),
        tool(
            VIDEO_INFO,
            "Fetch a single YouTube video. Accepts a raw 11-character id or a watch, youtu.be, shorts or embed URL. Returns the video resource with isShort and isLive flags.",
            json!({
                "type": "object",
                "properties": {
                    "video_id": {"type": "string", "description": "Video id or URL"},
                    "parts_level": {"type": "string", "enum": ["basic", "full"], "description": "Detail level (default: full)"}
                },
                "required": ["video_id"]
            }),
        ),
        tool(
            QUOTA_STATUS,
            "Report this server's YouTube quota consumption for the current period: ceiling, consumed, remaining, period and per-endpoint units. Makes no API call.",
            json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube::gateway::testing::FakeApi;
    use ytmcp_core::error::ApiError;
    use ytmcp_core::request::QueryValue;

    fn channel() -> Value {
        json!({"items": [{
            "id": "UC1",
            "snippet": {"title": "Channel"},
            "contentDetails": {"relatedPlaylists": {"uploads": "UU1"}}
        }]})
    }

    fn text_of(result: &Value) -> Value {
        serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_channel_defaults() {
        let api = FakeApi::ok(vec![channel()]);
        let result = dispatch(RESOLVE_CHANNEL, Some(json!({"channel_ref": "@chan"})), &api)
            .await
            .unwrap();

        let output = text_of(&result);
        assert_eq!(output["channelId"], "UC1");
        assert_eq!(output["uploadsPlaylistId"], "UU1");
    }

    #[tokio::test]
    async fn test_cursor_alias_is_forwarded_and_echoed() {
        let api = FakeApi::ok(vec![
            channel(),
            json!({"items": [], "nextPageToken": "NEXT"}),
        ]);

        let result = dispatch(
            CHANNEL_PLAYLISTS,
            Some(json!({"channel_ref": "@chan", "next_page_token": "FROM_ALIAS"})),
            &api,
        )
        .await
        .unwrap();

        assert_eq!(api.calls()[1].page_token.as_deref(), Some("FROM_ALIAS"));
        let output = text_of(&result);
        assert_eq!(output["nextPageToken"], "NEXT");
        assert_eq!(output["next_page_token"], "NEXT");
    }

    #[tokio::test]
    async fn test_canonical_cursor_wins_and_last_page_is_null() {
        let api = FakeApi::ok(vec![json!({"items": []})]);

        let result = dispatch(
            VIDEO_COMMENTS,
            Some(json!({"video_id": "dQw4w9WgXcQ", "page_token": "A", "next_page_token": "B"})),
            &api,
        )
        .await
        .unwrap();

        assert_eq!(api.calls()[0].page_token.as_deref(), Some("A"));
        let output = text_of(&result);
        assert!(output["nextPageToken"].is_null());
        assert!(output["next_page_token"].is_null());
        assert_eq!(output["commentsDisabled"], false);
    }

    #[tokio::test]
    async fn test_channel_videos_arguments() {
        let api = FakeApi::ok(vec![
            channel(),
            json!({"items": [{"snippet": {"resourceId": {"videoId": "a"}}}]}),
            json!({"items": [{"id": "a", "contentDetails": {"duration": "PT10M"}}]}),
        ]);

        let result = dispatch(
            CHANNEL_VIDEOS,
            Some(json!({"channel_ref": "@chan", "max_videos": 10, "order_by": "date"})),
            &api,
        )
        .await
        .unwrap();

        let output = text_of(&result);
        assert_eq!(output["items"].as_array().unwrap().len(), 1);
        assert_eq!(output["appliedMaxVideos"], 10);
        assert_eq!(output["appliedOrder"]["strategy"], "uploads_playlist");
        assert_eq!(output["truncated"], false);
        assert_eq!(output["quotaEstimate"]["estimatedUnits"], 2);
        assert_eq!(
            api.calls()[1].params.get("maxResults"),
            Some(&QueryValue::from(10usize))
        );
    }

    #[tokio::test]
    async fn test_bad_argument_types_are_invalid_params() {
        let api = FakeApi::ok(vec![]);

        let err = dispatch(
            CHANNEL_VIDEOS,
            Some(json!({"channel_ref": "@chan", "order_strategy": "random"})),
            &api,
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, -32602);

        let err = dispatch(SEARCH_CHANNEL_VIDEOS, None, &api).await.unwrap_err();
        assert_eq!(err.code, -32602);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_quota_rejection_carries_reason() {
        let api = FakeApi::ok(vec![]).with_remaining(50);

        let err = dispatch(
            CHANNEL_VIDEOS,
            Some(json!({"channel_ref": "@chan", "order_strategy": "search_api"})),
            &api,
        )
        .await
        .unwrap_err();

        assert_eq!(err.code, -32603);
        assert_eq!(err.data.unwrap()["reason"], "quota_exceeded");
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_upstream_failure_carries_status() {
        let api = FakeApi::new(vec![Err(ApiError::Upstream {
            endpoint: "videos".to_string(),
            status: 400,
            reason: Some("badRequest".to_string()),
            message: Some("bad".to_string()),
        })]);

        let err = dispatch(VIDEO_INFO, Some(json!({"video_id": "dQw4w9WgXcQ"})), &api)
            .await
            .unwrap_err();

        let data = err.data.unwrap();
        assert_eq!(data["reason"], "upstream_error");
        assert_eq!(data["status"], 400);
        assert_eq!(data["upstreamReason"], "badRequest");
    }

    #[test]
    fn test_quota_tool_needs_no_credential() {
        assert!(!is_api_tool(QUOTA_STATUS));
        assert!(is_api_tool(VIDEO_INFO));
    }
}
