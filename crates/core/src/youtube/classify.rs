//! Best-effort video classification, filtering and local sorting
//!
//! Shorts and live detection are heuristics over the video resource, not
//! authoritative flags from the upstream.

use std::sync::OnceLock;

use chrono::DateTime;
use regex::Regex;
use serde_json::Value;

use super::VideoOrderBy;

/// Videos at or under this length are treated as Shorts
pub const SHORTS_MAX_SECONDS: u64 = 60;

static DURATION_RE: OnceLock<Option<Regex>> = OnceLock::new();

/// Parse the `PT#H#M#S` subset of ISO-8601 durations the upstream returns
///
/// Absurd values that overflow `u64` seconds are treated as unparseable.
pub fn parse_duration_seconds(duration: &str) -> Option<u64> {
    let re = DURATION_RE
        .get_or_init(|| Regex::new(r"^P(?:(\d+)D)?T?(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$").ok())
        .as_ref()?;
    let caps = re.captures(duration)?;
    if duration == "P" || duration == "PT" {
        return None;
    }

    let part = |i: usize| -> Option<u64> {
        caps.get(i)
            .map(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(Some(0))
    };
    part(1)?
        .checked_mul(86_400)?
        .checked_add(part(2)?.checked_mul(3_600)?)?
        .checked_add(part(3)?.checked_mul(60)?)?
        .checked_add(part(4)?)
}

fn duration_of(video: &Value) -> Option<u64> {
    video
        .pointer("/contentDetails/duration")
        .and_then(Value::as_str)
        .and_then(parse_duration_seconds)
}

pub fn is_short(video: &Value) -> bool {
    duration_of(video).is_some_and(|s| s <= SHORTS_MAX_SECONDS)
}

/// `snippet.liveBroadcastContent` is `live` or `upcoming`
pub fn is_live(video: &Value) -> bool {
    matches!(
        video
            .pointer("/snippet/liveBroadcastContent")
            .and_then(Value::as_str),
        Some("live" | "upcoming")
    )
}

pub fn filter_videos(videos: Vec<Value>, include_shorts: bool, include_live: bool) -> Vec<Value> {
    videos
        .into_iter()
        .filter(|v| include_shorts || !is_short(v))
        .filter(|v| include_live || !is_live(v))
        .collect()
}

/// Statistics arrive as decimal strings; numbers are accepted too
fn statistic(video: &Value, name: &str) -> i64 {
    match video.get("statistics").and_then(|s| s.get(name)) {
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        _ => 0,
    }
}

/// Numeric sort key; larger sorts first
pub fn sort_key(video: &Value, order_by: VideoOrderBy) -> i64 {
    match order_by {
        VideoOrderBy::Date => video
            .pointer("/snippet/publishedAt")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.timestamp())
            .unwrap_or(0),
        VideoOrderBy::ViewCount => statistic(video, "viewCount"),
        VideoOrderBy::LikeCount => statistic(video, "likeCount"),
        VideoOrderBy::CommentCount => statistic(video, "commentCount"),
        VideoOrderBy::Duration => duration_of(video).map(|d| d as i64).unwrap_or(0),
    }
}

/// Sort descending by `order_by`; ties keep their upstream order
pub fn sort_videos(videos: &mut [Value], order_by: VideoOrderBy) {
    videos.sort_by_cached_key(|v| std::cmp::Reverse(sort_key(v, order_by)));
}
