//! Id and metadata extraction from list responses

use std::collections::HashSet;

use serde_json::Value;

use super::{ChannelCandidate, ResolvedChannel, WARNING_CANDIDATES_ONLY, WARNING_UPLOADS_UNAVAILABLE};

fn non_empty_str<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn owned(value: &Value, pointer: &str) -> Option<String> {
    non_empty_str(value, pointer).map(str::to_string)
}

/// `snippet.resourceId.videoId` of each playlist item, deduplicated in order
pub fn playlist_video_ids(items: &[Value], limit: Option<usize>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter_map(|item| non_empty_str(item, "/snippet/resourceId/videoId"))
        .filter(|id| seen.insert(id.to_string()))
        .take(limit.unwrap_or(usize::MAX))
        .map(str::to_string)
        .collect()
}

/// `id.videoId` of each search result, in order
pub fn search_video_ids(items: &[Value], limit: usize) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| owned(item, "/id/videoId"))
        .take(limit)
        .collect()
}

/// Channel candidates from a `search.list?type=channel` response
pub fn channel_candidates(items: &[Value]) -> Vec<ChannelCandidate> {
    items
        .iter()
        .filter_map(|item| {
            Some(ChannelCandidate {
                channel_id: owned(item, "/id/channelId")?,
                title: owned(item, "/snippet/title"),
                handle: owned(item, "/snippet/channelTitle"),
            })
        })
        .collect()
}

/// `contentDetails.relatedPlaylists.uploads` of a channel resource
pub fn uploads_playlist_id(channel: &Value) -> Option<String> {
    owned(channel, "/contentDetails/relatedPlaylists/uploads")
}

/// Build a resolution result from the single channel a lookup returned
pub fn resolved_from_channel(channel: &Value, include_uploads_playlist: bool) -> ResolvedChannel {
    let mut warnings = Vec::new();
    let uploads_playlist_id = if include_uploads_playlist {
        let uploads = uploads_playlist_id(channel);
        if uploads.is_none() {
            warnings.push(WARNING_UPLOADS_UNAVAILABLE.to_string());
        }
        uploads
    } else {
        None
    };

    ResolvedChannel {
        channel_id: owned(channel, "/id"),
        title: owned(channel, "/snippet/title"),
        handle: owned(channel, "/snippet/customUrl"),
        uploads_playlist_id,
        warnings,
        candidates: Vec::new(),
    }
}

/// Best-effort result: candidates only, no channel chosen
pub fn resolved_candidates(candidates: Vec<ChannelCandidate>) -> ResolvedChannel {
    ResolvedChannel {
        channel_id: None,
        title: None,
        handle: None,
        uploads_playlist_id: None,
        warnings: vec![WARNING_CANDIDATES_ONLY.to_string()],
        candidates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn playlist_item(video_id: &str) -> Value {
        json!({"snippet": {"resourceId": {"kind": "youtube#video", "videoId": video_id}}})
    }

    #[test]
    fn test_playlist_video_ids_dedup_and_limit() {
        let items = vec![
            playlist_item("a"),
            playlist_item("b"),
            playlist_item("a"),
            json!({"snippet": {}}),
            playlist_item(""),
            playlist_item("c"),
        ];
        assert_eq!(playlist_video_ids(&items, None), vec!["a", "b", "c"]);
        assert_eq!(playlist_video_ids(&items, Some(2)), vec!["a", "b"]);
    }

    #[test]
    fn test_search_video_ids_skip_non_videos() {
        let items = vec![
            json!({"id": {"kind": "youtube#video", "videoId": "v1"}}),
            json!({"id": {"kind": "youtube#channel", "channelId": "UC1"}}),
            json!({"id": {"kind": "youtube#video", "videoId": "v2"}}),
            json!({"id": {"kind": "youtube#video", "videoId": "v3"}}),
        ];
        assert_eq!(search_video_ids(&items, 2), vec!["v1", "v2"]);
    }

    #[test]
    fn test_channel_candidates() {
        let items = vec![
            json!({"id": {"channelId": "UC1"}, "snippet": {"title": "One", "channelTitle": "one"}}),
            json!({"id": {"videoId": "x"}}),
            json!({"id": {"channelId": "UC2"}}),
        ];
        let candidates = channel_candidates(&items);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].title.as_deref(), Some("One"));
        assert_eq!(candidates[1].handle, None);
    }

    #[test]
    fn test_resolved_from_channel() {
        let channel = json!({
            "id": "UC_x5XG1OV2P6uZZ5FSM9Ttw",
            "snippet": {"title": "Google for Developers", "customUrl": "@googledevelopers"},
            "contentDetails": {"relatedPlaylists": {"uploads": "UU_x5XG1OV2P6uZZ5FSM9Ttw"}}
        });
        let resolved = resolved_from_channel(&channel, true);
        assert_eq!(resolved.channel_id.as_deref(), Some("UC_x5XG1OV2P6uZZ5FSM9Ttw"));
        assert_eq!(
            resolved.uploads_playlist_id.as_deref(),
            Some("UU_x5XG1OV2P6uZZ5FSM9Ttw")
        );
        assert!(resolved.warnings.is_empty());
    }

    #[test]
    fn test_missing_uploads_adds_warning() {
        let resolved = resolved_from_channel(&json!({"id": "UC1"}), true);
        assert_eq!(resolved.warnings, vec![WARNING_UPLOADS_UNAVAILABLE]);

        let resolved = resolved_from_channel(&json!({"id": "UC1"}), false);
        assert!(resolved.warnings.is_empty());
    }

    #[test]
    fn test_resolved_candidates_never_selects() {
        let resolved = resolved_candidates(vec![ChannelCandidate {
            channel_id: "UC1".to_string(),
            title: None,
            handle: None,
        }]);
        assert_eq!(resolved.channel_id, None);
        assert_eq!(resolved.candidates.len(), 1);
    }
}
