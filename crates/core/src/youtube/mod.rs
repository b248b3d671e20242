//! YouTube Data API domain models and pure transformations
//!
//! Upstream resources (videos, playlists, comment threads) are passed through to
//! callers as JSON values; only the envelope and the fields this crate reasons
//! about are modeled as types.

pub mod channel_ref;
pub mod classify;
pub mod extract;
pub mod video_url;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `*.list` response envelope
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEnvelope {
    #[serde(default)]
    pub items: Vec<Value>,
    #[serde(default)]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub page_info: Option<PageInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total_results: Option<u64>,
    pub results_per_page: Option<u64>,
}

impl ListEnvelope {
    /// Parse a decoded response body. A body whose `items` is not a list is
    /// malformed and yields an error.
    pub fn from_value(value: Value) -> Result<Self, String> {
        serde_json::from_value(value).map_err(|e| format!("unexpected response shape: {e}"))
    }

    /// Upstream next-page token, with empty strings treated as absent
    pub fn next_token(&self) -> Option<String> {
        self.next_page_token.clone().filter(|t| !t.is_empty())
    }
}

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!(
                        "Invalid value {other:?}; expected one of: {}",
                        [$($text),+].join(", ")
                    )),
                }
            }
        }
    };
}

string_enum! {
    /// How much of each video resource to request
    PartsLevel {
        Basic => "basic",
        Full => "full",
    }
}

impl Default for PartsLevel {
    fn default() -> Self {
        PartsLevel::Basic
    }
}

impl PartsLevel {
    /// `part` parameter for `videos.list`
    pub fn video_part(&self) -> &'static str {
        match self {
            PartsLevel::Basic => "snippet,statistics,contentDetails",
            PartsLevel::Full => "snippet,statistics,contentDetails,liveStreamingDetails,status",
        }
    }
}

string_enum! {
    /// Channel resolution strictness
    ResolutionMode {
        Strict => "strict",
        BestEffort => "best_effort",
    }
}

impl Default for ResolutionMode {
    fn default() -> Self {
        ResolutionMode::Strict
    }
}

string_enum! {
    VideoOrderBy {
        Date => "date",
        ViewCount => "viewCount",
        LikeCount => "likeCount",
        CommentCount => "commentCount",
        Duration => "duration",
    }
}

impl Default for VideoOrderBy {
    fn default() -> Self {
        VideoOrderBy::Date
    }
}

string_enum! {
    SearchOrder {
        Relevance => "relevance",
        Date => "date",
        ViewCount => "viewCount",
        Rating => "rating",
        Title => "title",
    }
}

impl Default for SearchOrder {
    fn default() -> Self {
        SearchOrder::Relevance
    }
}

string_enum! {
    CommentOrder {
        Time => "time",
        Relevance => "relevance",
    }
}

impl Default for CommentOrder {
    fn default() -> Self {
        CommentOrder::Relevance
    }
}

string_enum! {
    TextFormat {
        PlainText => "plainText",
        Html => "html",
    }
}

impl Default for TextFormat {
    fn default() -> Self {
        TextFormat::PlainText
    }
}

/// A possible match for an ambiguous channel reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelCandidate {
    pub channel_id: String,
    pub title: Option<String>,
    pub handle: Option<String>,
}

/// Outcome of resolving a channel reference
///
/// In best-effort mode an ambiguous reference yields no `channel_id`, only
/// `candidates`; a channel is never picked on the caller's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedChannel {
    pub channel_id: Option<String>,
    pub title: Option<String>,
    pub handle: Option<String>,
    pub uploads_playlist_id: Option<String>,
    pub warnings: Vec<String>,
    pub candidates: Vec<ChannelCandidate>,
}

pub const WARNING_UPLOADS_UNAVAILABLE: &str = "uploadsPlaylistId not available";
pub const WARNING_CANDIDATES_ONLY: &str = "best_effort_candidates_only";
