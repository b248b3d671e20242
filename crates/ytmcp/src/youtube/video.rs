use crate::prelude::{println, *};
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use ytmcp_core::error::ToolError;
use ytmcp_core::youtube::classify::{is_live, is_short};
use ytmcp_core::youtube::video_url::extract_video_id;
use ytmcp_core::youtube::PartsLevel;

use super::{hydrate_videos, YouTubeApi};

#[derive(Debug, clap::Args, Clone)]
pub struct VideoOptions {
    /// Video id or a watch / youtu.be / shorts / embed URL
    #[arg(value_name = "VIDEO")]
    pub video: String,

    /// basic or full
    #[arg(long, default_value = "full")]
    pub parts_level: PartsLevel,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// A single video resource with its classification
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    pub video_id: String,
    pub is_short: bool,
    pub is_live: bool,
    pub video: Value,
}

pub async fn run(options: VideoOptions, context: &super::Context) -> Result<()> {
    let api = context.gateway()?;
    let info = get_video_data(&api, &options.video, options.parts_level).await?;

    if options.json {
        super::output_json(&info)
    } else {
        println!("{}", format_video_text(&info));
        Ok(())
    }
}

pub async fn get_video_data<A: YouTubeApi>(
    api: &A,
    video: &str,
    parts_level: PartsLevel,
) -> Result<VideoInfo, ToolError> {
    let video_id = extract_video_id(video).map_err(|e| ToolError::invalid(e.to_string()))?;

    let video = hydrate_videos(api, std::slice::from_ref(&video_id), parts_level)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ToolError::NotFound(format!("video {video_id}")))?;

    Ok(VideoInfo {
        is_short: is_short(&video),
        is_live: is_live(&video),
        video_id,
        video,
    })
}

fn format_video_text(info: &VideoInfo) -> String {
    let video = &info.video;
    let text = |pointer: &str| {
        video
            .pointer(pointer)
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| "-".to_string())
    };

    let mut result = String::new();
    result.push_str(&format!("{}\n", text("/snippet/title").bright_cyan().bold()));
    result.push_str(&format!(
        "{}\n",
        format!("https://www.youtube.com/watch?v={}", info.video_id)
            .cyan()
            .underline()
    ));

    let mut table = new_table(["Field", "Value"]);
    table.add_row(prettytable::row!["Channel", text("/snippet/channelTitle")]);
    table.add_row(prettytable::row!["Published", text("/snippet/publishedAt")]);
    table.add_row(prettytable::row!["Duration", text("/contentDetails/duration")]);
    table.add_row(prettytable::row!["Views", text("/statistics/viewCount")]);
    table.add_row(prettytable::row!["Likes", text("/statistics/likeCount")]);
    table.add_row(prettytable::row!["Comments", text("/statistics/commentCount")]);
    table.add_row(prettytable::row!["Short", info.is_short]);
    table.add_row(prettytable::row!["Live", info.is_live]);
    result.push_str(&table.to_string());

    let description = text("/snippet/description");
    if description != "-" && !description.is_empty() {
        result.push_str(&format!("\n{}\n{}\n", "Description".green(), description));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube::gateway::testing::FakeApi;
    use serde_json::json;
    use ytmcp_core::request::QueryValue;

    #[tokio::test]
    async fn test_video_from_url_is_classified() {
        let api = FakeApi::ok(vec![json!({"items": [{
            "id": "dQw4w9WgXcQ",
            "snippet": {"title": "Clip", "liveBroadcastContent": "none"},
            "contentDetails": {"duration": "PT42S"}
        }]})]);

        let info = get_video_data(
            &api,
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            PartsLevel::Basic,
        )
        .await
        .unwrap();

        assert_eq!(info.video_id, "dQw4w9WgXcQ");
        assert!(info.is_short);
        assert!(!info.is_live);
        assert_eq!(
            api.calls()[0].params.get("id"),
            Some(&QueryValue::from("dQw4w9WgXcQ"))
        );

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["videoId"], "dQw4w9WgXcQ");
        assert_eq!(json["isShort"], true);

        assert!(format_video_text(&info).contains("Clip"));
    }

    #[tokio::test]
    async fn test_missing_video_is_not_found() {
        let api = FakeApi::ok(vec![json!({"items": []})]);
        let err = get_video_data(&api, "dQw4w9WgXcQ", PartsLevel::Full)
            .await
            .unwrap_err();
        assert_eq!(err.reason(), "not_found");
    }

    #[tokio::test]
    async fn test_unparseable_input_makes_no_call() {
        let api = FakeApi::ok(vec![]);
        let err = get_video_data(&api, "not a video", PartsLevel::Full)
            .await
            .unwrap_err();
        assert_eq!(err.reason(), "invalid_argument");
        assert!(api.calls().is_empty());
    }
}
