use crate::prelude::{println, *};
use colored::Colorize;
use log::info;
use serde_json::Value;
use ytmcp_core::allowlist::COMMENT_THREADS;
use ytmcp_core::error::{ApiError, ToolError};
use ytmcp_core::pagination::ListingPage;
use ytmcp_core::quota::{estimate_reads, QuotaError};
use ytmcp_core::request::RequestSpec;
use ytmcp_core::youtube::video_url::extract_video_id;
use ytmcp_core::youtube::{CommentOrder, TextFormat};

use super::{fetch_list, YouTubeApi};

/// Upper bound of `maxResults` for `commentThreads.list`
pub const MAX_THREADS_PER_PAGE: usize = 100;

const COMMENTS_DISABLED: &str = "commentsDisabled";

#[derive(Debug, clap::Args, Clone)]
pub struct CommentsOptions {
    /// Video id or watch URL
    #[arg(value_name = "VIDEO")]
    pub video: String,

    /// Maximum number of threads for this page (1-100)
    #[arg(short, long, default_value_t = MAX_THREADS_PER_PAGE)]
    pub max_threads: usize,

    /// Page token from a previous response
    #[arg(long)]
    pub page_token: Option<String>,

    /// time or relevance
    #[arg(long, default_value = "relevance")]
    pub order: CommentOrder,

    /// plainText or html
    #[arg(long, default_value = "plainText")]
    pub text_format: TextFormat,

    /// Include the replies YouTube returns inline with each thread
    #[arg(long)]
    pub include_replies: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentsParams {
    pub video: String,
    pub max_threads: usize,
    pub page_token: Option<String>,
    pub order: CommentOrder,
    pub text_format: TextFormat,
    pub include_replies: bool,
}

impl From<CommentsOptions> for CommentsParams {
    fn from(options: CommentsOptions) -> Self {
        Self {
            video: options.video,
            max_threads: options.max_threads,
            page_token: options.page_token,
            order: options.order,
            text_format: options.text_format,
            include_replies: options.include_replies,
        }
    }
}

pub async fn run(options: CommentsOptions, context: &super::Context) -> Result<()> {
    let json = options.json;
    let api = context.gateway()?;
    let page = list_video_comments_data(&api, options.into()).await?;

    if json {
        super::output_page_json(page)
    } else {
        println!("{}", format_comments_text(&page));
        Ok(())
    }
}

/// One page of a video's top-level comment threads
///
/// A video with comments turned off yields an empty last page flagged with
/// `commentsDisabled`, not an error.
pub async fn list_video_comments_data<A: YouTubeApi>(
    api: &A,
    params: CommentsParams,
) -> Result<ListingPage<Value>, ToolError> {
    if params.video.trim().is_empty() {
        return Err(ToolError::invalid("video_id is required"));
    }
    let video_id = extract_video_id(&params.video).map_err(|e| ToolError::invalid(e.to_string()))?;
    if params.max_threads == 0 {
        return Err(ToolError::invalid("max_threads must be positive"));
    }
    let max_threads = params.max_threads.min(MAX_THREADS_PER_PAGE);

    let estimate = estimate_reads(1, false, api.estimation_policy());
    let limit = api.tool_budget().max_quota_units;
    if estimate.estimated_units > limit {
        return Err(QuotaError::PlanExceedsBudget {
            estimated: estimate.estimated_units,
            limit,
        }
        .into());
    }

    let part = if params.include_replies {
        "snippet,replies"
    } else {
        "snippet"
    };
    let spec = RequestSpec::new(&COMMENT_THREADS)
        .part(part)
        .param("videoId", video_id.as_str())
        .param("maxResults", max_threads)
        .param("order", params.order.as_str())
        .param("textFormat", params.text_format.as_str())
        .page_token(params.page_token);

    let mut page = match fetch_list(api, spec).await {
        Ok(envelope) => {
            let next = envelope.next_token();
            let mut page = ListingPage::new(envelope.items, next, estimate);
            page.comments_disabled = Some(false);
            page
        }
        Err(err) if err.is_disabled(COMMENTS_DISABLED) => {
            info!("Comments are disabled for video {video_id}");
            let mut page = ListingPage::new(Vec::new(), None, estimate);
            page.comments_disabled = Some(true);
            page.warnings.push(disabled_warning(&err));
            page
        }
        Err(err) => return Err(err.into()),
    };

    if params.max_threads > MAX_THREADS_PER_PAGE {
        page.warnings
            .push(format!("max_threads capped at {MAX_THREADS_PER_PAGE}"));
    }
    Ok(page)
}

fn disabled_warning(err: &ApiError) -> String {
    match err {
        ApiError::Upstream {
            message: Some(message),
            ..
        } if !message.is_empty() => format!("{COMMENTS_DISABLED}: {message}"),
        _ => COMMENTS_DISABLED.to_string(),
    }
}

fn format_comments_text(page: &ListingPage<Value>) -> String {
    let mut result = String::new();

    result.push_str(&format!("\n{}\n", "=".repeat(80).bright_cyan()));
    result.push_str(&format!("{}\n", "COMMENTS".bright_cyan().bold()));
    result.push_str(&format!("{}\n", "=".repeat(80).bright_cyan()));

    if page.comments_disabled == Some(true) {
        result.push_str(&format!("\n{}\n", "Comments are disabled for this video.".yellow()));
    }

    for (idx, thread) in page.items.iter().enumerate() {
        let top = thread
            .pointer("/snippet/topLevelComment/snippet")
            .cloned()
            .unwrap_or(Value::Null);
        let author = top
            .get("authorDisplayName")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        let text = top
            .get("textDisplay")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let likes = top.get("likeCount").and_then(Value::as_u64).unwrap_or(0);
        let replies = thread
            .pointer("/snippet/totalReplyCount")
            .and_then(Value::as_u64)
            .unwrap_or(0);

        result.push_str(&format!(
            "\n{} {} {}\n",
            format!("[{}]", idx + 1).yellow().bold(),
            author.white().bold(),
            format!("({likes} likes, {replies} replies)").bright_black()
        ));
        for line in text.lines() {
            result.push_str(&format!("    {line}\n"));
        }
    }

    result.push_str(&super::format_page_footer(page));
    result
}
