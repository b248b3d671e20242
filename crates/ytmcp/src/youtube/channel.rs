use crate::prelude::{println, *};
use colored::Colorize;
use ytmcp_core::allowlist::{CHANNELS, SEARCH};
use ytmcp_core::error::ToolError;
use ytmcp_core::request::RequestSpec;
use ytmcp_core::youtube::channel_ref::{parse_channel_ref, ChannelRefKind};
use ytmcp_core::youtube::extract::{channel_candidates, resolved_candidates, resolved_from_channel};
use ytmcp_core::youtube::{ResolutionMode, ResolvedChannel};

use super::{fetch_list, YouTubeApi};

/// Candidates returned by a best-effort search
const MAX_CANDIDATES: usize = 5;

#[derive(Debug, clap::Args, Clone)]
pub struct ChannelOptions {
    /// @handle, channel URL, /user/ URL or UC... channel id
    #[arg(value_name = "CHANNEL")]
    pub channel_ref: String,

    /// strict or best_effort (may use the expensive search endpoint)
    #[arg(long, default_value = "strict")]
    pub resolution_mode: ResolutionMode,

    /// Skip looking up the uploads playlist id
    #[arg(long)]
    pub no_uploads_playlist: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(options: ChannelOptions, context: &super::Context) -> Result<()> {
    let api = context.gateway()?;
    let resolved = resolve_channel_data(
        &api,
        &options.channel_ref,
        options.resolution_mode,
        !options.no_uploads_playlist,
    )
    .await?;

    if options.json {
        super::output_json(&resolved)
    } else {
        println!("{}", format_channel_text(&resolved));
        Ok(())
    }
}

/// Resolve a user-facing channel reference
///
/// Handles, channel ids and legacy usernames are looked up exactly with
/// `channels.list`. Custom URLs and free text are ambiguous: `strict` rejects
/// them, `best_effort` returns candidates from `search.list` without choosing.
pub async fn resolve_channel_data<A: YouTubeApi>(
    api: &A,
    channel_ref: &str,
    mode: ResolutionMode,
    include_uploads_playlist: bool,
) -> Result<ResolvedChannel, ToolError> {
    let reference = parse_channel_ref(channel_ref).map_err(|e| ToolError::invalid(e.to_string()))?;

    let (filter, value) = match (reference.kind, mode) {
        (ChannelRefKind::Handle, _) => ("forHandle", format!("@{}", reference.value)),
        (ChannelRefKind::ChannelId, _) => ("id", reference.value),
        (ChannelRefKind::Username, _) => ("forUsername", reference.value),
        (ChannelRefKind::CustomUrl, ResolutionMode::Strict) => {
            return Err(ToolError::Resolution(
                "Custom channel URLs (/c/...) cannot be resolved deterministically. \
                 Provide @handle or /channel/<id> or /user/<username>."
                    .to_string(),
            ))
        }
        (ChannelRefKind::Query, ResolutionMode::Strict) => {
            return Err(ToolError::Resolution(
                "Ambiguous channel reference. Provide @handle, channel URL (/channel/UC...), \
                 or /user/<username>."
                    .to_string(),
            ))
        }
        (ChannelRefKind::CustomUrl | ChannelRefKind::Query, ResolutionMode::BestEffort) => {
            return search_candidates(api, &reference.value).await
        }
    };

    let part = if include_uploads_playlist {
        "snippet,id,contentDetails"
    } else {
        "snippet,id"
    };
    let spec = RequestSpec::new(&CHANNELS).part(part).param(filter, value);
    let envelope = fetch_list(api, spec).await?;

    match envelope.items.as_slice() {
        [] => Err(ToolError::Resolution("Channel not found".to_string())),
        [channel] => Ok(resolved_from_channel(channel, include_uploads_playlist)),
        _ => Err(ToolError::Resolution(
            "Multiple channels matched unexpectedly".to_string(),
        )),
    }
}

async fn search_candidates<A: YouTubeApi>(api: &A, query: &str) -> Result<ResolvedChannel, ToolError> {
    let spec = RequestSpec::new(&SEARCH)
        .part("snippet")
        .param("q", query)
        .param("type", "channel")
        .param("maxResults", MAX_CANDIDATES);
    let envelope = fetch_list(api, spec).await?;

    let candidates = channel_candidates(&envelope.items);
    if candidates.is_empty() {
        return Err(ToolError::Resolution("No channel candidates found".to_string()));
    }
    Ok(resolved_candidates(candidates))
}

fn format_channel_text(resolved: &ResolvedChannel) -> String {
    let mut result = String::new();
    let field = |label: &str, value: &Option<String>| {
        format!(
            "{}: {}\n",
            label.green(),
            value.as_deref().unwrap_or("-").bright_white()
        )
    };

    if let Some(id) = &resolved.channel_id {
        result.push_str(&format!(
            "{}\n",
            resolved.title.as_deref().unwrap_or(id).bright_cyan().bold()
        ));
        result.push_str(&field("Channel ID", &resolved.channel_id));
        result.push_str(&field("Handle", &resolved.handle));
        result.push_str(&field("Uploads playlist", &resolved.uploads_playlist_id));
    }

    if !resolved.candidates.is_empty() {
        result.push_str(&format!("{}\n", "Candidates".bright_cyan().bold()));
        for candidate in &resolved.candidates {
            result.push_str(&format!(
                "  {} {} {}\n",
                candidate.channel_id.yellow(),
                candidate.title.as_deref().unwrap_or("-").white().bold(),
                candidate.handle.as_deref().unwrap_or("").bright_black()
            ));
        }
    }

    for warning in &resolved.warnings {
        result.push_str(&format!("{} {}\n", "!".yellow().bold(), warning.yellow()));
    }

    result
}
