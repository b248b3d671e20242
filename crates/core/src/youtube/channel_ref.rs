//! Channel reference parsing
//!
//! Classifies user input (`@handle`, channel URLs, raw ids, free text) without
//! any network access. Resolution of the classified reference happens in the
//! shell.

use serde::Serialize;

const YOUTUBE_HOSTS: [&str; 3] = ["youtube.com", "www.youtube.com", "m.youtube.com"];

const PATH_HANDLE: &str = "/@";
const PATH_CHANNEL: &str = "/channel/";
const PATH_USER: &str = "/user/";
const PATH_CUSTOM: &str = "/c/";

/// Shortest string still accepted as a raw `UC...` channel id
const MIN_CHANNEL_ID_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelRefKind {
    Handle,
    ChannelId,
    Username,
    CustomUrl,
    Query,
}

/// Normalized channel reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRef {
    pub kind: ChannelRefKind,
    /// Handle without `@`, channel id, username, custom segment, or query text
    pub value: String,
    /// Trimmed original input
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelRefError {
    #[error("Channel reference cannot be empty")]
    Empty,

    #[error("{0} cannot be empty")]
    EmptySegment(&'static str),

    #[error("{0} contains invalid URL separator characters")]
    InvalidSeparator(&'static str),
}

impl ChannelRef {
    fn new(kind: ChannelRefKind, value: &str, raw: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
            raw: raw.to_string(),
        }
    }
}

/// Parse a user-supplied channel reference
pub fn parse_channel_ref(input: &str) -> Result<ChannelRef, ChannelRefError> {
    let raw = input.trim();
    if raw.is_empty() {
        return Err(ChannelRefError::Empty);
    }

    if let Some(handle) = raw.strip_prefix('@') {
        let handle = checked_segment(handle.trim(), "Handle")?;
        return Ok(ChannelRef::new(ChannelRefKind::Handle, handle, raw));
    }

    if looks_like_channel_id(raw) {
        return Ok(ChannelRef::new(ChannelRefKind::ChannelId, raw, raw));
    }

    if let Some(parsed) = parse_youtube_url(raw)? {
        return Ok(parsed);
    }

    Ok(ChannelRef::new(ChannelRefKind::Query, raw, raw))
}

fn looks_like_channel_id(value: &str) -> bool {
    value.starts_with("UC") && value.len() >= MIN_CHANNEL_ID_LEN && !value.contains(' ')
}

fn checked_segment<'a>(value: &'a str, label: &'static str) -> Result<&'a str, ChannelRefError> {
    if value.is_empty() {
        return Err(ChannelRefError::EmptySegment(label));
    }
    if value.contains(['/', '?', '#']) {
        return Err(ChannelRefError::InvalidSeparator(label));
    }
    Ok(value)
}

/// Split an `http(s)` URL into lowercase host and path (query and fragment
/// dropped). Scheme-less `youtube.com/...` inputs are accepted.
pub(crate) fn split_url(raw: &str) -> Option<(String, String)> {
    let rest = match raw.split_once("://") {
        Some((scheme, rest)) => {
            let scheme = scheme.to_ascii_lowercase();
            if scheme != "http" && scheme != "https" {
                return None;
            }
            rest
        }
        None => {
            let lower = raw.to_ascii_lowercase();
            if !YOUTUBE_HOSTS.iter().any(|h| lower.starts_with(&format!("{h}/"))) {
                return None;
            }
            raw
        }
    };

    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    let rest = &rest[..end];
    let (host, path) = match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, ""),
    };
    Some((host.to_ascii_lowercase(), path.to_string()))
}

fn parse_youtube_url(raw: &str) -> Result<Option<ChannelRef>, ChannelRefError> {
    let Some((host, path)) = split_url(raw) else {
        return Ok(None);
    };
    if !YOUTUBE_HOSTS.contains(&host.as_str()) {
        return Ok(None);
    }

    if let Some(rest) = path.strip_prefix(PATH_HANDLE) {
        // `/@name/videos` and friends still name the channel
        let handle = rest.split('/').next().unwrap_or_default();
        let handle = checked_segment(handle, "Handle")?;
        return Ok(Some(ChannelRef::new(ChannelRefKind::Handle, handle, raw)));
    }

    let prefixed = [
        (PATH_CHANNEL, ChannelRefKind::ChannelId, "Channel ID"),
        (PATH_USER, ChannelRefKind::Username, "Username"),
        (PATH_CUSTOM, ChannelRefKind::CustomUrl, "Custom URL segment"),
    ];
    for (prefix, kind, label) in prefixed {
        if let Some(rest) = path.strip_prefix(prefix) {
            let value = checked_segment(rest.trim_matches('/'), label)?;
            return Ok(Some(ChannelRef::new(kind, value, raw)));
        }
    }

    Ok(Some(ChannelRef::new(ChannelRefKind::Query, raw, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_and_value(input: &str) -> (ChannelRefKind, String) {
        let parsed = parse_channel_ref(input).unwrap();
        (parsed.kind, parsed.value)
    }

    #[test]
    fn test_handle() {
        assert_eq!(
            kind_and_value("  @GoogleDevelopers "),
            (ChannelRefKind::Handle, "GoogleDevelopers".to_string())
        );
    }

    #[test]
    fn test_handle_url() {
        assert_eq!(
            kind_and_value("https://www.youtube.com/@GoogleDevelopers"),
            (ChannelRefKind::Handle, "GoogleDevelopers".to_string())
        );
        assert_eq!(
            kind_and_value("https://m.youtube.com/@GoogleDevelopers/videos?view=0"),
            (ChannelRefKind::Handle, "GoogleDevelopers".to_string())
        );
    }

    #[test]
    fn test_channel_id_url_and_raw() {
        let id = "UC_x5XG1OV2P6uZZ5FSM9Ttw";
        assert_eq!(
            kind_and_value(&format!("https://www.youtube.com/channel/{id}")),
            (ChannelRefKind::ChannelId, id.to_string())
        );
        assert_eq!(kind_and_value(id), (ChannelRefKind::ChannelId, id.to_string()));
    }

    #[test]
    fn test_short_uc_string_is_query() {
        assert_eq!(kind_and_value("UCshort").0, ChannelRefKind::Query);
    }

    #[test]
    fn test_user_and_custom_urls() {
        assert_eq!(
            kind_and_value("youtube.com/user/SomeUser"),
            (ChannelRefKind::Username, "SomeUser".to_string())
        );
        assert_eq!(
            kind_and_value("https://youtube.com/c/SomeCustom/"),
            (ChannelRefKind::CustomUrl, "SomeCustom".to_string())
        );
    }

    #[test]
    fn test_free_text_and_foreign_hosts_are_queries() {
        assert_eq!(kind_and_value("google developers").0, ChannelRefKind::Query);
        assert_eq!(
            kind_and_value("https://evil.example.com/@handle").0,
            ChannelRefKind::Query
        );
        assert_eq!(
            kind_and_value("ftp://www.youtube.com/@handle").0,
            ChannelRefKind::Query
        );
        assert_eq!(
            kind_and_value("https://www.youtube.com/playlist?list=PL1").0,
            ChannelRefKind::Query
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse_channel_ref("   "), Err(ChannelRefError::Empty));
        assert_eq!(
            parse_channel_ref("@"),
            Err(ChannelRefError::EmptySegment("Handle"))
        );
        assert_eq!(
            parse_channel_ref("@a/b"),
            Err(ChannelRefError::InvalidSeparator("Handle"))
        );
        assert_eq!(
            parse_channel_ref("https://www.youtube.com/channel/"),
            Err(ChannelRefError::EmptySegment("Channel ID"))
        );
    }

    #[test]
    fn test_split_url() {
        assert_eq!(
            split_url("HTTPS://WWW.YouTube.com/watch?v=x"),
            Some(("www.youtube.com".to_string(), "/watch".to_string()))
        );
        assert_eq!(split_url("not a url"), None);
    }
}
