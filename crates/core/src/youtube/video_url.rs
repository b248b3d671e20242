//! Video id extraction from raw ids and common YouTube URL shapes

use std::sync::OnceLock;

use regex::Regex;

use super::channel_ref::split_url;

const VIDEO_ID_LEN: usize = 11;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VideoUrlError {
    #[error("video url/id is required")]
    Empty,

    #[error("could not extract video id from {0:?}")]
    Unrecognized(String),
}

/// True for an 11-character `[A-Za-z0-9_-]` id
pub fn is_video_id(value: &str) -> bool {
    value.len() == VIDEO_ID_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Return the video id from a raw id or a watch / youtu.be / shorts / embed URL
pub fn extract_video_id(input: &str) -> Result<String, VideoUrlError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(VideoUrlError::Empty);
    }
    if is_video_id(s) {
        return Ok(s.to_string());
    }

    let unrecognized = || VideoUrlError::Unrecognized(s.to_string());
    let (host, path) = split_url(s)
        .or_else(|| split_url(&format!("https://{s}")))
        .ok_or_else(unrecognized)?;

    if host == "youtu.be" {
        let seg = path.trim_start_matches('/').split('/').next().unwrap_or_default();
        if is_video_id(seg) {
            return Ok(seg.to_string());
        }
    }

    if host == "youtube.com" || host.ends_with(".youtube.com") {
        if path == "/watch" {
            if let Some(v) = query_param(s, "v").filter(|v| is_video_id(v)) {
                return Ok(v);
            }
        }
        if let Some(id) = path_video_id(&path) {
            return Ok(id);
        }
    }

    Err(unrecognized())
}

static PATH_ID_RE: OnceLock<Option<Regex>> = OnceLock::new();

fn path_video_id(path: &str) -> Option<String> {
    let re = PATH_ID_RE
        .get_or_init(|| Regex::new(r"^/(?:shorts|embed|live)/([A-Za-z0-9_-]{11})(?:[/?]|$)").ok())
        .as_ref()?;
    re.captures(path)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn query_param(url: &str, name: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    let query = query.split('#').next().unwrap_or_default();
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        if k == name {
            urlencoding::decode(v).ok().map(|v| v.into_owned())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "dQw4w9WgXcQ";

    #[test]
    fn test_raw_id() {
        assert_eq!(extract_video_id(ID).unwrap(), ID);
        assert_eq!(extract_video_id(&format!("  {ID} ")).unwrap(), ID);
    }

    #[test]
    fn test_url_shapes() {
        let urls = [
            format!("https://www.youtube.com/watch?v={ID}"),
            format!("https://www.youtube.com/watch?feature=share&v={ID}&t=42s"),
            format!("https://m.youtube.com/watch?v={ID}#comments"),
            format!("https://youtu.be/{ID}"),
            format!("https://youtu.be/{ID}?si=abc"),
            format!("https://www.youtube.com/shorts/{ID}"),
            format!("https://www.youtube.com/embed/{ID}?start=10"),
            format!("youtube.com/watch?v={ID}"),
            format!("youtu.be/{ID}"),
        ];
        for url in urls {
            assert_eq!(extract_video_id(&url).unwrap(), ID, "{url}");
        }
    }

    #[test]
    fn test_rejects_other_hosts_and_bad_ids() {
        assert!(extract_video_id(&format!("https://evil.example.com/watch?v={ID}")).is_err());
        assert!(extract_video_id("https://www.youtube.com/watch?v=short").is_err());
        assert!(extract_video_id("https://www.youtube.com/@channel").is_err());
        assert!(extract_video_id("hello world").is_err());
        assert_eq!(extract_video_id(""), Err(VideoUrlError::Empty));
    }

    #[test]
    fn test_is_video_id() {
        assert!(is_video_id("abc_DEF-123"));
        assert!(!is_video_id("abc_DEF-12"));
        assert!(!is_video_id("abc DEF-123"));
    }
}
