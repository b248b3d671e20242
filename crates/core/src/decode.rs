//! Response body decoding
//!
//! Bodies are decompressed when either the `Content-Encoding` header says gzip
//! or the payload starts with the gzip magic bytes, then parsed as JSON. A body
//! that cannot be decoded is an error, never an empty result.

use std::io::Read;

use flate2::read::GzDecoder;
use serde_json::Value;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("gzip decompression failed: {0}")]
    Gzip(String),

    #[error("body is not valid JSON: {0}")]
    Json(String),

    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Returns true when the header or the leading bytes indicate gzip
pub fn is_gzip(content_encoding: Option<&str>, body: &[u8]) -> bool {
    let header = content_encoding
        .map(|v| {
            v.split(',')
                .any(|enc| enc.trim().eq_ignore_ascii_case("gzip"))
        })
        .unwrap_or(false);
    header || body.starts_with(&GZIP_MAGIC)
}

/// Decompress the body if needed; plain bodies are returned as-is
pub fn decompress(content_encoding: Option<&str>, body: &[u8]) -> Result<Vec<u8>, DecodeError> {
    if !is_gzip(content_encoding, body) {
        return Ok(body.to_vec());
    }
    // Some transports decompress already and leave the header in place.
    if !body.starts_with(&GZIP_MAGIC) {
        return Ok(body.to_vec());
    }

    let mut out = Vec::new();
    GzDecoder::new(body)
        .read_to_end(&mut out)
        .map_err(|e| DecodeError::Gzip(e.to_string()))?;
    Ok(out)
}

/// Decompress and parse a successful response body into a JSON object
pub fn decode_body(content_encoding: Option<&str>, body: &[u8]) -> Result<Value, DecodeError> {
    let bytes = decompress(content_encoding, body)?;
    let value: Value =
        serde_json::from_slice(&bytes).map_err(|e| DecodeError::Json(e.to_string()))?;

    match value {
        Value::Object(_) => Ok(value),
        Value::Array(_) => Err(DecodeError::NotAnObject("array")),
        Value::Null => Err(DecodeError::NotAnObject("null")),
        Value::Bool(_) => Err(DecodeError::NotAnObject("boolean")),
        Value::Number(_) => Err(DecodeError::NotAnObject("number")),
        Value::String(_) => Err(DecodeError::NotAnObject("string")),
    }
}

/// Reason and message extracted from an upstream error body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpstreamErrorInfo {
    pub reason: Option<String>,
    pub message: Option<String>,
}

/// Parse `{"error": {"message": .., "errors": [{"reason": ..}]}}`
///
/// Anything that does not match yields an empty [`UpstreamErrorInfo`].
pub fn parse_error_body(content_encoding: Option<&str>, body: &[u8]) -> UpstreamErrorInfo {
    let Ok(value) = decode_body(content_encoding, body) else {
        return UpstreamErrorInfo::default();
    };
    let Some(error) = value.get("error") else {
        return UpstreamErrorInfo::default();
    };

    let reason = error
        .get("errors")
        .and_then(|errs| errs.get(0))
        .and_then(|first| first.get("reason"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string);

    UpstreamErrorInfo { reason, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use serde_json::json;
    use std::io::Write;

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_gzip_body_decodes_like_plain_body() {
        let payload = json!({
            "kind": "youtube#videoListResponse",
            "items": [{"id": "dQw4w9WgXcQ"}],
            "nextPageToken": "CAUQAA"
        });
        let plain = serde_json::to_vec(&payload).unwrap();
        let compressed = gzip(&plain);

        let from_plain = decode_body(None, &plain).unwrap();
        let from_header = decode_body(Some("gzip"), &compressed).unwrap();
        let from_magic = decode_body(None, &compressed).unwrap();

        assert_eq!(from_plain, payload);
        assert_eq!(from_header, payload);
        assert_eq!(from_magic, payload);
    }

    #[test]
    fn test_header_without_compressed_body_is_tolerated() {
        let body = br#"{"items": []}"#;
        assert_eq!(decode_body(Some("gzip"), body).unwrap(), json!({"items": []}));
    }

    #[test]
    fn test_is_gzip_header_variants() {
        assert!(is_gzip(Some("GZIP"), b"{}"));
        assert!(is_gzip(Some("identity, gzip"), b"{}"));
        assert!(!is_gzip(Some("br"), b"{}"));
        assert!(!is_gzip(None, b"{}"));
    }

    #[test]
    fn test_corrupt_gzip_is_an_error() {
        let mut bytes = gzip(br#"{"a":1}"#);
        bytes.truncate(12);
        assert!(matches!(
            decode_body(None, &bytes),
            Err(DecodeError::Gzip(_))
        ));
    }

    #[test]
    fn test_malformed_json_is_an_error_not_empty() {
        assert!(matches!(
            decode_body(None, b"<html>oops</html>"),
            Err(DecodeError::Json(_))
        ));
        assert!(matches!(decode_body(None, b""), Err(DecodeError::Json(_))));
    }

    #[test]
    fn test_non_object_is_an_error() {
        assert_eq!(
            decode_body(None, b"[1,2]"),
            Err(DecodeError::NotAnObject("array"))
        );
        assert_eq!(
            decode_body(None, b"null"),
            Err(DecodeError::NotAnObject("null"))
        );
    }

    #[test]
    fn test_parse_error_body() {
        let body = json!({
            "error": {
                "code": 403,
                "message": "The video identified by the videoId parameter has disabled comments.",
                "errors": [{"reason": "commentsDisabled", "domain": "youtube.commentThread"}]
            }
        });
        let info = parse_error_body(None, &serde_json::to_vec(&body).unwrap());
        assert_eq!(info.reason.as_deref(), Some("commentsDisabled"));
        assert!(info.message.unwrap().contains("disabled comments"));
    }

    #[test]
    fn test_parse_error_body_gzip_and_garbage() {
        let body = gzip(br#"{"error":{"errors":[{"reason":"quotaExceeded"}]}}"#);
        assert_eq!(
            parse_error_body(Some("gzip"), &body).reason.as_deref(),
            Some("quotaExceeded")
        );
        assert_eq!(
            parse_error_body(None, b"Service Unavailable"),
            UpstreamErrorInfo::default()
        );
    }
}
