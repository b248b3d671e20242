mod youtube;

use serde::{Deserialize, Serialize};
use serde_json::json;
use ytmcp_core::error::ToolError;

use crate::prelude::{eprintln, Error};

// Re-export types needed by tool handlers
pub use super::{JsonRpcError, Server, Tool};

// MCP Protocol types for tools
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct ServerCapabilities {
    pub tools: Option<ToolsCapability>,
}

#[derive(Debug, Serialize)]
pub struct ToolsCapability {}

#[derive(Debug, Serialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

#[derive(Debug, Serialize)]
pub struct ToolsList {
    pub tools: Vec<Tool>,
}

#[derive(Debug, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    pub arguments: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct CallToolResult {
    pub content: Vec<Content>,
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum Content {
    #[serde(rename = "text")]
    Text { text: String },
}

pub fn handle_initialize() -> Result<serde_json::Value, JsonRpcError> {
    let result = InitializeResult {
        protocol_version: "2024-11-05".to_string(),
        capabilities: ServerCapabilities {
            tools: Some(ToolsCapability {}),
        },
        server_info: ServerInfo {
            name: "ytmcp".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    };

    serde_json::to_value(result).map_err(internal_error)
}

pub fn handle_tools_list() -> Result<serde_json::Value, JsonRpcError> {
    let result = ToolsList {
        tools: youtube::tools(),
    };

    serde_json::to_value(result).map_err(internal_error)
}

pub async fn handle_tools_call(
    params: Option<serde_json::Value>,
    server: &Server,
) -> Result<serde_json::Value, JsonRpcError> {
    let params: CallToolParams = serde_json::from_value(params.unwrap_or(serde_json::Value::Null))
        .map_err(|e| JsonRpcError {
            code: -32602,
            message: format!("Invalid params: {e}"),
            data: None,
        })?;

    if server.verbose() {
        eprintln!("Calling {}: {:?}", params.name, params.arguments);
    }

    match params.name.as_str() {
        youtube::QUOTA_STATUS => youtube::handle_quota_status(&server.youtube),
        name if youtube::is_api_tool(name) => {
            let api = server.youtube.gateway().map_err(config_error)?;
            youtube::dispatch(name, params.arguments, &api).await
        }
        _ => Err(JsonRpcError {
            code: -32602,
            message: format!("Unknown tool: {}", params.name),
            data: None,
        }),
    }
}

/// Deserialize tool arguments; a missing object counts as empty
pub fn parse_arguments<T: serde::de::DeserializeOwned>(
    arguments: Option<serde_json::Value>,
) -> Result<T, JsonRpcError> {
    let arguments = match arguments {
        None | Some(serde_json::Value::Null) => json!({}),
        Some(value) => value,
    };

    serde_json::from_value(arguments).map_err(|e| JsonRpcError {
        code: -32602,
        message: format!("Invalid arguments: {e}"),
        data: Some(json!({ "reason": "invalid_argument" })),
    })
}

/// Wrap a tool output in the MCP result format
pub fn to_call_result<T: Serialize>(output: &T) -> Result<serde_json::Value, JsonRpcError> {
    let json_string = serde_json::to_string_pretty(output).map_err(|e| JsonRpcError {
        code: -32603,
        message: format!("Serialization error: {e}"),
        data: None,
    })?;

    let result = CallToolResult {
        content: vec![Content::Text { text: json_string }],
        is_error: None,
    };

    serde_json::to_value(result).map_err(internal_error)
}

/// JSON-RPC error for a failed tool call
///
/// `data.reason` is the stable code; `status` and `upstreamReason` are added
/// when the upstream answered.
pub fn tool_error(err: ToolError) -> JsonRpcError {
    let code = match err {
        ToolError::InvalidArgument(_) => -32602,
        _ => -32603,
    };

    let mut data = json!({ "reason": err.reason() });
    if let ToolError::Api(api) = &err {
        if let Some(status) = api.status() {
            data["status"] = json!(status);
        }
        if let Some(reason) = api.upstream_reason() {
            data["upstreamReason"] = json!(reason);
        }
    }

    JsonRpcError {
        code,
        message: format!("Tool execution error: {err}"),
        data: Some(data),
    }
}

pub fn config_error(err: Error) -> JsonRpcError {
    JsonRpcError {
        code: -32603,
        message: format!("Configuration error: {err}"),
        data: Some(json!({ "reason": err.reason() })),
    }
}

fn internal_error(e: serde_json::Error) -> JsonRpcError {
    JsonRpcError {
        code: -32603,
        message: format!("Internal error: {e}"),
        data: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::testing;
    use ytmcp_core::error::ApiError;

    #[test]
    fn test_tools_list_names() {
        let value = handle_tools_list().unwrap();
        let names: Vec<&str> = value["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();

        assert_eq!(
            names,
            vec![
                "resolve_youtube_channel",
                "list_youtube_channel_videos",
                "search_youtube_channel_videos",
                "list_youtube_channel_playlists",
                "list_youtube_playlist_videos",
                "list_youtube_video_comments",
                "get_yt_video_info",
                "youtube_quota_status",
            ]
        );
    }

    #[test]
    fn test_paginated_tools_accept_both_cursor_names() {
        let value = handle_tools_list().unwrap();
        for tool in value["tools"].as_array().unwrap() {
            let properties = &tool["inputSchema"]["properties"];
            assert!(properties.get("api_key").is_none());
            assert_eq!(
                properties.get("page_token").is_some(),
                properties.get("next_page_token").is_some(),
                "{}",
                tool["name"]
            );
        }
    }

    #[test]
    fn test_upstream_error_data() {
        let err = tool_error(ToolError::Api(ApiError::Upstream {
            endpoint: "commentThreads".to_string(),
            status: 404,
            reason: Some("videoNotFound".to_string()),
            message: None,
        }));

        assert_eq!(err.code, -32603);
        let data = err.data.unwrap();
        assert_eq!(data["reason"], "upstream_error");
        assert_eq!(data["status"], 404);
        assert_eq!(data["upstreamReason"], "videoNotFound");
    }

    #[test]
    fn test_invalid_argument_maps_to_invalid_params() {
        let err = tool_error(ToolError::invalid("max_videos must be positive"));
        assert_eq!(err.code, -32602);
        assert_eq!(err.data.unwrap()["reason"], "invalid_argument");
    }

    #[test]
    fn test_missing_key_reason() {
        let err = config_error(Error::MissingApiKey);
        assert_eq!(err.data.unwrap()["reason"], "missing_api_key");
        assert!(err.message.contains("YOUTUBE_API_KEY"));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let err = handle_tools_call(
            Some(json!({"name": "youtube_captions", "arguments": {}})),
            &testing::server(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, -32602);
        assert!(err.message.contains("youtube_captions"));
    }
}
