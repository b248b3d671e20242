mod cli;
mod sse;
mod stdio;
mod tools;

pub use cli::App;

use crate::prelude::*;
use serde::{Deserialize, Serialize};

// JSON-RPC 2.0 types
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    id: Option<serde_json::Value>,
    method: String,
    params: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    jsonrpc: String,
    id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

// MCP Protocol types
#[derive(Debug, Serialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// State shared by every request the server handles
///
/// One quota budgeter lives here for the lifetime of the process, so all
/// concurrent tool calls draw from the same budget.
#[derive(Debug, Clone)]
pub struct Server {
    global: crate::Global,
    youtube: crate::youtube::Context,
}

impl Server {
    pub fn new(global: crate::Global) -> std::result::Result<Self, Error> {
        let youtube = crate::youtube::Context::from_global(&global)?;
        Ok(Self { global, youtube })
    }

    pub fn verbose(&self) -> bool {
        self.global.verbose
    }
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let server = Server::new(global)?;

    match app.command {
        cli::Commands::Stdio => stdio::run_stdio(server).await,
        cli::Commands::Sse(options) => sse::run_sse(options, server).await,
    }
}

/// Handle one JSON-RPC message. Notifications get no response.
pub async fn handle_request(request_str: &str, server: &Server) -> Option<JsonRpcResponse> {
    let request: JsonRpcRequest = match serde_json::from_str(request_str) {
        Ok(req) => req,
        Err(e) => {
            return Some(JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id: None,
                result: None,
                error: Some(JsonRpcError {
                    code: -32700,
                    message: format!("Parse error: {e}"),
                    data: None,
                }),
            });
        }
    };

    if request.id.is_none() && request.method.starts_with("notifications/") {
        log::debug!("Ignoring notification {}", request.method);
        return None;
    }

    let result = match request.method.as_str() {
        "initialize" => tools::handle_initialize(),
        "ping" => Ok(serde_json::json!({})),
        "tools/list" => tools::handle_tools_list(),
        "tools/call" => tools::handle_tools_call(request.params, server).await,
        method => Err(JsonRpcError {
            code: -32601,
            message: format!("Method not found: {method}"),
            data: None,
        }),
    };

    Some(match result {
        Ok(value) => JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            id: request.id,
            result: Some(value),
            error: None,
        },
        Err(error) => JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            id: request.id,
            result: None,
            error: Some(error),
        },
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::config::PeriodMode;

    pub fn global() -> crate::Global {
        crate::Global {
            quota_ceiling: 10_000,
            quota_period: PeriodMode::Session,
            http_timeout_secs: 10,
            max_attempts: 4,
            call_deadline_secs: 60,
            estimation_policy: ytmcp_core::quota::EstimationPolicy::PageRounded,
            verbose: false,
        }
    }

    pub fn server() -> Server {
        Server::new(global()).unwrap()
    }
}
