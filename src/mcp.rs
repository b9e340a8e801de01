//! MCP (Model Context Protocol) handling module
//!
//! This module implements the JSON-RPC 2.0 protocol for MCP communication.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader as AsyncBufReader};
use tracing::{debug, error, info};

/// Server context for tracking client information
#[derive(Clone, Default)]
pub struct ServerContext {
    pub client_info: Option<ClientInfo>,
}

impl ServerContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_client_name(&self) -> String {
        self.client_info
            .as_ref()
            .and_then(|info| info.name.as_ref())
            .cloned()
            .unwrap_or_else(|| "Unknown Client".to_string())
    }
}

/// MCP JSON-RPC 2.0 request structure
#[derive(Debug, Deserialize)]
pub struct McpRequest {
    /// JSON-RPC version field - required by the protocol but not accessed in code
    #[allow(dead_code)]
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    pub params: Option<Value>,
}

/// Initialize request parameters
#[derive(Debug, Deserialize)]
pub struct InitializeParams {
    #[serde(rename = "clientInfo")]
    pub client_info: Option<ClientInfo>,
}

/// Client information
#[derive(Debug, Deserialize, Clone)]
pub struct ClientInfo {
    pub name: Option<String>,
    #[allow(dead_code)]
    pub version: Option<String>,
}

/// MCP JSON-RPC 2.0 response structure
#[derive(Debug, Serialize)]
pub struct McpResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
}

/// MCP Error structure
#[derive(Debug, Serialize)]
pub struct McpError {
    pub code: String,
    pub message: String,
}

/// MCP Tool call arguments
#[derive(Debug, Deserialize)]
pub struct ToolCallArgs {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// MCP Content item
#[derive(Debug, Serialize)]
pub struct ContentItem {
    pub r#type: String,
    pub text: String,
}

/// MCP Tool result
#[derive(Debug, Serialize)]
pub struct ToolResult {
    pub content: Vec<ContentItem>,
}

impl McpResponse {
    /// Create a successful response
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Option<Value>, code: &str, message: &str) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(McpError {
                code: code.to_string(),
                message: message.to_string(),
            }),
        }
    }
}

impl ToolResult {
    /// Create a text result
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem::text(content)],
        }
    }
}

impl ContentItem {
    /// Helper to create plain text content
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            r#type: "text".to_string(),
            text: content.into(),
        }
    }
}

/// Parse MCP request from JSON string
pub fn parse_request(json: &str) -> Result<McpRequest> {
    let request: McpRequest = serde_json::from_str(json)?;
    Ok(request)
}

/// Serialize MCP response to JSON string
pub fn serialize_response(response: &McpResponse) -> Result<String> {
    Ok(serde_json::to_string(response)?)
}

/// Handle stdio MCP communication
pub async fn handle_stdio() -> Result<()> {
    info!("Starting polysearch MCP server on stdio");

    let stdin = tokio::io::stdin();
    let mut reader = AsyncBufReader::new(stdin).lines();
    let mut stdout = tokio::io::stdout();

    let mut context = ServerContext::new();

    while let Some(line) = reader.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        debug!("Received request: {}", line);

        let response = match parse_request(&line) {
            Ok(request) if is_notification(&request) => {
                debug!("Notification '{}' needs no reply", request.method);
                continue;
            }
            Ok(request) => handle_request(request, &mut context).await,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                McpResponse::error(None, "parse_error", &format!("Invalid JSON: {}", e))
            }
        };

        let response_json = serialize_response(&response)?;
        debug!("Sending response: {}", response_json);

        stdout.write_all(response_json.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    info!("stdin closed, shutting down");
    Ok(())
}

/// Notifications carry no id and must not be answered
fn is_notification(request: &McpRequest) -> bool {
    request.id.is_none() && request.method.starts_with("notifications/")
}

/// Handle a single MCP request
async fn handle_request(request: McpRequest, context: &mut ServerContext) -> McpResponse {
    match request.method.as_str() {
        "initialize" => handle_initialize(request, context).await,
        "ping" => McpResponse::success(request.id, serde_json::json!({})),
        "tools/call" => handle_tool_call(request, context).await,
        "tools/list" => handle_tools_list(request).await,
        _ => McpResponse::error(
            request.id,
            "method_not_found",
            &format!("Method '{}' not found", request.method),
        ),
    }
}

/// Handle tools/call method
async fn handle_tool_call(request: McpRequest, context: &ServerContext) -> McpResponse {
    let args: ToolCallArgs = match serde_json::from_value(request.params.unwrap_or_default()) {
        Ok(args) => args,
        Err(e) => {
            return McpResponse::error(
                request.id.clone(),
                "invalid_params",
                &format!("Invalid parameters: {}", e),
            )
        }
    };

    debug!("Tool call '{}' from {}", args.name, context.get_client_name());

    match args.name.as_str() {
        "search" => crate::tools::search::handle_search(request.id, args.arguments).await,
        _ => McpResponse::error(
            request.id,
            "tool_not_found",
            &format!("Tool '{}' not found", args.name),
        ),
    }
}

/// Handle tools/list method
async fn handle_tools_list(request: McpRequest) -> McpResponse {
    let tools = build_tools_array();

    McpResponse::success(request.id, serde_json::json!({ "tools": tools }))
}

/// Handle initialize method
async fn handle_initialize(request: McpRequest, context: &mut ServerContext) -> McpResponse {
    if let Some(params) = request.params {
        if let Ok(init_params) = serde_json::from_value::<InitializeParams>(params) {
            context.client_info = init_params.client_info;
            info!("Client connected: {}", context.get_client_name());
        }
    }

    let tools = build_tools_array();
    let result = serde_json::json!({
        "serverInfo": {
            "name": "polysearch",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "capabilities": {
            "tools": { "list": true, "call": true }
        },
        "tools": tools
    });
    McpResponse::success(request.id, result)
}

/// Build the tools array returned from tools/list and initialize
fn build_tools_array() -> serde_json::Value {
    use crate::cli::SearchArgs;
    use schemars::schema_for;

    // Generate the JSON schema from the CLI argument struct
    let search_schema = schema_for!(SearchArgs);

    serde_json::json!([
        {
            "name": "search",
            "description": "Search a collection of records with fuzzy, semantic, location, wildcard and regex matching, fused into one ranked list",
            "inputSchema": search_schema
        }
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(id: i64, method: &str, params: Option<Value>) -> McpRequest {
        McpRequest {
            jsonrpc: "2.0".into(),
            id: Some(json!(id)),
            method: method.into(),
            params,
        }
    }

    #[tokio::test]
    async fn test_initialize_response_contains_fields() {
        let req = request(
            1,
            "initialize",
            Some(json!({ "clientInfo": { "name": "inspector", "version": "1.0" } })),
        );
        let mut context = ServerContext::new();
        let resp = handle_request(req, &mut context).await;
        assert!(resp.error.is_none());
        let result = resp.result.expect("result present");
        assert_eq!(
            result
                .get("serverInfo")
                .and_then(|v| v.get("name"))
                .and_then(|v| v.as_str()),
            Some("polysearch")
        );
        assert_eq!(
            result
                .get("capabilities")
                .and_then(|v| v.get("tools"))
                .and_then(|v| v.get("list"))
                .and_then(|v| v.as_bool()),
            Some(true)
        );
        assert!(result.get("tools").and_then(|v| v.as_array()).is_some());
        assert_eq!(context.get_client_name(), "inspector");
    }

    #[tokio::test]
    async fn test_tools_list_contains_search() {
        let mut context = ServerContext::new();
        let resp = handle_request(request(2, "tools/list", None), &mut context).await;
        assert!(resp.error.is_none());
        let result = resp.result.expect("result present");
        let tools = result
            .get("tools")
            .and_then(|v| v.as_array())
            .expect("tools array");
        let names: Vec<&str> = tools
            .iter()
            .filter_map(|t| t.get("name").and_then(|n| n.as_str()))
            .collect();
        assert_eq!(names, vec!["search"]);
        assert!(tools[0]["inputSchema"]["properties"].get("query").is_some());
    }

    #[tokio::test]
    async fn test_tools_call_runs_search() {
        let mut context = ServerContext::new();
        let params = json!({
            "name": "search",
            "arguments": {
                "query": "arjun",
                "records": [{ "name": "Arjun Institute" }, { "name": "Beta University" }],
                "format": "json",
                "config": "/nonexistent/polysearch/config.json"
            }
        });
        let resp = handle_request(request(3, "tools/call", Some(params)), &mut context).await;
        assert!(resp.error.is_none());

        let result = resp.result.expect("result present");
        let text = result["content"][0]["text"].as_str().expect("text content");
        let response: Value = serde_json::from_str(text).unwrap();
        assert_eq!(response["success"], json!(true));
        assert_eq!(response["results"][0]["record"]["name"], json!("Arjun Institute"));
    }

    #[tokio::test]
    async fn test_unknown_tool_and_method() {
        let mut context = ServerContext::new();
        let resp = handle_request(
            request(4, "tools/call", Some(json!({ "name": "profile", "arguments": {} }))),
            &mut context,
        )
        .await;
        assert_eq!(resp.error.expect("error").code, "tool_not_found");

        let resp = handle_request(request(5, "resources/list", None), &mut context).await;
        assert_eq!(resp.error.expect("error").code, "method_not_found");
    }

    #[tokio::test]
    async fn test_ping_and_notifications() {
        let mut context = ServerContext::new();
        let resp = handle_request(request(6, "ping", None), &mut context).await;
        assert!(resp.error.is_none());
        assert_eq!(resp.result, Some(json!({})));

        let initialized =
            parse_request(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        assert!(is_notification(&initialized));
        assert!(!is_notification(&request(7, "notifications/initialized", None)));
        assert!(!is_notification(&request(8, "tools/list", None)));
    }

    #[test]
    fn test_parse_and_serialize() {
        let req = parse_request(r#"{"jsonrpc":"2.0","id":9,"method":"tools/list"}"#).unwrap();
        assert_eq!(req.method, "tools/list");
        assert!(parse_request("{").is_err());

        let json = serialize_response(&McpResponse::error(Some(json!(9)), "x", "y")).unwrap();
        assert!(json.contains("\"error\""));
        assert!(!json.contains("\"result\""));
    }
}
