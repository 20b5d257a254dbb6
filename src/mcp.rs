//! MCP (Model Context Protocol) handling module
//!
//! This module implements the JSON-RPC 2.0 protocol for MCP communication.

use crate::reddit::RedditApi;
use crate::tools;
use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader as AsyncBufReader};
use tracing::{debug, error, info, warn};

/// Protocol revision assumed when the client does not name one
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i64 = -32700;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// Server context for tracking client information
#[derive(Clone)]
pub struct ServerContext {
    pub client_info: Option<ClientInfo>,
    pub api: Arc<dyn RedditApi>,
    pub tool_timeout: Duration,
}

impl ServerContext {
    pub fn new(api: Arc<dyn RedditApi>, tool_timeout: Duration) -> Self {
        Self {
            client_info: None,
            api,
            tool_timeout,
        }
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
    #[allow(dead_code)]
    #[serde(default)]
    pub jsonrpc: String,
    /// `None` only when the member is absent; `"id": null` is `Some(Value::Null)`
    #[serde(default, deserialize_with = "present_id")]
    pub id: Option<Value>,
    pub method: String,
    pub params: Option<Value>,
}

fn present_id<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Initialize request parameters
#[derive(Debug, Deserialize)]
pub struct InitializeParams {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: Option<String>,
    #[serde(rename = "clientInfo")]
    pub client_info: Option<ClientInfo>,
}

/// Client information
#[derive(Debug, Deserialize, Clone)]
pub struct ClientInfo {
    pub name: Option<String>,
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
    pub code: i64,
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// MCP Tool result
#[derive(Debug, Serialize)]
pub struct ToolResult {
    pub content: Vec<ContentItem>,
    #[serde(rename = "isError", skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
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
    pub fn error(id: Option<Value>, code: i64, message: &str) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(McpError {
                code,
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
            is_error: false,
        }
    }

    /// Create a failed result the client should show to the model
    pub fn error(item: ContentItem) -> Self {
        Self {
            content: vec![item],
            is_error: true,
        }
    }
}

impl ContentItem {
    /// Helper to create plain text content
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            r#type: "text".to_string(),
            text: content.into(),
            metadata: None,
        }
    }

    /// Text content with machine-readable details attached
    pub fn with_metadata(content: impl Into<String>, metadata: Value) -> Self {
        Self {
            metadata: Some(metadata),
            ..Self::text(content)
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
pub async fn handle_stdio(mut context: ServerContext) -> Result<()> {
    info!("Starting mcp-reddit MCP server on stdio");

    let stdin = tokio::io::stdin();
    let mut reader = AsyncBufReader::new(stdin).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = reader.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        debug!("Received request: {}", line);

        let Some(response) = process_line(&line, &mut context).await else {
            continue;
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

/// Handle one protocol line; notifications produce no response
pub async fn process_line(line: &str, context: &mut ServerContext) -> Option<McpResponse> {
    match parse_request(line) {
        Ok(request) => handle_request(request, context).await,
        Err(e) => {
            error!("Failed to parse request: {}", e);
            Some(McpResponse::error(
                None,
                PARSE_ERROR,
                &format!("Invalid JSON: {}", e),
            ))
        }
    }
}

/// Handle a single MCP request
async fn handle_request(request: McpRequest, context: &mut ServerContext) -> Option<McpResponse> {
    if request.id.is_none() {
        debug!("Notification: {}", request.method);
        return None;
    }

    let response = match request.method.as_str() {
        "initialize" => handle_initialize(request, context),
        "ping" => McpResponse::success(request.id, serde_json::json!({})),
        "tools/list" => handle_tools_list(request),
        "tools/call" => handle_tool_call(request, context).await,
        _ => McpResponse::error(
            request.id,
            METHOD_NOT_FOUND,
            &format!("Method '{}' not found", request.method),
        ),
    };
    Some(response)
}

/// Handle tools/call method
async fn handle_tool_call(request: McpRequest, context: &ServerContext) -> McpResponse {
    let args: ToolCallArgs = match serde_json::from_value(request.params.unwrap_or_default()) {
        Ok(args) => args,
        Err(e) => {
            return McpResponse::error(
                request.id,
                INVALID_PARAMS,
                &format!("Invalid parameters: {}", e),
            )
        }
    };

    if !tools::is_known_tool(&args.name) {
        return McpResponse::error(
            request.id,
            INVALID_PARAMS,
            &format!("Tool '{}' not found", args.name),
        );
    }

    info!("Tool call {} from {}", args.name, context.get_client_name());

    let outcome = tools::run_with_timeout(
        context.tool_timeout,
        &args.name,
        tools::execute(context.api.as_ref(), &args.name, args.arguments),
    )
    .await;

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            warn!("Tool {} failed: {}", args.name, e);
            tools::failure_result(&args.name, &e)
        }
    };

    match serde_json::to_value(result) {
        Ok(value) => McpResponse::success(request.id, value),
        Err(e) => McpResponse::error(
            request.id,
            INTERNAL_ERROR,
            &format!("Failed to encode tool result: {}", e),
        ),
    }
}

/// Handle tools/list method
fn handle_tools_list(request: McpRequest) -> McpResponse {
    let tools = build_tools_array();

    McpResponse::success(request.id, serde_json::json!({ "tools": tools }))
}

/// Handle initialize method
fn handle_initialize(request: McpRequest, context: &mut ServerContext) -> McpResponse {
    let mut protocol_version = DEFAULT_PROTOCOL_VERSION.to_string();

    if let Some(params) = request.params {
        if let Ok(init_params) = serde_json::from_value::<InitializeParams>(params) {
            if let Some(version) = init_params.protocol_version {
                protocol_version = version;
            }
            context.client_info = init_params.client_info;
        }
    }

    info!(
        "Client connected: {} {}",
        context.get_client_name(),
        context
            .client_info
            .as_ref()
            .and_then(|c| c.version.as_deref())
            .unwrap_or("")
    );

    let result = serde_json::json!({
        "protocolVersion": protocol_version,
        "serverInfo": {
            "name": "mcp-reddit",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "capabilities": {
            "tools": { "listChanged": false }
        }
    });
    McpResponse::success(request.id, result)
}

/// Input schema for a tool argument struct, with every subschema inlined
fn input_schema<T: schemars::JsonSchema>() -> Value {
    use schemars::gen::SchemaSettings;

    let generator = SchemaSettings::draft07()
        .with(|s| {
            s.inline_subschemas = true;
            s.option_add_null_type = false;
        })
        .into_generator();
    let mut schema = serde_json::to_value(generator.into_root_schema_for::<T>()).unwrap_or_default();
    if let Some(object) = schema.as_object_mut() {
        object.remove("$schema");
        object.remove("definitions");
    }
    schema
}

/// Build the tools array returned from tools/list
fn build_tools_array() -> Value {
    use crate::cli::{
        CrossPostsArgs, PostCommentsArgs, SearchArgs, SubredditInfoArgs, SubredditPostsArgs, TrendingArgs,
        UserProfileArgs,
    };

    serde_json::json!([
        {
            "name": tools::subreddit_posts::NAME,
            "description": "Get posts from a subreddit. Sort by hot, new, top, rising or controversial; top and controversial accept a time window. Returns title, author, score, comment count, date and link for each post.",
            "inputSchema": input_schema::<SubredditPostsArgs>()
        },
        {
            "name": tools::search::NAME,
            "description": "Search Reddit posts across the whole site or within one subreddit. Returns title, author, subreddit, score and link for each result.",
            "inputSchema": input_schema::<SearchArgs>()
        },
        {
            "name": tools::user_profile::NAME,
            "description": "Get a Reddit user's public profile: karma, account age, gold and moderator status, and profile link.",
            "inputSchema": input_schema::<UserProfileArgs>()
        },
        {
            "name": tools::subreddit_info::NAME,
            "description": "Get information about a subreddit: description, subscribers, active users, creation date, NSFW status and URL.",
            "inputSchema": input_schema::<SubredditInfoArgs>()
        },
        {
            "name": tools::post_comments::NAME,
            "description": "Get comments for a Reddit post, with up to three replies per comment. Post IDs appear in post URLs after /comments/.",
            "inputSchema": input_schema::<PostCommentsArgs>()
        },
        {
            "name": tools::trending::NAME,
            "description": "List currently popular subreddits with subscribers, description and URL.",
            "inputSchema": input_schema::<TrendingArgs>()
        },
        {
            "name": tools::cross_posts::NAME,
            "description": "Find crossposts of a Reddit post: other posts sharing the same link, with title, author, subreddit, score and link.",
            "inputSchema": input_schema::<CrossPostsArgs>()
        }
    ])
}
