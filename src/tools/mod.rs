//! MCP tools implementation
//!
//! Each tool module exposes an `execute_*` function shared by MCP and CLI
//! modes and a pure `format_*` function turning decoded records into text.

pub mod cross_posts;
pub mod format;
pub mod post_comments;
pub mod search;
pub mod subreddit_info;
pub mod subreddit_posts;
pub mod trending;
pub mod user_profile;

use crate::error::AppError;
use crate::mcp::{ContentItem, ToolResult};
use crate::reddit::RedditApi;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;

/// Tool names in the order `tools/list` reports them
pub const TOOL_NAMES: [&str; 7] = [
    subreddit_posts::NAME,
    search::NAME,
    user_profile::NAME,
    subreddit_info::NAME,
    post_comments::NAME,
    trending::NAME,
    cross_posts::NAME,
];

pub fn is_known_tool(name: &str) -> bool {
    TOOL_NAMES.contains(&name)
}

/// Decode tool arguments; a missing object is treated as `{}`
pub fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, AppError> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args).map_err(|e| AppError::Validation(format!("Invalid arguments: {}", e)))
}

/// Run the named tool against `api`
pub async fn execute(api: &dyn RedditApi, name: &str, args: Value) -> Result<ToolResult, AppError> {
    match name {
        subreddit_posts::NAME => subreddit_posts::execute_subreddit_posts(api, parse_args(args)?).await,
        search::NAME => search::execute_search(api, parse_args(args)?).await,
        user_profile::NAME => user_profile::execute_user_profile(api, parse_args(args)?).await,
        subreddit_info::NAME => subreddit_info::execute_subreddit_info(api, parse_args(args)?).await,
        post_comments::NAME => post_comments::execute_post_comments(api, parse_args(args)?).await,
        trending::NAME => trending::execute_trending(api, parse_args(args)?).await,
        cross_posts::NAME => cross_posts::execute_cross_posts(api, parse_args(args)?).await,
        _ => Err(AppError::Validation(format!("Unknown tool: {}", name))),
    }
}

/// Bound a whole tool invocation, token exchange and retries included
pub async fn run_with_timeout<F>(limit: Duration, name: &str, fut: F) -> Result<ToolResult, AppError>
where
    F: Future<Output = Result<ToolResult, AppError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout(format!(
            "{} exceeded {} second timeout",
            name,
            limit.as_secs()
        ))),
    }
}

fn failure_headline(name: &str) -> &'static str {
    match name {
        subreddit_posts::NAME => "Failed to get subreddit posts",
        search::NAME => "Failed to search Reddit",
        user_profile::NAME => "Failed to get user profile",
        subreddit_info::NAME => "Failed to get subreddit info",
        post_comments::NAME => "Failed to get post comments",
        trending::NAME => "Failed to get trending subreddits",
        cross_posts::NAME => "Failed to get cross posts",
        _ => "Tool execution failed",
    }
}

/// Error result reported to the MCP client for a failed tool call
pub fn failure_result(name: &str, err: &AppError) -> ToolResult {
    let mut metadata = json!({ "code": err.error_code() });
    if let AppError::RateLimit {
        retry_after: Some(secs),
    } = err
    {
        metadata["retryAfter"] = json!(secs);
    }

    ToolResult::error(ContentItem::with_metadata(
        format::error_text(failure_headline(name), &err.message()),
        metadata,
    ))
}

/// Reddit answers 404 for unknown users, posts and banned subreddits
pub(crate) fn not_found_on_404(err: AppError, message: impl FnOnce() -> String) -> AppError {
    match err {
        AppError::Upstream { status: 404, .. } => AppError::NotFound(message()),
        other => other,
    }
}
