//! Comment thread tool
//!
//! Implements the `get_post_comments` MCP tool. Reddit answers
//! `/comments/{id}.json` with two listings: the post itself, then the
//! top-level comments with their reply trees inlined.

use crate::cli::{CommentSort, PostCommentsArgs};
use crate::error::{clamp_limit, validate_post_id, AppError};
use crate::mcp::ToolResult;
use crate::reddit::models::{Comment, Listing, KIND_COMMENT};
use crate::reddit::{RateLimitInfo, RedditApi};
use crate::tools::format::{format_comment, success, summary, with_items};
use crate::tools::not_found_on_404;
use serde_json::Value;
use tracing::info;

pub const NAME: &str = "get_post_comments";

/// Execute get_post_comments (shared implementation for MCP and CLI)
pub async fn execute_post_comments(
    api: &dyn RedditApi,
    args: PostCommentsArgs,
) -> Result<ToolResult, AppError> {
    let post_id = validate_post_id(&args.post_id)?;
    let sort = args.sort.unwrap_or_default();
    let limit = clamp_limit(args.limit);

    info!("Comments request for post {} ({})", post_id, sort.label());

    let params = vec![
        ("sort".to_string(), sort.as_str().to_string()),
        ("limit".to_string(), limit.to_string()),
    ];
    let response = api
        .call(&format!("/comments/{}.json", post_id), &params)
        .await
        .map_err(|e| not_found_on_404(e, || format!("Post '{}' not found", post_id)))?;

    let comments: Vec<Comment> = second_listing(&response.data, &post_id)?.items(KIND_COMMENT)?;

    info!("Comments request completed: {} comments for post {}", comments.len(), post_id);

    Ok(ToolResult::text(format_post_comments(
        &post_id,
        sort,
        &comments,
        &response.rate_limit,
    )))
}

/// The second element of a `[post listing, other listing]` pair
pub(crate) fn second_listing(data: &Value, post_id: &str) -> Result<Listing, AppError> {
    match data.as_array().and_then(|pair| pair.get(1)) {
        Some(value) => Listing::from_value(value),
        None => Err(AppError::Parse(format!(
            "Expected a post and a comment listing for post {}",
            post_id
        ))),
    }
}

pub fn format_post_comments(
    post_id: &str,
    sort: CommentSort,
    comments: &[Comment],
    rate_limit: &RateLimitInfo,
) -> String {
    if comments.is_empty() {
        return success(&format!("No comments found for post {}", post_id), "");
    }

    let line = summary(
        &format!(
            "**Found {} comments** for post {} (sorted by {})",
            comments.len(),
            post_id,
            sort.label()
        ),
        comments.len(),
        "comments",
        rate_limit,
    );
    let items: Vec<String> = comments.iter().map(|c| format_comment(c, 0)).collect();

    success(
        &format!("Successfully retrieved comments for post {}", post_id),
        &with_items(&line, &items),
    )
}
