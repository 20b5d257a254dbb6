//! Subreddit listing tool
//!
//! Implements the `get_subreddit_posts` MCP tool

use crate::cli::{PostSort, SubredditPostsArgs};
use crate::error::{clamp_limit, validate_subreddit, AppError};
use crate::mcp::ToolResult;
use crate::reddit::models::{Listing, Post, KIND_LINK};
use crate::reddit::{RateLimitInfo, RedditApi};
use crate::tools::format::{format_post, success, summary, with_items};
use crate::tools::not_found_on_404;
use tracing::info;

pub const NAME: &str = "get_subreddit_posts";

/// Execute get_subreddit_posts (shared implementation for MCP and CLI)
pub async fn execute_subreddit_posts(
    api: &dyn RedditApi,
    args: SubredditPostsArgs,
) -> Result<ToolResult, AppError> {
    let subreddit = validate_subreddit(&args.subreddit)?;
    let sort = args.sort.unwrap_or_default();
    let time = args.time.unwrap_or_default();
    let limit = clamp_limit(args.limit);

    info!("Subreddit posts request: r/{} ({}, limit {})", subreddit, sort.as_str(), limit);

    let endpoint = format!("/r/{}/{}.json", subreddit, sort.as_str());
    let params = vec![
        ("limit".to_string(), limit.to_string()),
        ("t".to_string(), time.as_str().to_string()),
    ];

    let response = api
        .call(&endpoint, &params)
        .await
        .map_err(|e| not_found_on_404(e, || format!("Subreddit 'r/{}' not found", subreddit)))?;

    let posts: Vec<Post> = Listing::from_value(&response.data)?.items(KIND_LINK)?;

    info!("Subreddit posts request completed: {} posts from r/{}", posts.len(), subreddit);

    Ok(ToolResult::text(format_subreddit_posts(
        &subreddit,
        sort,
        &posts,
        &response.rate_limit,
    )))
}

pub fn format_subreddit_posts(
    subreddit: &str,
    sort: PostSort,
    posts: &[Post],
    rate_limit: &RateLimitInfo,
) -> String {
    if posts.is_empty() {
        return success(&format!("No posts found in r/{}", subreddit), "");
    }

    let line = summary(
        &format!(
            "**Found {} posts** in r/{} (sorted by {})",
            posts.len(),
            subreddit,
            sort.as_str()
        ),
        posts.len(),
        "posts",
        rate_limit,
    );
    let items: Vec<String> = posts.iter().map(format_post).collect();

    success(
        &format!("Successfully retrieved posts from r/{}", subreddit),
        &with_items(&line, &items),
    )
}
