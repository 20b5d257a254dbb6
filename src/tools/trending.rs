//! Popular subreddits tool
//!
//! Implements the `get_trending_subreddits` MCP tool

use crate::cli::TrendingArgs;
use crate::error::{clamp_limit, AppError};
use crate::mcp::ToolResult;
use crate::reddit::models::{Listing, Subreddit, KIND_SUBREDDIT};
use crate::reddit::{RateLimitInfo, RedditApi};
use crate::tools::format::{format_subreddit, success, summary, with_items};
use tracing::info;

pub const NAME: &str = "get_trending_subreddits";

/// Execute get_trending_subreddits (shared implementation for MCP and CLI)
pub async fn execute_trending(api: &dyn RedditApi, args: TrendingArgs) -> Result<ToolResult, AppError> {
    let limit = clamp_limit(args.limit);

    info!("Trending subreddits request (limit {})", limit);

    let params = vec![("limit".to_string(), limit.to_string())];
    let response = api.call("/subreddits/popular.json", &params).await?;
    let subreddits: Vec<Subreddit> = Listing::from_value(&response.data)?.items(KIND_SUBREDDIT)?;

    info!("Trending subreddits request completed: {} subreddits", subreddits.len());

    Ok(ToolResult::text(format_trending(&subreddits, &response.rate_limit)))
}

pub fn format_trending(subreddits: &[Subreddit], rate_limit: &RateLimitInfo) -> String {
    if subreddits.is_empty() {
        return success("No trending subreddits found", "");
    }

    let line = summary(
        &format!("**Found {} trending subreddits**", subreddits.len()),
        subreddits.len(),
        "subreddits",
        rate_limit,
    );
    let items: Vec<String> = subreddits.iter().map(format_subreddit).collect();

    success(
        "Successfully retrieved trending subreddits",
        &with_items(&line, &items),
    )
}
