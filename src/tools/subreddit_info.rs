//! Subreddit about tool
//!
//! Implements the `get_subreddit_info` MCP tool

use crate::cli::SubredditInfoArgs;
use crate::error::{validate_subreddit, AppError};
use crate::mcp::ToolResult;
use crate::reddit::models::{Subreddit, Thing, KIND_SUBREDDIT};
use crate::reddit::{RateLimitInfo, RedditApi};
use crate::tools::format::{format_subreddit, success, summary, with_items};
use crate::tools::not_found_on_404;
use tracing::info;

pub const NAME: &str = "get_subreddit_info";

/// Execute get_subreddit_info (shared implementation for MCP and CLI)
pub async fn execute_subreddit_info(
    api: &dyn RedditApi,
    args: SubredditInfoArgs,
) -> Result<ToolResult, AppError> {
    let subreddit = validate_subreddit(&args.subreddit)?;

    info!("Subreddit info request for r/{}", subreddit);

    let not_found = || format!("Subreddit 'r/{}' not found", subreddit);
    let response = api
        .call(&format!("/r/{}/about.json", subreddit), &[])
        .await
        .map_err(|e| not_found_on_404(e, not_found))?;

    // Unknown names come back as a search Listing rather than a t5
    let thing = Thing::from_value(&response.data)?;
    if thing.kind != KIND_SUBREDDIT {
        return Err(AppError::NotFound(not_found()));
    }
    let about: Subreddit = thing.parse()?;

    info!("Subreddit info request completed for r/{}", subreddit);

    Ok(ToolResult::text(format_subreddit_info(
        &subreddit,
        &about,
        &response.rate_limit,
    )))
}

pub fn format_subreddit_info(subreddit: &str, about: &Subreddit, rate_limit: &RateLimitInfo) -> String {
    let line = summary(
        &format!("**Subreddit info for r/{}**", subreddit),
        1,
        "subreddit",
        rate_limit,
    );
    success(
        &format!("Successfully retrieved info for r/{}", subreddit),
        &with_items(&line, &[format_subreddit(about)]),
    )
}
