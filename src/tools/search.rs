//! Search tool implementation
//!
//! Implements the `search_reddit` MCP tool, site-wide or restricted to one
//! subreddit

use crate::cli::SearchArgs;
use crate::error::{clamp_limit, validate_query, validate_subreddit, AppError};
use crate::mcp::ToolResult;
use crate::reddit::models::{Listing, Post, KIND_LINK};
use crate::reddit::{RateLimitInfo, RedditApi};
use crate::tools::format::{format_post, success, summary, with_items};
use tracing::{debug, info};

pub const NAME: &str = "search_reddit";

/// Execute search_reddit (shared implementation for MCP and CLI)
pub async fn execute_search(api: &dyn RedditApi, args: SearchArgs) -> Result<ToolResult, AppError> {
    let query = validate_query(&args.query)?;
    let subreddit = args
        .subreddit
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(validate_subreddit)
        .transpose()?;
    let sort = args.sort.unwrap_or_default();
    let time = args.time.unwrap_or_default();
    let limit = clamp_limit(args.limit);

    info!(
        "Search request: '{}' in {}",
        query,
        subreddit.as_deref().map_or("all of Reddit".to_string(), |s| format!("r/{}", s))
    );

    let endpoint = match &subreddit {
        Some(sub) => format!("/r/{}/search.json", sub),
        None => "/search.json".to_string(),
    };
    let mut params = vec![
        ("q".to_string(), query.clone()),
        ("sort".to_string(), sort.as_str().to_string()),
        ("t".to_string(), time.as_str().to_string()),
        ("limit".to_string(), limit.to_string()),
    ];
    if subreddit.is_some() {
        params.push(("restrict_sr".to_string(), "true".to_string()));
    }
    debug!("Search params: {:?}", params);

    let response = api.call(&endpoint, &params).await?;
    let posts: Vec<Post> = Listing::from_value(&response.data)?.items(KIND_LINK)?;

    info!("Search request completed: {} results", posts.len());

    Ok(ToolResult::text(format_search_results(
        &query,
        subreddit.as_deref(),
        &posts,
        &response.rate_limit,
    )))
}

pub fn format_search_results(
    query: &str,
    subreddit: Option<&str>,
    posts: &[Post],
    rate_limit: &RateLimitInfo,
) -> String {
    if posts.is_empty() {
        let scope = subreddit.map(|s| format!(" in r/{}", s)).unwrap_or_default();
        return success(&format!("No results found for '{}'{}", query, scope), "");
    }

    let scope = match subreddit {
        Some(s) => format!(" in r/{}", s),
        None => " across Reddit".to_string(),
    };
    let line = summary(
        &format!("**Found {} results** for '{}'{}", posts.len(), query, scope),
        posts.len(),
        "results",
        rate_limit,
    );
    let items: Vec<String> = posts.iter().map(format_post).collect();

    success(
        &format!("Search completed for '{}'", query),
        &with_items(&line, &items),
    )
}
