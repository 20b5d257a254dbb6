//! Crosspost lookup tool
//!
//! Implements the `get_cross_posts` MCP tool using `/duplicates/{id}.json`,
//! which returns the original post followed by the posts sharing its link.

use crate::cli::CrossPostsArgs;
use crate::error::{validate_post_id, AppError};
use crate::mcp::ToolResult;
use crate::reddit::models::{Post, KIND_LINK};
use crate::reddit::{RateLimitInfo, RedditApi};
use crate::tools::format::{format_post, success, summary, with_items};
use crate::tools::not_found_on_404;
use crate::tools::post_comments::second_listing;
use tracing::info;

pub const NAME: &str = "get_cross_posts";

/// Execute get_cross_posts (shared implementation for MCP and CLI)
pub async fn execute_cross_posts(api: &dyn RedditApi, args: CrossPostsArgs) -> Result<ToolResult, AppError> {
    let post_id = validate_post_id(&args.post_id)?;

    info!("Cross posts request for post {}", post_id);

    let response = api
        .call(&format!("/duplicates/{}.json", post_id), &[])
        .await
        .map_err(|e| not_found_on_404(e, || format!("Post '{}' not found", post_id)))?;

    let posts: Vec<Post> = second_listing(&response.data, &post_id)?.items(KIND_LINK)?;

    info!("Cross posts request completed: {} cross posts for {}", posts.len(), post_id);

    Ok(ToolResult::text(format_cross_posts(&post_id, &posts, &response.rate_limit)))
}

pub fn format_cross_posts(post_id: &str, posts: &[Post], rate_limit: &RateLimitInfo) -> String {
    if posts.is_empty() {
        return success(&format!("No cross posts found for post {}", post_id), "");
    }

    let line = summary(
        &format!("**Found {} cross posts** for post {}", posts.len(), post_id),
        posts.len(),
        "cross posts",
        rate_limit,
    );
    let items: Vec<String> = posts.iter().map(format_post).collect();

    success(
        &format!("Successfully retrieved cross posts for post {}", post_id),
        &with_items(&line, &items),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reddit::testing::{listing, post, FakeApi};
    use serde_json::json;

    #[tokio::test]
    async fn test_lists_duplicates_not_original() {
        let api = FakeApi::with_json(json!([
            listing(vec![post("orig1", "Original link", 900)]),
            listing(vec![post("dup1", "Shared in r/programming", 45), post("dup2", "Shared again", 3)])
        ]));

        let result = execute_cross_posts(&api, CrossPostsArgs { post_id: "orig1".to_string() })
            .await
            .unwrap();
        let text = &result.content[0].text;

        assert_eq!(api.calls()[0].endpoint, "/duplicates/orig1.json");
        assert!(text.contains("**Found 2 cross posts** for post orig1"));
        assert!(text.contains("Shared in r/programming"));
        assert!(!text.contains("Original link"));
    }

    #[tokio::test]
    async fn test_no_cross_posts() {
        let api = FakeApi::with_json(json!([listing(vec![post("solo", "Solo", 1)]), listing(vec![])]));
        let result = execute_cross_posts(&api, CrossPostsArgs { post_id: "solo".to_string() })
            .await
            .unwrap();
        assert_eq!(result.content[0].text, "**Success**: No cross posts found for post solo");
    }

    #[tokio::test]
    async fn test_unknown_post_is_not_found() {
        let api = FakeApi::new();
        api.push(Err(AppError::Upstream { status: 404, body: String::new() }));
        let err = execute_cross_posts(&api, CrossPostsArgs { post_id: "zzz".to_string() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
