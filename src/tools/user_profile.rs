//! Profile tool implementation
//!
//! Implements the `get_user_profile` MCP tool

use crate::cli::UserProfileArgs;
use crate::error::{validate_username, AppError};
use crate::mcp::ToolResult;
use crate::reddit::models::{Thing, User, KIND_ACCOUNT};
use crate::reddit::{RateLimitInfo, RedditApi};
use crate::tools::format::{format_user, success, summary, with_items};
use crate::tools::not_found_on_404;
use tracing::info;

pub const NAME: &str = "get_user_profile";

/// Execute get_user_profile (shared implementation for MCP and CLI)
pub async fn execute_user_profile(
    api: &dyn RedditApi,
    args: UserProfileArgs,
) -> Result<ToolResult, AppError> {
    let username = validate_username(&args.username)?;

    info!("Profile request for u/{}", username);

    let not_found = || format!("User '{}' not found", username);
    let response = api
        .call(&format!("/user/{}/about.json", username), &[])
        .await
        .map_err(|e| not_found_on_404(e, not_found))?;

    let thing = Thing::from_value(&response.data)?;
    let is_empty = thing.data.as_object().map_or(true, |o| o.is_empty());
    if thing.kind != KIND_ACCOUNT || is_empty {
        return Err(AppError::NotFound(not_found()));
    }
    let user: User = thing.parse()?;

    info!("Profile request completed for u/{}", username);

    Ok(ToolResult::text(format_user_profile(
        &username,
        &user,
        &response.rate_limit,
    )))
}

pub fn format_user_profile(username: &str, user: &User, rate_limit: &RateLimitInfo) -> String {
    let line = summary(&format!("**Profile for u/{}**", username), 1, "profile", rate_limit);
    success(
        &format!("Successfully retrieved profile for u/{}", username),
        &with_items(&line, &[format_user(user)]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reddit::testing::{listing, thing, FakeApi};
    use serde_json::json;

    fn args(username: &str) -> UserProfileArgs {
        UserProfileArgs {
            username: username.to_string(),
        }
    }

    #[tokio::test]
    async fn test_profile_rendered() {
        let api = FakeApi::with_json(thing(
            "t2",
            json!({
                "name": "spez",
                "link_karma": 180_000,
                "comment_karma": 750_000,
                "created_utc": 1_118_030_400.0,
                "is_mod": true,
                "has_verified_email": true
            }),
        ));

        let result = execute_user_profile(&api, args("u/spez")).await.unwrap();
        let text = &result.content[0].text;

        assert_eq!(api.calls()[0].endpoint, "/user/spez/about.json");
        assert!(text.starts_with("**Success**: Successfully retrieved profile for u/spez\n\n**Profile for u/spez**"));
        assert!(text.contains("**Karma**: Elite: 930,000 (Post: 180,000 | Comment: 750,000)"));
        assert!(text.contains("**Member since**: 2005-06-06"));
        assert!(text.contains("Moderator | Verified"));
    }

    #[tokio::test]
    async fn test_missing_user_is_not_found() {
        let api = FakeApi::new();
        api.push(Err(AppError::Upstream {
            status: 404,
            body: "{\"message\": \"Not Found\", \"error\": 404}".to_string(),
        }));
        let err = execute_user_profile(&api, args("ghost_user")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m.contains("ghost_user")));
    }

    #[tokio::test]
    async fn test_unexpected_kind_is_not_found() {
        let api = FakeApi::with_json(listing(vec![]));
        let err = execute_user_profile(&api, args("someone")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let api = FakeApi::with_json(thing("t2", json!({})));
        let err = execute_user_profile(&api, args("someone")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_invalid_username_rejected() {
        let api = FakeApi::new();
        let err = execute_user_profile(&api, args("a")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(api.calls().is_empty());
    }
}
