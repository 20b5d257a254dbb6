//! Runtime configuration for the Reddit connection
//!
//! Values arrive from the environment (optionally seeded from `.env`) or from
//! CLI flags; see `cli::ConnectionArgs`.

use crate::error::AppError;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_AUTH_URL: &str = "https://www.reddit.com/api/v1/access_token";
pub const DEFAULT_API_BASE_URL: &str = "https://oauth.reddit.com";
pub const DEFAULT_USER_AGENT: &str = concat!("mcp-reddit/", env!("CARGO_PKG_VERSION"));

/// Connection settings shared by the token manager and the dispatcher
#[derive(Clone)]
pub struct RedditConfig {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
    /// How many times a timed-out request is re-sent before giving up
    pub timeout_retries: u32,
    /// Upper bound on a whole tool invocation
    pub tool_timeout: Duration,
    /// Tokens are treated as expired this long before Reddit says they are
    pub token_margin: Duration,
    /// Where the bearer token is persisted between runs, if anywhere
    pub token_cache_path: Option<PathBuf>,
    pub auth_url: String,
    pub api_base_url: String,
}

impl RedditConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(30),
            timeout_retries: 1,
            tool_timeout: Duration::from_secs(120),
            token_margin: Duration::from_secs(60),
            token_cache_path: None,
            auth_url: DEFAULT_AUTH_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    /// Check that required values are present and URLs parse
    pub fn validate(&self) -> Result<(), AppError> {
        if self.client_id.trim().is_empty() {
            return Err(AppError::Config("REDDIT_CLIENT_ID is required".to_string()));
        }
        if self.client_secret.trim().is_empty() {
            return Err(AppError::Config("REDDIT_CLIENT_SECRET is required".to_string()));
        }
        if self.user_agent.trim().is_empty() {
            return Err(AppError::Config("REDDIT_USER_AGENT cannot be empty".to_string()));
        }
        for (name, value) in [("auth URL", &self.auth_url), ("API base URL", &self.api_base_url)] {
            let parsed = url::Url::parse(value)
                .map_err(|e| AppError::Config(format!("Invalid {} '{}': {}", name, value, e)))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(AppError::Config(format!(
                    "Invalid {} '{}': scheme must be http or https",
                    name, value
                )));
            }
        }
        if self.request_timeout.is_zero() || self.tool_timeout.is_zero() {
            return Err(AppError::Config("Timeouts must be greater than zero".to_string()));
        }
        Ok(())
    }
}

impl fmt::Debug for RedditConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedditConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .field("request_timeout", &self.request_timeout)
            .field("timeout_retries", &self.timeout_retries)
            .field("tool_timeout", &self.tool_timeout)
            .field("token_margin", &self.token_margin)
            .field("token_cache_path", &self.token_cache_path)
            .field("auth_url", &self.auth_url)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

/// Default location of the persisted token file
pub fn default_token_cache_path() -> Result<PathBuf, AppError> {
    let cache_dir = dirs::cache_dir()
        .ok_or_else(|| AppError::Config("Cannot determine cache directory".to_string()))?;

    Ok(cache_dir.join("mcp-reddit").join("token.json"))
}
