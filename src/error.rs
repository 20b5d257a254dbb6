//! Error types and input validation for the Reddit MCP server

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Application error taxonomy shared by the token manager, the dispatcher
/// and the tool handlers
#[derive(Debug, Error)]
pub enum AppError {
    /// Client credentials rejected, or a token still rejected after refresh
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Upstream returned 429; `retry_after` is the reported wait in seconds
    #[error("Rate limited by Reddit{}", retry_suffix(.retry_after))]
    RateLimit { retry_after: Option<u64> },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Reddit API returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn retry_suffix(retry_after: &Option<u64>) -> String {
    match retry_after {
        Some(secs) => format!(", retry after {} seconds", secs),
        None => String::new(),
    }
}

impl AppError {
    /// Get the error code for MCP responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Auth(_) => "auth_error",
            AppError::RateLimit { .. } => "rate_limited",
            AppError::Timeout(_) => "timeout",
            AppError::Validation(_) => "invalid_input",
            AppError::Upstream { .. } => "upstream_error",
            AppError::Network(_) => "network_error",
            AppError::Parse(_) => "parse_error",
            AppError::NotFound(_) => "not_found",
            AppError::Config(_) => "config_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Process exit code used in CLI mode
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Validation(_) | AppError::Config(_) => 1,
            AppError::Network(_)
            | AppError::Upstream { .. }
            | AppError::RateLimit { .. }
            | AppError::Parse(_) => 2,
            AppError::NotFound(_) => 3,
            AppError::Timeout(_) => 4,
            AppError::Auth(_) | AppError::Internal(_) => 5,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(err.to_string())
        } else if err.is_decode() {
            AppError::Parse(err.to_string())
        } else {
            AppError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Smallest and largest page size Reddit accepts for listings
pub const MIN_LIMIT: u32 = 1;
pub const MAX_LIMIT: u32 = 100;
pub const DEFAULT_LIMIT: u32 = 25;

/// Longest search query Reddit accepts
pub const MAX_QUERY_LEN: usize = 512;

/// Clamp a caller-supplied limit into the range Reddit accepts
pub fn clamp_limit(limit: Option<i64>) -> u32 {
    match limit {
        None => DEFAULT_LIMIT,
        Some(n) => n.clamp(MIN_LIMIT as i64, MAX_LIMIT as i64) as u32,
    }
}

fn subreddit_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]{2,21}$").expect("valid subreddit regex"))
}

fn username_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{3,20}$").expect("valid username regex"))
}

fn post_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9]{1,12}$").expect("valid post id regex"))
}

/// Validate a subreddit name, accepting `r/` and `/r/` prefixes
pub fn validate_subreddit(name: &str) -> Result<String, AppError> {
    let trimmed = name.trim();
    let bare = trimmed
        .strip_prefix("/r/")
        .or_else(|| trimmed.strip_prefix("r/"))
        .unwrap_or(trimmed)
        .trim_end_matches('/');

    if bare.is_empty() {
        return Err(AppError::Validation("Subreddit name is required".to_string()));
    }
    if !subreddit_pattern().is_match(bare) {
        return Err(AppError::Validation(format!(
            "Invalid subreddit name '{}': use 2-21 letters, digits or underscores",
            bare
        )));
    }

    Ok(bare.to_string())
}

/// Validate a username, accepting `u/` and `/u/` prefixes
pub fn validate_username(name: &str) -> Result<String, AppError> {
    let trimmed = name.trim();
    let bare = trimmed
        .strip_prefix("/u/")
        .or_else(|| trimmed.strip_prefix("u/"))
        .unwrap_or(trimmed);

    if bare.is_empty() {
        return Err(AppError::Validation("Username is required".to_string()));
    }
    if !username_pattern().is_match(bare) {
        return Err(AppError::Validation(format!("Invalid username '{}'", bare)));
    }

    Ok(bare.to_string())
}

/// Validate a post id, accepting the `t3_` fullname prefix
pub fn validate_post_id(id: &str) -> Result<String, AppError> {
    let trimmed = id.trim();
    let bare = trimmed.strip_prefix("t3_").unwrap_or(trimmed).to_ascii_lowercase();

    if bare.is_empty() {
        return Err(AppError::Validation("Post ID is required".to_string()));
    }
    if !post_id_pattern().is_match(&bare) {
        return Err(AppError::Validation(format!("Invalid post ID '{}'", bare)));
    }

    Ok(bare)
}

pub fn validate_query(query: &str) -> Result<String, AppError> {
    let normalized = normalize_text(query);

    if normalized.is_empty() {
        return Err(AppError::Validation("Search query is required".to_string()));
    }

    if normalized.chars().count() > MAX_QUERY_LEN {
        return Err(AppError::Validation(format!(
            "Query too long, maximum {} characters",
            MAX_QUERY_LEN
        )));
    }

    Ok(normalized)
}

/// Normalize text using Unicode NFKC
pub fn normalize_text(text: &str) -> String {
    use unicode_normalization::UnicodeNormalization;
    text.nfkc().collect::<String>().trim().to_string()
}
