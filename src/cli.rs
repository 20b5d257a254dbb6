//! CLI mode implementation
//!
//! The tool argument structs double as MCP input schemas (via schemars) and
//! as CLI subcommand arguments (via clap).

use crate::config::{default_token_cache_path, RedditConfig, DEFAULT_API_BASE_URL, DEFAULT_AUTH_URL};
use crate::error::AppError;
use clap::{Args, Parser, Subcommand, ValueEnum};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// mcp-reddit CLI
#[derive(Parser)]
#[command(name = "mcp-reddit")]
#[command(about = "Read-only Reddit tools, served over MCP stdio or run directly", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Run a single tool and exit; without a subcommand the MCP server starts on stdio
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output (no short flag to avoid conflicts)
    #[arg(long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Get posts from a subreddit
    Posts(SubredditPostsArgs),
    /// Search Reddit posts
    Search(SearchArgs),
    /// Get a user's profile
    User(UserProfileArgs),
    /// Get information about a subreddit
    Subreddit(SubredditInfoArgs),
    /// Get comments for a post
    Comments(PostCommentsArgs),
    /// List popular subreddits
    Trending(TrendingArgs),
    /// Find crossposts of a post
    Crossposts(CrossPostsArgs),
}

/// Reddit connection settings, read from flags or the environment
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Reddit application client id
    #[arg(long, env = "REDDIT_CLIENT_ID", global = true, hide_env_values = true)]
    pub client_id: Option<String>,

    /// Reddit application client secret
    #[arg(long, env = "REDDIT_CLIENT_SECRET", global = true, hide_env_values = true)]
    pub client_secret: Option<String>,

    /// User-Agent sent with every request
    #[arg(long, env = "REDDIT_USER_AGENT", global = true)]
    pub user_agent: Option<String>,

    /// Per-request HTTP timeout in seconds
    #[arg(long, env = "TIMEOUT_SECONDS", default_value_t = 30, global = true)]
    pub timeout_seconds: u64,

    /// How many times a timed-out request is re-sent
    #[arg(long, env = "REDDIT_TIMEOUT_RETRIES", default_value_t = 1, global = true)]
    pub timeout_retries: u32,

    /// Upper bound on one tool invocation in seconds
    #[arg(long, env = "REDDIT_TOOL_TIMEOUT_SECONDS", default_value_t = 120, global = true)]
    pub tool_timeout_seconds: u64,

    /// Refresh the bearer token this many seconds before it expires
    #[arg(long, env = "REDDIT_TOKEN_MARGIN_SECONDS", default_value_t = 60, global = true)]
    pub token_margin_seconds: u64,

    /// Keep the bearer token on disk between runs
    #[arg(long, env = "REDDIT_PERSIST_TOKEN", global = true)]
    pub persist_token: bool,

    /// Token file location (implies --persist-token)
    #[arg(long, env = "REDDIT_TOKEN_CACHE_PATH", global = true)]
    pub token_cache_path: Option<PathBuf>,

    /// OAuth token endpoint
    #[arg(long, env = "REDDIT_AUTH_URL", default_value = DEFAULT_AUTH_URL, global = true)]
    pub auth_url: String,

    /// Base URL of the authenticated API
    #[arg(long, env = "REDDIT_API_BASE_URL", default_value = DEFAULT_API_BASE_URL, global = true)]
    pub api_base_url: String,
}

impl ConnectionArgs {
    /// Resolve into a validated configuration
    pub fn into_config(self) -> Result<RedditConfig, AppError> {
        let mut config = RedditConfig::new(
            self.client_id.unwrap_or_default(),
            self.client_secret.unwrap_or_default(),
        );

        if let Some(user_agent) = self.user_agent.filter(|ua| !ua.trim().is_empty()) {
            config.user_agent = user_agent;
        }
        config.request_timeout = Duration::from_secs(self.timeout_seconds);
        config.timeout_retries = self.timeout_retries;
        config.tool_timeout = Duration::from_secs(self.tool_timeout_seconds);
        config.token_margin = Duration::from_secs(self.token_margin_seconds);
        config.token_cache_path = match self.token_cache_path {
            Some(path) => Some(path),
            None if self.persist_token => Some(default_token_cache_path()?),
            None => None,
        };
        config.auth_url = self.auth_url;
        config.api_base_url = self.api_base_url;

        config.validate()?;
        Ok(config)
    }
}

/// Listing order for subreddit posts
#[derive(ValueEnum, JsonSchema, Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostSort {
    #[default]
    Hot,
    New,
    Top,
    Rising,
    Controversial,
}

impl PostSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostSort::Hot => "hot",
            PostSort::New => "new",
            PostSort::Top => "top",
            PostSort::Rising => "rising",
            PostSort::Controversial => "controversial",
        }
    }
}

/// Time window for top/controversial listings and search
#[derive(ValueEnum, JsonSchema, Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimeFilter {
    Hour,
    Day,
    Week,
    Month,
    Year,
    #[default]
    All,
}

impl TimeFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFilter::Hour => "hour",
            TimeFilter::Day => "day",
            TimeFilter::Week => "week",
            TimeFilter::Month => "month",
            TimeFilter::Year => "year",
            TimeFilter::All => "all",
        }
    }
}

/// Result order for search
#[derive(ValueEnum, JsonSchema, Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchSort {
    #[default]
    Relevance,
    Hot,
    Top,
    New,
    Comments,
}

impl SearchSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchSort::Relevance => "relevance",
            SearchSort::Hot => "hot",
            SearchSort::Top => "top",
            SearchSort::New => "new",
            SearchSort::Comments => "comments",
        }
    }
}

/// Comment order; Reddit calls "best" `confidence`
#[derive(ValueEnum, JsonSchema, Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CommentSort {
    #[default]
    #[serde(alias = "confidence")]
    #[value(alias = "confidence")]
    Best,
    Top,
    New,
    Controversial,
    Old,
    Qa,
}

impl CommentSort {
    /// Name shown to users
    pub fn label(&self) -> &'static str {
        match self {
            CommentSort::Best => "best",
            other => other.as_str(),
        }
    }

    /// Value of the `sort` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentSort::Best => "confidence",
            CommentSort::Top => "top",
            CommentSort::New => "new",
            CommentSort::Controversial => "controversial",
            CommentSort::Old => "old",
            CommentSort::Qa => "qa",
        }
    }
}

/// get_subreddit_posts arguments
#[derive(Args, JsonSchema, Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct SubredditPostsArgs {
    /// Subreddit name (e.g. 'programming', 'AskReddit'); an r/ prefix is accepted
    #[arg(short = 'r', long)]
    pub subreddit: String,

    /// Sort order (default: hot)
    #[arg(short, long, value_enum)]
    #[serde(default)]
    pub sort: Option<PostSort>,

    /// Time window for top and controversial (default: all)
    #[arg(short, long, value_enum)]
    #[serde(default)]
    pub time: Option<TimeFilter>,

    /// Number of posts to fetch, 1-100 (default 25)
    #[arg(short, long, allow_negative_numbers = true)]
    #[serde(default)]
    pub limit: Option<i64>,
}

/// search_reddit arguments
#[derive(Args, JsonSchema, Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct SearchArgs {
    /// Search terms (e.g. 'machine learning', 'python tutorial')
    #[arg(short, long)]
    pub query: String,

    /// Limit the search to one subreddit
    #[arg(short = 'r', long)]
    #[serde(default)]
    pub subreddit: Option<String>,

    /// Result order (default: relevance)
    #[arg(short, long, value_enum)]
    #[serde(default)]
    pub sort: Option<SearchSort>,

    /// Time window (default: all)
    #[arg(short, long, value_enum)]
    #[serde(default)]
    pub time: Option<TimeFilter>,

    /// Number of results to fetch, 1-100 (default 25)
    #[arg(short, long, allow_negative_numbers = true)]
    #[serde(default)]
    pub limit: Option<i64>,
}

/// get_user_profile arguments
#[derive(Args, JsonSchema, Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct UserProfileArgs {
    /// Reddit username without the u/ prefix
    #[arg(short, long)]
    pub username: String,
}

/// get_subreddit_info arguments
#[derive(Args, JsonSchema, Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct SubredditInfoArgs {
    /// Subreddit name without the r/ prefix
    #[arg(short = 'r', long)]
    pub subreddit: String,
}

/// get_post_comments arguments
#[derive(Args, JsonSchema, Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct PostCommentsArgs {
    /// Reddit post ID, as found in post URLs (e.g. '1n1nlse')
    #[arg(short, long)]
    pub post_id: String,

    /// Comment order (default: best)
    #[arg(short, long, value_enum)]
    #[serde(default)]
    pub sort: Option<CommentSort>,

    /// Number of top-level comments to fetch, 1-100 (default 25)
    #[arg(short, long, allow_negative_numbers = true)]
    #[serde(default)]
    pub limit: Option<i64>,
}

/// get_trending_subreddits arguments
#[derive(Args, JsonSchema, Deserialize, Serialize, Clone, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct TrendingArgs {
    /// Number of subreddits to fetch, 1-100 (default 25)
    #[arg(short, long, allow_negative_numbers = true)]
    #[serde(default)]
    pub limit: Option<i64>,
}

/// get_cross_posts arguments
#[derive(Args, JsonSchema, Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct CrossPostsArgs {
    /// Reddit post ID to find crossposts for
    #[arg(short, long)]
    pub post_id: String,
}
