//! Reddit API access: OAuth token lifecycle, request dispatch, response models

pub mod client;
pub mod models;
pub mod rate_limit;
pub mod token;

#[cfg(test)]
pub mod testing;

pub use client::{ApiResponse, RedditApi, RedditClient};
pub use rate_limit::RateLimitInfo;
