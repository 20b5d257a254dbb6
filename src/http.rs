//! HTTP client utilities
//!
//! Provides the reqwest::Client shared by the token manager and the API
//! dispatcher. Proxy settings (HTTP_PROXY, HTTPS_PROXY, NO_PROXY and the
//! lowercase forms) are picked up by reqwest from the environment.

use crate::config::RedditConfig;
use crate::error::AppError;
use reqwest::Client;

/// Build a reqwest Client carrying the configured timeout and User-Agent
pub fn build_client(config: &RedditConfig) -> Result<Client, AppError> {
    Client::builder()
        .timeout(config.request_timeout)
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))
}
