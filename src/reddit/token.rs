//! Application-only OAuth for the Reddit API
//!
//! Exchanges the client id/secret for a bearer token using the
//! client-credentials grant and caches it until shortly before it expires.

use crate::config::RedditConfig;
use crate::error::AppError;
use crate::reddit::rate_limit::retry_after_seconds;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Device id sent with the client-credentials grant
const DEVICE_ID: &str = "mcp_reddit_server";

/// Lifetime assumed when Reddit omits `expires_in`
const DEFAULT_EXPIRES_IN: i64 = 3600;

/// Bearer token with its absolute expiry
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    /// Whether the token may still be used at `now`, keeping `margin` in reserve
    pub fn is_usable_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        now < self.expires_at - margin
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Response from the access_token endpoint
#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
    /// Reddit reports some credential failures with a 200 and this field set
    error: Option<Value>,
}

#[derive(Default)]
struct TokenState {
    token: Option<Token>,
    disk_checked: bool,
}

/// Owns the single cached bearer token
pub struct TokenManager {
    http: Client,
    auth_url: String,
    client_id: String,
    client_secret: String,
    margin: Duration,
    cache_path: Option<PathBuf>,
    state: Mutex<TokenState>,
}

impl TokenManager {
    pub fn new(http: Client, config: &RedditConfig) -> Self {
        Self {
            http,
            auth_url: config.auth_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            margin: Duration::from_std(config.token_margin).unwrap_or_else(|_| Duration::zero()),
            cache_path: config.token_cache_path.clone(),
            state: Mutex::new(TokenState::default()),
        }
    }

    /// Return the cached token, exchanging credentials for a new one if it
    /// is missing or inside the expiry margin
    ///
    /// The state lock is held across the exchange so concurrent callers
    /// wait for one exchange instead of starting their own.
    pub async fn get_token(&self) -> Result<Token, AppError> {
        let mut state = self.state.lock().await;

        if !state.disk_checked {
            state.disk_checked = true;
            if let Some(path) = &self.cache_path {
                match load_token(path) {
                    Ok(Some(token)) => {
                        debug!("Loaded cached token from {}", path.display());
                        state.token = Some(token);
                    }
                    Ok(None) => {}
                    Err(e) => warn!("Ignoring unreadable token cache {}: {}", path.display(), e),
                }
            }
        }

        if let Some(token) = &state.token {
            if token.is_usable_at(Utc::now(), self.margin) {
                return Ok(token.clone());
            }
            debug!("Cached token expires at {}, refreshing", token.expires_at);
        }

        let token = self.exchange().await?;

        if let Some(path) = &self.cache_path {
            if let Err(e) = save_token(path, &token) {
                warn!("Failed to persist token to {}: {}", path.display(), e);
            }
        }

        state.token = Some(token.clone());
        Ok(token)
    }

    /// Drop the cached token if it is still the one that was rejected
    pub async fn invalidate(&self, rejected: &Token) {
        let mut state = self.state.lock().await;
        if state.token.as_ref().map(|t| t.value == rejected.value).unwrap_or(false) {
            debug!("Invalidating rejected token");
            state.token = None;
        }
    }

    async fn exchange(&self) -> Result<Token, AppError> {
        info!("Requesting application token from {}", self.auth_url);

        let response = self
            .http
            .post(&self.auth_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials"), ("device_id", DEVICE_ID)])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AppError::Auth(format!(
                "Reddit rejected the client credentials (HTTP {})",
                status.as_u16()
            )));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::RateLimit {
                retry_after: retry_after_seconds(response.headers()),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let body: AccessTokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Parse(format!("Failed to decode token response: {}", e)))?;

        if let Some(error) = body.error {
            let reason = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
            return Err(AppError::Auth(format!("Token request rejected: {}", reason)));
        }

        let value = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Auth("Token response did not include an access_token".to_string()))?;
        let expires_in = body.expires_in.unwrap_or(DEFAULT_EXPIRES_IN);

        debug!("Obtained application token valid for {} seconds", expires_in);

        Ok(Token {
            value,
            expires_at: Utc::now() + Duration::seconds(expires_in),
        })
    }
}

/// Read a persisted token; a missing file is not an error
pub fn load_token(path: &Path) -> Result<Option<Token>, AppError> {
    if !path.exists() {
        return Ok(None);
    }

    let data = fs::read_to_string(path)?;
    let token: Token = serde_json::from_str(&data)?;
    Ok(Some(token))
}

/// Write a token with user-only permissions
pub fn save_token(path: &Path, token: &Token) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let data = serde_json::to_string_pretty(token)?;
    fs::write(path, data)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(path, perms)?;
    }

    Ok(())
}
