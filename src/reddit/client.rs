//! Authenticated request dispatch to oauth.reddit.com

use crate::config::RedditConfig;
use crate::error::AppError;
use crate::reddit::rate_limit::{retry_after_seconds, RateLimitInfo};
use crate::reddit::token::{Token, TokenManager};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Decoded JSON body plus the rate-limit state reported with it
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub data: Value,
    pub rate_limit: RateLimitInfo,
}

/// Read-only access to the Reddit API
#[async_trait]
pub trait RedditApi: Send + Sync {
    /// GET `endpoint` (a path such as `/r/rust/hot.json`) with query `params`
    async fn call(&self, endpoint: &str, params: &[(String, String)]) -> Result<ApiResponse, AppError>;
}

/// Dispatcher that authenticates with an application-only token
pub struct RedditClient {
    http: Client,
    tokens: Arc<TokenManager>,
    base_url: String,
    timeout_retries: u32,
}

impl RedditClient {
    pub fn new(config: &RedditConfig) -> Result<Self, AppError> {
        config.validate()?;
        let http = crate::http::build_client(config)?;
        let tokens = Arc::new(TokenManager::new(http.clone(), config));
        Ok(Self::with_tokens(http, tokens, config))
    }

    pub fn with_tokens(http: Client, tokens: Arc<TokenManager>, config: &RedditConfig) -> Self {
        Self {
            http,
            tokens,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            timeout_retries: config.timeout_retries,
        }
    }

    /// One GET: send, then read the whole body
    async fn fetch_once(
        &self,
        url: &str,
        params: &[(String, String)],
        token: &Token,
    ) -> Result<RawResponse, reqwest::Error> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&token.value)
            .query(params)
            .query(&[("raw_json", "1")])
            .send()
            .await?;

        let status = response.status();
        let rate_limit = RateLimitInfo::from_headers(response.headers());
        let retry_after = retry_after_seconds(response.headers());
        let body = response.text().await?;

        Ok(RawResponse {
            status,
            rate_limit,
            retry_after,
            body,
        })
    }

    /// Fetch once, fetching again only when the send or the body read timed out
    async fn fetch_with_retry(
        &self,
        url: &str,
        params: &[(String, String)],
        token: &Token,
    ) -> Result<RawResponse, AppError> {
        let mut attempt: u32 = 0;
        loop {
            match self.fetch_once(url, params, token).await {
                Ok(raw) => return Ok(raw),
                Err(e) if e.is_timeout() && attempt < self.timeout_retries => {
                    attempt += 1;
                    warn!(
                        "Request to {} timed out, retrying ({}/{})",
                        url, attempt, self.timeout_retries
                    );
                }
                Err(e) if e.is_timeout() => {
                    return Err(AppError::Timeout(format!(
                        "Request to {} timed out after {} attempt(s)",
                        url,
                        attempt + 1
                    )));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Status, rate-limit headers and body of one completed response
struct RawResponse {
    status: StatusCode,
    rate_limit: RateLimitInfo,
    retry_after: Option<u64>,
    body: String,
}

#[async_trait]
impl RedditApi for RedditClient {
    async fn call(&self, endpoint: &str, params: &[(String, String)]) -> Result<ApiResponse, AppError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut refreshed = false;

        loop {
            let token = self.tokens.get_token().await?;
            debug!("GET {} {:?}", url, params);

            let RawResponse {
                status,
                rate_limit,
                retry_after,
                body,
            } = self.fetch_with_retry(&url, params, &token).await?;

            if status == StatusCode::UNAUTHORIZED {
                if refreshed {
                    return Err(AppError::Auth(format!(
                        "Reddit rejected a freshly issued token for {}",
                        endpoint
                    )));
                }
                warn!("Reddit returned 401 for {}, refreshing token", endpoint);
                self.tokens.invalidate(&token).await;
                refreshed = true;
                continue;
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                warn!("Rate limited on {} (retry after {:?}s)", endpoint, retry_after);
                return Err(AppError::RateLimit { retry_after });
            }

            if !status.is_success() {
                return Err(AppError::Upstream {
                    status: status.as_u16(),
                    body,
                });
            }

            let data: Value = serde_json::from_str(&body)
                .map_err(|e| AppError::Parse(format!("Invalid JSON from {}: {}", endpoint, e)))?;

            debug!(
                "Received {} bytes from {} (rate limit: {:?} remaining, {:?} used, reset in {:?}s)",
                body.len(),
                endpoint,
                rate_limit.remaining_requests(),
                rate_limit.used,
                rate_limit.reset_seconds
            );

            return Ok(ApiResponse { data, rate_limit });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> RedditConfig {
        let mut config = RedditConfig::new("client-id", "client-secret");
        config.auth_url = format!("{}/api/v1/access_token", server.uri());
        config.api_base_url = server.uri();
        config.user_agent = "test-agent/1.0".to_string();
        config
    }

    async fn mount_token(server: &MockServer, value: &str, times: Option<u64>) {
        let mock = Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": value,
                "token_type": "bearer",
                "expires_in": 86400
            })));
        let mock = match times {
            Some(n) => mock.up_to_n_times(n),
            None => mock,
        };
        mock.mount(server).await;
    }

    fn listing() -> Value {
        json!({"kind": "Listing", "data": {"children": []}})
    }

    #[tokio::test]
    async fn test_attaches_auth_and_user_agent_and_reads_rate_limit() {
        let server = MockServer::start().await;
        mount_token(&server, "tok", None).await;
        Mock::given(method("GET"))
            .and(path("/r/rust/hot.json"))
            .and(header("authorization", "Bearer tok"))
            .and(header("user-agent", "test-agent/1.0"))
            .and(query_param("limit", "10"))
            .and(query_param("raw_json", "1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(listing())
                    .insert_header("x-ratelimit-remaining", "99.0")
                    .insert_header("x-ratelimit-reset", "120"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = RedditClient::new(&config_for(&server)).unwrap();
        let params = vec![("limit".to_string(), "10".to_string())];
        let response = client.call("/r/rust/hot.json", &params).await.unwrap();

        assert_eq!(response.data["kind"], "Listing");
        assert_eq!(response.rate_limit.remaining_requests(), Some(99));
        assert_eq!(response.rate_limit.reset_seconds, Some(120));
    }

    #[tokio::test]
    async fn test_401_refreshes_token_once_and_retries() {
        let server = MockServer::start().await;
        mount_token(&server, "stale", Some(1)).await;
        mount_token(&server, "fresh", None).await;

        Mock::given(method("GET"))
            .and(path("/r/rust/about.json"))
            .and(header("authorization", "Bearer stale"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/r/rust/about.json"))
            .and(header("authorization", "Bearer fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"kind": "t5", "data": {}})))
            .expect(1)
            .mount(&server)
            .await;

        let client = RedditClient::new(&config_for(&server)).unwrap();
        let response = client.call("/r/rust/about.json", &[]).await.unwrap();
        assert_eq!(response.data["kind"], "t5");

        let exchanges = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == "/api/v1/access_token")
            .count();
        assert_eq!(exchanges, 2);
    }

    #[tokio::test]
    async fn test_second_consecutive_401_is_auth_error() {
        let server = MockServer::start().await;
        mount_token(&server, "tok", None).await;
        Mock::given(method("GET"))
            .and(path("/r/rust/about.json"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;

        let client = RedditClient::new(&config_for(&server)).unwrap();
        let err = client.call("/r/rust/about.json", &[]).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_429_is_surfaced_without_retry() {
        let server = MockServer::start().await;
        mount_token(&server, "tok", None).await;
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "37"))
            .expect(1)
            .mount(&server)
            .await;

        let client = RedditClient::new(&config_for(&server)).unwrap();
        match client.call("/search.json", &[]).await {
            Err(AppError::RateLimit { retry_after }) => assert_eq!(retry_after, Some(37)),
            other => panic!("expected rate limit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_other_status_is_upstream_error_with_body() {
        let server = MockServer::start().await;
        mount_token(&server, "tok", None).await;
        Mock::given(method("GET"))
            .and(path("/user/ghost/about.json"))
            .respond_with(ResponseTemplate::new(404).set_body_string("{\"message\": \"Not Found\"}"))
            .mount(&server)
            .await;

        let client = RedditClient::new(&config_for(&server)).unwrap();
        match client.call("/user/ghost/about.json", &[]).await {
            Err(AppError::Upstream { status, body }) => {
                assert_eq!(status, 404);
                assert!(body.contains("Not Found"));
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_retried_once_then_surfaced() {
        let server = MockServer::start().await;
        mount_token(&server, "tok", None).await;
        Mock::given(method("GET"))
            .and(path("/r/slow/hot.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(listing())
                    .set_delay(Duration::from_secs(2)),
            )
            .expect(2)
            .mount(&server)
            .await;

        let mut config = config_for(&server);
        config.request_timeout = Duration::from_millis(200);
        let client = RedditClient::new(&config).unwrap();

        let err = client.call("/r/slow/hot.json", &[]).await.unwrap_err();
        assert!(matches!(err, AppError::Timeout(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_timeout_while_reading_body_is_retried() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let token_server = MockServer::start().await;
        mount_token(&token_server, "tok", None).await;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let api_addr = listener.local_addr().unwrap();
        let gets = Arc::new(AtomicUsize::new(0));
        let counter = gets.clone();

        tokio::spawn(async move {
            loop {
                let (mut socket, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => return,
                };
                let n = counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(read) => request.extend_from_slice(&buf[..read]),
                        }
                    }

                    let body = listing().to_string();
                    let head = format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                        body.len()
                    );
                    if n == 0 {
                        // Headers and the first byte, then stall past the client timeout
                        let _ = socket.write_all(head.as_bytes()).await;
                        let _ = socket.write_all(&body.as_bytes()[..1]).await;
                        let _ = socket.flush().await;
                        tokio::time::sleep(Duration::from_secs(3)).await;
                    } else {
                        let _ = socket.write_all(head.as_bytes()).await;
                        let _ = socket.write_all(body.as_bytes()).await;
                        let _ = socket.flush().await;
                    }
                });
            }
        });

        let mut config = config_for(&token_server);
        config.api_base_url = format!("http://{}", api_addr);
        config.request_timeout = Duration::from_millis(300);
        let client = RedditClient::new(&config).unwrap();

        let response = client.call("/r/stall/hot.json", &[]).await.unwrap();
        assert_eq!(response.data["kind"], "Listing");
        assert_eq!(gets.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_json_success_body_is_parse_error() {
        let server = MockServer::start().await;
        mount_token(&server, "tok", None).await;
        Mock::given(method("GET"))
            .and(path("/r/rust/hot.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let client = RedditClient::new(&config_for(&server)).unwrap();
        let err = client.call("/r/rust/hot.json", &[]).await.unwrap_err();
        assert!(matches!(err, AppError::Parse(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_bad_credentials_fail_before_api_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing()))
            .expect(0)
            .mount(&server)
            .await;

        let client = RedditClient::new(&config_for(&server)).unwrap();
        let err = client.call("/r/rust/hot.json", &[]).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
    }
}
