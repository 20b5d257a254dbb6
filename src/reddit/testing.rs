//! In-memory `RedditApi` for handler tests

use crate::error::AppError;
use crate::reddit::{ApiResponse, RateLimitInfo, RedditApi};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A recorded dispatcher call
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub endpoint: String,
    pub params: Vec<(String, String)>,
}

impl RecordedCall {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Replays canned responses in order and records every call
#[derive(Default)]
pub struct FakeApi {
    responses: Mutex<VecDeque<Result<ApiResponse, AppError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(data: Value) -> Self {
        let api = Self::new();
        api.push_json(data);
        api
    }

    pub fn push_json(&self, data: Value) {
        self.push(Ok(ApiResponse {
            data,
            rate_limit: RateLimitInfo {
                remaining: Some(596.0),
                used: Some(4),
                reset_seconds: Some(300),
            },
        }));
    }

    pub fn push(&self, response: Result<ApiResponse, AppError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RedditApi for FakeApi {
    async fn call(&self, endpoint: &str, params: &[(String, String)]) -> Result<ApiResponse, AppError> {
        self.calls.lock().unwrap().push(RecordedCall {
            endpoint: endpoint.to_string(),
            params: params.to_vec(),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::Internal("FakeApi has no canned response".to_string())))
    }
}

/// `{kind, data}` wrapper
pub fn thing(kind: &str, data: Value) -> Value {
    serde_json::json!({"kind": kind, "data": data})
}

/// A Listing holding `children`
pub fn listing(children: Vec<Value>) -> Value {
    thing("Listing", serde_json::json!({"children": children, "after": null}))
}

/// A `t3` child with the given title and score
pub fn post(id: &str, title: &str, score: i64) -> Value {
    thing(
        "t3",
        serde_json::json!({
            "id": id,
            "title": title,
            "author": "ferris",
            "subreddit": "rust",
            "score": score,
            "num_comments": 3,
            "created_utc": 1_700_000_000.0,
            "permalink": format!("/r/rust/comments/{}/", id),
            "url": format!("https://example.com/{}", id)
        }),
    )
}

/// A `t1` child with no replies
pub fn comment(author: &str, body: &str, score: i64) -> Value {
    thing(
        "t1",
        serde_json::json!({
            "author": author,
            "body": body,
            "score": score,
            "created_utc": 1_700_000_000.0,
            "replies": ""
        }),
    )
}
