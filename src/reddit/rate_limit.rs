//! Rate-limit header parsing
//!
//! Reddit reports its budget on every response through `X-Ratelimit-*`
//! headers and sends `Retry-After` alongside 429 responses.

use reqwest::header::{HeaderMap, RETRY_AFTER};

const REMAINING: &str = "x-ratelimit-remaining";
const USED: &str = "x-ratelimit-used";
const RESET: &str = "x-ratelimit-reset";

/// Rate-limit state observed on a single response
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RateLimitInfo {
    /// Requests left in the current window (Reddit sends this as a float)
    pub remaining: Option<f64>,
    pub used: Option<u64>,
    /// Seconds until the window resets
    pub reset_seconds: Option<u64>,
}

impl RateLimitInfo {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            remaining: header_f64(headers, REMAINING),
            used: header_seconds(headers, USED),
            reset_seconds: header_seconds(headers, RESET),
        }
    }

    /// Whole requests remaining, if Reddit reported it
    pub fn remaining_requests(&self) -> Option<u64> {
        self.remaining.map(|r| r.max(0.0).floor() as u64)
    }
}

/// Seconds to wait after a 429: `Retry-After`, else `X-Ratelimit-Reset`
pub fn retry_after_seconds(headers: &HeaderMap) -> Option<u64> {
    header_seconds(headers, RETRY_AFTER.as_str()).or_else(|| header_seconds(headers, RESET))
}

fn header_f64(headers: &HeaderMap, name: &str) -> Option<f64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn header_seconds(headers: &HeaderMap, name: &str) -> Option<u64> {
    header_f64(headers, name).map(|v| v.max(0.0).ceil() as u64)
}
