//! Reddit API response records
//!
//! Reddit wraps everything in "things" (`{kind, data}`) and pages them in
//! listings. Fields are optional because Reddit omits or nulls many of them
//! for deleted, removed or quarantined content.

use crate::error::AppError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub const KIND_COMMENT: &str = "t1";
pub const KIND_ACCOUNT: &str = "t2";
pub const KIND_LINK: &str = "t3";
pub const KIND_SUBREDDIT: &str = "t5";
pub const KIND_LISTING: &str = "Listing";

/// A typed Reddit object whose payload is decoded on demand
#[derive(Debug, Clone, Deserialize)]
pub struct Thing {
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

impl Thing {
    pub fn from_value(value: &Value) -> Result<Self, AppError> {
        Ok(Thing::deserialize(value)?)
    }

    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        T::deserialize(&self.data)
            .map_err(|e| AppError::Parse(format!("Malformed {} record: {}", self.kind, e)))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub children: Vec<Thing>,
}

/// One page of things
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Listing {
    #[serde(default)]
    pub data: ListingData,
}

impl Listing {
    pub fn from_value(value: &Value) -> Result<Self, AppError> {
        let kind = value.get("kind").and_then(Value::as_str);
        if kind != Some(KIND_LISTING) {
            return Err(AppError::Parse(format!(
                "Expected a Listing, got {}",
                kind.unwrap_or("an untyped value")
            )));
        }
        Ok(Listing::deserialize(value)?)
    }

    /// Decode every child of `kind`, in listing order, skipping other kinds
    pub fn items<T: DeserializeOwned>(&self, kind: &str) -> Result<Vec<T>, AppError> {
        self.data
            .children
            .iter()
            .filter(|child| child.kind == kind)
            .map(|child| child.parse::<T>())
            .collect()
    }
}

/// A submission (`t3`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Post {
    pub id: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub subreddit: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub score: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub num_comments: Option<i64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub created_utc: Option<f64>,
    pub url: Option<String>,
    pub permalink: Option<String>,
    #[serde(default)]
    pub over_18: bool,
}

/// A comment (`t1`); `replies` is either "" or a nested listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Comment {
    pub author: Option<String>,
    pub body: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub score: Option<i64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub created_utc: Option<f64>,
    #[serde(default)]
    pub replies: Value,
}

impl Comment {
    /// Direct replies that are real comments (collapsed "more" stubs are skipped)
    pub fn reply_comments(&self) -> Vec<Comment> {
        if !self.replies.is_object() {
            return Vec::new();
        }
        Listing::from_value(&self.replies)
            .and_then(|listing| listing.items(KIND_COMMENT))
            .unwrap_or_default()
    }
}

/// A community (`t5`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Subreddit {
    pub display_name: Option<String>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub public_description: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub subscribers: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub active_user_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub created_utc: Option<f64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub over18: Option<bool>,
}

/// An account (`t2`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct User {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub link_karma: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub comment_karma: Option<i64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub created_utc: Option<f64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_gold: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_mod: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub has_verified_email: Option<bool>,
}

/// Accept integers, floats, numeric strings and null
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite()))
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_f64(deserializer)?.map(|v| v.trunc() as i64))
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::Number(n)) => n.as_i64().map(|n| n != 0),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_listing_items_filters_by_kind() {
        let value = json!({
            "kind": "Listing",
            "data": {
                "after": "t3_next",
                "children": [
                    {"kind": "t3", "data": {"title": "one", "score": 5}},
                    {"kind": "more", "data": {"count": 12}},
                    {"kind": "t3", "data": {"title": "two", "score": 7.0}}
                ]
            }
        });

        let listing = Listing::from_value(&value).unwrap();
        let posts: Vec<Post> = listing.items(KIND_LINK).unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].title.as_deref(), Some("one"));
        assert_eq!(posts[1].score, Some(7));
    }

    #[test]
    fn test_listing_rejects_non_listing() {
        let value = json!({"kind": "t5", "data": {}});
        assert!(matches!(Listing::from_value(&value), Err(AppError::Parse(_))));
    }

    #[test]
    fn test_lenient_fields_tolerate_nulls_and_strings() {
        let post: Post = serde_json::from_value(json!({
            "title": null,
            "score": "12",
            "num_comments": null,
            "created_utc": 1700000000.0
        }))
        .unwrap();
        assert_eq!(post.title, None);
        assert_eq!(post.score, Some(12));
        assert_eq!(post.num_comments, None);
        assert_eq!(post.created_utc, Some(1_700_000_000.0));
    }

    #[test]
    fn test_comment_replies_empty_string_and_listing() {
        let leaf: Comment = serde_json::from_value(json!({"body": "leaf", "replies": ""})).unwrap();
        assert!(leaf.reply_comments().is_empty());

        let parent: Comment = serde_json::from_value(json!({
            "body": "parent",
            "replies": {
                "kind": "Listing",
                "data": {"children": [
                    {"kind": "t1", "data": {"body": "child", "replies": ""}},
                    {"kind": "more", "data": {"count": 3}}
                ]}
            }
        }))
        .unwrap();
        let replies = parent.reply_comments();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].body.as_deref(), Some("child"));
    }
}
