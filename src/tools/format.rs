//! Markdown rendering shared by the Reddit tools
//!
//! Every tool answers with the same layout:
//!
//! ```text
//! **Success**: <headline>
//!
//! **Found 3 posts** in r/rust (sorted by hot) **3 posts**
//! **Rate limit**: 596 requests remaining
//!
//! <item>
//!
//! <item>
//! ```
//!
//! Dates are rendered in UTC and counts use comma thousands separators.

use crate::reddit::models::{Comment, Post, Subreddit, User};
use crate::reddit::RateLimitInfo;
use chrono::{DateTime, Utc};

const UNKNOWN_DATE: &str = "Unknown date";

/// Comment bodies longer than this are cut and suffixed with `...`
pub const COMMENT_BODY_LIMIT: usize = 200;

/// Replies rendered under each comment
pub const MAX_REPLIES: usize = 3;

/// Deepest reply level rendered below a top-level comment
pub const MAX_REPLY_DEPTH: usize = 3;

pub fn success(headline: &str, body: &str) -> String {
    if body.is_empty() {
        format!("**Success**: {}", headline)
    } else {
        format!("**Success**: {}\n\n{}", headline, body)
    }
}

pub fn error_text(headline: &str, details: &str) -> String {
    format!("**Error**: {}\n\n**Details**: {}", headline, details)
}

/// `<line> **<count> <item type>**`, followed by the remaining request budget
/// when Reddit reported it
pub fn summary(line: &str, count: usize, item_type: &str, rate_limit: &RateLimitInfo) -> String {
    let head = format!("{} **{} {}**", line, count, item_type);
    match rate_limit.remaining_requests() {
        Some(remaining) => format!("{}\n**Rate limit**: {} requests remaining", head, remaining),
        None => head,
    }
}

/// Summary followed by blank-line separated items
pub fn with_items(summary: &str, items: &[String]) -> String {
    if items.is_empty() {
        return summary.to_string();
    }
    format!("{}\n\n{}", summary, items.join("\n\n"))
}

pub fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

pub fn format_score(score: i64) -> String {
    if score >= 1000 {
        format!("Hot: {}", group_thousands(score))
    } else if score >= 100 {
        format!("Good: {}", group_thousands(score))
    } else {
        format!("Score: {}", group_thousands(score))
    }
}

pub fn format_karma(karma: i64) -> String {
    if karma >= 100_000 {
        format!("Elite: {}", group_thousands(karma))
    } else if karma >= 10_000 {
        format!("High: {}", group_thousands(karma))
    } else {
        format!("Karma: {}", group_thousands(karma))
    }
}

pub fn format_subscribers(subscribers: i64) -> String {
    if subscribers >= 1_000_000 {
        format!("Large: {:.1}M", subscribers as f64 / 1_000_000.0)
    } else if subscribers >= 999_950 {
        // Rounds up to the next tier
        "Large: 1.0M".to_string()
    } else if subscribers >= 1000 {
        format!("Medium: {:.1}K", subscribers as f64 / 1000.0)
    } else {
        format!("Subscribers: {}", group_thousands(subscribers))
    }
}

fn to_datetime(created_utc: Option<f64>) -> Option<DateTime<Utc>> {
    created_utc.and_then(|secs| DateTime::<Utc>::from_timestamp(secs.trunc() as i64, 0))
}

/// `2023-11-14 22:13:20 UTC`
pub fn format_timestamp(created_utc: Option<f64>) -> String {
    to_datetime(created_utc)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| UNKNOWN_DATE.to_string())
}

/// `2023-11-14`
pub fn format_date(created_utc: Option<f64>) -> String {
    to_datetime(created_utc)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| UNKNOWN_DATE.to_string())
}

/// Cut `text` to `max_chars` characters, appending `...` when shortened
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// Absolute link from a permalink, else the fallback URL
pub fn reddit_link(permalink: Option<&str>, fallback: Option<&str>) -> String {
    match permalink.filter(|p| !p.is_empty()) {
        Some(permalink) => format!("https://reddit.com{}", permalink),
        None => fallback.unwrap_or_default().to_string(),
    }
}

fn text_or<'a>(value: &'a Option<String>, default: &'a str) -> &'a str {
    value
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default)
}

pub fn format_post(post: &Post) -> String {
    let title = text_or(&post.title, "No title");
    let nsfw = if post.over_18 { " [NSFW]" } else { "" };

    let mut lines = vec![
        format!("**{}**{}", title, nsfw),
        format!(
            "**Author**: u/{} | **Subreddit**: r/{}",
            text_or(&post.author, "Unknown"),
            text_or(&post.subreddit, "Unknown")
        ),
        format!(
            "{} | Comments: {} | **Posted**: {}",
            format_score(post.score.unwrap_or(0)),
            group_thousands(post.num_comments.unwrap_or(0)),
            format_timestamp(post.created_utc)
        ),
    ];
    if let Some(id) = post.id.as_deref().filter(|id| !id.is_empty()) {
        lines.push(format!("**ID**: {}", id));
    }
    lines.push(format!(
        "**Link**: {}",
        reddit_link(post.permalink.as_deref(), post.url.as_deref())
    ));

    lines.join("\n")
}

/// Render a comment and the non-empty replies among its first [`MAX_REPLIES`],
/// two spaces of indentation per level
pub fn format_comment(comment: &Comment, depth: usize) -> String {
    let indent = "  ".repeat(depth);
    let body = truncate(text_or(&comment.body, "No content"), COMMENT_BODY_LIMIT);

    let mut out = format!(
        "{indent}**u/{}** (Score: {}) - {}\n{indent}{}",
        text_or(&comment.author, "Unknown"),
        group_thousands(comment.score.unwrap_or(0)),
        format_timestamp(comment.created_utc),
        body.replace('\n', &format!("\n{}", indent)),
        indent = indent
    );

    if depth < MAX_REPLY_DEPTH {
        let replies = comment.reply_comments();
        for reply in replies
            .iter()
            .take(MAX_REPLIES)
            .filter(|r| r.body.as_deref().is_some_and(|b| !b.is_empty()))
        {
            out.push('\n');
            out.push_str(&format_comment(reply, depth + 1));
        }
    }

    out
}

pub fn format_subreddit(subreddit: &Subreddit) -> String {
    let name = subreddit
        .display_name
        .as_deref()
        .or(subreddit.name.as_deref())
        .filter(|n| !n.is_empty())
        .unwrap_or("Unknown");
    let nsfw = if subreddit.over18.unwrap_or(false) { "NSFW" } else { "SFW" };

    format!(
        "**r/{name}** - {}\n**Description**: {}\n**Subscribers**: {} | **Active**: {}\n**Created**: {} | {}\n**URL**: https://reddit.com/r/{name}",
        text_or(&subreddit.title, "No title"),
        text_or(&subreddit.public_description, "No description"),
        format_subscribers(subreddit.subscribers.unwrap_or(0)),
        group_thousands(subreddit.active_user_count.unwrap_or(0)),
        format_date(subreddit.created_utc),
        nsfw,
        name = name
    )
}

pub fn format_user(user: &User) -> String {
    let name = text_or(&user.name, "Unknown");
    let link_karma = user.link_karma.unwrap_or(0);
    let comment_karma = user.comment_karma.unwrap_or(0);

    let mut status = Vec::new();
    if user.is_gold.unwrap_or(false) {
        status.push("Gold");
    }
    if user.is_mod.unwrap_or(false) {
        status.push("Moderator");
    }
    if user.has_verified_email.unwrap_or(false) {
        status.push("Verified");
    }
    let status = if status.is_empty() {
        "Regular User".to_string()
    } else {
        status.join(" | ")
    };

    format!(
        "**u/{name}**\n**Karma**: {} (Post: {} | Comment: {})\n**Member since**: {}\n{}\n**Profile**: https://reddit.com/u/{name}",
        format_karma(link_karma.saturating_add(comment_karma)),
        group_thousands(link_karma),
        group_thousands(comment_karma),
        format_date(user.created_utc),
        status,
        name = name
    )
}
