//! URL-shape classification of raw input.
//!
//! Pure and synchronous: no network access happens here.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;

use crate::ContentKind;

static TWEET_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://(?:www\.|mobile\.)?(?:twitter\.com|x\.com)/\w+/status/\d+")
        .expect("tweet pattern is valid")
});

static TIKTOK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://(?:www\.|vm\.|m\.)?tiktok\.com/").expect("tiktok pattern is valid")
});

static YOUTUBE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^https?://(?:(?:www\.|m\.)?youtube\.com/watch\?(?:[^#]*&)?v=[\w-]+|youtu\.be/[\w-]+|(?:www\.|m\.)?youtube\.com/shorts/[\w-]+)",
    )
    .expect("youtube pattern is valid")
});

static POST_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/status/(\d+)").expect("post id pattern is valid"));

/// Maps raw input to a content kind.
///
/// Input that does not parse as an absolute URL is a note. URLs are tested
/// against tweet, TikTok and YouTube shapes in that order; the first match
/// wins. Any other http(s) URL is an article, and URLs with other schemes
/// are notes.
///
/// # Examples
///
/// ```
/// use vault::{ContentKind, classifier::classify};
///
/// assert_eq!(classify("https://www.youtube.com/watch?v=abc123"), ContentKind::YouTube);
/// assert_eq!(classify("https://x.com/rustlang/status/1234"), ContentKind::Tweet);
/// assert_eq!(classify("https://blog.rust-lang.org/"), ContentKind::Article);
/// assert_eq!(classify("Remember to call Alex"), ContentKind::Note);
/// ```
pub fn classify(input: &str) -> ContentKind {
    let input = input.trim();

    let Ok(url) = Url::parse(input) else {
        return ContentKind::Note;
    };

    if TWEET_PATTERN.is_match(input) {
        ContentKind::Tweet
    } else if TIKTOK_PATTERN.is_match(input) {
        ContentKind::TikTok
    } else if YOUTUBE_PATTERN.is_match(input) {
        ContentKind::YouTube
    } else if matches!(url.scheme(), "http" | "https") {
        ContentKind::Article
    } else {
        ContentKind::Note
    }
}

/// Extracts the numeric post ID following a `/status/` path segment.
///
/// Returns `None` when no such segment exists.
///
/// # Examples
///
/// ```
/// use vault::classifier::extract_post_id;
///
/// assert_eq!(extract_post_id("https://twitter.com/a/status/42?s=20"), Some("42"));
/// assert_eq!(extract_post_id("https://twitter.com/a"), None);
/// ```
pub fn extract_post_id(url: &str) -> Option<&str> {
    POST_ID_PATTERN
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
