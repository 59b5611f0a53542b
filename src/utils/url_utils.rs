//! URL and title helpers shared by both extractor tiers.

use url::Url;

use super::constants::{MAX_TITLE_CHARS, MIN_TITLE_CHARS, NAVIGATION_KEYWORDS};

/// Check if a URL is an absolute http(s) URL
#[must_use]
pub fn is_http_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    // Skip data URLs, javascript URLs, and other non-http schemes
    if url.starts_with("data:") || url.starts_with("javascript:") || url.starts_with("mailto:") {
        return false;
    }

    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Resolve an `href` found on `page` into an absolute http(s) link
///
/// Relative hrefs are joined against the page URL. Returns `None` for empty
/// hrefs, fragments-only anchors, and anything that does not end up http(s).
#[must_use]
pub fn resolve_link(page: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let joined = page.join(href).ok()?;
    match joined.scheme() {
        "http" | "https" => Some(joined.to_string()),
        _ => None,
    }
}

/// Collapse all runs of whitespace (including newlines) into single spaces
#[must_use]
pub fn clean_title(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether a cleaned title length falls strictly inside the title bounds
#[must_use]
pub fn title_length_ok(title: &str) -> bool {
    let len = title.chars().count();
    len > MIN_TITLE_CHARS && len < MAX_TITLE_CHARS
}

/// Whether cleaned anchor text looks like a job title rather than page chrome
///
/// Generic pages link to "View all jobs", "Careers" and job alerts with the
/// same markup as real listings, so those keywords are rejected too.
#[must_use]
pub fn is_plausible_title(title: &str) -> bool {
    if !title_length_ok(title) {
        return false;
    }

    let lowered = title.to_lowercase();
    !NAVIGATION_KEYWORDS.iter().any(|kw| lowered.contains(kw))
}
