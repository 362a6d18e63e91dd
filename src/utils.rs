//! Small helpers shared across the pipeline.
//!
//! - URL slug derivation for article files and image files
//! - Link-list deduplication
//! - Date and year normalization for CLI input and archive listings
//! - String helpers for titles and log previews
//! - Output directory validation

use crate::errors::CrawlError;
use chrono::NaiveDate;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument};

static ORDINAL_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").unwrap());
static ISO_DATE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})(?:[T ].*)?$").unwrap());
static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").unwrap());

/// Formats tried, in order, after ordinal suffixes and commas are removed.
/// `%b` only parses abbreviated month names; `%B` parses full and abbreviated.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y%m%d",
    "%b %d %Y",
    "%d %b %Y",
    "%B %d %Y",
    "%d %B %Y",
];

/// Final path segment of a URL, ignoring any width hint, query or fragment.
///
/// Image URLs on the site can carry a trailing `" 2048"` width hint; only the
/// part before the first whitespace is the real URL. Inline `data:` URIs have
/// no usable name and yield `""`.
///
/// ```ignore
/// assert_eq!(url_slug("https://x/img/20200725_ABC.png 2048"), "20200725_ABC.png");
/// assert_eq!(url_slug("/leaders/2020/07/25/a-title"), "a-title");
/// assert_eq!(url_slug("https://x/a/"), "");
/// ```
pub fn url_slug(url: &str) -> &str {
    let url = strip_width_hint(url);
    if url.starts_with("data:") {
        return "";
    }
    let path = url.split(['?', '#']).next().unwrap_or_default();
    path.rsplit('/').next().unwrap_or_default()
}

/// The URL with any trailing space-separated annotation removed.
pub fn strip_width_hint(url: &str) -> &str {
    url.split_whitespace().next().unwrap_or_default()
}

/// Remove repeated links, keeping each at the position it first appeared.
/// Comparison is exact: `/a` and `/a/` are different links.
pub fn dedup(links: Vec<String>) -> Vec<String> {
    links.into_iter().unique().collect()
}

/// Human title from a dashed slug: `"the-world-this-week"` -> `"The world this week"`.
pub fn title_from_slug(slug: &str) -> String {
    upcase(&slug.replace('-', " "))
}

/// Normalize a raw date string to `YYYY-MM-DD`.
///
/// Accepts ISO dates (with or without a time part), slash and compact forms,
/// and the site's teaser style (`"Jul 25th 2020"`, `"October 18, 2020"`).
#[instrument(level = "debug")]
pub fn normalize_date(raw: &str) -> Result<String, CrawlError> {
    let trimmed = raw.trim();
    if let Some(caps) = ISO_DATE_PREFIX.captures(trimmed) {
        if let Ok(d) = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d") {
            return Ok(d.format("%Y-%m-%d").to_string());
        }
    }

    let cleaned = ORDINAL_SUFFIX.replace_all(trimmed, "$1").replace(',', " ");
    let cleaned = cleaned.split_whitespace().join(" ");

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok())
        .map(|d| d.format("%Y-%m-%d").to_string())
        .ok_or_else(|| {
            debug!(raw = %raw, "No date format matched");
            CrawlError::InvalidDate(raw.to_string())
        })
}

/// Validate a four-digit year.
pub fn normalize_year(raw: &str) -> Result<String, CrawlError> {
    let trimmed = raw.trim();
    if YEAR.is_match(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(CrawlError::InvalidYear(raw.to_string()))
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` bytes (backing off to a char boundary) with
/// a `"…(+N bytes)"` marker appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Capitalize the first character of a string.
pub fn upcase(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), CrawlError> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| CrawlError::io(path, e))?;
    let probe_path = path.join("..__probe_write__");
    fs::write(&probe_path, b"")
        .await
        .map_err(|e| CrawlError::io(&probe_path, e))?;
    let _ = fs::remove_file(&probe_path).await;
    info!("Output directory is writable");
    Ok(())
}
