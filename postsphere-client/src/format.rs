//! Presentation helpers shared by every view.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;

pub const AVATAR_BASE_URL: &str = "https://robohash.org/";

static BLOCK_END: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(p|div|h[1-6]|li|blockquote|pre|ul|ol)\s*>")
        .expect("Failed to compile block end regex")
});
static LIST_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<li[^>]*>").expect("Failed to compile list item regex"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("Failed to compile tag regex"));
static BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("Failed to compile blank line regex"));

/// Generated avatar for a username
pub fn avatar_url(username: &str) -> String {
    format!("{}{}", AVATAR_BASE_URL, urlencoding::encode(username))
}

/// Where to load a post thumbnail from.
///
/// Absolute and protocol-relative URLs resolve on their own; server-relative
/// paths are joined to the origin of `api_base_url`. Returns `None` when the
/// post has no thumbnail or the reference cannot be resolved.
pub fn thumbnail_src(api_base_url: &str, thumbnail_url: Option<&str>) -> Option<String> {
    let path = thumbnail_url.map(str::trim).filter(|p| !p.is_empty())?;
    if path.get(..5).is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:")) {
        return Some(path.to_string());
    }

    let resolved = match server_origin(api_base_url) {
        Some(origin) => origin.join(path),
        None => Url::parse(path),
    };
    resolved.ok().map(String::from)
}

/// `scheme://host[:port]/` part of a URL
fn server_origin(url: &str) -> Option<Url> {
    let mut origin = Url::parse(url).ok()?;
    origin.set_path("/");
    origin.set_query(None);
    origin.set_fragment(None);
    Some(origin)
}

/// Long US date, e.g. `December 20, 2024`
pub fn format_post_date(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%B %-d, %Y").to_string()
}

pub fn like_label(count: i64) -> String {
    if count == 1 {
        "1 like".to_string()
    } else {
        format!("{} likes", count)
    }
}

/// Renders the HTML body of a post as plain text
pub fn html_to_text(html: &str) -> String {
    let text = LIST_ITEM.replace_all(html, "- ");
    let text = BLOCK_END.replace_all(&text, "\n");
    let text = TAG.replace_all(&text, "");
    let text = html_escape::decode_html_entities(&text).replace('\u{a0}', " ");

    let text: Vec<&str> = text.lines().map(str::trim_end).collect();
    let text = text.join("\n");
    BLANK_RUN.replace_all(text.trim(), "\n\n").into_owned()
}

/// Wraps text to `width` columns, keeping blank lines between paragraphs
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = vec![];
    for line in text.lines() {
        if line.trim().is_empty() {
            lines.push(String::new());
            continue;
        }
        for wrapped in textwrap::wrap(line, width.max(1)) {
            lines.push(wrapped.into_owned());
        }
    }
    lines
}
