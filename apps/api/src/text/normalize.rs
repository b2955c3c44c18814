//! Text normalization for scraped or pasted job text, skill lists and links.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use url::Url;

static TAG_RE: OnceLock<Regex> = OnceLock::new();
static URL_RE: OnceLock<Regex> = OnceLock::new();

/// Strips HTML tags and URLs, then collapses all whitespace runs to single spaces.
pub fn clean_text(text: &str) -> String {
    let tag_re = TAG_RE.get_or_init(|| Regex::new(r"<[^>]*?>").expect("valid tag regex"));
    let url_re = URL_RE.get_or_init(|| Regex::new(r#"https?://[^\s<>"']+"#).expect("valid url regex"));

    let without_tags = tag_re.replace_all(text, "");
    let without_urls = url_re.replace_all(&without_tags, "");
    without_urls.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True for absolute http(s) URLs with a host.
pub fn validate_url(url: &str) -> bool {
    match Url::parse(url.trim()) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https")
                && parsed.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

/// Parses a comma- or newline-separated skill list.
/// Entries are trimmed and deduplicated case-insensitively; first spelling wins.
pub fn parse_skills(skills_text: &str) -> Vec<String> {
    dedup_skills(skills_text.split([',', '\n']))
}

/// Coerces an arbitrary JSON value into a skill list.
/// Strings are parsed with [`parse_skills`]; arrays keep their non-empty string
/// items; anything else is empty.
pub fn coerce_skills(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => parse_skills(s),
        Value::Array(items) => dedup_skills(items.iter().filter_map(Value::as_str)),
        _ => Vec::new(),
    }
}

/// Trims, drops empties and deduplicates case-insensitively, preserving order.
pub fn dedup_skills<'a>(skills: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    skills
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Keeps only valid http(s) links, trimmed.
pub fn sanitize_links<'a>(links: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    links
        .into_iter()
        .map(str::trim)
        .filter(|l| validate_url(l))
        .map(str::to_string)
        .collect()
}

/// Truncates to at most `max_chars` characters, cutting at the last space before
/// the limit when there is one, and marks the cut with `" …"`.
pub fn safe_truncate(text: &str, max_chars: usize) -> String {
    let Some((byte_limit, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };

    let head = &text[..byte_limit];
    let cut = match head.rfind(' ') {
        Some(pos) if pos > 0 => &head[..pos],
        _ => head,
    };
    format!("{} …", cut.trim_end())
}
