//! Job source — resolves a job posting URL or pasted description into clean text.

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use scraper::{Html, Node};
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::text::normalize::{clean_text, validate_url};

/// Bytes of a fetched page kept for parsing; the rest is dropped.
pub const MAX_JOB_PAGE_BYTES: usize = 2 * 1024 * 1024;

/// Elements whose text is never shown to a reader.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "svg", "head"];

/// Visible text of an HTML document, one space between text nodes.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut parts: Vec<&str> = Vec::new();

    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if !hidden && !text.trim().is_empty() {
            parts.push(&**text);
        }
    }

    parts.join(" ")
}

/// Downloads `url` and returns its cleaned visible text (possibly empty).
pub async fn fetch_job_text(http: &Client, url: &str) -> Result<String, AppError> {
    if !validate_url(url) {
        return Err(AppError::Validation(
            "job url must be an http(s) URL with a host".to_string(),
        ));
    }

    let response = http
        .get(url.trim())
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("Failed to fetch {url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Upstream(format!("Fetching {url} returned {status}")));
    }

    let is_html = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map_or(true, |v| v.contains("html"));

    let body = read_capped(response, MAX_JOB_PAGE_BYTES)
        .await
        .map_err(|e| AppError::Upstream(format!("Failed to read {url}: {e}")))?;
    let body = String::from_utf8_lossy(&body);

    let text = if is_html {
        visible_text(&body)
    } else {
        body.into_owned()
    };
    let cleaned = clean_text(&text);
    if cleaned.is_empty() {
        warn!("No visible text extracted from {url}");
    } else {
        debug!("Fetched {} chars of job text from {url}", cleaned.len());
    }
    Ok(cleaned)
}

/// Streams the body, stopping after `limit` bytes.
async fn read_capped(mut response: Response, limit: usize) -> Result<Vec<u8>, reqwest::Error> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = limit - body.len();
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            warn!("Job page larger than {limit} bytes, truncated");
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Pasted text wins over the URL. Errors when neither yields any text.
pub async fn resolve_job_text(
    http: &Client,
    url: Option<&str>,
    description: Option<&str>,
) -> Result<String, AppError> {
    let pasted = description.map(str::trim).filter(|d| !d.is_empty());
    let url = url.map(str::trim).filter(|u| !u.is_empty());

    let text = match (pasted, url) {
        (Some(description), _) => clean_text(description),
        (None, Some(url)) => fetch_job_text(http, url).await?,
        (None, None) => {
            return Err(AppError::Validation(
                "Provide a valid job URL or paste a job description".to_string(),
            ))
        }
    };

    if text.is_empty() {
        return Err(AppError::UnprocessableEntity(
            "No job description text found".to_string(),
        ));
    }
    Ok(text)
}
