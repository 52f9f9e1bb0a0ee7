//! HTTP document fetcher: reqwest for transport, scraper for HTML text.

use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Node, Selector};

use crate::config::FetchConfig;
use crate::error::{RcaBotError, Result};
use crate::ports::{DocumentFetcher, FetchedDocument};

/// Elements whose text never reaches the extracted document.
const SKIPPED_ELEMENTS: [&str; 6] = ["script", "style", "noscript", "template", "head", "svg"];

/// Elements that break the flow of text.
const BLOCK_ELEMENTS: [&str; 24] = [
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "li", "main", "p", "pre",
    "section",
];

const TEXT_APPLICATION_TYPES: [&str; 3] =
    ["application/xhtml+xml", "application/xml", "application/json"];

pub struct WebFetcher {
    client: reqwest::Client,
}

impl WebFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentFetcher for WebFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument> {
        tracing::debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RcaBotError::Fetch(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RcaBotError::Fetch(format!("{url}: HTTP {status}")));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);

        if !is_text_content_type(content_type.as_deref()) {
            return Err(RcaBotError::Fetch(format!(
                "{url}: unsupported content type {}",
                content_type.as_deref().unwrap_or_default()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RcaBotError::Fetch(format!("{url}: failed to read body: {e}")))?;

        let (title, text) = if looks_like_html(content_type.as_deref(), &body) {
            extract_html_text(&body)
        } else {
            (None, body)
        };

        Ok(FetchedDocument {
            url: url.to_string(),
            title,
            content_type,
            text,
        })
    }
}

/// A missing content type is given the benefit of the doubt.
pub fn is_text_content_type(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return true;
    };

    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    mime.starts_with("text/") || TEXT_APPLICATION_TYPES.contains(&mime.as_str())
}

fn looks_like_html(content_type: Option<&str>, body: &str) -> bool {
    content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("html"))
        || body.trim_start().starts_with('<')
}

/// Returns the page title and the visible text of an HTML document.
pub fn extract_html_text(html: &str) -> (Option<String>, String) {
    let document = Html::parse_document(html);

    let title = Selector::parse("title").ok().and_then(|selector| {
        document
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    });

    let mut raw = String::new();
    collect_text(document.root_element(), &mut raw);

    (title, normalize_text(&raw))
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_ELEMENTS.contains(&name) {
                    continue;
                }
                let Some(child_element) = ElementRef::wrap(child) else {
                    continue;
                };

                let block = BLOCK_ELEMENTS.contains(&name);
                if block {
                    out.push('\n');
                }
                collect_text(child_element, out);
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Collapses whitespace inside lines and runs of blank lines into a single
/// paragraph break.
fn normalize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut paragraph_break = false;

    for line in raw.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            paragraph_break = !out.is_empty();
            continue;
        }
        if !out.is_empty() {
            out.push_str(if paragraph_break { "\n\n" } else { "\n" });
        }
        out.push_str(&line);
        paragraph_break = false;
    }

    out
}
