use std::time::Duration;

use crate::domain::{Document, DomainError};
use crate::infrastructure::loader::html::{html_to_text, looks_like_html};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; doc-chat/0.1)";

/// Fetches a web page and keeps its visible text.
pub struct WebLoader {
    client: reqwest::Client,
}

impl WebLoader {
    pub fn new(timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DomainError::internal(format!("http client: {e}")))?;
        Ok(Self { client })
    }

    #[tracing::instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<Document, DomainError> {
        validate_url(url)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DomainError::timeout(format!("fetching {url}"))
                } else {
                    DomainError::upstream(format!("fetching {url}: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::upstream(format!("{url} returned {status}")));
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("html"));

        let body = response
            .text()
            .await
            .map_err(|e| DomainError::upstream(format!("reading {url}: {e}")))?;

        let text = if is_html || looks_like_html(&body) {
            html_to_text(&body)
        } else {
            body.trim().to_string()
        };

        if text.is_empty() {
            return Err(DomainError::validation(format!("no text extracted from {url}")));
        }

        tracing::info!(chars = text.chars().count(), "web page loaded");
        Ok(Document::new(url, text))
    }
}

pub fn validate_url(url: &str) -> Result<(), DomainError> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| DomainError::validation(format!("invalid url '{url}': {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(DomainError::validation(format!(
            "unsupported url scheme '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com/paper.html").is_ok());
        assert!(validate_url("http://localhost:8000").is_ok());
        assert!(matches!(
            validate_url("file:///etc/passwd"),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            validate_url("not a url"),
            Err(DomainError::Validation(_))
        ));
    }
}
