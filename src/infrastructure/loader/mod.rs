//! Turns an upload into a [`Document`]: raw text, HTML, a PDF or a web page.

mod html;
mod pdf;
mod web;

pub use html::{html_to_text, looks_like_html};
pub use pdf::{decode_base64, load_pdf};
pub use web::{validate_url, WebLoader};

use crate::domain::{Document, DomainError};

/// Builds a document from uploaded content, stripping markup when the
/// content is an HTML page.
pub fn load_text(source: &str, content: &str) -> Result<Document, DomainError> {
    let text = if looks_like_html(content) {
        html_to_text(content)
    } else {
        content.trim().to_string()
    };

    if text.is_empty() {
        return Err(DomainError::validation(format!(
            "no text could be extracted from {source}"
        )));
    }

    Ok(Document::new(source, text))
}
