use base64::{engine::general_purpose::STANDARD, Engine};

use crate::domain::{Document, DomainError};

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Extracts the text layer of a PDF. Parsing runs on the blocking pool and a
/// parser panic on a malformed file is reported as a validation error.
#[tracing::instrument(skip(bytes), fields(bytes = bytes.len()))]
pub async fn load_pdf(source: &str, bytes: Vec<u8>) -> Result<Document, DomainError> {
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(DomainError::validation(format!("{source} is not a PDF file")));
    }

    let extracted = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| DomainError::validation(format!("could not parse {source}: {e}")))?
        .map_err(|e| DomainError::validation(format!("could not parse {source}: {e}")))?;

    let text = tidy_lines(&extracted);
    if text.is_empty() {
        return Err(DomainError::validation(format!(
            "no text could be extracted from {source}"
        )));
    }

    tracing::info!(chars = text.chars().count(), "pdf loaded");
    Ok(Document::new(source, text))
}

/// Decodes a base64 upload body.
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>, DomainError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| DomainError::validation(format!("invalid base64 content: {e}")))
}

/// Trims every line and drops blank ones, keeping line breaks between the
/// remaining lines.
fn tidy_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_non_pdf_bytes_rejected() {
        let result = load_pdf("notes.pdf", b"just some text".to_vec()).await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_truncated_pdf_rejected() {
        let result = load_pdf("broken.pdf", b"%PDF-1.5\n%broken".to_vec()).await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_decode_base64() {
        assert_eq!(decode_base64("JVBERi0x\nLjU=").unwrap(), b"%PDF-1.5".to_vec());
        assert!(matches!(
            decode_base64("not base64!"),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_tidy_lines() {
        assert_eq!(
            tidy_lines("  Title \n\n\n  First line.\r\nSecond line.  \n \n"),
            "Title\nFirst line.\nSecond line."
        );
        assert_eq!(tidy_lines(" \n\t\n"), "");
    }
}
