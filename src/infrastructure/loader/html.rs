const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript"];

/// Visible text of an HTML page: skipped elements removed, tags dropped,
/// common entities decoded and whitespace collapsed to single spaces.
pub fn html_to_text(html: &str) -> String {
    let stripped = strip_elements(html, SKIPPED_ELEMENTS);

    let mut text = String::with_capacity(stripped.len());
    let mut in_tag = false;
    for c in stripped.chars() {
        match c {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    decode_entities(&text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn looks_like_html(content: &str) -> bool {
    let head: String = content
        .trim_start()
        .chars()
        .take(256)
        .collect::<String>()
        .to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html") || head.contains("<body")
}

fn strip_elements(html: &str, elements: &[&str]) -> String {
    // ASCII lowercasing keeps byte offsets identical to `html`.
    let lower = html.to_ascii_lowercase();
    let mut out = String::with_capacity(html.len());
    let mut pos = 0;

    loop {
        let next = elements
            .iter()
            .filter_map(|el| {
                lower[pos..]
                    .find(&format!("<{el}"))
                    .map(|i| (pos + i, *el))
            })
            .min_by_key(|(i, _)| *i);

        let Some((start, el)) = next else {
            out.push_str(&html[pos..]);
            return out;
        };

        out.push_str(&html[pos..start]);
        pos = match lower[start..].find(&format!("</{el}")) {
            Some(rel) => {
                let close = start + rel;
                lower[close..]
                    .find('>')
                    .map_or(html.len(), |gt| close + gt + 1)
            }
            None => html.len(),
        };
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_text_drops_scripts_and_tags() {
        let html = r#"<!DOCTYPE html>
<html><head><title>Paper</title>
<style>body { color: red; }</style>
<script type="text/javascript">var x = "<p>not text</p>";</script>
</head>
<body>
  <h1>Results</h1>
  <p>The sky is   blue &amp; the grass is green.</p>
  <SCRIPT>alert(1)</SCRIPT>
</body></html>"#;

        assert_eq!(
            html_to_text(html),
            "Paper Results The sky is blue & the grass is green."
        );
    }

    #[test]
    fn test_html_to_text_unclosed_script() {
        assert_eq!(html_to_text("<p>kept</p><script>lost"), "kept");
    }

    #[test]
    fn test_looks_like_html() {
        assert!(looks_like_html("  <!DOCTYPE html><html></html>"));
        assert!(looks_like_html("<html lang=\"en\">"));
        assert!(!looks_like_html("Plain text about <html> tags."));
    }
}
