//! PDF text extraction
//!
//! Extracts per-page text from PDF files using lopdf. Page numbers are
//! preserved because they become provenance metadata on every chunk.
//! Each BT..ET text block in the content stream becomes one paragraph,
//! separated by blank lines, so downstream segmentation has structure
//! to work with.

use crate::errors::IngestionError;
use std::path::Path;
use tracing::{debug, warn};

/// Text of a single page, 1-based page number attached
#[derive(Debug, Clone)]
pub struct PageText {
    pub number: i32,
    pub text: String,
}

/// Extract the text of every page in a PDF
pub fn extract_pages(path: &Path) -> Result<Vec<PageText>, IngestionError> {
    let doc = lopdf::Document::load(path).map_err(|e| IngestionError::PdfParseError {
        path: path.display().to_string(),
        message: format!("Failed to load PDF: {}", e),
    })?;

    let page_count = doc.get_pages().len();
    debug!(page_count, "Extracting text from PDF");

    let mut pages = Vec::with_capacity(page_count);

    for (index, page_id) in doc.page_iter().enumerate() {
        let number = (index + 1) as i32;

        match doc.get_page_content(page_id) {
            Ok(content) => {
                let text = text_from_content_stream(&content);
                pages.push(PageText { number, text });
            }
            Err(e) => {
                warn!(page = number, error = %e, "Failed to read page content, skipping");
            }
        }
    }

    if pages.iter().all(|p| p.text.trim().is_empty()) {
        return Err(IngestionError::EmptyDocument {
            path: path.display().to_string(),
        });
    }

    Ok(pages)
}

/// Walk a page content stream and collect the text shown between BT and ET
/// operators. Each text block ends a paragraph.
fn text_from_content_stream(content: &[u8]) -> String {
    let content_str = String::from_utf8_lossy(content);
    let mut text = String::new();
    let mut in_text_block = false;
    let mut current_block = String::new();

    for line in content_str.lines() {
        let trimmed = line.trim();

        if trimmed == "BT" {
            in_text_block = true;
            continue;
        }

        if trimmed == "ET" {
            in_text_block = false;
            let block = normalize_whitespace(&current_block);
            if !block.is_empty() {
                if !text.is_empty() {
                    text.push_str("\n\n");
                }
                text.push_str(&block);
            }
            current_block.clear();
            continue;
        }

        if in_text_block {
            if let Some(shown) = text_from_operator(trimmed) {
                if !current_block.is_empty() {
                    current_block.push(' ');
                }
                current_block.push_str(&shown);
            }
        }
    }

    text
}

/// Extract the shown text from a single text-showing operator line
/// (Tj, ', ", or TJ with its array form)
fn text_from_operator(line: &str) -> Option<String> {
    // Handle (text) Tj and the quote variants
    if line.ends_with("Tj") || line.ends_with('\'') || line.ends_with('"') {
        if let (Some(start), Some(end)) = (line.find('('), line.rfind(')')) {
            if start < end {
                return Some(decode_literal_string(&line[start + 1..end]));
            }
        }
    }

    // Handle [(text) num (text) num] TJ (array of strings and kerning)
    if line.ends_with("TJ") {
        let mut result = String::new();
        let mut in_paren = false;
        let mut current = String::new();

        for ch in line.chars() {
            match ch {
                '(' => {
                    in_paren = true;
                }
                ')' => {
                    in_paren = false;
                    result.push_str(&decode_literal_string(&current));
                    current.clear();
                }
                _ if in_paren => {
                    current.push(ch);
                }
                _ => {}
            }
        }

        if !result.is_empty() {
            return Some(result);
        }
    }

    None
}

/// Decode PDF literal-string escapes (\n, \t, \(, \), \\)
fn decode_literal_string(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('\\') => result.push('\\'),
                Some('(') => result.push('('),
                Some(')') => result.push(')'),
                Some(c) => result.push(c),
                None => {}
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Collapse runs of whitespace and strip byte-order marks and curly quotes
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('\u{FEFF}', "")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_literal_string() {
        assert_eq!(decode_literal_string("Hello\\nWorld"), "Hello\nWorld");
        assert_eq!(decode_literal_string("Test\\(paren\\)"), "Test(paren)");
        assert_eq!(decode_literal_string("plain"), "plain");
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("Hello   World\n\nTest"), "Hello World Test");
        assert_eq!(normalize_whitespace("\u{201C}quoted\u{201D}"), "\"quoted\"");
    }

    #[test]
    fn test_text_blocks_become_paragraphs() {
        let stream = b"BT\n(First block.) Tj\nET\nBT\n(Second block.) Tj\nET\n";
        let text = text_from_content_stream(stream);
        assert_eq!(text, "First block.\n\nSecond block.");
    }

    #[test]
    fn test_tj_array_operator() {
        let line = "[(Hel) -20 (lo)] TJ";
        assert_eq!(text_from_operator(line), Some("Hello".to_string()));
    }

    #[test]
    fn test_non_text_operator_ignored() {
        assert_eq!(text_from_operator("1 0 0 1 72 720 Tm"), None);
    }
}
