//! Page-document (PDF) text.
//!
//! Decoding a PDF is left to a [`PageTextSource`]; this module only turns the
//! per-page text it returns into the page-marked extraction format. The
//! default source, [`LopdfPageSource`], is compiled in with the `pdf` feature.

use crate::common::error::Result;
use std::path::Path;

/// Anything that can split a page document into per-page text.
///
/// Pages without extractable text must come back as empty strings rather
/// than errors, so page numbering stays aligned with the document.
pub trait PageTextSource: Send + Sync {
    fn page_texts(&self, path: &Path) -> Result<Vec<String>>;
}

/// Page text through `lopdf`.
#[cfg(feature = "pdf")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfPageSource;

#[cfg(feature = "pdf")]
impl PageTextSource for LopdfPageSource {
    fn page_texts(&self, path: &Path) -> Result<Vec<String>> {
        let doc = lopdf::Document::load(path)?;
        let pages = doc.get_pages();
        tracing::debug!(path = %path.display(), pages = pages.len(), "loaded pdf");

        Ok(pages
            .keys()
            .map(|&page| match doc.extract_text(&[page]) {
                Ok(text) => text,
                Err(err) => {
                    tracing::debug!(page, error = %err, "page has no extractable text");
                    String::new()
                },
            })
            .collect())
    }
}

/// Render page texts with `--- Page N ---` markers.
///
/// With `skip_empty`, whitespace-only pages are left out (numbering keeps the
/// original page numbers). Returns `None` when no page has any text.
pub fn render_pages(pages: &[String], skip_empty: bool) -> Option<String> {
    if pages.iter().all(|p| p.trim().is_empty()) {
        return None;
    }
    let mut parts: Vec<String> = Vec::new();
    for (i, text) in pages.iter().enumerate() {
        if skip_empty && text.trim().is_empty() {
            continue;
        }
        parts.push(format!("--- Page {} ---", i + 1));
        parts.push(text.clone());
        parts.push(String::new());
    }
    Some(parts.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_render_skips_blank_pages() {
        let rendered = render_pages(&pages(&["first", "  \n", "third"]), true).unwrap();
        assert_eq!(rendered, "--- Page 1 ---\nfirst\n\n--- Page 3 ---\nthird\n");
    }

    #[test]
    fn test_render_keeps_blank_pages_when_asked() {
        let rendered = render_pages(&pages(&["", "second"]), false).unwrap();
        assert_eq!(rendered, "--- Page 1 ---\n\n\n--- Page 2 ---\nsecond\n");
    }

    #[test]
    fn test_all_blank_pages() {
        assert_eq!(render_pages(&pages(&["", " "]), true), None);
        assert_eq!(render_pages(&[], false), None);
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn test_lopdf_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();
        assert!(LopdfPageSource.page_texts(&path).is_err());
    }
}
