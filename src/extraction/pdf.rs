//! PDF page counting and text extraction.

use std::fmt::Write;
use std::path::Path;

use tracing::{debug, warn};

use super::ExtractionError;

pub(super) fn page_count(path: &Path) -> Result<u32, ExtractionError> {
    let doc = lopdf::Document::load(path).map_err(|e| ExtractionError::Pdf(e.to_string()))?;
    match doc.get_pages().len() {
        0 => Err(ExtractionError::Pdf("document has no pages".into())),
        n => Ok(n as u32),
    }
}

fn push_page(out: &mut String, number: u32, text: &str) {
    let _ = write!(out, "--- Page {} ---\n{}\n\n", number, text.trim_end());
}

/// Per-page text via lopdf, falling back to pdf-extract for the whole file.
pub(super) fn extract_text(path: &Path) -> Result<String, ExtractionError> {
    match extract_with_lopdf(path) {
        Ok(text) => Ok(text),
        Err(e) => {
            debug!("lopdf extraction failed for {}: {}", path.display(), e);
            extract_with_pdf_extract(path)
        }
    }
}

fn extract_with_lopdf(path: &Path) -> Result<String, ExtractionError> {
    let doc = lopdf::Document::load(path).map_err(|e| ExtractionError::Pdf(e.to_string()))?;
    let pages = doc.get_pages();
    if pages.is_empty() {
        return Err(ExtractionError::Pdf("document has no pages".into()));
    }

    let mut out = String::new();
    let mut failed = 0;
    for &number in pages.keys() {
        match doc.extract_text(&[number]) {
            Ok(text) => push_page(&mut out, number, &text),
            Err(e) => {
                debug!("Could not extract page {}: {}", number, e);
                failed += 1;
                push_page(&mut out, number, "");
            }
        }
    }

    if failed == pages.len() {
        return Err(ExtractionError::Pdf("no page could be decoded".into()));
    }
    Ok(out)
}

fn extract_with_pdf_extract(path: &Path) -> Result<String, ExtractionError> {
    let bytes = std::fs::read(path)?;
    let text = pdf_extract::extract_text_from_mem(&bytes).map_err(|e| {
        warn!("Fallback extraction failed for {}: {}", path.display(), e);
        ExtractionError::Pdf(e.to_string())
    })?;
    Ok(label_form_feed_pages(&text))
}

/// Label pages of whole-document text split on form feeds.
fn label_form_feed_pages(text: &str) -> String {
    let mut out = String::new();
    for (i, page) in text.split('\u{0c}').enumerate() {
        if i > 0 && page.trim().is_empty() {
            continue;
        }
        push_page(&mut out, i as u32 + 1, page);
    }
    out
}
