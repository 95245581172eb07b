//! Page-by-page PDF text extraction.
//!
//! A page that fails to decode contributes empty text and a warning; only a
//! document that cannot be opened at all is an error. Pages are joined with
//! `\n` in page order.

use std::path::Path;

use crate::error::{Error, Result};

/// Read the PDF at `path` and extract its text.
pub fn extract_pdf_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    extract_pdf(path, &bytes)
}

/// Extract text from PDF `bytes`; `path` is only used in diagnostics.
pub fn extract_pdf(path: &Path, bytes: &[u8]) -> Result<String> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| Error::Extraction {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let pages: Vec<String> = doc
        .get_pages()
        .keys()
        .map(|&page| match extract_page(&doc, path, page) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!("{}", err);
                String::new()
            }
        })
        .collect();

    Ok(pages.join("\n"))
}

fn extract_page(doc: &lopdf::Document, path: &Path, page: u32) -> Result<String> {
    doc.extract_text(&[page])
        .map_err(|e| Error::PageExtraction {
            path: path.to_path_buf(),
            page,
            message: e.to_string(),
        })
}
