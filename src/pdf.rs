// src/pdf.rs
//
// First-page text source for case study PDFs. `pdf_extract` can panic on
// malformed input rather than returning an error, so the extraction call is
// kept behind a `catch_unwind` boundary.

use crate::utils::error::ExtractError;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

/// Reads a PDF file and returns the trimmed lines of its first page.
pub fn first_page_lines(path: &Path) -> Result<Vec<String>, ExtractError> {
    let data = fs::read(path)
        .map_err(|e| ExtractError::Pdf(format!("failed to read {}: {}", path.display(), e)))?;

    let pages = extract_pages(&data, path)?;

    let first = pages
        .into_iter()
        .next()
        .ok_or_else(|| ExtractError::EmptyDocument(path.display().to_string()))?;

    let lines: Vec<String> = first.lines().map(|line| line.trim().to_string()).collect();

    if lines.iter().all(|line| line.is_empty()) {
        return Err(ExtractError::EmptyDocument(format!(
            "{}: first page has no text (may be scanned/image-only)",
            path.display()
        )));
    }

    Ok(lines)
}

/// Extracts per-page text, converting library panics into errors.
fn extract_pages(data: &[u8], path: &Path) -> Result<Vec<String>, ExtractError> {
    let owned = data.to_vec(); // owned copy for the unwind boundary
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(&owned)
    }));

    match result {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(ExtractError::Pdf(format!("{}: {}", path.display(), e))),
        Err(_) => Err(ExtractError::Pdf(format!(
            "{}: extraction panicked (malformed document)",
            path.display()
        ))),
    }
}
