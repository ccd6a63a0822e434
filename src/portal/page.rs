// src/portal/page.rs
//
// Scraping of the case study page itself: the PDF download link, the
// impact-metadata definition list, and the grant funding table.

use crate::portal::models::{PageField, PageMetadata};
use crate::utils::error::PortalError;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

// --- CSS Selectors (Lazy Static) ---
static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("a").expect("Failed to compile ANCHOR_SELECTOR")
});

static METADATA_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".impact-metadata").expect("Failed to compile METADATA_SELECTOR")
});

static DT_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("dt").expect("Failed to compile DT_SELECTOR")
});

static DD_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("dd").expect("Failed to compile DD_SELECTOR")
});

static H4_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("h4").expect("Failed to compile H4_SELECTOR")
});

// --- Regex Patterns for Text Matching (Lazy Static) ---
static PDF_LINK_TEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Download case study PDF").expect("Failed to compile PDF_LINK_TEXT_RE")
});

const GRANT_FUNDING_HEADING: &str = "Grant funding";

/// Collapses an element's text nodes into a single trimmed string.
fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Visible text of a block element, one line per non-empty text node.
/// Approximates what a browser would render for a table.
fn block_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Finds the href of the "Download case study PDF" anchor.
pub fn find_pdf_link(html: &str, case_study: &str) -> Result<String, PortalError> {
    let document = Html::parse_document(html);

    for anchor in document.select(&ANCHOR_SELECTOR) {
        if PDF_LINK_TEXT_RE.is_match(&element_text(anchor)) {
            if let Some(href) = anchor.value().attr("href") {
                return Ok(href.to_string());
            }
        }
    }

    Err(PortalError::PdfLinkNotFound(case_study.to_string()))
}

/// Scrapes the secondary metadata table: the second `impact-metadata`
/// element's `dt` texts zipped against its `dd` texts.
///
/// A page without that structure yields `Unavailable`, never an error.
pub fn scrape_page_metadata(html: &str) -> PageField<PageMetadata> {
    let document = Html::parse_document(html);

    let Some(element) = document.select(&METADATA_SELECTOR).nth(1) else {
        tracing::debug!("no secondary impact-metadata element on page");
        return PageField::Unavailable;
    };

    let keys: Vec<String> = element.select(&DT_SELECTOR).map(element_text).collect();
    let values: Vec<String> = element.select(&DD_SELECTOR).map(element_text).collect();

    PageField::Present(PageMetadata {
        pairs: keys.into_iter().zip(values).collect(),
    })
}

/// Scrapes the text of the table following the "Grant funding" heading.
///
/// A page without the heading or the table yields `Unavailable`.
pub fn scrape_grant_funding(html: &str) -> PageField<String> {
    let document = Html::parse_document(html);

    let Some(heading) = document
        .select(&H4_SELECTOR)
        .find(|h| element_text(*h) == GRANT_FUNDING_HEADING)
    else {
        tracing::debug!("no grant funding heading on page");
        return PageField::Unavailable;
    };

    let table = heading
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table");

    match table {
        Some(table) => PageField::Present(block_text(table)),
        None => {
            tracing::debug!("grant funding heading has no following table");
            PageField::Unavailable
        }
    }
}
