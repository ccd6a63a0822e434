// src/extractors/segment.rs

use crate::extractors::normalize::is_canonical_token;
use crate::utils::error::ExtractError;
use once_cell::sync::Lazy;
use regex::Regex;

// Boilerplate dropped by the degraded-mode names fallback: institution
// header lines, template field descriptions, and section headers. Canonical
// token lines are filtered separately via `is_canonical_token`.
static FALLBACK_DENYLIST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"HEI:|^Details of|^Period when|^Unit of assessment|^\d+\.\s*Summary")
        .expect("Failed to compile FALLBACK_DENYLIST_RE")
});

/// Positionally paired start/end marker indices, validated at construction.
///
/// The i-th start is paired with the i-th end; no nearest-match or overlap
/// reasoning is applied. Construction fails fast on anything that would have
/// been silently truncated or mis-paired otherwise.
#[derive(Debug, Clone)]
pub struct MarkerPairs {
    pairs: Vec<(usize, usize)>,
}

impl MarkerPairs {
    /// Pairs the i-th start marker with the i-th end marker.
    ///
    /// Fails with [`ExtractError::MalformedDocument`] when the lists differ
    /// in length, an index is out of bounds, either list is not strictly
    /// increasing, or a start does not precede its paired end.
    pub fn pair(
        starts: &[usize],
        ends: &[usize],
        line_count: usize,
    ) -> Result<Self, ExtractError> {
        if starts.len() != ends.len() {
            return Err(ExtractError::MalformedDocument(format!(
                "{} start markers but {} end markers",
                starts.len(),
                ends.len()
            )));
        }

        for list in [starts, ends] {
            if list.windows(2).any(|w| w[0] >= w[1]) {
                return Err(ExtractError::MalformedDocument(
                    "marker indices are not strictly increasing".to_string(),
                ));
            }
        }

        for (&start, &end) in starts.iter().zip(ends.iter()) {
            if start >= end {
                return Err(ExtractError::MalformedDocument(format!(
                    "start marker {} does not precede end marker {}",
                    start, end
                )));
            }
            if end > line_count {
                return Err(ExtractError::MalformedDocument(format!(
                    "end marker {} is beyond the {} available lines",
                    end, line_count
                )));
            }
        }

        Ok(Self {
            pairs: starts.iter().copied().zip(ends.iter().copied()).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Extracts the content lines lying strictly between each marker pair.
///
/// For each pair the slice is `lines[start+1..end]` (both markers excluded).
/// Per-pair slices are concatenated in order, each retained line is trimmed,
/// and blank lines are dropped. An empty pair list yields an empty result.
pub fn extract_segments(lines: &[String], pairs: &MarkerPairs) -> Vec<String> {
    pairs
        .pairs
        .iter()
        .flat_map(|&(start, end)| lines[start + 1..end].iter())
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Degraded-mode extraction for the names field.
///
/// Some documents lay the staff table out so that nothing survives between
/// the paired markers. This coarse tier takes the whole raw range from the
/// first name marker to the first end marker and filters it against the
/// boilerplate denylist instead.
pub fn extract_names_fallback(lines: &[String], start: usize, end: usize) -> Vec<String> {
    let end = end.min(lines.len());
    if start >= end {
        return Vec::new();
    }

    lines[start..end]
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .filter(|line| !is_canonical_token(line))
        .filter(|line| !FALLBACK_DENYLIST_RE.is_match(line))
        .map(str::to_string)
        .collect()
}
