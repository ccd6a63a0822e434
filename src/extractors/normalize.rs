// src/extractors/normalize.rs

use once_cell::sync::Lazy;
use regex::Regex;

// --- Canonical marker tokens ---
// Variable header text on the first page ("Name(s):", "Names of staff", ...)
// collapses into fixed tokens so markers can be found by exact line equality.
pub const NAME_TOKEN: &str = "Name:";
pub const ROLE_TOKEN: &str = "Role:";
pub const START_TOKEN: &str = "Start:";
pub const END_TOKEN: &str = "End:";
pub const PERIOD_TOKEN: &str = "Period:";

// Known boilerplate line dropped during normalization
const SUBMITTING_HEI_LINE: &str = "submitting HEI:";

// --- Regex Patterns (Lazy Static) ---
// Two-character layout artifact left by the PDF text layer (a digit glued to
// a literal 'B', e.g. "1B")
static CODE_ARTIFACT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\dB").expect("Failed to compile CODE_ARTIFACT_RE")
});

static NAME_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Name").expect("Failed to compile NAME_HEADER_RE")
});

static ROLE_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Role").expect("Failed to compile ROLE_HEADER_RE")
});

// Order matters for the Period variants: the "undertaken" and "when the
// claimed" forms must win over the generic Period rule.
static START_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Period.*undertaken").expect("Failed to compile START_HEADER_RE")
});

static END_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Period when the claimed").expect("Failed to compile END_HEADER_RE")
});

static PERIOD_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Period").expect("Failed to compile PERIOD_HEADER_RE")
});

// First section header of the template, used as the fallback end marker when
// no "End:" token was produced.
static SECTION_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^1\.\s*Summary").expect("Failed to compile SECTION_HEADER_RE")
});

/// Positions (0-based line offsets) of canonical marker lines, grouped by kind.
#[derive(Debug, Clone, Default)]
pub struct MarkerScan {
    pub names: Vec<usize>,
    pub roles: Vec<usize>,
    pub periods: Vec<usize>,
    pub ends: Vec<usize>,
}

/// Normalizes a single raw line. Returns `None` for lines that are dropped
/// outright (blank lines and the submitting-HEI boilerplate).
fn normalize_line(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let cleaned = CODE_ARTIFACT_RE.replace_all(trimmed, "");
    let cleaned = cleaned.trim();

    let canonical = if NAME_HEADER_RE.is_match(cleaned) {
        NAME_TOKEN
    } else if ROLE_HEADER_RE.is_match(cleaned) {
        ROLE_TOKEN
    } else if START_HEADER_RE.is_match(cleaned) {
        START_TOKEN
    } else if END_HEADER_RE.is_match(cleaned) {
        END_TOKEN
    } else if PERIOD_HEADER_RE.is_match(cleaned) {
        PERIOD_TOKEN
    } else {
        cleaned
    };

    if canonical.is_empty() || canonical == SUBMITTING_HEI_LINE {
        return None;
    }

    Some(canonical.to_string())
}

/// Applies the full normalization pass to the raw first-page lines:
/// trim, artifact removal, header canonicalization, boilerplate drop.
///
/// Normalization is a fixed point: running it again over its own output
/// yields the identical sequence.
pub fn normalize_lines(raw_lines: &[String]) -> Vec<String> {
    raw_lines
        .iter()
        .filter_map(|line| normalize_line(line))
        .collect()
}

/// True for lines that are exactly one of the canonical marker tokens.
pub fn is_canonical_token(line: &str) -> bool {
    matches!(
        line,
        NAME_TOKEN | ROLE_TOKEN | START_TOKEN | END_TOKEN | PERIOD_TOKEN
    )
}

/// Scans normalized lines for marker positions.
///
/// Markers are lines exactly equal to a canonical token. When no `End:`
/// token exists the first-section header ("1. Summary") stands in as the
/// end marker, so downstream pairing still has a right boundary.
pub fn scan_markers(lines: &[String]) -> MarkerScan {
    let mut scan = MarkerScan::default();

    for (i, line) in lines.iter().enumerate() {
        match line.as_str() {
            NAME_TOKEN => scan.names.push(i),
            ROLE_TOKEN => scan.roles.push(i),
            PERIOD_TOKEN => scan.periods.push(i),
            END_TOKEN => scan.ends.push(i),
            _ => {}
        }
    }

    if scan.ends.is_empty() {
        scan.ends = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| SECTION_HEADER_RE.is_match(line))
            .map(|(i, _)| i)
            .collect();
    }

    scan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_header_canonicalization() {
        let raw = lines(&[
            "Name(s):",
            "Names of staff",
            "Role(s) (e.g. job title):",
            "Period when the underpinning research was undertaken: 2000-2015",
            "Period when the claimed impact occurred:",
            "Period employed by submitting HEI:",
        ]);
        let normalized = normalize_lines(&raw);
        assert_eq!(
            normalized,
            lines(&["Name:", "Name:", "Role:", "Start:", "End:", "Period:"])
        );
    }

    #[test]
    fn test_artifact_and_boilerplate_removal() {
        let raw = lines(&["  Alice Smith  ", "1B", "", "submitting HEI:", "Bob Jones"]);
        let normalized = normalize_lines(&raw);
        assert_eq!(normalized, lines(&["Alice Smith", "Bob Jones"]));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let raw = lines(&[
            " Name(s): ",
            "Dr Alice Smith",
            "Role(s):",
            "Professor",
            "Period when the claimed impact occurred:",
            "1. Summary of the impact",
        ]);
        let once = normalize_lines(&raw);
        let twice = normalize_lines(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_scan_markers_groups_by_kind() {
        let text = lines(&[
            "University of Somewhere",
            "Name:",
            "Alice",
            "Role:",
            "PI",
            "Period:",
            "2010-2015",
            "End:",
        ]);
        let scan = scan_markers(&text);
        assert_eq!(scan.names, vec![1]);
        assert_eq!(scan.roles, vec![3]);
        assert_eq!(scan.periods, vec![5]);
        assert_eq!(scan.ends, vec![7]);
    }

    #[test]
    fn test_scan_markers_section_header_fallback() {
        let text = lines(&["Name:", "Alice", "1. Summary of the impact"]);
        let scan = scan_markers(&text);
        assert_eq!(scan.ends, vec![2]);
    }

    #[test]
    fn test_scan_markers_none_found() {
        let text = lines(&["just", "content", "lines"]);
        let scan = scan_markers(&text);
        assert!(scan.names.is_empty());
        assert!(scan.ends.is_empty());
    }
}
