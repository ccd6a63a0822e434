// src/extractors/record.rs

use crate::extractors::normalize::{scan_markers, MarkerScan};
use crate::extractors::segment::{extract_names_fallback, extract_segments, MarkerPairs};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

// Connective words from the period header that leak into the period segment
// on some layouts ("Period employed / by / submitting HEI")
const PERIOD_ARTIFACT_WORDS: [&str; 2] = ["by", "employed"];

/// An extracted field: either the content lines, or explicitly unavailable.
///
/// `Unavailable` serializes as JSON `null`, so downstream consumers can
/// distinguish a field that was missing from one that was present but empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Lines(Vec<String>),
    Unavailable,
}

impl FieldValue {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, FieldValue::Unavailable)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Lines(lines) => lines.serialize(serializer),
            FieldValue::Unavailable => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let lines = Option::<Vec<String>>::deserialize(deserializer)?;
        Ok(lines.map_or(FieldValue::Unavailable, FieldValue::Lines))
    }
}

/// Everything extracted from one case study PDF's first page.
/// Constructed once per document and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseStudyRecord {
    pub names: FieldValue,
    pub roles: FieldValue,
    pub periods: FieldValue,
    /// Normalized lines up to the first end marker (all lines when none exists)
    pub raw: Vec<String>,
}

/// Builds a record from normalized first-page lines.
///
/// Pairing policy: names lie between `Name:` and `Role:` markers, roles
/// between `Role:` and `Period:`, periods between `Period:` and the end
/// marker. A field whose markers are missing degrades to `Unavailable`
/// (logged, never raised); only the names field carries the range+denylist
/// fallback, triggered when the primary pairing yields the empty sequence.
pub fn build_record(case_study: &str, lines: &[String]) -> CaseStudyRecord {
    let scan = scan_markers(lines);

    let names = extract_names(case_study, lines, &scan);
    let roles = extract_paired_field(case_study, "roles", lines, &scan.roles, &scan.periods);
    let periods = match extract_paired_field(case_study, "periods", lines, &scan.periods, &scan.ends)
    {
        FieldValue::Lines(mut segment) => {
            segment.retain(|line| !PERIOD_ARTIFACT_WORDS.contains(&line.as_str()));
            FieldValue::Lines(segment)
        }
        unavailable => unavailable,
    };

    let raw = match scan.ends.first() {
        Some(&end) => lines[..end].to_vec(),
        None => lines.to_vec(),
    };

    CaseStudyRecord {
        names,
        roles,
        periods,
        raw,
    }
}

fn extract_names(case_study: &str, lines: &[String], scan: &MarkerScan) -> FieldValue {
    if scan.names.is_empty() || scan.roles.is_empty() {
        tracing::warn!(case_study, "no name markers found; names unavailable");
        return FieldValue::Unavailable;
    }

    let primary = match MarkerPairs::pair(&scan.names, &scan.roles, lines.len()) {
        Ok(pairs) => extract_segments(lines, &pairs),
        Err(e) => {
            tracing::warn!(case_study, error = %e, "name/role pairing malformed");
            Vec::new()
        }
    };

    if !primary.is_empty() {
        return FieldValue::Lines(primary);
    }

    // Degraded mode: coarse range from the first name marker to the first
    // end marker, filtered against the boilerplate denylist.
    match (scan.names.first(), scan.ends.first()) {
        (Some(&start), Some(&end)) if start < end => {
            tracing::debug!(case_study, "names empty after pairing; using range fallback");
            FieldValue::Lines(extract_names_fallback(lines, start, end))
        }
        _ => {
            tracing::warn!(case_study, "names empty and no usable fallback range");
            FieldValue::Lines(Vec::new())
        }
    }
}

fn extract_paired_field(
    case_study: &str,
    field: &str,
    lines: &[String],
    starts: &[usize],
    ends: &[usize],
) -> FieldValue {
    if starts.is_empty() || ends.is_empty() {
        tracing::warn!(case_study, field, "no markers found; field unavailable");
        return FieldValue::Unavailable;
    }

    match MarkerPairs::pair(starts, ends, lines.len()) {
        Ok(pairs) => FieldValue::Lines(extract_segments(lines, &pairs)),
        Err(e) => {
            tracing::warn!(case_study, field, error = %e, "marker pairing malformed; field unavailable");
            FieldValue::Unavailable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::normalize::normalize_lines;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_well_formed_record() {
        let raw = lines(&[
            "Institution: University of Somewhere",
            "Period when the underpinning research was undertaken: 2000-2010",
            "Name(s):",
            "Dr Alice Smith",
            "Dr Bob Jones",
            "Role(s):",
            "Professor",
            "Reader",
            "Period(s) employed by submitting HEI:",
            "2000-present",
            "Period when the claimed impact occurred:",
            "1. Summary of the impact",
        ]);
        let normalized = normalize_lines(&raw);
        let record = build_record("ics-1", &normalized);

        assert_eq!(
            record.names,
            FieldValue::Lines(lines(&["Dr Alice Smith", "Dr Bob Jones"]))
        );
        assert_eq!(
            record.roles,
            FieldValue::Lines(lines(&["Professor", "Reader"]))
        );
        assert_eq!(record.periods, FieldValue::Lines(lines(&["2000-present"])));
        // raw stops at the first end marker
        assert_eq!(record.raw.last().map(String::as_str), Some("2000-present"));
    }

    #[test]
    fn test_missing_name_markers_degrade_to_unavailable() {
        let normalized = lines(&["no", "markers", "here"]);
        let record = build_record("ics-2", &normalized);
        assert!(record.names.is_unavailable());
        assert!(record.roles.is_unavailable());
        assert!(record.periods.is_unavailable());
        assert_eq!(record.raw, normalized);
    }

    #[test]
    fn test_empty_primary_result_triggers_names_fallback() {
        // Nothing between Name: and Role:, but real content in the coarse range
        let normalized = lines(&["Name:", "Role:", "Dr Alice Smith", "End:"]);
        let record = build_record("ics-3", &normalized);
        assert_eq!(record.names, FieldValue::Lines(lines(&["Dr Alice Smith"])));
    }

    #[test]
    fn test_malformed_pairing_routes_names_to_fallback() {
        // Two Name: markers against one Role: marker - the validating
        // builder refuses to truncate, so names come from the fallback.
        let normalized = lines(&["Name:", "Name:", "Dr Alice Smith", "Role:", "End:"]);
        let record = build_record("ics-4", &normalized);
        assert_eq!(record.names, FieldValue::Lines(lines(&["Dr Alice Smith"])));
    }

    #[test]
    fn test_malformed_pairing_leaves_roles_unavailable() {
        let normalized = lines(&["Role:", "Role:", "PI", "Period:", "End:"]);
        let record = build_record("ics-5", &normalized);
        assert!(record.roles.is_unavailable());
    }

    #[test]
    fn test_period_artifact_words_removed() {
        let normalized = lines(&["Period:", "employed", "by", "2001-2015", "End:"]);
        let record = build_record("ics-6", &normalized);
        assert_eq!(record.periods, FieldValue::Lines(lines(&["2001-2015"])));
    }

    #[test]
    fn test_field_value_round_trips_through_json() {
        let present = FieldValue::Lines(lines(&["Alice", "Bob"]));
        let absent = FieldValue::Unavailable;

        let present_json = serde_json::to_string(&present).unwrap();
        let absent_json = serde_json::to_string(&absent).unwrap();
        assert_eq!(present_json, r#"["Alice","Bob"]"#);
        assert_eq!(absent_json, "null");

        assert_eq!(
            serde_json::from_str::<FieldValue>(&present_json).unwrap(),
            present
        );
        assert_eq!(
            serde_json::from_str::<FieldValue>(&absent_json).unwrap(),
            absent
        );
    }

    #[test]
    fn test_record_round_trips_through_json() {
        let record = CaseStudyRecord {
            names: FieldValue::Lines(lines(&["Alice"])),
            roles: FieldValue::Unavailable,
            periods: FieldValue::Lines(Vec::new()),
            raw: lines(&["Name:", "Alice"]),
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: CaseStudyRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
