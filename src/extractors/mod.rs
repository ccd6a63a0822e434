// src/extractors/mod.rs
pub mod normalize;
pub mod record;
pub mod segment;

// Re-export key extraction types for convenience
#[allow(unused_imports)]
pub use normalize::{normalize_lines, scan_markers, MarkerScan};
#[allow(unused_imports)]
pub use record::{build_record, CaseStudyRecord, FieldValue};
#[allow(unused_imports)]
pub use segment::{extract_names_fallback, extract_segments, MarkerPairs};
