// src/utils/text_debug.rs
use crate::extractors::normalize::MarkerScan;
use crate::utils::error::AppError;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Saves the normalized first-page lines with marker annotations, so a
/// failed extraction can be diagnosed against the exact line indices the
/// extractor saw.
pub fn save_marker_dump(
    lines: &[String],
    scan: &MarkerScan,
    path: &Path,
) -> Result<(), AppError> {
    let mut file = File::create(path)?;

    for (i, line) in lines.iter().enumerate() {
        let tag = marker_tag(scan, i);
        writeln!(file, "{:4} {:8} {}", i, tag, line)?;
    }

    tracing::info!("Saved marker dump to {}", path.display());
    Ok(())
}

fn marker_tag(scan: &MarkerScan, index: usize) -> &'static str {
    if scan.names.contains(&index) {
        "[NAME]"
    } else if scan.roles.contains(&index) {
        "[ROLE]"
    } else if scan.periods.contains(&index) {
        "[PERIOD]"
    } else if scan.ends.contains(&index) {
        "[END]"
    } else {
        ""
    }
}
