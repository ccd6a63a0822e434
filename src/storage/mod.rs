// src/storage/mod.rs
use crate::extractors::record::{CaseStudyRecord, FieldValue};
use crate::utils::error::StorageError;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const DOC_MAP_FILENAME: &str = "pdf_key_map.json";
const AUTHOR_TABLE_FILENAME: &str = "author_data.csv";
const RUN_METADATA_FILENAME: &str = "run_metadata.json";

// Sentinel used only in the tabular author output, where every document
// must contribute at least one row
const NO_AUTHOR_SENTINEL: &str = "None";

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self {
            base_dir: base_path,
        })
    }

    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.base_dir.join(filename)
    }

    /// Saves downloaded PDF bytes under `<identifier>.pdf`.
    pub fn save_pdf(&self, case_study: &str, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        let path = self.base_dir.join(format!("{}.pdf", case_study));
        fs::write(&path, bytes).map_err(StorageError::IoError)?;
        tracing::info!("Saved PDF to {}", path.display());
        Ok(path)
    }

    /// Loads the persisted filename-to-identifier map, or builds it once.
    ///
    /// On first use the map is derived by listing the directory's PDF files
    /// ordered by modification time and zipping them against the identifier
    /// list in order, then written to disk. An existing map file is loaded
    /// verbatim and never regenerated.
    pub fn load_or_make_doc_map(
        &self,
        keys: &[String],
    ) -> Result<Vec<(String, String)>, StorageError> {
        let map_path = self.base_dir.join(DOC_MAP_FILENAME);

        if map_path.exists() {
            tracing::info!("Loading existing document map from {}", map_path.display());
            let text = fs::read_to_string(&map_path).map_err(StorageError::IoError)?;
            return serde_json::from_str(&text)
                .map_err(|e| StorageError::SerializationError(e.to_string()));
        }

        let mut pdf_files: Vec<(String, SystemTime)> = Vec::new();
        for entry in fs::read_dir(&self.base_dir).map_err(StorageError::IoError)? {
            let entry = entry.map_err(StorageError::IoError)?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "pdf") {
                let modified = entry
                    .metadata()
                    .and_then(|m| m.modified())
                    .map_err(StorageError::IoError)?;
                let filename = entry.file_name().to_string_lossy().to_string();
                pdf_files.push((filename, modified));
            }
        }
        pdf_files.sort_by_key(|(_, modified)| *modified);

        if pdf_files.len() != keys.len() {
            tracing::warn!(
                "document map has {} PDF files but {} identifiers; zipping to the shorter list",
                pdf_files.len(),
                keys.len()
            );
        }

        let map: Vec<(String, String)> = pdf_files
            .into_iter()
            .map(|(filename, _)| filename)
            .zip(keys.iter().cloned())
            .collect();

        let text = serde_json::to_string_pretty(&map)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&map_path, text).map_err(StorageError::IoError)?;
        tracing::info!("Wrote document map to {}", map_path.display());

        Ok(map)
    }

    /// Writes one `{"<identifier>": <value>}` JSON object per line.
    pub fn save_jsonl<T: Serialize>(
        &self,
        filename: &str,
        entries: &[(String, T)],
    ) -> Result<PathBuf, StorageError> {
        let path = self.base_dir.join(filename);
        let mut file = fs::File::create(&path).map_err(StorageError::IoError)?;

        for (key, value) in entries {
            let value = serde_json::to_value(value)
                .map_err(|e| StorageError::SerializationError(e.to_string()))?;
            let mut object = serde_json::Map::new();
            object.insert(key.clone(), value);
            let line = serde_json::to_string(&serde_json::Value::Object(object))
                .map_err(|e| StorageError::SerializationError(e.to_string()))?;
            writeln!(file, "{}", line).map_err(StorageError::IoError)?;
        }

        tracing::info!("Saved {} entries to {}", entries.len(), path.display());
        Ok(path)
    }

    /// Reads a JSONL file back into (identifier, value) pairs.
    pub fn load_jsonl(
        &self,
        filename: &str,
    ) -> Result<Vec<(String, serde_json::Value)>, StorageError> {
        let path = self.base_dir.join(filename);
        let text = fs::read_to_string(&path).map_err(StorageError::IoError)?;

        let mut entries = Vec::new();
        for line in text.lines().filter(|line| !line.trim().is_empty()) {
            let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(line)
                .map_err(|e| StorageError::SerializationError(e.to_string()))?;
            for (key, value) in object {
                entries.push((key, value));
            }
        }

        Ok(entries)
    }

    /// Writes the tabular author output: one row per extracted name, with
    /// the identifier repeated for multi-author documents. Documents with
    /// unavailable or empty names contribute a single sentinel row.
    pub fn save_author_table(
        &self,
        records: &[(String, CaseStudyRecord)],
    ) -> Result<PathBuf, StorageError> {
        let path = self.base_dir.join(AUTHOR_TABLE_FILENAME);
        let mut file = fs::File::create(&path).map_err(StorageError::IoError)?;

        writeln!(file, "key,author").map_err(StorageError::IoError)?;

        for (key, record) in records {
            match &record.names {
                FieldValue::Lines(names) if !names.is_empty() => {
                    for name in names {
                        writeln!(file, "{},{}", csv_field(key), csv_field(name))
                            .map_err(StorageError::IoError)?;
                    }
                }
                _ => {
                    writeln!(file, "{},{}", csv_field(key), NO_AUTHOR_SENTINEL)
                        .map_err(StorageError::IoError)?;
                }
            }
        }

        tracing::info!("Saved author table to {}", path.display());
        Ok(path)
    }

    /// Stamps a small run-metadata file next to the outputs.
    pub fn save_run_metadata(
        &self,
        identifiers: usize,
        success_count: usize,
        failure_count: usize,
    ) -> Result<PathBuf, StorageError> {
        let path = self.base_dir.join(RUN_METADATA_FILENAME);

        let metadata = serde_json::json!({
            "identifiers": identifiers,
            "records_extracted": success_count,
            "failures": failure_count,
            "run_timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let text = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&path, text).map_err(StorageError::IoError)?;

        tracing::info!("Saved run metadata to {}", path.display());
        Ok(path)
    }
}

/// Quotes a CSV field when it contains a delimiter, quote, or newline.
fn csv_field(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') || raw.contains('\n') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn record_with_names(names: FieldValue) -> CaseStudyRecord {
        CaseStudyRecord {
            names,
            roles: FieldValue::Unavailable,
            periods: FieldValue::Lines(Vec::new()),
            raw: Vec::new(),
        }
    }

    #[test]
    fn test_jsonl_round_trip_with_null_fields() {
        let dir = tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();

        let entries = vec![
            ("ics-1".to_string(), FieldValue::Lines(lines(&["Alice"]))),
            ("ics-2".to_string(), FieldValue::Unavailable),
        ];
        storage.save_jsonl("author_data.jsonl", &entries).unwrap();

        let loaded = storage.load_jsonl("author_data.jsonl").unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].0, "ics-1");
        assert_eq!(loaded[0].1, serde_json::json!(["Alice"]));
        assert_eq!(loaded[1].0, "ics-2");
        assert_eq!(loaded[1].1, serde_json::Value::Null);
    }

    #[test]
    fn test_doc_map_built_by_mtime_and_reused() {
        let dir = tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();

        fs::write(dir.path().join("first.pdf"), b"%PDF-1.4").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(50));
        fs::write(dir.path().join("second.pdf"), b"%PDF-1.4").unwrap();

        let keys = lines(&["ics-1", "ics-2"]);
        let map = storage.load_or_make_doc_map(&keys).unwrap();
        assert_eq!(
            map,
            vec![
                ("first.pdf".to_string(), "ics-1".to_string()),
                ("second.pdf".to_string(), "ics-2".to_string()),
            ]
        );

        // A later call with different keys must return the persisted map
        let reloaded = storage.load_or_make_doc_map(&lines(&["other"])).unwrap();
        assert_eq!(reloaded, map);
    }

    #[test]
    fn test_doc_map_zips_to_shorter_list() {
        let dir = tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();

        fs::write(dir.path().join("only.pdf"), b"%PDF-1.4").unwrap();

        let keys = lines(&["ics-1", "ics-2"]);
        let map = storage.load_or_make_doc_map(&keys).unwrap();
        assert_eq!(map, vec![("only.pdf".to_string(), "ics-1".to_string())]);
    }

    #[test]
    fn test_author_table_rows_and_sentinel() {
        let dir = tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();

        let records = vec![
            (
                "ics-1".to_string(),
                record_with_names(FieldValue::Lines(lines(&["Alice", "Smith, Bob"]))),
            ),
            (
                "ics-2".to_string(),
                record_with_names(FieldValue::Unavailable),
            ),
            (
                "ics-3".to_string(),
                record_with_names(FieldValue::Lines(Vec::new())),
            ),
        ];
        let path = storage.save_author_table(&records).unwrap();

        let text = fs::read_to_string(path).unwrap();
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(
            rows,
            vec![
                "key,author",
                "ics-1,Alice",
                "ics-1,\"Smith, Bob\"",
                "ics-2,None",
                "ics-3,None",
            ]
        );
    }
}
