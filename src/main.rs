// src/main.rs
mod extractors;
mod pdf;
mod portal;
mod storage;
mod utils;

use clap::Parser;
use extractors::normalize;
use extractors::record::{self, CaseStudyRecord, FieldValue};
use portal::client;
use portal::models::{PageField, PageMetadata};
use portal::page;
use std::path::Path;
use storage::StorageManager;
use utils::error::PortalError;
use utils::AppError;

/// Command Line Interface for the REF impact case study extractor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File listing case study identifiers (one per line, or a CSV with an identifier column)
    #[arg(short, long)]
    ids: String,

    /// Column to read identifiers from when --ids is a CSV file
    #[arg(long, default_value = "REF impact case study identifier")]
    id_column: String,

    /// Base URL of the results portal
    #[arg(long, default_value = "https://results2021.ref.ac.uk/impact/")]
    base_url: String,

    /// Output directory for downloaded PDFs and extracted data
    #[arg(short, long, default_value = "./output")]
    output_dir: String,

    /// Skip page fetching and process already-downloaded PDFs only
    #[arg(long)]
    skip_fetch: bool,

    /// Debug mode - save annotated marker dumps for each document
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::info!("Starting processing for args: {:?}", args);

    // 3. Read the case study identifiers
    let keys = read_identifiers(Path::new(&args.ids), &args.id_column)?;
    if keys.is_empty() {
        return Err(AppError::Config(format!(
            "No case study identifiers found in {}",
            args.ids
        )));
    }
    tracing::info!("Read {} case study identifiers", keys.len());

    // 4. Initialize storage
    let storage = StorageManager::new(&args.output_dir)?;

    // 5. Fetch pages, scrape page-side fields, and download the PDFs.
    //    One case study in flight at a time; a failed page keeps its slot
    //    in the outputs as an unavailable value.
    let mut aux_entries: Vec<(String, PageField<PageMetadata>)> = Vec::new();
    let mut grant_entries: Vec<(String, PageField<String>)> = Vec::new();

    if !args.skip_fetch {
        let http = client::build_portal_client().map_err(PortalError::Network)?;

        for key in &keys {
            match client::fetch_case_study_page(&http, &args.base_url, key).await {
                Ok(html) => {
                    aux_entries.push((key.clone(), page::scrape_page_metadata(&html)));
                    grant_entries.push((key.clone(), page::scrape_grant_funding(&html)));

                    match page::find_pdf_link(&html, key) {
                        Ok(href) => {
                            let url = client::resolve_pdf_url(&args.base_url, &href);
                            match client::download_pdf(&http, &url).await {
                                Ok(bytes) => {
                                    storage.save_pdf(key, &bytes)?;
                                }
                                Err(e) => {
                                    tracing::error!("Failed to download PDF for {}: {}", key, e);
                                }
                            }
                        }
                        Err(e) => {
                            tracing::warn!("{}", e);
                        }
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to fetch page for {}: {}", key, e);
                    aux_entries.push((key.clone(), PageField::Unavailable));
                    grant_entries.push((key.clone(), PageField::Unavailable));
                }
            }
        }
    }

    // 6. Associate downloaded PDFs with identifiers (built once, then reused)
    let doc_map = storage.load_or_make_doc_map(&keys)?;
    tracing::info!("Document map covers {} PDFs", doc_map.len());

    // 7. Extract a record from each PDF's first page
    let mut records: Vec<(String, CaseStudyRecord)> = Vec::new();
    let mut success_count = 0;
    let mut failure_count = 0;

    for (filename, key) in &doc_map {
        let path = storage.file_path(filename);
        tracing::info!("Processing {} ({})", key, filename);

        match pdf::first_page_lines(&path) {
            Ok(raw_lines) => {
                let lines = normalize::normalize_lines(&raw_lines);

                if args.debug {
                    let scan = normalize::scan_markers(&lines);
                    let dump_path = storage.file_path(&format!("{}_markers.txt", key));
                    if let Err(e) = utils::text_debug::save_marker_dump(&lines, &scan, &dump_path)
                    {
                        tracing::warn!("Failed to save marker dump for {}: {}", key, e);
                    }
                }

                records.push((key.clone(), record::build_record(key, &lines)));
                success_count += 1;
            }
            Err(e) => {
                tracing::error!("Failed to extract text from {}: {}", filename, e);
                failure_count += 1;
            }
        }
    }

    // 8. Write the outputs
    let names_entries: Vec<(String, FieldValue)> = records
        .iter()
        .map(|(key, record)| (key.clone(), record.names.clone()))
        .collect();
    let roles_entries: Vec<(String, FieldValue)> = records
        .iter()
        .map(|(key, record)| (key.clone(), record.roles.clone()))
        .collect();
    let period_entries: Vec<(String, FieldValue)> = records
        .iter()
        .map(|(key, record)| (key.clone(), record.periods.clone()))
        .collect();
    let raw_entries: Vec<(String, Vec<String>)> = records
        .iter()
        .map(|(key, record)| (key.clone(), record.raw.clone()))
        .collect();

    storage.save_jsonl("author_data.jsonl", &names_entries)?;
    storage.save_jsonl("role_data.jsonl", &roles_entries)?;
    storage.save_jsonl("period_data.jsonl", &period_entries)?;
    storage.save_jsonl("raw_data.jsonl", &raw_entries)?;

    if !args.skip_fetch {
        storage.save_jsonl("aux_data.jsonl", &aux_entries)?;
        storage.save_jsonl("grant_data.jsonl", &grant_entries)?;
    }

    storage.save_author_table(&records)?;
    storage.save_run_metadata(keys.len(), success_count, failure_count)?;

    tracing::info!(
        "Processing finished. Success: {}, Failures: {}",
        success_count,
        failure_count
    );

    if success_count == 0 && failure_count > 0 {
        return Err(AppError::Processing(format!(
            "Failed to extract any records from {} documents",
            failure_count
        )));
    }

    Ok(())
}

/// Reads case study identifiers from a plain text file (one per line) or,
/// for `.csv` files, from the named column.
fn read_identifiers(path: &Path, id_column: &str) -> Result<Vec<String>, AppError> {
    let text = std::fs::read_to_string(path)?;

    let is_csv = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"));

    if !is_csv {
        return Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect());
    }

    let mut lines = text.lines();
    let header = lines
        .next()
        .ok_or_else(|| AppError::Config(format!("Empty CSV file: {}", path.display())))?;

    // Identifier fields in this corpus contain no embedded commas, so a
    // plain split is sufficient
    let column_index = header
        .split(',')
        .map(|field| field.trim().trim_matches('"'))
        .position(|field| field == id_column)
        .ok_or_else(|| {
            AppError::Config(format!(
                "Column '{}' not found in {}",
                id_column,
                path.display()
            ))
        })?;

    Ok(lines
        .filter_map(|line| line.split(',').nth(column_index))
        .map(|field| field.trim().trim_matches('"'))
        .filter(|field| !field.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_identifiers_plain_text() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ics-1\n\n  ics-2  ").unwrap();

        let keys = read_identifiers(file.path(), "unused").unwrap();
        assert_eq!(keys, vec!["ics-1".to_string(), "ics-2".to_string()]);
    }

    #[test]
    fn test_read_identifiers_csv_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref_data.csv");
        std::fs::write(
            &path,
            "Institution,REF impact case study identifier\nSomewhere,ics-1\nElsewhere,ics-2\n",
        )
        .unwrap();

        let keys = read_identifiers(&path, "REF impact case study identifier").unwrap();
        assert_eq!(keys, vec!["ics-1".to_string(), "ics-2".to_string()]);
    }

    #[test]
    fn test_read_identifiers_csv_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref_data.csv");
        std::fs::write(&path, "a,b\n1,2\n").unwrap();

        let err = read_identifiers(&path, "missing").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
