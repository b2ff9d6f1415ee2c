//! CSV header pre-flight for uploads
//!
//! Only the header row is checked locally; row-level validation stays with
//! the service, which reports it back as non-fatal row errors.

use std::collections::HashSet;

use thiserror::Error;

use crate::types::UploadKind;

const BOM: char = '\u{feff}';

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CsvCheckError {
    #[error("CSV is empty or has no header row")]
    Empty,

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("CSV header could not be read: {0}")]
    Unreadable(String),
}

/// Verify that `text` has a header row with every column `kind` requires
pub fn check_csv_header(kind: UploadKind, text: &str) -> Result<(), CsvCheckError> {
    let text = text.trim_start_matches(BOM);
    if text.trim().is_empty() {
        return Err(CsvCheckError::Empty);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| CsvCheckError::Unreadable(e.to_string()))?;

    let present: HashSet<&str> = headers.iter().filter(|h| !h.is_empty()).collect();
    if present.is_empty() {
        return Err(CsvCheckError::Empty);
    }

    let mut missing: Vec<String> = kind
        .required_columns()
        .iter()
        .filter(|column| !present.contains(*column))
        .map(|column| column.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        missing.sort();
        Err(CsvCheckError::MissingColumns(missing))
    }
}
