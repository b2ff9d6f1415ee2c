//! Common types used across the client

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Supported UI languages
///
/// Spanish is the default; the UI toggles between exactly these two.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Es,
    En,
}

impl Locale {
    pub fn code(&self) -> &'static str {
        match self {
            Locale::Es => "es",
            Locale::En => "en",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Locale::Es => Locale::En,
            Locale::En => Locale::Es,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "es" => Ok(Locale::Es),
            "en" => Ok(Locale::En),
            other => Err(format!("unsupported locale: {}", other)),
        }
    }
}

/// Which data set a CSV upload replaces
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Inventory,
    Students,
}

impl UploadKind {
    /// Path segment under `/upload/`
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadKind::Inventory => "inventory",
            UploadKind::Students => "students",
        }
    }

    /// Header columns the service requires for this upload
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            UploadKind::Inventory => &["sku_id", "description", "total_stock_available"],
            UploadKind::Students => &[
                "student_id",
                "school_id",
                "shirt_sku",
                "pants_sku",
                "shoe_size_sku",
            ],
        }
    }
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inventory" => Ok(UploadKind::Inventory),
            "students" => Ok(UploadKind::Students),
            other => Err(format!("unknown upload kind: {}", other)),
        }
    }
}

/// Request body for the text upload endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvPayload {
    pub csv_content: String,
}

/// Result of a CSV upload
///
/// Row errors are non-fatal: a non-empty `errors` list does not imply
/// `upserted == 0`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct UploadOutcome {
    pub upserted: u64,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl UploadOutcome {
    pub fn has_row_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
