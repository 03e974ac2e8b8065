use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

pub mod export;
pub mod xlsx;

pub use export::{export_records, render};

/// File name offered for the spreadsheet download.
pub const DEFAULT_FILENAME: &str = "kashafaat.xlsx";

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Column headers, in output order: excerpt, category, title, rationale, page.
pub const COLUMNS: [&str; 5] = [
    "مطلع الفقرة",
    "نوع الكشاف",
    "عنوان الكشاف",
    "سبب التصنيف",
    "رقم الصفحة",
];

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to build spreadsheet: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
    Json,
    Markdown,
}

impl ExportFormat {
    pub fn all() -> &'static [ExportFormat] {
        &[
            ExportFormat::Xlsx,
            ExportFormat::Csv,
            ExportFormat::Json,
            ExportFormat::Markdown,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Xlsx => "Excel",
            Self::Csv => "CSV",
            Self::Json => "JSON",
            Self::Markdown => "Markdown",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Xlsx => XLSX_MIME,
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json",
            Self::Markdown => "text/markdown; charset=utf-8",
        }
    }

    /// Guess the format from an output path's extension.
    pub fn from_path(path: &Path) -> Option<ExportFormat> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "xlsx" | "excel" => Ok(Self::Xlsx),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "md" | "markdown" => Ok(Self::Markdown),
            other => Err(format!(
                "unknown export format '{}' (expected xlsx, csv, json or markdown)",
                other
            )),
        }
    }
}
