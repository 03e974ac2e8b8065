use std::path::Path;

pub mod docx;

// Re-export domain types for convenience
pub use kashaf_core::{DocumentBackend, DocumentError};

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Docx,
    PlainText,
}

/// Detect the document format from the file name and magic bytes.
///
/// Extension wins when it is recognized; otherwise a ZIP signature means
/// `.docx`. Legacy binary `.doc` files are rejected.
pub fn detect_format(filename: &str, data: &[u8]) -> Result<DocumentFormat, DocumentError> {
    let lower = filename.to_lowercase();

    if lower.ends_with(".docx") {
        if !data.starts_with(b"PK") {
            return Err(DocumentError::Malformed(
                "file has .docx extension but is not a ZIP container".to_string(),
            ));
        }
        return Ok(DocumentFormat::Docx);
    }
    if lower.ends_with(".txt") || lower.ends_with(".md") || lower.ends_with(".text") {
        return Ok(DocumentFormat::PlainText);
    }
    if lower.ends_with(".doc") {
        return Err(DocumentError::Unsupported(
            "legacy .doc files are not supported; save as .docx".to_string(),
        ));
    }

    if data.starts_with(b"PK") {
        return Ok(DocumentFormat::Docx);
    }

    Err(DocumentError::Unsupported(format!(
        "{} (expected .docx or .txt)",
        if filename.is_empty() { "<unnamed>" } else { filename }
    )))
}

/// Reads `.docx` and plain-text documents.
#[derive(Debug, Clone, Default)]
pub struct DocumentReader {
    /// Upper bound on the uncompressed size of the document body, in bytes
    /// (0 = unlimited).
    pub max_body_size: u64,
}

impl DocumentReader {
    pub fn new() -> Self {
        Self {
            max_body_size: docx::DEFAULT_MAX_BODY_SIZE,
        }
    }
}

impl DocumentBackend for DocumentReader {
    fn extract_text_from_bytes(
        &self,
        filename: &str,
        data: &[u8],
    ) -> Result<String, DocumentError> {
        let format = detect_format(filename, data)?;
        tracing::debug!(filename, ?format, bytes = data.len(), "reading document");
        match format {
            DocumentFormat::Docx => docx::extract_text(data, self.max_body_size),
            DocumentFormat::PlainText => plain_text(data),
        }
    }
}

/// Read a document from disk with the default reader.
pub fn read_document(path: &Path) -> Result<String, DocumentError> {
    DocumentReader::new().extract_text(path)
}

fn plain_text(data: &[u8]) -> Result<String, DocumentError> {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    String::from_utf8(data.to_vec()).map_err(|_| DocumentError::Encoding)
}
