use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("unsupported document type: {0}")]
    Unsupported(String),
    #[error("malformed document: {0}")]
    Malformed(String),
    #[error("document is not valid UTF-8")]
    Encoding,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for document text extraction backends.
///
/// Implementors turn an uploaded document into the flat, newline-joined text
/// the analysis pipeline works on.
pub trait DocumentBackend: Send + Sync {
    /// Extract text from a file on disk.
    fn extract_text(&self, path: &Path) -> Result<String, DocumentError> {
        let data = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.extract_text_from_bytes(&name, &data)
    }

    /// Extract text from an in-memory upload. `filename` is used only to
    /// pick a format.
    fn extract_text_from_bytes(&self, filename: &str, data: &[u8])
    -> Result<String, DocumentError>;
}
