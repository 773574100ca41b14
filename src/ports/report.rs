//! Report port: Trait for serializing a prediction report to a document.

use crate::application::Report;

/// Errors that can occur while producing a document.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Font error: {0}")]
    Font(String),

    #[error("Document encoding failed: {0}")]
    Encode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for document backends.
pub trait ReportWriter: Send + Sync {
    /// File extension without the dot, e.g. `pdf`.
    fn extension(&self) -> &'static str;

    /// Render the report to bytes.
    ///
    /// # Errors
    /// Returns `ReportError` if the document cannot be produced.
    fn render(&self, report: &Report) -> Result<Vec<u8>, ReportError>;
}
