use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Failed to load document: {0}")]
    DocumentLoad(String),

    #[error("Text extraction failed: {0}")]
    ExtractionFailed(String),
}
