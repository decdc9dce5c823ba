use thiserror::Error;

/// Top-level error for the revision engine entry points.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("download failed: {0}")]
    Download(String),

    #[error(transparent)]
    Pdf(#[from] shared_pdf::PdfError),

    #[error(transparent)]
    Markup(#[from] markup_engine::MarkupError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
