use crate::error::EngineError;

/// Plain-text extraction for non-PDF documents.
///
/// DOCX parsing is delegated to an external collaborator rather than
/// implemented here; callers construct one once and pass it by reference.
pub trait PlainTextSource: Send + Sync {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, EngineError>;
}
