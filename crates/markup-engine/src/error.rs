use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarkupError {
    #[error("Failed to load document: {0}")]
    DocumentLoad(String),

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("Annotation update failed: {0}")]
    Annotation(String),
}
