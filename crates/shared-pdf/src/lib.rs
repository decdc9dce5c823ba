//! Shared PDF handling utilities
//!
//! This crate provides common PDF parsing, coordinate transformation,
//! and positioned text extraction functionality used across the engine.

pub mod coords;
#[cfg(test)]
pub(crate) mod testutil;
pub mod document;
pub mod error;
pub mod extract;
pub mod geometry;

pub use coords::{pdf_to_viewport, viewport_to_pdf};
pub use document::PdfDocument;
pub use error::PdfError;
pub use extract::extract_positioned_text;
pub use geometry::{PageText, WordBox};
