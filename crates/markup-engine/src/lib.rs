//! Visual markup of legal-article PDFs.
//!
//! Two engines sharing the page-mutation helpers in [`page`]:
//! - [`render::render_visual_diff`] draws word-level diff highlights onto a
//!   base document.
//! - [`watermark::apply_watermark`] embeds logo/text watermarks and, for
//!   published end-user downloads, a clickable link annotation.

pub mod error;
pub mod page;
#[cfg(test)]
pub(crate) mod testutil;
pub mod render;
pub mod watermark;

pub use error::MarkupError;
pub use render::{render_visual_diff, RenderOptions};
pub use watermark::{apply_watermark, ActorRole, PublicationStatus, WatermarkOptions};
