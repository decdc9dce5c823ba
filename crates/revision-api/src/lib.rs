//! Async entry points of the revision engine.
//!
//! Each operation is an independent sequential transform over the documents
//! it is given: resolve the references, run the pure engines, return the
//! result. No state is shared between invocations.

pub mod error;
pub mod fetch;
pub mod source;

pub use error::EngineError;
pub use fetch::{DocFormat, DocRef};
pub use source::PlainTextSource;

pub use markup_engine::{ActorRole, PublicationStatus, RenderOptions, WatermarkOptions};
pub use revdiff_core::{DiffResult, WordDiff};

use shared_pdf::{PageText, PdfDocument};
use tracing::debug;

/// Plain text of one revision, whichever format it arrived in.
fn plain_text(
    bytes: &[u8],
    format: DocFormat,
    docx_source: Option<&dyn PlainTextSource>,
) -> Result<String, EngineError> {
    match format {
        DocFormat::Pdf => {
            let doc = PdfDocument::load_bytes(bytes)?;
            Ok(shared_pdf::extract::extract_plain_text(&doc)?)
        }
        DocFormat::Docx => match docx_source {
            Some(source) => source.extract_text(bytes),
            None => Err(EngineError::UnsupportedFormat(
                "docx comparison requires a plain-text source".to_string(),
            )),
        },
    }
}

fn positioned_text(bytes: &[u8], format: DocFormat) -> Result<Vec<PageText>, EngineError> {
    if format != DocFormat::Pdf {
        return Err(EngineError::UnsupportedFormat(
            "visual markup requires PDF input".to_string(),
        ));
    }
    let doc = PdfDocument::load_bytes(bytes)?;
    Ok(shared_pdf::extract_positioned_text(&doc)?)
}

/// Compare two revisions line by line.
///
/// Both sides may be PDFs; DOCX sides are read through `docx_source`.
/// Degraded extraction (an image-only scan, say) yields empty text and the
/// comparison proceeds, reporting everything on the other side.
pub async fn compare_revisions(
    old_ref: &DocRef,
    new_ref: &DocRef,
    docx_source: Option<&dyn PlainTextSource>,
) -> Result<DiffResult, EngineError> {
    let (old_bytes, old_format) = fetch::resolve(old_ref).await?;
    let (new_bytes, new_format) = fetch::resolve(new_ref).await?;

    let old_text = plain_text(&old_bytes, old_format, docx_source)?;
    let new_text = plain_text(&new_bytes, new_format, docx_source)?;

    let result = revdiff_core::diff_lines(&old_text, &new_text);
    debug!(
        added = result.summary.added,
        removed = result.summary.removed,
        modified = result.summary.modified,
        "revisions compared"
    );
    Ok(result)
}

/// Render the word-level differences between two revisions as a marked-up
/// PDF.
///
/// Highlights are drawn onto whichever revision carries more of the
/// change: the new one when additions dominate or tie, the old one when
/// deletions dominate.
pub async fn render_visual_diff(
    old_ref: &DocRef,
    new_ref: &DocRef,
    options: &RenderOptions,
) -> Result<Vec<u8>, EngineError> {
    let (old_bytes, old_format) = fetch::resolve(old_ref).await?;
    let (new_bytes, new_format) = fetch::resolve(new_ref).await?;

    let old_pages = positioned_text(&old_bytes, old_format)?;
    let new_pages = positioned_text(&new_bytes, new_format)?;
    let diff = revdiff_core::diff_words(&old_pages, &new_pages);

    let base = if diff.added >= diff.deleted {
        &new_bytes
    } else {
        &old_bytes
    };
    debug!(
        added = diff.added,
        deleted = diff.deleted,
        base_is_new = diff.added >= diff.deleted,
        "rendering visual diff"
    );
    Ok(markup_engine::render_visual_diff(base, &diff, options)?)
}

/// Watermark a single document for download.
pub async fn apply_watermark(
    doc_ref: &DocRef,
    options: &WatermarkOptions,
) -> Result<Vec<u8>, EngineError> {
    let (bytes, format) = fetch::resolve(doc_ref).await?;
    if format != DocFormat::Pdf {
        return Err(EngineError::UnsupportedFormat(
            "watermarking requires PDF input".to_string(),
        ));
    }
    Ok(markup_engine::apply_watermark(&bytes, options)?)
}
