//! Visual diff rendering.
//!
//! Draws word-level changes onto a base document: translucent red boxes
//! with a strikethrough for deletions, translucent green boxes with an
//! underline for additions, plus an optional legend with the change counts.
//! Highlights are appended as new content streams so the original page
//! content is untouched.

use crate::error::MarkupError;
use crate::page;
use lopdf::Document;
use revdiff_core::{ChangeKind, TextChange, WordDiff};
use shared_pdf::coords;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use tracing::{debug, warn};

/// Smallest rendered highlight, in points; anything thinner stays legible.
const MIN_BOX_WIDTH: f64 = 10.0;
const MIN_BOX_HEIGHT: f64 = 8.0;

/// Page margin the legend keeps clear of.
const LEGEND_MARGIN: f64 = 16.0;
const LEGEND_FONT_SIZE: f64 = 9.0;

/// Graphics state and font resource names registered on marked pages.
const DIFF_GSTATE: &str = "GSdiff";
const LEGEND_FONT: &str = "Fdiff";

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Draw a fixed-position legend with addition/deletion counts.
    pub legend: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { legend: true }
    }
}

/// Render diff highlights onto `base_pdf` and return the marked-up bytes.
///
/// The base document must load fully; a corrupt file fails before any
/// mutation. Changes referring to pages the base does not have are skipped
/// with a warning.
pub fn render_visual_diff(
    base_pdf: &[u8],
    diff: &WordDiff,
    options: &RenderOptions,
) -> Result<Vec<u8>, MarkupError> {
    let mut doc =
        Document::load_mem(base_pdf).map_err(|e| MarkupError::DocumentLoad(e.to_string()))?;
    let pages = doc.get_pages();

    let mut by_page: BTreeMap<u32, Vec<&TextChange>> = BTreeMap::new();
    for change in &diff.changes {
        if change.kind == ChangeKind::Unchanged {
            continue;
        }
        by_page.entry(change.page).or_default().push(change);
    }

    for (page_number, changes) in &by_page {
        let Some(&page_id) = pages.get(page_number) else {
            warn!(page = page_number, "change beyond page count, skipped");
            continue;
        };
        let (page_width, page_height) = shared_pdf::document::page_size(&doc, page_id);

        page::add_alpha_gstate(&mut doc, page_id, DIFF_GSTATE, 0.85, 0.35)?;
        let content = highlight_content(changes, page_width, page_height);
        page::append_content(&mut doc, page_id, content)?;
        debug!(page = page_number, highlights = changes.len(), "page marked");
    }

    if options.legend {
        if let Some(&first_page) = pages.get(&1) {
            let (page_width, _) = shared_pdf::document::page_size(&doc, first_page);
            page::add_helvetica(&mut doc, first_page, LEGEND_FONT)?;
            let (_, page_height) = shared_pdf::document::page_size(&doc, first_page);
            let content = legend_content(diff, page_width, page_height);
            page::append_content(&mut doc, first_page, content)?;
        }
    }

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| MarkupError::Render(e.to_string()))?;
    Ok(output)
}

/// Content stream drawing all highlights for one page.
fn highlight_content(changes: &[&TextChange], page_width: f64, page_height: f64) -> String {
    let mut content = String::from("q\n");
    let _ = writeln!(content, "/{DIFF_GSTATE} gs");

    for change in changes {
        let width = change.width.max(MIN_BOX_WIDTH).min(page_width);
        let height = change.height.max(MIN_BOX_HEIGHT).min(page_height);
        let (x, y) = coords::viewport_to_pdf(change.x, change.y, height, page_height);
        let x = x.min((page_width - width).max(0.0));

        match change.kind {
            ChangeKind::Deleted => {
                let _ = writeln!(content, "0.86 0.20 0.20 rg");
                let _ = writeln!(content, "{x:.2} {y:.2} {width:.2} {height:.2} re f");
                // Strikethrough across the vertical midpoint.
                let mid = y + height / 2.0;
                let _ = writeln!(content, "0.55 0.08 0.08 RG 1.2 w");
                let _ = writeln!(content, "{x:.2} {mid:.2} m {:.2} {mid:.2} l S", x + width);
            }
            ChangeKind::Added => {
                let _ = writeln!(content, "0.22 0.65 0.29 rg");
                let _ = writeln!(content, "{x:.2} {y:.2} {width:.2} {height:.2} re f");
                // Underline along the bottom edge.
                let _ = writeln!(content, "0.10 0.42 0.16 RG 1.2 w");
                let _ = writeln!(content, "{x:.2} {y:.2} m {:.2} {y:.2} l S", x + width);
            }
            ChangeKind::Unchanged => {}
        }
    }

    content.push_str("Q\n");
    content
}

/// Fixed-position legend in the top-right corner of the first page.
fn legend_content(diff: &WordDiff, page_width: f64, page_height: f64) -> String {
    let added_label = format!("+{} added", diff.added);
    let removed_label = format!("-{} removed", diff.deleted);

    let text_width = page::estimate_text_width(&added_label, LEGEND_FONT_SIZE)
        .max(page::estimate_text_width(&removed_label, LEGEND_FONT_SIZE));
    let box_width = text_width + 2.0 * 8.0;
    let box_height = 2.0 * LEGEND_FONT_SIZE + 3.0 * 6.0;

    // Top-right, kept clear of the margins.
    let x = (page_width - LEGEND_MARGIN - box_width).max(LEGEND_MARGIN);
    let y = page_height - LEGEND_MARGIN - box_height;

    let mut content = String::from("q\n");
    let _ = writeln!(content, "1 1 1 rg 0.5 0.5 0.5 RG 0.75 w");
    let _ = writeln!(content, "{x:.2} {y:.2} {box_width:.2} {box_height:.2} re B");

    let text_x = x + 8.0;
    let added_y = y + box_height - 6.0 - LEGEND_FONT_SIZE;
    let removed_y = added_y - 6.0 - LEGEND_FONT_SIZE;

    let _ = writeln!(content, "0.10 0.42 0.16 rg");
    let _ = writeln!(
        content,
        "BT /{LEGEND_FONT} {LEGEND_FONT_SIZE} Tf {text_x:.2} {added_y:.2} Td ({}) Tj ET",
        page::escape_pdf_text(&added_label)
    );
    let _ = writeln!(content, "0.55 0.08 0.08 rg");
    let _ = writeln!(
        content,
        "BT /{LEGEND_FONT} {LEGEND_FONT_SIZE} Tf {text_x:.2} {removed_y:.2} Td ({}) Tj ET",
        page::escape_pdf_text(&removed_label)
    );
    content.push_str("Q\n");
    content
}
