//! Positioned text extraction.
//!
//! Interprets each page's content stream with a small text-state machine
//! (BT/ET, Tf, Td/TD/Tm/T*/TL, Tj/TJ/'/") and emits one [`WordBox`] per
//! whitespace-separated word. Content streams often bundle several words
//! into one show-text run; the run's estimated width is distributed across
//! sub-words proportionally to their character counts so word-level diffing
//! gets individual boxes.
//!
//! Extraction is lossy by design: glyph widths are estimated from character
//! counts rather than font programs, and a page with no recoverable text is
//! a warning, not an error, so downstream diffing can proceed.

use crate::coords;
use crate::document::PdfDocument;
use crate::error::PdfError;
use crate::geometry::{PageText, WordBox};
use lopdf::content::Content;
use lopdf::Object;
use tracing::{debug, warn};

/// Average glyph advance as a fraction of the font size. Helvetica averages
/// out near this for running legal text.
const GLYPH_WIDTH_FACTOR: f64 = 0.5;

/// Extract per-word bounding boxes for every page of a document.
///
/// Pages that yield no text (scanned or image-only) produce an empty
/// [`PageText`] and a warning rather than an error.
pub fn extract_positioned_text(doc: &PdfDocument) -> Result<Vec<PageText>, PdfError> {
    let mut pages = Vec::with_capacity(doc.page_count());
    let mut total_chars = 0usize;

    for (page_number, page_id) in doc.pages() {
        let (width, height) = doc.page_size(page_id);
        let content = doc
            .page_content(page_id)
            .map_err(|e| PdfError::ExtractionFailed(format!("page {page_number}: {e}")))?;

        let words = match Content::decode(&content) {
            Ok(ops) => interpret_text_ops(&ops, page_number, width, height),
            Err(e) => {
                warn!(page = page_number, error = %e, "content stream undecodable, skipping page");
                Vec::new()
            }
        };

        total_chars += words.iter().map(|w| w.text.chars().count()).sum::<usize>();
        debug!(page = page_number, words = words.len(), "extracted page text");
        pages.push(PageText {
            page_number,
            words,
            width,
            height,
        });
    }

    if total_chars == 0 {
        warn!("document yielded zero extractable characters (scanned or image-only?)");
    }
    Ok(pages)
}

/// Extract the plain text of a document, lines joined page by page.
pub fn extract_plain_text(doc: &PdfDocument) -> Result<String, PdfError> {
    let pages = extract_positioned_text(doc)?;
    Ok(pages
        .iter()
        .map(|p| p.joined())
        .collect::<Vec<_>>()
        .join("\n"))
}

/// 2D affine transform in PDF's row-vector convention: `p' = p × M`.
#[derive(Debug, Clone, Copy)]
struct Matrix {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn translation(tx: f64, ty: f64) -> Matrix {
        Matrix {
            e: tx,
            f: ty,
            ..Matrix::IDENTITY
        }
    }

    /// `self × other` (self applied first).
    fn concat(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    /// Horizontal scale magnitude of the transform.
    fn x_scale(&self) -> f64 {
        (self.a * self.a + self.b * self.b).sqrt()
    }

    /// Vertical scale magnitude of the transform.
    fn y_scale(&self) -> f64 {
        (self.c * self.c + self.d * self.d).sqrt()
    }

    fn from_operands(operands: &[Object]) -> Option<Matrix> {
        if operands.len() != 6 {
            return None;
        }
        let mut v = [0.0f64; 6];
        for (i, op) in operands.iter().enumerate() {
            v[i] = operand_f64(op)?;
        }
        Some(Matrix {
            a: v[0],
            b: v[1],
            c: v[2],
            d: v[3],
            e: v[4],
            f: v[5],
        })
    }
}

struct TextState {
    ctm: Matrix,
    ctm_stack: Vec<Matrix>,
    /// Text matrix, valid between BT/ET.
    tm: Matrix,
    /// Text line matrix: start of the current line.
    tlm: Matrix,
    font_size: f64,
    leading: f64,
}

impl TextState {
    fn new() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            ctm_stack: Vec::new(),
            tm: Matrix::IDENTITY,
            tlm: Matrix::IDENTITY,
            font_size: 0.0,
            leading: 0.0,
        }
    }

    fn next_line(&mut self, tx: f64, ty: f64) {
        self.tlm = Matrix::translation(tx, ty).concat(&self.tlm);
        self.tm = self.tlm;
    }
}

fn interpret_text_ops(
    content: &Content,
    page_number: u32,
    page_width: f64,
    page_height: f64,
) -> Vec<WordBox> {
    let mut state = TextState::new();
    let mut words = Vec::new();

    for op in &content.operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "q" => state.ctm_stack.push(state.ctm),
            "Q" => {
                if let Some(m) = state.ctm_stack.pop() {
                    state.ctm = m;
                }
            }
            "cm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    state.ctm = m.concat(&state.ctm);
                }
            }
            "BT" => {
                state.tm = Matrix::IDENTITY;
                state.tlm = Matrix::IDENTITY;
            }
            "Tf" => {
                if let Some(size) = operands.get(1).and_then(operand_f64) {
                    state.font_size = size;
                }
            }
            "TL" => {
                if let Some(l) = operands.first().and_then(operand_f64) {
                    state.leading = l;
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (
                    operands.first().and_then(operand_f64),
                    operands.get(1).and_then(operand_f64),
                ) {
                    state.next_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (
                    operands.first().and_then(operand_f64),
                    operands.get(1).and_then(operand_f64),
                ) {
                    state.leading = -ty;
                    state.next_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    state.tlm = m;
                    state.tm = m;
                }
            }
            "T*" => state.next_line(0.0, -state.leading),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    show_text(bytes, &mut state, page_number, page_width, page_height, &mut words);
                }
            }
            "'" => {
                state.next_line(0.0, -state.leading);
                if let Some(Object::String(bytes, _)) = operands.first() {
                    show_text(bytes, &mut state, page_number, page_width, page_height, &mut words);
                }
            }
            "\"" => {
                state.next_line(0.0, -state.leading);
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    show_text(bytes, &mut state, page_number, page_width, page_height, &mut words);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    for item in items {
                        match item {
                            Object::String(bytes, _) => show_text(
                                bytes,
                                &mut state,
                                page_number,
                                page_width,
                                page_height,
                                &mut words,
                            ),
                            other => {
                                if let Some(adj) = operand_f64(other) {
                                    // Kerning adjustment in thousandths of text space.
                                    let tx = -adj / 1000.0 * state.font_size;
                                    state.tm = Matrix::translation(tx, 0.0).concat(&state.tm);
                                }
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    words
}

/// Emit word boxes for one show-text run and advance the text matrix.
fn show_text(
    bytes: &[u8],
    state: &mut TextState,
    page_number: u32,
    page_width: f64,
    page_height: f64,
    words: &mut Vec<WordBox>,
) {
    let text = decode_pdf_string(bytes);
    if text.is_empty() || state.font_size <= 0.0 {
        return;
    }

    let device = state.tm.concat(&state.ctm);
    let anchor_x = device.e;
    let anchor_y = device.f;
    let height = (state.font_size * device.y_scale()).max(1.0);

    let run_chars = text.chars().count();
    let run_width_text = run_chars as f64 * state.font_size * GLYPH_WIDTH_FACTOR;
    let run_width = run_width_text * device.x_scale();

    // Anchor sits on the baseline in PDF space; the box extends one font
    // size upward, so its top edge in viewport space is one height above
    // the converted baseline.
    let (vx, vy) = coords::pdf_to_viewport(anchor_x, anchor_y, page_height);
    let top_y = vy - height;

    let sub_words: Vec<&str> = text.split_whitespace().collect();
    let word_chars: usize = sub_words.iter().map(|w| w.chars().count()).sum();
    if word_chars > 0 {
        let mut cursor = vx;
        for sub in sub_words {
            let fraction = sub.chars().count() as f64 / word_chars as f64;
            let width = run_width * fraction;
            words.push(
                WordBox {
                    text: sub.to_string(),
                    page: page_number,
                    x: cursor,
                    y: top_y,
                    width,
                    height,
                }
                .clamped(page_width, page_height),
            );
            cursor += width;
        }
    }

    state.tm = Matrix::translation(run_width_text, 0.0).concat(&state.tm);
}

fn operand_f64(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(*f as f64),
        _ => None,
    }
}

/// Decode a PDF string: UTF-16BE when the BOM is present, else UTF-8,
/// else Latin-1 byte cast.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
