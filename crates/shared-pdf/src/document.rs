//! Thin wrapper around `lopdf::Document` with page-tree helpers.

use crate::error::PdfError;
use lopdf::{Dictionary, Document, Object, ObjectId};

/// US Letter fallback when a malformed page tree carries no /MediaBox.
pub const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// A parsed PDF document plus its ordered page list.
pub struct PdfDocument {
    inner: Document,
    page_ids: Vec<ObjectId>,
}

impl PdfDocument {
    /// Parse a document from memory.
    pub fn load_bytes(bytes: &[u8]) -> Result<Self, PdfError> {
        let inner =
            Document::load_mem(bytes).map_err(|e| PdfError::DocumentLoad(e.to_string()))?;
        // get_pages returns a BTreeMap keyed by 1-based page number, so
        // values() is already in page order.
        let page_ids: Vec<ObjectId> = inner.get_pages().values().copied().collect();
        Ok(Self { inner, page_ids })
    }

    pub fn inner(&self) -> &Document {
        &self.inner
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Object id for a 1-indexed page number.
    pub fn page_id(&self, page_number: u32) -> Result<ObjectId, PdfError> {
        page_number
            .checked_sub(1)
            .and_then(|i| self.page_ids.get(i as usize))
            .copied()
            .ok_or_else(|| {
                PdfError::DocumentLoad(format!(
                    "page {} out of range (1..={})",
                    page_number,
                    self.page_ids.len()
                ))
            })
    }

    /// Page ids paired with their 1-indexed page numbers.
    pub fn pages(&self) -> impl Iterator<Item = (u32, ObjectId)> + '_ {
        self.page_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (i as u32 + 1, *id))
    }

    /// Page width and height from the (possibly inherited) /MediaBox.
    pub fn page_size(&self, page_id: ObjectId) -> (f64, f64) {
        let mb = self.media_box(page_id);
        (mb[2] - mb[0], mb[3] - mb[1])
    }

    /// Resolve the /MediaBox for a page, walking /Parent links. Falls back
    /// to US Letter when absent or malformed.
    pub fn media_box(&self, page_id: ObjectId) -> [f64; 4] {
        media_box(&self.inner, page_id)
    }

    /// Concatenated, decompressed content stream bytes for a page.
    ///
    /// Handles a single stream reference, an array of references, and pages
    /// without /Contents (empty page).
    pub fn page_content(&self, page_id: ObjectId) -> Result<Vec<u8>, PdfError> {
        let page_dict = self.page_dict(page_id)?;
        let contents = match page_dict.get(b"Contents") {
            Ok(obj) => obj,
            Err(_) => return Ok(Vec::new()),
        };

        match contents {
            Object::Reference(id) => self.stream_bytes(*id),
            Object::Array(arr) => {
                let mut out = Vec::new();
                for item in arr {
                    let id = item.as_reference().map_err(|e| {
                        PdfError::DocumentLoad(format!("/Contents array item: {e}"))
                    })?;
                    let bytes = self.stream_bytes(id)?;
                    if !out.is_empty() {
                        out.push(b' ');
                    }
                    out.extend_from_slice(&bytes);
                }
                Ok(out)
            }
            _ => Err(PdfError::DocumentLoad(
                "/Contents is not a reference or array".to_string(),
            )),
        }
    }

    fn page_dict(&self, page_id: ObjectId) -> Result<&Dictionary, PdfError> {
        self.inner
            .get_object(page_id)
            .and_then(|o| o.as_dict())
            .map_err(|e| PdfError::DocumentLoad(format!("page dictionary: {e}")))
    }

    fn stream_bytes(&self, id: ObjectId) -> Result<Vec<u8>, PdfError> {
        let stream = self
            .inner
            .get_object(id)
            .and_then(|o| o.as_stream())
            .map_err(|e| PdfError::DocumentLoad(format!("/Contents stream: {e}")))?;
        if stream.dict.get(b"Filter").is_ok() {
            stream
                .decompressed_content()
                .map_err(|e| PdfError::DocumentLoad(format!("decompress content: {e}")))
        } else {
            Ok(stream.content.clone())
        }
    }

}

/// Resolve the /MediaBox for a page of a raw lopdf document, walking
/// /Parent links. Falls back to US Letter when absent or malformed.
pub fn media_box(doc: &Document, page_id: ObjectId) -> [f64; 4] {
    match resolve_inherited(doc, page_id, b"MediaBox") {
        Some(obj) => match resolve(doc, obj) {
            Object::Array(arr) if arr.len() == 4 => {
                let mut mb = DEFAULT_MEDIA_BOX;
                for (i, item) in arr.iter().enumerate() {
                    if let Some(v) = object_to_f64(item) {
                        mb[i] = v;
                    }
                }
                mb
            }
            _ => DEFAULT_MEDIA_BOX,
        },
        None => DEFAULT_MEDIA_BOX,
    }
}

/// Page width and height for a raw lopdf document.
pub fn page_size(doc: &Document, page_id: ObjectId) -> (f64, f64) {
    let mb = media_box(doc, page_id);
    (mb[2] - mb[0], mb[3] - mb[1])
}

/// Follow a single level of indirection.
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

/// Look up a key on the page, walking up the page tree via /Parent.
/// Attributes like /MediaBox and /Resources may live on any ancestor
/// /Pages node.
pub fn resolve_inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current = page_id;
    // Depth limit guards against cyclic /Parent chains in malformed files.
    for _ in 0..32 {
        let dict = doc.get_object(current).ok()?.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        current = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

fn object_to_f64(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(*f as f64),
        _ => None,
    }
}
