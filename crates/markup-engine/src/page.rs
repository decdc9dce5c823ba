//! Page-mutation helpers shared by the renderer and the watermark engine.
//!
//! All mutation is additive: existing /Contents and /Annots entries are
//! merged with, never replaced, so the document's prior object graph stays
//! resolvable.

use crate::error::MarkupError;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

/// Rough Helvetica advance per character, as a fraction of font size.
/// Used to size captions, legends and link rectangles.
const TEXT_WIDTH_FACTOR: f64 = 0.5;

/// Estimated rendered width of a caption string.
pub fn estimate_text_width(text: &str, font_size: f64) -> f64 {
    text.chars().count() as f64 * font_size * TEXT_WIDTH_FACTOR
}

/// Append a content stream to a page without clobbering existing content.
///
/// A single /Contents reference becomes a two-element array; an array gets
/// one more element; a missing entry becomes a direct reference.
pub fn append_content(
    doc: &mut Document,
    page_id: ObjectId,
    content: String,
) -> Result<(), MarkupError> {
    let stream = Stream::new(Dictionary::new(), content.into_bytes());
    let content_id = doc.add_object(Object::Stream(stream));

    let page = doc
        .get_object_mut(page_id)
        .and_then(|o| o.as_dict_mut())
        .map_err(|e| MarkupError::Render(format!("page dictionary: {e}")))?;

    let existing = page.get(b"Contents").ok().cloned();
    match existing {
        Some(Object::Reference(existing_id)) => {
            page.set(
                "Contents",
                Object::Array(vec![
                    Object::Reference(existing_id),
                    Object::Reference(content_id),
                ]),
            );
        }
        Some(Object::Array(mut arr)) => {
            arr.push(Object::Reference(content_id));
            page.set("Contents", Object::Array(arr));
        }
        _ => {
            page.set("Contents", Object::Reference(content_id));
        }
    }
    Ok(())
}

/// Append an annotation reference to a page's /Annots.
///
/// Merge rule: an existing array is appended to; a single reference is
/// resolved -- if it points at an array object the reference is kept and
/// the array itself grows, otherwise the entry is coerced to a two-element
/// array; a missing entry becomes a fresh one-element array. Prior
/// annotations always remain resolvable.
pub fn append_annotation(
    doc: &mut Document,
    page_id: ObjectId,
    annot_id: ObjectId,
) -> Result<(), MarkupError> {
    let existing = {
        let page = doc
            .get_object(page_id)
            .and_then(|o| o.as_dict())
            .map_err(|e| MarkupError::Annotation(format!("page dictionary: {e}")))?;
        page.get(b"Annots").ok().cloned()
    };

    match existing {
        Some(Object::Array(mut arr)) => {
            arr.push(Object::Reference(annot_id));
            set_page_annots(doc, page_id, Object::Array(arr))
        }
        Some(Object::Reference(existing_id)) => {
            // The reference may name a shared annotation array, or a single
            // annotation dictionary.
            let points_at_array = matches!(doc.get_object(existing_id), Ok(Object::Array(_)));
            if points_at_array {
                if let Ok(Object::Array(arr)) = doc.get_object_mut(existing_id) {
                    arr.push(Object::Reference(annot_id));
                }
                Ok(())
            } else {
                set_page_annots(
                    doc,
                    page_id,
                    Object::Array(vec![
                        Object::Reference(existing_id),
                        Object::Reference(annot_id),
                    ]),
                )
            }
        }
        Some(other) => set_page_annots(
            doc,
            page_id,
            Object::Array(vec![other, Object::Reference(annot_id)]),
        ),
        None => set_page_annots(
            doc,
            page_id,
            Object::Array(vec![Object::Reference(annot_id)]),
        ),
    }
}

fn set_page_annots(
    doc: &mut Document,
    page_id: ObjectId,
    annots: Object,
) -> Result<(), MarkupError> {
    let page = doc
        .get_object_mut(page_id)
        .and_then(|o| o.as_dict_mut())
        .map_err(|e| MarkupError::Annotation(format!("page dictionary: {e}")))?;
    page.set("Annots", annots);
    Ok(())
}

/// Where a page's /Resources dictionary lives.
enum ResourceSlot {
    Missing,
    Inline,
    Indirect(ObjectId),
}

/// Where a resource category dictionary lives within /Resources.
enum CategorySlot {
    Missing,
    Inline,
    Indirect(ObjectId),
}

/// Register `name => target` under a resource category (e.g. "ExtGState",
/// "Font", "XObject") on a page, creating intermediate dictionaries as
/// needed and preserving entries already present.
pub fn add_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &str,
    name: &str,
    target: ObjectId,
) -> Result<(), MarkupError> {
    let err = |e: String| MarkupError::Render(e);

    // Classify the existing layout read-only before taking any mutable
    // borrow.
    let (res_slot, cat_slot) = {
        let page = doc
            .get_object(page_id)
            .and_then(|o| o.as_dict())
            .map_err(|e| err(format!("page dictionary: {e}")))?;
        match page.get(b"Resources") {
            Err(_) => (ResourceSlot::Missing, CategorySlot::Missing),
            Ok(Object::Reference(res_id)) => {
                let res_id = *res_id;
                let dict = doc
                    .get_object(res_id)
                    .and_then(|o| o.as_dict())
                    .map_err(|e| err(format!("resources dictionary: {e}")))?;
                (ResourceSlot::Indirect(res_id), classify_category(dict, category))
            }
            Ok(Object::Dictionary(dict)) => (ResourceSlot::Inline, classify_category(dict, category)),
            Ok(_) => (ResourceSlot::Missing, CategorySlot::Missing),
        }
    };

    // A page without its own /Resources may inherit one from an ancestor
    // /Pages node. Creating an empty page-level dictionary would shadow it
    // and break the original content's font/XObject lookups, so the
    // inherited dictionary is cloned as the starting point.
    let inherited = if matches!(res_slot, ResourceSlot::Missing) {
        shared_pdf::document::resolve_inherited(doc, page_id, b"Resources").and_then(|obj| {
            match obj {
                Object::Dictionary(dict) => Some(dict.clone()),
                Object::Reference(id) => doc
                    .get_object(*id)
                    .ok()
                    .and_then(|o| o.as_dict().ok())
                    .cloned(),
                _ => None,
            }
        })
    } else {
        None
    };

    let entry = Object::Reference(target);

    // Referenced category dictionaries can be mutated directly.
    if let CategorySlot::Indirect(cat_id) = cat_slot {
        let dict = doc
            .get_object_mut(cat_id)
            .and_then(|o| o.as_dict_mut())
            .map_err(|e| err(format!("resource category: {e}")))?;
        dict.set(name, entry);
        return Ok(());
    }

    let resources = match res_slot {
        ResourceSlot::Indirect(res_id) => doc
            .get_object_mut(res_id)
            .and_then(|o| o.as_dict_mut())
            .map_err(|e| err(format!("resources dictionary: {e}")))?,
        ResourceSlot::Inline | ResourceSlot::Missing => {
            let page = doc
                .get_object_mut(page_id)
                .and_then(|o| o.as_dict_mut())
                .map_err(|e| err(format!("page dictionary: {e}")))?;
            if matches!(res_slot, ResourceSlot::Missing) {
                page.set(
                    "Resources",
                    Object::Dictionary(inherited.unwrap_or_else(Dictionary::new)),
                );
            }
            page.get_mut(b"Resources")
                .and_then(|o| o.as_dict_mut())
                .map_err(|e| err(format!("resources dictionary: {e}")))?
        }
    };

    match resources.get_mut(category.as_bytes()) {
        Ok(Object::Dictionary(cat)) => {
            cat.set(name, entry);
        }
        _ => {
            resources.set(category, Object::Dictionary(dictionary! { name => entry }));
        }
    }
    Ok(())
}

fn classify_category(resources: &Dictionary, category: &str) -> CategorySlot {
    match resources.get(category.as_bytes()) {
        Err(_) => CategorySlot::Missing,
        Ok(Object::Reference(id)) => CategorySlot::Indirect(*id),
        Ok(_) => CategorySlot::Inline,
    }
}

/// Register a translucency graphics state on the page and return its name.
pub fn add_alpha_gstate(
    doc: &mut Document,
    page_id: ObjectId,
    name: &str,
    stroke_alpha: f64,
    fill_alpha: f64,
) -> Result<(), MarkupError> {
    let gs_id = doc.add_object(dictionary! {
        "Type" => "ExtGState",
        "CA" => stroke_alpha as f32,
        "ca" => fill_alpha as f32,
    });
    add_resource(doc, page_id, "ExtGState", name, gs_id)
}

/// Register a non-embedded Helvetica font on the page under `name`.
pub fn add_helvetica(
    doc: &mut Document,
    page_id: ObjectId,
    name: &str,
) -> Result<(), MarkupError> {
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    add_resource(doc, page_id, "Font", name, font_id)
}

/// Escape a string for use inside a PDF literal string.
pub fn escape_pdf_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out
}
