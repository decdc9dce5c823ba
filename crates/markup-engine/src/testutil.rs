//! Test fixtures shared across the crate's test modules.

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

/// How the fixture wires the page's /Annots entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AnnotsShape {
    /// `/Annots [ref ref ...]` directly on the page.
    InlineArray,
    /// `/Annots ref` where the reference resolves to an array object.
    ReferencedArray,
    /// `/Annots ref` where the reference resolves to a single annotation
    /// dictionary (count is ignored; exactly one annotation is created).
    SingleReference,
}

/// Minimal letter-size PDF with `pages` empty-ish pages.
pub(crate) fn test_pdf(pages: usize) -> Vec<u8> {
    build_pdf(pages, None, 0)
}

/// One-page PDF carrying `count` pre-existing link annotations wired in the
/// given shape. Annotation URIs are `https://example.com/prior/{i}`.
pub(crate) fn single_page_pdf_with_annots(shape: AnnotsShape, count: usize) -> Vec<u8> {
    build_pdf(1, Some(shape), count)
}

/// One-page PDF whose /Resources (with font F1) lives on the /Pages node;
/// the page itself carries none and relies on inheritance.
pub(crate) fn single_page_pdf_inherited_resources() -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let content = "BT /F1 12 Tf 72 720 Td (Fixture page 1) Tj ET";
    let content_id = doc.add_object(Stream::new(
        Dictionary::new(),
        content.as_bytes().to_vec(),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => Object::Reference(content_id),
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn link_annot(doc: &mut Document, index: usize) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => vec![10.into(), 10.into(), 60.into(), 24.into()],
        "Border" => vec![0.into(), 0.into(), 0.into()],
        "A" => dictionary! {
            "S" => "URI",
            "URI" => Object::string_literal(format!("https://example.com/prior/{index}")),
        },
    })
}

fn build_pdf(pages: usize, shape: Option<AnnotsShape>, annot_count: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids: Vec<Object> = Vec::new();
    for i in 0..pages.max(1) {
        let content = format!("BT /F1 12 Tf 72 720 Td (Fixture page {}) Tj ET", i + 1);
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
        });

        if i == 0 {
            if let Some(shape) = shape {
                let annots = match shape {
                    AnnotsShape::InlineArray => {
                        let refs: Vec<Object> = (0..annot_count)
                            .map(|n| Object::Reference(link_annot(&mut doc, n)))
                            .collect();
                        Object::Array(refs)
                    }
                    AnnotsShape::ReferencedArray => {
                        let refs: Vec<Object> = (0..annot_count)
                            .map(|n| Object::Reference(link_annot(&mut doc, n)))
                            .collect();
                        let arr_id = doc.add_object(Object::Array(refs));
                        Object::Reference(arr_id)
                    }
                    AnnotsShape::SingleReference => {
                        Object::Reference(link_annot(&mut doc, 0))
                    }
                };
                if let Ok(page) = doc.get_object_mut(page_id) {
                    if let Ok(dict) = page.as_dict_mut() {
                        dict.set("Annots", annots);
                    }
                }
            }
        }
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages.max(1) as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Resolve a page's /Annots entry to the list of annotation object ids,
/// whatever shape the entry takes.
pub(crate) fn annots_of_page(doc: &Document, page_id: ObjectId) -> Vec<ObjectId> {
    let page = match doc.get_object(page_id).and_then(|o| o.as_dict()) {
        Ok(d) => d,
        Err(_) => return Vec::new(),
    };
    let entry = match page.get(b"Annots") {
        Ok(e) => e,
        Err(_) => return Vec::new(),
    };
    let entry = match entry {
        Object::Reference(id) => match doc.get_object(*id) {
            Ok(Object::Array(_)) => doc.get_object(*id).unwrap(),
            Ok(Object::Dictionary(_)) => return vec![*id],
            _ => return Vec::new(),
        },
        other => other,
    };
    match entry {
        Object::Array(arr) => arr
            .iter()
            .filter_map(|o| o.as_reference().ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// URIs of all /Link annotations on a page.
pub(crate) fn link_uris(doc: &Document, page_id: ObjectId) -> Vec<String> {
    annots_of_page(doc, page_id)
        .into_iter()
        .filter_map(|id| doc.get_object(id).ok()?.as_dict().ok())
        .filter(|d| {
            d.get(b"Subtype")
                .and_then(|s| s.as_name_str())
                .map(|s| s == "Link")
                .unwrap_or(false)
        })
        .filter_map(|d| {
            let action = d.get(b"A").ok()?.as_dict().ok()?;
            let uri = action.get(b"URI").ok()?;
            match uri {
                Object::String(bytes, _) => Some(String::from_utf8_lossy(bytes).into_owned()),
                _ => None,
            }
        })
        .collect()
}
