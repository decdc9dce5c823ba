//! Watermarking of downloaded article documents.
//!
//! Every page gets a role label and a download-date caption, plus an
//! optional centered low-opacity logo. End-user downloads of published
//! articles additionally get a clickable "view online" link on the first
//! page, registered as a real /Link annotation merged into the page's
//! existing annotation graph.
//!
//! Watermark decoration is best-effort: a missing or undecodable logo is
//! skipped with a warning, because the substantive document content must
//! always ship.

use crate::error::MarkupError;
use crate::page;
use chrono::{DateTime, Utc};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::fmt::Write as _;
use std::io::Write as _;
use tracing::{debug, warn};

const CAPTION_FONT_SIZE: f64 = 8.0;
const CAPTION_MARGIN: f64 = 18.0;
/// Logo width relative to the page.
const LOGO_WIDTH_FRACTION: f64 = 0.4;
const LOGO_ALPHA: f64 = 0.12;

const WM_FONT: &str = "Fwm";
const WM_GSTATE: &str = "GSwm";
const WM_LOGO: &str = "WmLogo";

/// Who is downloading the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActorRole {
    EndUser,
    Editor,
    Reviewer,
    Admin,
}

impl ActorRole {
    /// Label drawn in the page corner.
    pub fn label(&self) -> &'static str {
        match self {
            ActorRole::EndUser => "Reader copy",
            ActorRole::Editor => "Editor working copy",
            ActorRole::Reviewer => "Reviewer working copy",
            ActorRole::Admin => "Administrator copy",
        }
    }
}

/// Workflow status of the article the document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationStatus {
    Draft,
    InReview,
    Published,
    Rejected,
}

#[derive(Debug, Clone)]
pub struct WatermarkOptions {
    pub download_date: DateTime<Utc>,
    pub article_id: i64,
    /// Base URL of the public frontend, e.g. `https://lexpress.example`.
    pub frontend_url: String,
    pub actor_role: ActorRole,
    pub publication_status: PublicationStatus,
    /// Raw logo image bytes (PNG or JPEG); `None` skips the logo.
    pub logo_image: Option<Vec<u8>>,
}

impl WatermarkOptions {
    /// Canonical public URL of the article.
    pub fn article_url(&self) -> String {
        format!(
            "{}/articles/{}",
            self.frontend_url.trim_end_matches('/'),
            self.article_id
        )
    }

    /// The clickable link ships only on published documents downloaded by
    /// end users.
    fn link_enabled(&self) -> bool {
        self.actor_role == ActorRole::EndUser
            && self.publication_status == PublicationStatus::Published
    }
}

/// Watermark a document and return the new bytes.
pub fn apply_watermark(
    pdf_bytes: &[u8],
    options: &WatermarkOptions,
) -> Result<Vec<u8>, MarkupError> {
    let mut doc =
        Document::load_mem(pdf_bytes).map_err(|e| MarkupError::DocumentLoad(e.to_string()))?;
    let pages = doc.get_pages();

    let logo = match &options.logo_image {
        Some(bytes) => match build_logo_xobject(&mut doc, bytes) {
            Ok(logo) => Some(logo),
            Err(e) => {
                warn!(error = %e, "logo unusable, continuing without it");
                None
            }
        },
        None => None,
    };

    let date_caption = format!(
        "Downloaded on {}",
        options.download_date.format("%Y-%m-%d %H:%M UTC")
    );

    for (page_number, page_id) in &pages {
        let page_id = *page_id;
        let (page_width, page_height) = shared_pdf::document::page_size(&doc, page_id);

        page::add_helvetica(&mut doc, page_id, WM_FONT)?;
        if let Some(logo) = &logo {
            page::add_alpha_gstate(&mut doc, page_id, WM_GSTATE, LOGO_ALPHA, LOGO_ALPHA)?;
            page::add_resource(&mut doc, page_id, "XObject", WM_LOGO, logo.id)?;
        }

        let first_page = *page_number == 1;
        let content = watermark_content(
            options,
            logo.as_ref(),
            &date_caption,
            page_width,
            page_height,
            first_page,
        );
        page::append_content(&mut doc, page_id, content)?;

        if first_page && options.link_enabled() {
            add_link_annotation(&mut doc, page_id, options)?;
        }
    }

    debug!(
        pages = pages.len(),
        link = options.link_enabled(),
        "watermark applied"
    );

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| MarkupError::Render(e.to_string()))?;
    Ok(output)
}

struct Logo {
    id: ObjectId,
    width: u32,
    height: u32,
}

/// Decode the logo and embed it as a DeviceRGB FlateDecode image XObject.
fn build_logo_xobject(doc: &mut Document, bytes: &[u8]) -> Result<Logo, MarkupError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| MarkupError::Render(format!("logo decode: {e}")))?;
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&rgb.into_raw())
        .and_then(|_| encoder.finish())
        .map(|compressed| {
            let dict = dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8_i64,
                "Filter" => "FlateDecode",
            };
            let id = doc.add_object(Object::Stream(Stream::new(dict, compressed)));
            Logo { id, width, height }
        })
        .map_err(|e| MarkupError::Render(format!("logo compress: {e}")))
}

fn watermark_content(
    options: &WatermarkOptions,
    logo: Option<&Logo>,
    date_caption: &str,
    page_width: f64,
    page_height: f64,
    first_page: bool,
) -> String {
    let mut content = String::from("q\n");

    if let Some(logo) = logo {
        let draw_width = page_width * LOGO_WIDTH_FRACTION;
        let draw_height = draw_width * (logo.height as f64 / logo.width.max(1) as f64);
        let x = (page_width - draw_width) / 2.0;
        let y = (page_height - draw_height) / 2.0;
        let _ = writeln!(content, "q /{WM_GSTATE} gs");
        let _ = writeln!(
            content,
            "{draw_width:.2} 0 0 {draw_height:.2} {x:.2} {y:.2} cm /{WM_LOGO} Do"
        );
        content.push_str("Q\n");
    }

    content.push_str("0.45 0.45 0.45 rg\n");

    // Role label, top-right.
    let label = options.actor_role.label();
    let label_width = page::estimate_text_width(label, CAPTION_FONT_SIZE);
    let label_x = (page_width - CAPTION_MARGIN - label_width).max(CAPTION_MARGIN);
    let label_y = page_height - CAPTION_MARGIN - CAPTION_FONT_SIZE;
    let _ = writeln!(
        content,
        "BT /{WM_FONT} {CAPTION_FONT_SIZE} Tf {label_x:.2} {label_y:.2} Td ({}) Tj ET",
        page::escape_pdf_text(label)
    );

    // Download date, bottom-left.
    let _ = writeln!(
        content,
        "BT /{WM_FONT} {CAPTION_FONT_SIZE} Tf {CAPTION_MARGIN:.2} {CAPTION_MARGIN:.2} Td ({}) Tj ET",
        page::escape_pdf_text(date_caption)
    );

    if first_page && options.link_enabled() {
        let view_caption = format!("View this article online: {}", options.article_url());
        let login_caption = "Log in to read the latest published version.";
        let (view_y, login_y) = link_caption_baselines();
        let _ = writeln!(
            content,
            "BT /{WM_FONT} {CAPTION_FONT_SIZE} Tf {CAPTION_MARGIN:.2} {view_y:.2} Td ({}) Tj ET",
            page::escape_pdf_text(&view_caption)
        );
        let _ = writeln!(
            content,
            "BT /{WM_FONT} {CAPTION_FONT_SIZE} Tf {CAPTION_MARGIN:.2} {login_y:.2} Td ({}) Tj ET",
            page::escape_pdf_text(login_caption)
        );
    }

    content.push_str("Q\n");
    content
}

/// Baselines of the "view online" and login-reminder captions, stacked
/// above the download-date caption.
fn link_caption_baselines() -> (f64, f64) {
    let login_y = CAPTION_MARGIN + CAPTION_FONT_SIZE + 4.0;
    let view_y = login_y + CAPTION_FONT_SIZE + 4.0;
    (view_y, login_y)
}

/// Register the clickable /Link annotation over the "view online" caption.
fn add_link_annotation(
    doc: &mut Document,
    page_id: ObjectId,
    options: &WatermarkOptions,
) -> Result<(), MarkupError> {
    let url = options.article_url();
    let caption = format!("View this article online: {url}");
    let width = page::estimate_text_width(&caption, CAPTION_FONT_SIZE);
    let (view_y, _) = link_caption_baselines();

    let annot_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => vec![
            (CAPTION_MARGIN as f32).into(),
            ((view_y - 2.0) as f32).into(),
            ((CAPTION_MARGIN + width) as f32).into(),
            ((view_y + CAPTION_FONT_SIZE + 2.0) as f32).into(),
        ],
        "Border" => vec![0.into(), 0.into(), 0.into()],
        "A" => dictionary! {
            "S" => "URI",
            "URI" => Object::string_literal(url),
        },
    });
    page::append_annotation(doc, page_id, annot_id)
}
