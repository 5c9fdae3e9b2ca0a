//! PDF serialization of a rendered document.
//!
//! The writer draws exactly the nodes of the `RenderedDocument` the preview shows.
//! Output is deterministic: no creation dates, no document ids, objects numbered in
//! a fixed order. The standard Helvetica faces are referenced, not embedded.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::crop::data_url::decode_image_data_url;
use crate::crop::pipeline::encode_jpeg;
use crate::errors::AppError;
use crate::layout::document::{ImageBox, Node, Page, RenderedDocument, Rule, TextRun};
use crate::layout::font_metrics::FontFace;
use crate::layout::theme::Rgb;

const PDF_VERSION: &str = "1.7";
const PORTRAIT_JPEG_QUALITY: u8 = 90;

fn font_resource(face: FontFace) -> &'static str {
    match face {
        FontFace::Regular => "F1",
        FontFace::Bold => "F2",
        FontFace::Italic => "F3",
        FontFace::BoldItalic => "F4",
    }
}

fn base_font(face: FontFace) -> &'static str {
    match face {
        FontFace::Regular => "Helvetica",
        FontFace::Bold => "Helvetica-Bold",
        FontFace::Italic => "Helvetica-Oblique",
        FontFace::BoldItalic => "Helvetica-BoldOblique",
    }
}

/// Serializes `doc` to PDF bytes.
///
/// Fails with `AppError::Export` when an embedded image cannot be decoded or the
/// document cannot be written.
pub fn write_pdf(doc: &RenderedDocument) -> Result<Vec<u8>, AppError> {
    let mut pdf = Document::with_version(PDF_VERSION);
    let pages_id = pdf.new_object_id();

    // ── shared resources ────────────────────────────────────────────────────
    let mut fonts = Dictionary::new();
    for face in FontFace::ALL {
        let font_id = pdf.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => base_font(face),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font_resource(face), Object::Reference(font_id));
    }

    let images = collect_images(doc);
    let mut xobjects = Dictionary::new();
    for (index, url) in images.iter().enumerate() {
        let image_id = add_jpeg_image(&mut pdf, url)?;
        xobjects.set(image_resource(index), Object::Reference(image_id));
    }

    let mut resources = dictionary! { "Font" => Object::Dictionary(fonts) };
    if !images.is_empty() {
        resources.set("XObject", Object::Dictionary(xobjects));
    }
    let resources_id = pdf.add_object(resources);

    // ── pages ───────────────────────────────────────────────────────────────
    let mut kids = Vec::with_capacity(doc.pages.len());
    for page in &doc.pages {
        let content = page_content(doc, page, &images);
        let encoded = content
            .encode()
            .map_err(|e| AppError::Export(format!("Failed to encode page {}: {e}", page.number)))?;
        let content_id = pdf.add_object(Stream::new(Dictionary::new(), encoded));

        let page_id = pdf.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![
                0.into(),
                0.into(),
                Object::Real(doc.page_width),
                Object::Real(doc.page_height),
            ],
            "Resources" => Object::Reference(resources_id),
            "Contents" => Object::Reference(content_id),
        });
        kids.push(Object::Reference(page_id));
    }

    let page_count = kids.len() as i64;
    pdf.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
        }),
    );

    let catalog_id = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    let info_id = pdf.add_object(dictionary! {
        "Title" => Object::String(win_ansi(&doc.title), StringFormat::Literal),
        "Author" => Object::String(win_ansi(&doc.author), StringFormat::Literal),
    });
    pdf.trailer.set("Root", Object::Reference(catalog_id));
    pdf.trailer.set("Info", Object::Reference(info_id));

    let mut buffer = Vec::new();
    pdf.save_to(&mut buffer)
        .map_err(|e| AppError::Export(format!("Failed to write PDF: {e}")))?;
    Ok(buffer)
}

fn image_resource(index: usize) -> String {
    format!("Im{}", index + 1)
}

/// Distinct image data URLs in first-use order.
fn collect_images(doc: &RenderedDocument) -> Vec<&str> {
    let mut urls: Vec<&str> = Vec::new();
    for image in doc.images() {
        if !urls.contains(&image.data_url.as_str()) {
            urls.push(&image.data_url);
        }
    }
    urls
}

/// Decodes a data URL image, normalizes it to an RGB JPEG, and adds it as an
/// image XObject.
fn add_jpeg_image(pdf: &mut Document, data_url: &str) -> Result<ObjectId, AppError> {
    let raster = decode_image_data_url(data_url)
        .map_err(|e| AppError::Export(format!("Invalid profile image: {e}")))?
        .to_rgb8();
    let (width, height) = raster.dimensions();
    let jpeg = encode_jpeg(raster.as_raw(), width, height, PORTRAIT_JPEG_QUALITY)
        .map_err(|e| AppError::Export(format!("Failed to encode profile image: {e}")))?;

    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(width),
        "Height" => i64::from(height),
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
        "Filter" => "DCTDecode",
    };
    Ok(pdf.add_object(Stream::new(dict, jpeg)))
}

// ────────────────────────────────────────────────────────────────────────────
// Content streams
// ────────────────────────────────────────────────────────────────────────────

fn page_content(doc: &RenderedDocument, page: &Page, images: &[&str]) -> Content {
    let mut ops = Vec::new();
    fill_rect(&mut ops, doc.background, 0.0, 0.0, doc.page_width, doc.page_height);

    for node in &page.nodes {
        match node {
            Node::Text(run) => text_ops(&mut ops, run, doc.page_height),
            Node::Rule(rule) => rule_ops(&mut ops, rule, doc.page_height),
            Node::Image(image) => image_ops(&mut ops, image, images, doc.page_height),
        }
    }

    Content { operations: ops }
}

fn reals(values: &[f32]) -> Vec<Object> {
    values.iter().map(|v| Object::Real(*v)).collect()
}

fn fill_color(ops: &mut Vec<Operation>, color: Rgb) {
    ops.push(Operation::new("rg", reals(&color.unit_components())));
}

/// Filled rectangle given in PDF (bottom-left origin) coordinates.
fn fill_rect(ops: &mut Vec<Operation>, color: Rgb, x: f32, y: f32, width: f32, height: f32) {
    fill_color(ops, color);
    ops.push(Operation::new("re", reals(&[x, y, width, height])));
    ops.push(Operation::new("f", vec![]));
}

fn text_ops(ops: &mut Vec<Operation>, run: &TextRun, page_height: f32) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![
            Object::Name(font_resource(run.face).as_bytes().to_vec()),
            Object::Real(run.size),
        ],
    ));
    fill_color(ops, run.color);
    ops.push(Operation::new("Td", reals(&[run.x, page_height - run.baseline])));
    ops.push(Operation::new(
        "Tj",
        vec![Object::String(win_ansi(&run.text), StringFormat::Literal)],
    ));
    ops.push(Operation::new("ET", vec![]));
}

fn rule_ops(ops: &mut Vec<Operation>, rule: &Rule, page_height: f32) {
    fill_rect(
        ops,
        rule.color,
        rule.x,
        page_height - rule.y - rule.thickness,
        rule.width,
        rule.thickness,
    );
}

fn image_ops(ops: &mut Vec<Operation>, image: &ImageBox, images: &[&str], page_height: f32) {
    let Some(index) = images.iter().position(|url| *url == image.data_url) else {
        return;
    };
    ops.push(Operation::new("q", vec![]));
    ops.push(Operation::new(
        "cm",
        reals(&[
            image.width,
            0.0,
            0.0,
            image.height,
            image.x,
            page_height - image.y - image.height,
        ]),
    ));
    ops.push(Operation::new(
        "Do",
        vec![Object::Name(image_resource(index).into_bytes())],
    ));
    ops.push(Operation::new("Q", vec![]));
}

/// Encodes text for the WinAnsiEncoding standard fonts. Unmappable characters
/// become `?`.
pub(crate) fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\t' => b' ',
            ' '..='~' => c as u8,
            '\u{00A0}'..='\u{00FF}' => c as u32 as u8,
            '\u{20AC}' => 0x80,
            '\u{201A}' => 0x82,
            '\u{0192}' => 0x83,
            '\u{201E}' => 0x84,
            '\u{2026}' => 0x85,
            '\u{2020}' => 0x86,
            '\u{2021}' => 0x87,
            '\u{02C6}' => 0x88,
            '\u{2030}' => 0x89,
            '\u{0160}' => 0x8A,
            '\u{2039}' => 0x8B,
            '\u{0152}' => 0x8C,
            '\u{017D}' => 0x8E,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{02DC}' => 0x98,
            '\u{2122}' => 0x99,
            '\u{0161}' => 0x9A,
            '\u{203A}' => 0x9B,
            '\u{0153}' => 0x9C,
            '\u{017E}' => 0x9E,
            '\u{0178}' => 0x9F,
            _ => b'?',
        })
        .collect()
}
