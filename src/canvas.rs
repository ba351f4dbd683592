//! Immediate-mode drawing surface for a single synthetic page.
//!
//! Coordinates are PDF user space: origin at the bottom-left corner, y grows
//! upwards. Fill color applies to both shapes and text. A finished canvas is
//! serialized as a standalone one-page PDF so it can be spliced into a deck
//! like any other document.

use anyhow::{Context, Result};
use std::collections::BTreeSet;

use crate::compression;
use crate::fonts::{self, Font};
use crate::image::{self, ImageInfo};
use crate::pdf_generator::{PageSize, PdfGenerator, escape_pdf_string, format_number};

/// Bézier control distance for a quarter circle of radius 1
const KAPPA: f32 = 0.552_284_8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb8(0xFF, 0xFF, 0xFF);

    pub const fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Color {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Color from a `0xRRGGBB` literal
    pub const fn hex(rgb: u32) -> Self {
        Color::rgb8((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }
}

/// How a closed path is painted
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint {
    Fill,
    Stroke,
    FillStroke,
}

impl Paint {
    fn operator(&self) -> &'static str {
        match self {
            Paint::Fill => "f",
            Paint::Stroke => "S",
            Paint::FillStroke => "B",
        }
    }
}

/// A link annotation (clickable URL region)
#[derive(Debug, Clone)]
pub struct LinkAnnotation {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub url: String,
}

pub struct Canvas {
    size: PageSize,
    content: Vec<u8>,
    font: Font,
    font_size: f32,
    fonts: BTreeSet<Font>,
    images: Vec<ImageInfo>,
    links: Vec<LinkAnnotation>,
}

impl Canvas {
    pub fn new(size: PageSize) -> Self {
        Canvas {
            size,
            content: Vec::new(),
            font: Font::Helvetica,
            font_size: 12.0,
            fonts: BTreeSet::new(),
            images: Vec::new(),
            links: Vec::new(),
        }
    }

    pub fn size(&self) -> PageSize {
        self.size
    }

    /// Raw (uncompressed) content stream drawn so far
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    fn op(&mut self, operands: &[f32], operator: &str) {
        for value in operands {
            self.content.extend_from_slice(format_number(*value).as_bytes());
            self.content.push(b' ');
        }
        self.content.extend_from_slice(operator.as_bytes());
        self.content.push(b'\n');
    }

    pub fn set_fill_color(&mut self, color: Color) {
        self.op(&[color.r, color.g, color.b], "rg");
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        self.op(&[color.r, color.g, color.b], "RG");
    }

    pub fn set_line_width(&mut self, width: f32) {
        self.op(&[width], "w");
    }

    pub fn set_font(&mut self, font: Font, size: f32) {
        self.font = font;
        self.font_size = size;
    }

    pub fn string_width(&self, text: &str, font: Font, size: f32) -> f32 {
        font.string_width(text, size)
    }

    /// Draw a single line of text with its baseline starting at (x, y)
    pub fn draw_string(&mut self, x: f32, y: f32, text: &str) {
        self.fonts.insert(self.font);
        self.content.extend_from_slice(b"BT\n");
        self.content
            .extend_from_slice(format!("/{} ", self.font.resource_name()).as_bytes());
        let size = self.font_size;
        self.op(&[size], "Tf");
        self.op(&[x, y], "Td");
        self.content.push(b'(');
        self.content.extend_from_slice(&fonts::encode_pdf_text(text));
        self.content.extend_from_slice(b") Tj\n");
        self.content.extend_from_slice(b"ET\n");
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.op(&[x1, y1], "m");
        self.op(&[x2, y2], "l");
        self.content.extend_from_slice(b"S\n");
    }

    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32, paint: Paint) {
        self.op(&[x, y, width, height], "re");
        self.content.extend_from_slice(paint.operator().as_bytes());
        self.content.push(b'\n');
    }

    /// Rectangle with quarter-circle corners; the radius is clamped to half
    /// the shorter side.
    pub fn round_rect(&mut self, x: f32, y: f32, width: f32, height: f32, radius: f32, paint: Paint) {
        let r = radius.max(0.0).min(width.abs() / 2.0).min(height.abs() / 2.0);
        let k = r * KAPPA;
        let (right, top) = (x + width, y + height);

        self.op(&[x + r, y], "m");
        self.op(&[right - r, y], "l");
        self.op(&[right - r + k, y, right, y + r - k, right, y + r], "c");
        self.op(&[right, top - r], "l");
        self.op(&[right, top - r + k, right - r + k, top, right - r, top], "c");
        self.op(&[x + r, top], "l");
        self.op(&[x + r - k, top, x, top - r + k, x, top - r], "c");
        self.op(&[x, y + r], "l");
        self.op(&[x, y + r - k, x + r - k, y, x + r, y], "c");
        self.content.extend_from_slice(b"h\n");
        self.content.extend_from_slice(paint.operator().as_bytes());
        self.content.push(b'\n');
    }

    pub fn circle(&mut self, cx: f32, cy: f32, radius: f32, paint: Paint) {
        let r = radius;
        let k = r * KAPPA;
        self.op(&[cx + r, cy], "m");
        self.op(&[cx + r, cy + k, cx + k, cy + r, cx, cy + r], "c");
        self.op(&[cx - k, cy + r, cx - r, cy + k, cx - r, cy], "c");
        self.op(&[cx - r, cy - k, cx - k, cy - r, cx, cy - r], "c");
        self.op(&[cx + k, cy - r, cx + r, cy - k, cx + r, cy], "c");
        self.content.extend_from_slice(b"h\n");
        self.content.extend_from_slice(paint.operator().as_bytes());
        self.content.push(b'\n');
    }

    /// Place an image with its lower-left corner at (x, y), stretched to
    /// `width` x `height`
    pub fn draw_image(&mut self, info: &ImageInfo, x: f32, y: f32, width: f32, height: f32) {
        self.images.push(info.clone());
        let name = format!("Im{}", self.images.len());
        let stream = image::create_image_content_stream(x, y, width, height, &name);
        self.content.extend_from_slice(&stream);
    }

    /// Make the rectangle (x1, y1)-(x2, y2) open `url` when clicked
    pub fn link_url(&mut self, url: &str, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.links.push(LinkAnnotation {
            x: x1.min(x2),
            y: y1.min(y2),
            width: (x2 - x1).abs(),
            height: (y2 - y1).abs(),
            url: url.to_string(),
        });
    }

    /// Serialize the canvas as a standalone single-page PDF
    pub fn finish(self) -> Result<Vec<u8>> {
        let mut generator = PdfGenerator::new();
        let pages_id = generator.reserve_object();

        let font_entries: Vec<String> = self
            .fonts
            .iter()
            .map(|font| {
                let id = generator.add_object(format!(
                    "<< /Type /Font\n/Subtype /Type1\n/BaseFont /{}\n/Encoding /WinAnsiEncoding\n>>\n",
                    font.base_font()
                ));
                format!("/{} {} 0 R", font.resource_name(), id)
            })
            .collect();

        let image_entries: Vec<String> = self
            .images
            .iter()
            .enumerate()
            .map(|(i, info)| {
                let id = image::create_image_object(&mut generator, info);
                format!("/Im{} {} 0 R", i + 1, id)
            })
            .collect();

        let compressed = compression::compress_deflate(&self.content)
            .context("Failed to compress page content")?;
        let content_id =
            generator.add_stream_object("/Filter /FlateDecode\n".to_string(), compressed);

        let annot_ids: Vec<u32> = self
            .links
            .iter()
            .map(|link| {
                generator.add_object(format!(
                    "<< /Type /Annot\n/Subtype /Link\n/Rect [{} {} {} {}]\n/Border [0 0 0]\n\
                     /A << /Type /Action\n/S /URI\n/URI ({}) >>\n>>\n",
                    format_number(link.x),
                    format_number(link.y),
                    format_number(link.x + link.width),
                    format_number(link.y + link.height),
                    escape_pdf_string(&link.url),
                ))
            })
            .collect();

        let mut resources = String::from("<<");
        if !font_entries.is_empty() {
            resources.push_str(&format!(" /Font << {} >>", font_entries.join(" ")));
        }
        if !image_entries.is_empty() {
            resources.push_str(&format!(" /XObject << {} >>", image_entries.join(" ")));
        }
        resources.push_str(" >>");

        let annots = if annot_ids.is_empty() {
            String::new()
        } else {
            let refs: Vec<String> = annot_ids.iter().map(|id| format!("{} 0 R", id)).collect();
            format!("/Annots [{}]\n", refs.join(" "))
        };

        let page_id = generator.add_object(format!(
            "<< /Type /Page\n/Parent {} 0 R\n/MediaBox [0 0 {} {}]\n/Contents {} 0 R\n/Resources {}\n{}>>\n",
            pages_id,
            format_number(self.size.width),
            format_number(self.size.height),
            content_id,
            resources,
            annots
        ));
        generator.set_object(
            pages_id,
            format!("<< /Type /Pages\n/Kids [{} 0 R]\n/Count 1\n>>\n", page_id),
        );
        let catalog_id =
            generator.add_object(format!("<< /Type /Catalog\n/Pages {} 0 R\n>>\n", pages_id));

        let pdf = generator.generate(catalog_id);
        tracing::debug!(
            bytes = pdf.len(),
            fonts = self.fonts.len(),
            images = self.images.len(),
            links = self.links.len(),
            "rendered canvas page"
        );
        Ok(pdf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_str(canvas: &Canvas) -> String {
        String::from_utf8_lossy(canvas.content()).to_string()
    }

    #[test]
    fn test_color_hex() {
        assert_eq!(Color::hex(0x6B46C1), Color::rgb8(0x6B, 0x46, 0xC1));
        assert_eq!(Color::hex(0xFFFFFF), Color::WHITE);
    }

    #[test]
    fn test_draw_string_emits_text_object() {
        let mut canvas = Canvas::new(PageSize::letter());
        canvas.set_font(Font::HelveticaBold, 36.0);
        canvas.draw_string(50.0, 752.0, "botify");
        let s = content_str(&canvas);
        assert!(s.contains("BT\n/F2 36 Tf\n50 752 Td\n(botify) Tj\nET\n"));
    }

    #[test]
    fn test_rect_and_line_operators() {
        let mut canvas = Canvas::new(PageSize::letter());
        canvas.set_fill_color(Color::WHITE);
        canvas.rect(0.0, 0.0, 612.0, 792.0, Paint::FillStroke);
        canvas.line(50.0, 10.0, 100.0, 10.0);
        let s = content_str(&canvas);
        assert!(s.contains("1 1 1 rg\n"));
        assert!(s.contains("0 0 612 792 re\nB\n"));
        assert!(s.contains("50 10 m\n100 10 l\nS\n"));
    }

    #[test]
    fn test_round_rect_clamps_radius() {
        let mut canvas = Canvas::new(PageSize::letter());
        canvas.round_rect(0.0, 0.0, 10.0, 4.0, 8.0, Paint::Stroke);
        let s = content_str(&canvas);
        // radius clamped to 2, so the path starts 2pt in from the left edge
        assert!(s.starts_with("2 0 m\n8 0 l\n"));
        assert!(s.ends_with("h\nS\n"));
    }

    #[test]
    fn test_circle_is_four_curves() {
        let mut canvas = Canvas::new(PageSize::letter());
        canvas.circle(65.0, 100.0, 2.5, Paint::Fill);
        let s = content_str(&canvas);
        assert_eq!(s.matches(" c\n").count(), 4);
        assert!(s.starts_with("67.5 100 m\n"));
    }

    #[test]
    fn test_finish_produces_loadable_page() {
        let mut canvas = Canvas::new(PageSize::new(720.0, 540.0));
        canvas.set_font(Font::Helvetica, 14.0);
        canvas.draw_string(50.0, 400.0, "Tracker (sheet)");
        canvas.link_url("https://example.com/a(b)", 50.0, 398.0, 150.0, 408.0);
        let bytes = canvas.finish().unwrap();

        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);
        let page_id = pages[&1];
        let page = doc.get_dictionary(page_id).unwrap();
        let annots = page.get(b"Annots").unwrap().as_array().unwrap();
        assert_eq!(annots.len(), 1);

        let content = doc.get_page_content(page_id).unwrap();
        let content = String::from_utf8_lossy(&content);
        assert!(content.contains("(Tracker \\(sheet\\)) Tj"));
    }

    #[test]
    fn test_link_rect_is_normalised() {
        let mut canvas = Canvas::new(PageSize::letter());
        canvas.link_url("https://example.com", 150.0, 408.0, 50.0, 398.0);
        let bytes = canvas.finish().unwrap();

        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        let page = doc.get_dictionary(doc.get_pages()[&1]).unwrap();
        let annot_id = page.get(b"Annots").unwrap().as_array().unwrap()[0]
            .as_reference()
            .unwrap();
        let rect: Vec<f32> = doc
            .get_dictionary(annot_id)
            .unwrap()
            .get(b"Rect")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|o| match o {
                lopdf::Object::Integer(i) => *i as f32,
                lopdf::Object::Real(r) => *r,
                other => panic!("unexpected Rect entry {:?}", other),
            })
            .collect();
        assert_eq!(rect, vec![50.0, 398.0, 150.0, 408.0]);
    }
}
