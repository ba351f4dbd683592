//! Cover and closing page layouts.
//!
//! Both pages are drawn top-down with a [`Cursor`]; every block moves the
//! cursor down by a fixed step so the boxes stack without overlapping.

use anyhow::Result;
use std::path::Path;

use crate::canvas::{Canvas, Paint};
use crate::content::ReportContent;
use crate::fonts::Font;
use crate::image::{self, fit_image};
use crate::pdf_generator::PageSize;

const LEFT: f32 = 50.0;
const TOP_OFFSET: f32 = 40.0;

const LOGO_SIZE: f32 = 36.0;
const TITLE_SIZE: f32 = 28.0;
const TITLE_GAP: f32 = 15.0;
const TITLE_RISE: f32 = 5.0;
const LINK_SIZE: f32 = 14.0;
const BLOCK_GAP: f32 = 30.0;

const BOX_LEFT: f32 = 40.0;
const BOX_HEIGHT: f32 = 35.0;
const BOX_RADIUS: f32 = 8.0;
const BOX_TITLE_SIZE: f32 = 20.0;
const SECTION_GAP: f32 = 10.0;

const BULLET_SIZE: f32 = 16.0;
const BULLET_X: f32 = 65.0;
const BULLET_RADIUS: f32 = 2.5;
const BULLET_TEXT_X: f32 = 85.0;
const BULLET_STEP: f32 = 25.0;

/// Fraction of the page height the cover image may occupy
const COVER_IMAGE_MAX_HEIGHT: f32 = 0.3;
const CLOSING_HEADER_FROM_TOP: f32 = 0.06;
const CLOSING_IMAGE_MARGIN: f32 = 40.0;
const CLOSING_RESERVED_HEIGHT: f32 = 150.0;

/// Vertical layout position; only ever moves down the page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    y: f32,
}

impl Cursor {
    pub fn at(y: f32) -> Self {
        Cursor { y }
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn advance(&mut self, step: f32) {
        self.y -= step.max(0.0);
    }
}

/// Render the branded cover page. `image_path` is skipped when absent or
/// missing on disk; an image that exists but fails to decode is an error.
pub fn render_cover_page(
    page: PageSize,
    content: &ReportContent,
    image_path: Option<&Path>,
) -> Result<Vec<u8>> {
    let palette = content.palette;
    let mut canvas = Canvas::new(page);

    canvas.set_fill_color(palette.background);
    canvas.rect(0.0, 0.0, page.width, page.height, Paint::FillStroke);

    let mut cursor = Cursor::at(page.height - TOP_OFFSET);

    // Logo, with the title set beside it
    canvas.set_fill_color(palette.brand);
    canvas.set_font(Font::HelveticaBold, LOGO_SIZE);
    let logo_width = canvas.string_width(content.brand, Font::HelveticaBold, LOGO_SIZE);
    canvas.draw_string(LEFT, cursor.y(), content.brand);

    canvas.set_fill_color(palette.text);
    canvas.set_font(Font::HelveticaBold, TITLE_SIZE);
    canvas.draw_string(
        LEFT + logo_width + TITLE_GAP,
        cursor.y() + TITLE_RISE,
        content.title,
    );

    // Underlined tracker link
    cursor.advance(BLOCK_GAP);
    canvas.set_font(Font::Helvetica, LINK_SIZE);
    canvas.set_fill_color(palette.link);
    let y = cursor.y();
    canvas.draw_string(LEFT, y, content.link_text);
    let text_width = canvas.string_width(content.link_text, Font::Helvetica, LINK_SIZE);
    canvas.line(LEFT, y - 1.0, LEFT + text_width, y - 1.0);
    canvas.link_url(content.link_url, LEFT, y - 2.0, LEFT + text_width, y + 8.0);

    if let Some(path) = image_path.filter(|p| p.exists()) {
        cursor.advance(BLOCK_GAP);
        let info = image::load_image(path)?;
        let fit = fit_image(
            info.width,
            info.height,
            page.width - 2.0 * LEFT,
            page.height * COVER_IMAGE_MAX_HEIGHT,
        )?;
        let x = (page.width - fit.width) / 2.0;
        canvas.draw_image(&info, x, cursor.y() - fit.height, fit.width, fit.height);
        cursor.advance(fit.height + BLOCK_GAP);
    }

    for section in content.sections {
        cursor.advance(SECTION_GAP);
        draw_section(&mut canvas, &mut cursor, content, section.title, section.items);
        cursor.advance(SECTION_GAP);
    }

    cursor.advance(BLOCK_GAP);
    draw_section(
        &mut canvas,
        &mut cursor,
        content,
        content.priorities_title,
        content.priorities,
    );

    canvas.finish()
}

/// Rounded header box followed by its bullet list
fn draw_section(
    canvas: &mut Canvas,
    cursor: &mut Cursor,
    content: &ReportContent,
    title: &str,
    items: &[&str],
) {
    let page = canvas.size();
    let palette = content.palette;

    canvas.set_fill_color(palette.background);
    canvas.round_rect(
        BOX_LEFT,
        cursor.y() - 5.0,
        page.width - 2.0 * BOX_LEFT,
        BOX_HEIGHT,
        BOX_RADIUS,
        Paint::FillStroke,
    );

    canvas.set_fill_color(palette.text);
    canvas.set_font(Font::HelveticaBold, BOX_TITLE_SIZE);
    canvas.draw_string(LEFT, cursor.y() + 5.0, title);
    cursor.advance(BOX_HEIGHT);

    canvas.set_font(Font::Helvetica, BULLET_SIZE);
    for item in items {
        canvas.circle(BULLET_X, cursor.y() + 5.0, BULLET_RADIUS, Paint::FillStroke);
        canvas.draw_string(BULLET_TEXT_X, cursor.y(), item);
        cursor.advance(BULLET_STEP);
    }
}

/// Render the closing page: a titled header rule above the team slide image
pub fn render_team_slide(
    page: PageSize,
    content: &ReportContent,
    image_path: Option<&Path>,
) -> Result<Vec<u8>> {
    let palette = content.palette;
    let mut canvas = Canvas::new(page);

    canvas.set_fill_color(palette.background);
    canvas.rect(0.0, 0.0, page.width, page.height, Paint::FillStroke);

    let mut cursor = Cursor::at(page.height - page.height * CLOSING_HEADER_FROM_TOP);
    canvas.set_fill_color(palette.text);
    canvas.set_font(Font::HelveticaBold, BOX_TITLE_SIZE);
    canvas.draw_string(LEFT, cursor.y(), content.closing_title);

    canvas.set_stroke_color(palette.rule);
    canvas.set_line_width(1.0);
    canvas.line(LEFT, cursor.y() - 10.0, page.width - LEFT, cursor.y() - 10.0);

    if let Some(path) = image_path.filter(|p| p.exists()) {
        let info = image::load_image(path)?;
        let fit = fit_image(
            info.width,
            info.height,
            page.width - 2.0 * CLOSING_IMAGE_MARGIN,
            page.height - CLOSING_RESERVED_HEIGHT,
        )?;
        let x = (page.width - fit.width) / 2.0;
        cursor.advance(fit.height + CLOSING_IMAGE_MARGIN);
        canvas.draw_image(&info, x, cursor.y(), fit.width, fit.height);
    }

    canvas.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{EXECUTIVE_SUMMARY, Variant};
    use ::image::{Rgb, RgbImage};
    use lopdf::Document;

    fn page_content(bytes: &[u8]) -> (Document, String) {
        let doc = Document::load_mem(bytes).unwrap();
        let page_id = doc.get_pages()[&1];
        let content = doc.get_page_content(page_id).unwrap();
        let content = String::from_utf8_lossy(&content).to_string();
        (doc, content)
    }

    fn write_png(dir: &Path, name: &str, w: u32, h: u32) -> std::path::PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(w, h, Rgb([200, 100, 50])).save(&path).unwrap();
        path
    }

    #[test]
    fn test_cursor_only_moves_down() {
        let mut cursor = Cursor::at(100.0);
        cursor.advance(30.0);
        cursor.advance(-50.0);
        assert_eq!(cursor.y(), 70.0);
    }

    #[test]
    fn test_cover_without_image() {
        let page = PageSize::widescreen();
        let bytes = render_cover_page(page, Variant::Full.content(), None).unwrap();
        let (doc, content) = page_content(&bytes);

        assert!(content.contains("(botify) Tj"));
        assert!(content.contains("(David's Bridal Executive Summary) Tj"));
        assert!(content.contains("(Current Key Priorities) Tj"));
        assert!(content.contains("(Core Web Vitals \\(Page Speed\\) Analysis) Tj"));
        assert!(!content.contains(" Do\n"));
        // logo at 40pt from the top, title raised 5pt after the logo + 15pt gap
        assert!(content.contains("50 500 Td\n(botify)"));
        assert!(content.contains("162.992 505 Td\n"));

        let page_id = doc.get_pages()[&1];
        let dict = doc.get_dictionary(page_id).unwrap();
        assert!(dict.get(b"Annots").is_ok());
    }

    #[test]
    fn test_cover_missing_image_path_is_skipped() {
        let bytes = render_cover_page(
            PageSize::letter(),
            &EXECUTIVE_SUMMARY,
            Some(Path::new("/nonexistent/cover.png")),
        )
        .unwrap();
        let (_, content) = page_content(&bytes);
        assert!(!content.contains(" Do\n"));
    }

    #[test]
    fn test_cover_image_is_fitted_and_centered() {
        let dir = tempfile::tempdir().unwrap();
        // Letter: target width 512, max height 237.6 -> width-bound 512x256 is too tall
        let path = write_png(dir.path(), "cover.png", 1000, 500);
        let bytes = render_cover_page(PageSize::letter(), &EXECUTIVE_SUMMARY, Some(&path)).unwrap();
        let (_, content) = page_content(&bytes);

        // height-bound: 475.2 x 237.6, centred at x = (612 - 475.2) / 2
        // top of image at 792 - 40 - 30 - 30 = 692
        assert!(content.contains("475.2 0 0 237.6 68.4 454.4 cm\n/Im1 Do"));
    }

    #[test]
    fn test_cover_rejects_corrupt_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"\x89PNG but not really").unwrap();
        assert!(render_cover_page(PageSize::letter(), &EXECUTIVE_SUMMARY, Some(&path)).is_err());
    }

    #[test]
    fn test_team_slide_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "team-slide.png", 800, 400);
        let page = PageSize::letter();
        let bytes = render_team_slide(page, &EXECUTIVE_SUMMARY, Some(&path)).unwrap();
        let (_, content) = page_content(&bytes);

        assert!(content.contains("(Glossary) Tj"));
        // header at 6% from the top: 792 - 47.52
        assert!(content.contains("50 744.48 Td\n"));
        assert!(content.contains("50 734.48 m\n562 734.48 l\nS\n"));
        // width-bound: 532 x 266, bottom at 744.48 - 266 - 40
        assert!(content.contains("532 0 0 266 40 438.48 cm\n/Im1 Do"));
    }

    #[test]
    fn test_team_slide_without_image() {
        let bytes = render_team_slide(PageSize::letter(), &EXECUTIVE_SUMMARY, None).unwrap();
        let (_, content) = page_content(&bytes);
        assert!(content.contains("(Glossary) Tj"));
        assert!(!content.contains(" Do\n"));
    }
}
