//! # Label Composition
//!
//! Merges text lines, barcodes and QR symbols into one tape-width canvas.
//!
//! ## Layout
//!
//! ```text
//!  ┌──────────── canvas width ────────────┐
//!  │               top pad                │
//!  │            Key (w / 10 px)           │
//!  │         Value line (w / 18 px)       │  text items, request order
//!  │               line gap               │
//!  │           ║│║║│║│║ barcode           │  barcodes, request order
//!  │               line gap               │
//!  │              ▛▀▀▜ QR                 │  QR symbols, request order
//!  │              bottom pad              │
//!  └──────────────────────────────────────┘
//! ```
//!
//! Every block is horizontally centered. Width starts at
//! `max(min_width, widest bitmap)`, clamped to the tape; text lines that do
//! not fit grow the canvas and a final downscale brings it back under the
//! tape width. The height is estimated up front, then cropped to where the
//! last block ended.

use std::borrow::Cow;

use image::GrayImage;
use image::imageops::{self, FilterType};

use super::font::{LabelFont, blank};
use crate::error::LabelError;

/// Compositor dimensions, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositorSettings {
    pub tape_max_width: u32,
    pub min_width: u32,
    pub top_pad: u32,
    pub line_gap: u32,
    pub bottom_pad: u32,
    /// Floor for the height estimate
    pub min_estimate: u32,
    /// Horizontal room kept around text lines
    pub text_margin: u32,
}

impl Default for CompositorSettings {
    fn default() -> Self {
        Self {
            tape_max_width: 696,
            min_width: 500,
            top_pad: 8,
            line_gap: 8,
            bottom_pad: 8,
            min_estimate: 200,
            text_margin: 10,
        }
    }
}

impl CompositorSettings {
    pub fn for_tape(tape_max_width: u32) -> Self {
        Self {
            tape_max_width,
            min_width: Self::default().min_width.min(tape_max_width),
            ..Self::default()
        }
    }
}

/// One input to the compositor.
#[derive(Debug, Clone, Copy)]
pub enum Block<'a> {
    Text { key: &'a str, value: &'a str },
    Barcode(&'a GrayImage),
    Qr(&'a GrayImage),
}

/// The composed label.
#[derive(Debug, Clone)]
pub struct Composition {
    pub image: GrayImage,
    /// Height of the canvas before cropping
    pub estimated_height: u32,
}

impl Composition {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Font sizes derived from the canvas width.
#[derive(Debug, Clone, Copy)]
struct TextMetrics {
    key_px: f32,
    value_px: f32,
    key_advance: u32,
    value_advance: u32,
}

impl TextMetrics {
    fn for_width(width: u32, font: &LabelFont) -> Self {
        let key_px = (width / 10).max(12) as f32;
        let value_px = (width / 18).max(10) as f32;
        let key_advance = (key_px as u32).max(font.line_height(key_px));
        let value_advance = ((value_px * 1.2) as u32)
            .max(font.line_height(value_px))
            .max(1);
        Self {
            key_px,
            value_px,
            key_advance,
            value_advance,
        }
    }
}

struct TextBlock<'a> {
    key: &'a str,
    lines: Vec<&'a str>,
}

impl TextBlock<'_> {
    fn height(&self, m: &TextMetrics, gap: u32) -> u32 {
        let key = if self.key.is_empty() { 0 } else { m.key_advance };
        key + self.lines.len() as u32 * m.value_advance + gap
    }
}

/// Downscale `img` to `max_width` keeping its aspect ratio.
pub fn fit_width(img: &GrayImage, max_width: u32) -> Cow<'_, GrayImage> {
    if img.width() <= max_width {
        return Cow::Borrowed(img);
    }
    let ratio = max_width as f64 / img.width() as f64;
    let height = ((img.height() as f64 * ratio) as u32).max(1);
    Cow::Owned(imageops::resize(img, max_width, height, FilterType::Lanczos3))
}

/// Builds label canvases.
#[derive(Debug, Clone, Default)]
pub struct LabelCompositor {
    pub settings: CompositorSettings,
}

impl LabelCompositor {
    pub fn new(settings: CompositorSettings) -> Self {
        Self { settings }
    }

    /// Compose `blocks` (in request order) into one canvas.
    pub fn compose(&self, blocks: &[Block<'_>], font: &LabelFont) -> Result<Composition, LabelError> {
        let s = &self.settings;

        let mut texts = Vec::new();
        let mut barcodes = Vec::new();
        let mut qrs = Vec::new();
        for block in blocks {
            match *block {
                Block::Text { key, value } => {
                    let key = key.trim();
                    let value = value.trim();
                    if key.is_empty() && value.is_empty() {
                        continue;
                    }
                    let lines = if value.is_empty() {
                        Vec::new()
                    } else {
                        value.lines().collect()
                    };
                    texts.push(TextBlock { key, lines });
                }
                Block::Barcode(img) => barcodes.push(fit_width(img, s.tape_max_width)),
                Block::Qr(img) => qrs.push(fit_width(img, s.tape_max_width)),
            }
        }

        if texts.is_empty() && barcodes.is_empty() && qrs.is_empty() {
            return Err(LabelError::Composition("no renderable items".to_string()));
        }

        let widest_bitmap = barcodes.iter().chain(qrs.iter()).map(|i| i.width()).max().unwrap_or(0);
        let base_width = s.min_width.max(widest_bitmap).min(s.tape_max_width);
        let metrics = TextMetrics::for_width(base_width, font);

        let widest_text = texts
            .iter()
            .flat_map(|t| {
                let key = (!t.key.is_empty()).then(|| font.measure(t.key, metrics.key_px));
                t.lines
                    .iter()
                    .map(|line| font.measure(line, metrics.value_px))
                    .chain(key)
                    .collect::<Vec<_>>()
            })
            .max()
            .unwrap_or(0);
        let width = base_width.max(widest_text + 2 * s.text_margin);
        if width > base_width {
            tracing::debug!(base_width, width, "text grew the canvas");
        }

        let text_height: u32 = texts.iter().map(|t| t.height(&metrics, s.line_gap)).sum();
        let bitmap_height: u32 = barcodes
            .iter()
            .chain(qrs.iter())
            .map(|i| i.height() + s.line_gap)
            .sum();
        let estimated_height = (text_height + bitmap_height + s.top_pad + s.bottom_pad).max(s.min_estimate);

        let mut canvas = blank(width, estimated_height);
        let mut y = s.top_pad;

        for text in &texts {
            if !text.key.is_empty() {
                let w = font.measure(text.key, metrics.key_px);
                font.draw(&mut canvas, centered(width, w), y as i64, text.key, metrics.key_px);
                y += metrics.key_advance;
            }
            for line in &text.lines {
                let w = font.measure(line, metrics.value_px);
                font.draw(&mut canvas, centered(width, w), y as i64, line, metrics.value_px);
                y += metrics.value_advance;
            }
            y += s.line_gap;
        }

        for img in barcodes.iter().chain(qrs.iter()) {
            imageops::replace(&mut canvas, img.as_ref(), centered(width, img.width()), y as i64);
            y += img.height() + s.line_gap;
        }

        let used_height = (y.saturating_sub(s.line_gap) + s.bottom_pad).min(estimated_height);
        let mut image = imageops::crop_imm(&canvas, 0, 0, width, used_height).to_image();

        if image.width() > s.tape_max_width {
            image = fit_width(&image, s.tape_max_width).into_owned();
        }

        tracing::info!(
            width = image.width(),
            height = image.height(),
            estimated_height,
            text_items = texts.len(),
            barcodes = barcodes.len(),
            qr_codes = qrs.len(),
            "label composed"
        );

        Ok(Composition {
            image,
            estimated_height,
        })
    }
}

fn centered(outer: u32, inner: u32) -> i64 {
    (outer.saturating_sub(inner) / 2) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn solid(w: u32, h: u32) -> GrayImage {
        GrayImage::from_pixel(w, h, Luma([0]))
    }

    fn compose(blocks: &[Block<'_>]) -> Composition {
        LabelCompositor::default()
            .compose(blocks, &LabelFont::builtin())
            .unwrap()
    }

    #[test]
    fn test_empty_input_fails() {
        let err = LabelCompositor::default()
            .compose(&[Block::Text { key: " ", value: "" }], &LabelFont::builtin())
            .unwrap_err();
        assert!(matches!(err, LabelError::Composition(_)));
    }

    #[test]
    fn test_min_width_floor() {
        let img = solid(100, 100);
        let out = compose(&[Block::Qr(&img)]);
        assert_eq!(out.width(), 500);
    }

    #[test]
    fn test_width_follows_widest_bitmap() {
        let img = solid(600, 50);
        let out = compose(&[Block::Barcode(&img)]);
        assert_eq!(out.width(), 600);
    }

    #[test]
    fn test_width_never_exceeds_tape() {
        for w in [697, 1000, 5000, 20_000] {
            let img = solid(w, 40);
            let out = compose(&[Block::Qr(&img), Block::Text { key: "", value: "x" }]);
            assert!(out.width() <= 696, "input {} gave {}", w, out.width());
        }
    }

    #[test]
    fn test_oversized_bitmap_keeps_aspect_ratio() {
        let img = solid(1392, 400);
        let scaled = fit_width(&img, 696);
        assert_eq!(scaled.width(), 696);
        assert_eq!(scaled.height(), 200);
    }

    #[test]
    fn test_long_text_is_scaled_back_to_tape() {
        let value = "W".repeat(200);
        let out = compose(&[Block::Text { key: "", value: &value }]);
        assert_eq!(out.width(), 696);
    }

    #[test]
    fn test_height_cropped_to_content() {
        let img = solid(300, 120);
        let out = compose(&[Block::Qr(&img)]);
        // top + bitmap + bottom, the 200 px estimate floor is cropped away
        assert_eq!(out.height(), 8 + 120 + 8);
        assert_eq!(out.estimated_height, 200);
        assert!(out.height() < out.estimated_height);
    }

    #[test]
    fn test_height_covers_tallest_element() {
        let small = solid(200, 50);
        let tall = solid(200, 400);
        let out = compose(&[Block::Qr(&small), Block::Barcode(&tall)]);
        assert!(out.height() >= 400 + 8 + 8);
        assert_eq!(out.height(), 8 + 400 + 8 + 50 + 8);
    }

    #[test]
    fn test_groups_stack_text_barcode_qr() {
        let qr = solid(100, 100);
        let bars = solid(200, 30);
        // QR first in request order, but barcodes stack above QR symbols
        let out = compose(&[
            Block::Qr(&qr),
            Block::Barcode(&bars),
            Block::Text { key: "", value: "Widget" },
        ]);
        let width = out.width();
        assert_eq!(width, 500);

        let metrics = TextMetrics::for_width(500, &LabelFont::builtin());
        let text_end = 8 + metrics.value_advance + 8;
        // Barcode row: 200 px wide centered, at text_end
        assert_eq!(out.image.get_pixel(150, text_end + 1).0[0], 0);
        assert_eq!(out.image.get_pixel(120, text_end + 1).0[0], 255);
        // QR after barcode and gap
        let qr_top = text_end + 30 + 8;
        assert_eq!(out.image.get_pixel(200, qr_top + 1).0[0], 0);
        assert_eq!(out.image.get_pixel(190, qr_top + 1).0[0], 255);
        assert_eq!(out.height(), qr_top + 100 + 8);
    }

    #[test]
    fn test_multiline_value_adds_lines() {
        let one = compose(&[Block::Text { key: "", value: "a" }]);
        let three = compose(&[Block::Text { key: "Key", value: "a\nb\nc" }]);
        // Both fit in the estimate floor; crop shows the difference
        assert!(three.height() > one.height());
    }

    #[test]
    fn test_text_is_inked() {
        let out = compose(&[Block::Text { key: "", value: "Widget" }]);
        assert!(out.image.pixels().any(|p| p.0[0] == 0));
    }
}
