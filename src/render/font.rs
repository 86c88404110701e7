//! Text rendering for labels.
//!
//! Renders text with a TrueType font through ab_glyph, anti-aliased onto a
//! grayscale canvas. When the configured font file is missing or unreadable
//! the Spleen 12×24 bitmap font is used instead: integer scaled, no
//! anti-aliasing, but always available.

use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontVec, ScaleFont, point};
use image::{GrayImage, Luma};
use spleen_font::{FONT_12X24, PSF2Font};

use crate::error::LabelError;

/// Built-in glyph cell size.
const BUILTIN_CELL_W: u32 = 12;
const BUILTIN_CELL_H: u32 = 24;

/// The label font. Constructed once and passed to everything that draws text.
pub enum LabelFont {
    Truetype { font: FontVec, source: PathBuf },
    Builtin,
}

impl std::fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Truetype { source, .. } => write!(f, "LabelFont::Truetype({})", source.display()),
            Self::Builtin => f.write_str("LabelFont::Builtin"),
        }
    }
}

impl LabelFont {
    /// Read a TTF/OTF font file.
    pub fn try_load<P: AsRef<Path>>(path: P) -> Result<Self, LabelError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let font = FontVec::try_from_vec(bytes).map_err(|e| {
            LabelError::Composition(format!("unusable font {}: {}", path.display(), e))
        })?;
        Ok(Self::Truetype {
            font,
            source: path.to_path_buf(),
        })
    }

    /// Read a font file, falling back to the built-in bitmap font.
    pub fn load_or_builtin<P: AsRef<Path>>(path: P) -> Self {
        match Self::try_load(path.as_ref()) {
            Ok(font) => {
                tracing::debug!(path = %path.as_ref().display(), "loaded label font");
                font
            }
            Err(e) => {
                tracing::warn!(error = %e, "falling back to built-in bitmap font");
                Self::Builtin
            }
        }
    }

    pub fn builtin() -> Self {
        Self::Builtin
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin)
    }

    /// Integer scale of the bitmap font for a nominal pixel size.
    /// Glyphs never exceed the nominal size unless it is below one cell.
    fn builtin_scale(px: f32) -> u32 {
        ((px / BUILTIN_CELL_H as f32).floor() as u32).max(1)
    }

    /// Advance width of `text` in pixels.
    pub fn measure(&self, text: &str, px: f32) -> u32 {
        match self {
            Self::Truetype { font, .. } => {
                let scaled = font.as_scaled(px);
                let mut caret = 0.0f32;
                let mut last = None;
                for ch in text.chars() {
                    let id = font.glyph_id(ch);
                    if let Some(prev) = last {
                        caret += scaled.kern(prev, id);
                    }
                    caret += scaled.h_advance(id);
                    last = Some(id);
                }
                caret.ceil().max(0.0) as u32
            }
            Self::Builtin => {
                text.chars().count() as u32 * BUILTIN_CELL_W * Self::builtin_scale(px)
            }
        }
    }

    /// Height of one rendered line at `px`.
    pub fn line_height(&self, px: f32) -> u32 {
        match self {
            Self::Truetype { font, .. } => {
                let scaled = font.as_scaled(px);
                (scaled.ascent() - scaled.descent()).ceil().max(1.0) as u32
            }
            Self::Builtin => BUILTIN_CELL_H * Self::builtin_scale(px),
        }
    }

    /// Draw `text` with its top-left corner at (x, y). Ink darkens, never lightens.
    pub fn draw(&self, canvas: &mut GrayImage, x: i64, y: i64, text: &str, px: f32) {
        match self {
            Self::Truetype { font, .. } => draw_truetype(font, canvas, x, y, text, px),
            Self::Builtin => draw_builtin(canvas, x, y, text, Self::builtin_scale(px)),
        }
    }
}

fn darken(canvas: &mut GrayImage, x: i64, y: i64, coverage: f32) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    let ink = (255.0 * (1.0 - coverage.clamp(0.0, 1.0))).round() as u8;
    let pixel = canvas.get_pixel_mut(x as u32, y as u32);
    pixel.0[0] = pixel.0[0].min(ink);
}

fn draw_truetype(font: &FontVec, canvas: &mut GrayImage, x: i64, y: i64, text: &str, px: f32) {
    let scaled = font.as_scaled(px);
    let baseline = y as f32 + scaled.ascent();

    let mut caret = x as f32;
    let mut last = None;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = last {
            caret += scaled.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(px, point(caret, baseline));
        caret += scaled.h_advance(id);
        last = Some(id);

        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let cx = gx as i64 + bounds.min.x as i64;
                let cy = gy as i64 + bounds.min.y as i64;
                darken(canvas, cx, cy, coverage);
            });
        }
    }
}

fn draw_builtin(canvas: &mut GrayImage, x: i64, y: i64, text: &str, scale: u32) {
    let Ok(mut spleen) = PSF2Font::new(FONT_12X24) else {
        return;
    };
    let cell_w = (BUILTIN_CELL_W * scale) as i64;
    let scale = scale as i64;

    for (i, ch) in text.chars().enumerate() {
        let origin_x = x + i as i64 * cell_w;
        let utf8 = ch.to_string();
        match spleen.glyph_for_utf8(utf8.as_bytes()) {
            Some(glyph) => {
                for (row_y, row) in glyph.enumerate() {
                    for (col_x, on) in row.enumerate() {
                        if !on {
                            continue;
                        }
                        for sy in 0..scale {
                            for sx in 0..scale {
                                darken(
                                    canvas,
                                    origin_x + col_x as i64 * scale + sx,
                                    y + row_y as i64 * scale + sy,
                                    1.0,
                                );
                            }
                        }
                    }
                }
            }
            None if !ch.is_whitespace() => {
                draw_box(canvas, origin_x, y, cell_w, BUILTIN_CELL_H as i64 * scale);
            }
            None => {}
        }
    }
}

/// Box outline for characters the bitmap font lacks.
fn draw_box(canvas: &mut GrayImage, x: i64, y: i64, w: i64, h: i64) {
    for dx in 1..w - 1 {
        darken(canvas, x + dx, y + 1, 1.0);
        darken(canvas, x + dx, y + h - 2, 1.0);
    }
    for dy in 1..h - 1 {
        darken(canvas, x + 1, y + dy, 1.0);
        darken(canvas, x + w - 2, y + dy, 1.0);
    }
}

/// A white canvas of the given size.
pub(crate) fn blank(width: u32, height: u32) -> GrayImage {
    GrayImage::from_pixel(width.max(1), height.max(1), Luma([255u8]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ink_count(img: &GrayImage) -> usize {
        img.pixels().filter(|p| p.0[0] < 128).count()
    }

    #[test]
    fn test_missing_font_falls_back() {
        let font = LabelFont::load_or_builtin("/nonexistent/DejaVuSans-Bold.ttf");
        assert!(font.is_builtin());
    }

    #[test]
    fn test_garbage_font_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        fs::write(&path, b"definitely not a font").unwrap();
        assert!(LabelFont::try_load(&path).is_err());
        assert!(LabelFont::load_or_builtin(&path).is_builtin());
    }

    #[test]
    fn test_builtin_measure_scales_with_size() {
        let font = LabelFont::builtin();
        assert_eq!(font.measure("Widget", 24.0), 6 * 12);
        assert_eq!(font.measure("Widget", 50.0), 6 * 12 * 2);
        // Tiny sizes still use one cell
        assert_eq!(font.measure("ab", 10.0), 24);
        assert_eq!(font.line_height(10.0), 24);
        assert_eq!(font.line_height(72.0), 72);
    }

    #[test]
    fn test_builtin_draws_ink() {
        let font = LabelFont::builtin();
        let mut canvas = blank(200, 40);
        font.draw(&mut canvas, 4, 4, "Hello", 24.0);
        assert!(ink_count(&canvas) > 20);
    }

    #[test]
    fn test_draw_clips_outside_canvas() {
        let font = LabelFont::builtin();
        let mut canvas = blank(10, 10);
        font.draw(&mut canvas, -50, -50, "WWWW", 48.0);
        font.draw(&mut canvas, 500, 500, "WWWW", 48.0);
        assert_eq!(ink_count(&canvas), 0);
    }

    #[test]
    fn test_whitespace_draws_nothing() {
        let font = LabelFont::builtin();
        let mut canvas = blank(100, 30);
        font.draw(&mut canvas, 0, 0, "   ", 24.0);
        assert_eq!(ink_count(&canvas), 0);
    }
}
