//! Caption strips under QR symbols.
//!
//! ```text
//! ┌───────────┐
//! │  ▄▄▄ ▄ ▄▄ │
//! │  QR tile  │
//! │  ▀▀▀ ▀ ▀▀ │
//! ├───────────┤  ← pad
//! │  Caption  │  ← max(12, 8% of width) px
//! └───────────┘  ← pad
//! ```

use image::GrayImage;
use image::imageops;

use super::font::{LabelFont, blank};

/// Caption font size for an image of the given width.
pub fn caption_px(width: u32) -> f32 {
    (width as f32 * 0.08).floor().max(12.0)
}

/// Append `text` centered in a white strip below `image`.
///
/// Blank captions return the image unchanged.
pub fn with_caption(image: GrayImage, text: &str, font: &LabelFont) -> GrayImage {
    let text = text.trim();
    if text.is_empty() {
        return image;
    }

    let px = caption_px(image.width());
    let text_w = font.measure(text, px);
    let text_h = font.line_height(px);
    let pad_y = ((px * 0.4) as u32).max(6);
    let pad_x = ((px * 0.2) as u32).max(4);

    let mut out = blank(image.width(), image.height() + text_h + 2 * pad_y);
    imageops::replace(&mut out, &image, 0, 0);

    let text_x = pad_x.max(image.width().saturating_sub(text_w) / 2);
    let text_y = image.height() + pad_y;
    font.draw(&mut out, text_x as i64, text_y as i64, text, px);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_blank_caption_is_noop() {
        let img = GrayImage::from_pixel(100, 100, Luma([0]));
        let out = with_caption(img.clone(), "   ", &LabelFont::builtin());
        assert_eq!(out, img);
    }

    #[test]
    fn test_caption_extends_height() {
        let img = GrayImage::from_pixel(300, 300, Luma([255]));
        let font = LabelFont::builtin();
        let out = with_caption(img, "Digital Hospitals", &font);
        assert_eq!(out.width(), 300);
        // 24px text, pad max(6, 9) = 9 on both sides
        assert_eq!(out.height(), 300 + 24 + 18);
        assert!(out.pixels().skip(300 * 300).any(|p| p.0[0] == 0));
    }

    #[test]
    fn test_caption_px_floor() {
        assert_eq!(caption_px(50), 12.0);
        assert_eq!(caption_px(696), 55.0);
    }
}
