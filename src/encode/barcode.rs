//! Code 128 barcodes with human-readable text.
//!
//! Uses the barcoders crate for symbol encoding. Code 128 needs a character
//! set prefix:
//! - Character Set B (Ɓ): printable ASCII, used for general identifiers
//! - Character Set C (Ć): digit pairs only, half the width for numeric codes
//!   such as GS1 element strings

use barcoders::sym::code128::Code128;
use image::GrayImage;

use super::EncodeError;
use crate::render::font::{LabelFont, blank};

const CHARSET_B: char = '\u{0181}';
const CHARSET_C: char = '\u{0106}';

/// Renders Code 128 symbols.
#[derive(Debug, Clone)]
pub struct BarcodeEncoder {
    /// Width of one module in pixels
    pub module_px: u32,
    /// Bar height in pixels
    pub bar_height: u32,
    /// Quiet zone on each side, in modules
    pub quiet_zone: u32,
    /// Human-readable text size in pixels
    pub text_px: f32,
    /// Gap between bars and text
    pub text_gap: u32,
}

impl Default for BarcodeEncoder {
    fn default() -> Self {
        Self {
            module_px: 2,
            bar_height: 100,
            quiet_zone: 10,
            text_px: 24.0,
            text_gap: 4,
        }
    }
}

/// Pick the densest character set that can carry `data`.
fn prefixed(data: &str) -> Result<String, EncodeError> {
    if data.is_empty() {
        return Err(EncodeError::Symbology("empty barcode value".to_string()));
    }
    if data.len() % 2 == 0 && data.chars().all(|c| c.is_ascii_digit()) {
        return Ok(format!("{}{}", CHARSET_C, data));
    }
    if let Some(bad) = data.chars().find(|c| !(' '..='~').contains(c)) {
        return Err(EncodeError::Symbology(format!(
            "character {:?} is not encodable in Code 128",
            bad
        )));
    }
    Ok(format!("{}{}", CHARSET_B, data))
}

impl BarcodeEncoder {
    /// Encode to modules: `true` = bar.
    pub fn modules(&self, data: &str) -> Result<Vec<bool>, EncodeError> {
        let barcode = Code128::new(&prefixed(data)?)
            .map_err(|e| EncodeError::Symbology(format!("Code 128 rejected {:?}: {:?}", data, e)))?;
        Ok(barcode.encode().into_iter().map(|m| m == 1).collect())
    }

    /// Render the symbol with `data` printed centered underneath.
    pub fn encode(&self, data: &str, font: &LabelFont) -> Result<GrayImage, EncodeError> {
        let modules = self.modules(data)?;
        let module_px = self.module_px.max(1);

        let bars_width = (modules.len() as u32 + 2 * self.quiet_zone) * module_px;
        let text_width = font.measure(data, self.text_px);
        let width = bars_width.max(text_width + 2 * module_px * self.quiet_zone);
        let text_height = font.line_height(self.text_px);
        let height = self.bar_height + self.text_gap + text_height + self.text_gap;

        let mut img = blank(width, height);
        let bars_x = (width - modules.len() as u32 * module_px) / 2;

        for (i, &bar) in modules.iter().enumerate() {
            if !bar {
                continue;
            }
            let x0 = bars_x + i as u32 * module_px;
            for x in x0..x0 + module_px {
                for y in 0..self.bar_height {
                    img.put_pixel(x, y, image::Luma([0]));
                }
            }
        }

        let text_x = (width.saturating_sub(text_width) / 2) as i64;
        let text_y = (self.bar_height + self.text_gap) as i64;
        font.draw(&mut img, text_x, text_y, data, self.text_px);

        Ok(img)
    }
}
