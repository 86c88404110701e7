//! # 1-Bit Conversion
//!
//! Label printers print black or nothing. Grayscale label canvases (anti-
//! aliased text, downscaled QR tiles) are reduced to 1 bit per dot here.
//!
//! ## Algorithms
//!
//! | Method | Use |
//! |--------|-----|
//! | Floyd–Steinberg | default; keeps downscaled edges smooth |
//! | Threshold | sharp cutoff at 70% darkness of white |
//!
//! ## Floyd–Steinberg
//!
//! Each pixel is snapped to black or white and the quantization error is
//! pushed to unvisited neighbours:
//!
//! ```text
//!            X    7/16
//!    3/16  5/16   1/16
//! ```
//!
//! ## Usage Example
//!
//! ```
//! use labelprint::render::dither;
//!
//! // Pack a row of boolean values into bytes
//! let row: Vec<bool> = vec![true, true, false, false, true, false, true, false];
//! let packed = dither::pack_row(&row);
//! assert_eq!(packed, vec![0b11001010]); // 0xCA
//! ```

use image::GrayImage;

/// Default threshold when dithering is off, as a fraction of white.
pub const DEFAULT_THRESHOLD: f32 = 0.7;

/// How grayscale is reduced to black/white dots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DitheringAlgorithm {
    FloydSteinberg,
    /// Pixels darker than `level * 255` print.
    Threshold(f32),
}

impl Default for DitheringAlgorithm {
    fn default() -> Self {
        Self::FloydSteinberg
    }
}

/// A 1-bit image, row-major, `true` = black dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: usize,
    pub height: usize,
    pub dots: Vec<bool>,
}

impl Bitmap {
    pub fn row(&self, y: usize) -> &[bool] {
        &self.dots[y * self.width..(y + 1) * self.width]
    }

    pub fn black_dots(&self) -> usize {
        self.dots.iter().filter(|&&d| d).count()
    }
}

/// Reduce a grayscale image to 1 bit per pixel.
pub fn to_bitmap(image: &GrayImage, algorithm: DitheringAlgorithm) -> Bitmap {
    let width = image.width() as usize;
    let height = image.height() as usize;

    let dots = match algorithm {
        DitheringAlgorithm::Threshold(level) => {
            let cutoff = (level.clamp(0.0, 1.0) * 255.0).round() as u8;
            image.pixels().map(|p| p.0[0] < cutoff).collect()
        }
        DitheringAlgorithm::FloydSteinberg => floyd_steinberg(image),
    };

    Bitmap {
        width,
        height,
        dots,
    }
}

fn floyd_steinberg(image: &GrayImage) -> Vec<bool> {
    let width = image.width() as usize;
    let height = image.height() as usize;
    let mut levels: Vec<f32> = image.pixels().map(|p| p.0[0] as f32).collect();
    let mut dots = vec![false; width * height];

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            let old = levels[idx];
            let black = old < 128.0;
            dots[idx] = black;
            let err = old - if black { 0.0 } else { 255.0 };

            if x + 1 < width {
                levels[idx + 1] += err * 7.0 / 16.0;
            }
            if y + 1 < height {
                let below = idx + width;
                if x > 0 {
                    levels[below - 1] += err * 3.0 / 16.0;
                }
                levels[below] += err * 5.0 / 16.0;
                if x + 1 < width {
                    levels[below + 1] += err * 1.0 / 16.0;
                }
            }
        }
    }

    dots
}

/// Pack a row of pixels into bytes, MSB = leftmost dot.
pub fn pack_row(pixels: &[bool]) -> Vec<u8> {
    let num_bytes = pixels.len().div_ceil(8);
    let mut bytes = vec![0u8; num_bytes];

    for (i, &pixel) in pixels.iter().enumerate() {
        if pixel {
            let byte_idx = i / 8;
            let bit_idx = 7 - (i % 8); // MSB first
            bytes[byte_idx] |= 1 << bit_idx;
        }
    }

    bytes
}

// ============================================================================
// TESTS
// ============================================================================
