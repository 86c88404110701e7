//! # Label Rasterization
//!
//! Converts a composed grayscale label into the byte stream a Brother QL
//! printer prints.
//!
//! ## Image Preparation
//!
//! ```text
//!  composed label ─► auto-rotate ─► scale to printable width
//!        ─► pad into print head ─► mirror ─► dither ─► pack rows
//! ```
//!
//! The print head sees the tape from behind, so the image is mirrored
//! left-to-right. Padding places the image against the right offset:
//!
//! ```text
//!  x = head_width - image_width - right_offset
//!  ┌──────────────┬────────────────────────┬──────────┐
//!  │   white      │         image          │  offset  │
//!  └──────────────┴────────────────────────┴──────────┘
//! ```
//!
//! ## Compression
//!
//! Models that support it get each raster line TIFF PackBits encoded:
//!
//! | Header n | Meaning |
//! |----------|---------|
//! | 0..=127 | copy the next n + 1 bytes literally |
//! | -127..=-1 | repeat the next byte 1 - n times |

use image::GrayImage;
use image::imageops::{self, FilterType};

use super::commands::{self, ExpandedMode, MediaInfo};
use crate::error::LabelError;
use crate::printer::config::{ENDLESS_FEED_MARGIN, PrinterConfig, PrinterModel, TapeSpec};
use crate::render::dither::{self, DitheringAlgorithm};
use crate::render::font::blank;

/// Options that vary per job rather than per printer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    pub dithering: DitheringAlgorithm,
    /// Cut after each label on models with a cutter
    pub cut: bool,
    /// Use PackBits on models that support it
    pub compress: bool,
    /// Rotate wide, short images onto the tape
    pub auto_rotate: bool,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            dithering: DitheringAlgorithm::FloydSteinberg,
            cut: true,
            compress: true,
            auto_rotate: true,
        }
    }
}

/// A complete print job for one copy of one label.
#[derive(Debug, Clone)]
pub struct RasterJob {
    pub model: PrinterModel,
    pub tape: TapeSpec,
    /// Device the job is meant for, as configured
    pub device: String,
    pub instructions: Vec<u8>,
    /// Label length in raster lines
    pub raster_lines: u32,
}

/// Turns label images into raster jobs for one printer configuration.
#[derive(Debug, Clone, Default)]
pub struct Rasterizer {
    pub config: PrinterConfig,
    pub options: RasterOptions,
}

impl Rasterizer {
    pub fn new(config: PrinterConfig, options: RasterOptions) -> Self {
        Self { config, options }
    }

    /// Rotate, scale, pad and mirror `label` into a head-width grayscale image.
    pub fn prepare(&self, label: &GrayImage) -> GrayImage {
        let printable = self.config.printable_width();

        let rotated;
        let mut image = label;
        if self.options.auto_rotate && image.width() > printable && image.height() <= printable {
            tracing::debug!(
                width = image.width(),
                height = image.height(),
                "rotating label onto tape"
            );
            rotated = imageops::rotate270(image);
            image = &rotated;
        }

        let scaled;
        if image.width() != printable {
            let ratio = printable as f64 / image.width() as f64;
            let height = ((image.height() as f64 * ratio).round() as u32).max(1);
            scaled = imageops::resize(image, printable, height, FilterType::Lanczos3);
            image = &scaled;
        }

        let head = self.config.head_width();
        let x = head.saturating_sub(image.width() + self.config.right_offset());
        let mut padded = blank(head, image.height());
        imageops::replace(&mut padded, image, x as i64, 0);

        imageops::flip_horizontal(&padded)
    }

    /// Build the instruction stream for `label`, addressed to `device`.
    pub fn rasterize(&self, label: &GrayImage, device: &str) -> Result<RasterJob, LabelError> {
        if label.width() == 0 || label.height() == 0 {
            return Err(LabelError::Image("empty label image".to_string()));
        }

        let model = self.config.model;
        let tape = self.config.tape;
        let prepared = self.prepare(label);
        let bitmap = dither::to_bitmap(&prepared, self.options.dithering);
        let raster_lines = bitmap.height as u32;
        let compress = model.compression && self.options.compress;
        let cut = model.cutting && self.options.cut;

        let mut out = Vec::with_capacity(
            model.invalidate_bytes + bitmap.height * (model.bytes_per_row as usize + 3) + 64,
        );
        out.extend(commands::invalidate(model.invalidate_bytes));
        out.extend(commands::init());
        out.extend(commands::status_request());
        if model.mode_setting {
            out.extend(commands::switch_to_raster());
        }
        out.extend(commands::media_and_quality(
            MediaInfo::endless(tape.width_mm),
            raster_lines,
            true,
        ));
        if cut {
            out.extend(commands::autocut(true));
            out.extend(commands::cut_every(1));
        }
        if model.expanded_mode {
            out.extend(commands::expanded_mode(ExpandedMode {
                cut_at_end: cut,
                ..Default::default()
            }));
        }
        out.extend(commands::margins(ENDLESS_FEED_MARGIN));
        if compress {
            out.extend(commands::compression(true));
        }

        for y in 0..bitmap.height {
            let row = dither::pack_row(bitmap.row(y));
            if compress {
                out.extend(commands::raster_line(&packbits(&row)));
            } else {
                out.extend(commands::raster_line(&row));
            }
        }
        out.extend(commands::print(true));

        tracing::debug!(
            model = %model,
            tape = %tape,
            raster_lines,
            bytes = out.len(),
            compress,
            "raster job built"
        );

        Ok(RasterJob {
            model,
            tape,
            device: device.to_string(),
            instructions: out,
            raster_lines,
        })
    }
}

/// TIFF PackBits encoding of one raster line.
pub fn packbits(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / 128 + 1);
    let mut i = 0;

    while i < data.len() {
        let mut run = 1;
        while i + run < data.len() && run < 128 && data[i + run] == data[i] {
            run += 1;
        }

        if run >= 2 {
            out.push((1 - run as i16) as i8 as u8);
            out.push(data[i]);
            i += run;
            continue;
        }

        let start = i;
        i += 1;
        while i < data.len() && i - start < 128 {
            if i + 1 < data.len() && data[i] == data[i + 1] {
                break;
            }
            i += 1;
        }
        out.push((i - start - 1) as u8);
        out.extend(&data[start..i]);
    }

    out
}

// ============================================================================
// TESTS
// ============================================================================
