//! # Pipeline Configuration
//!
//! Everything a [`LabelPipeline`](crate::pipeline::LabelPipeline) needs,
//! gathered in one value built once at startup.
//!
//! ## Work Directory
//!
//! ```text
//! <work_dir>/
//! ├── fonts/DejaVuSans-Bold.ttf     default label font
//! ├── output/label.png              last composed label, replaced per request
//! └── requests/<uuid>/              per-request intermediates (optional)
//! ```
//!
//! ## Usage
//!
//! ```
//! use labelprint::config::PipelineConfig;
//! use labelprint::printer::PrinterConfig;
//!
//! let config = PipelineConfig::for_printer(PrinterConfig::parse("QL-700", "29").unwrap());
//! assert_eq!(config.compositor.tape_max_width, 306);
//! assert!(config.output_path().ends_with("output/label.png"));
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::encode::chunked::DEFAULT_SPLIT_THRESHOLD;
use crate::encode::{BarcodeEncoder, QrSettings};
use crate::printer::PrinterConfig;
use crate::printer::dispatch::DEFAULT_PACING;
use crate::protocol::RasterOptions;
use crate::render::compose::CompositorSettings;

/// Font file looked up under `<work_dir>/fonts/` when none is configured.
pub const DEFAULT_FONT_FILE: &str = "DejaVuSans-Bold.ttf";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub work_dir: PathBuf,
    /// Explicit font file; `None` uses the work directory default
    pub font_path: Option<PathBuf>,
    /// Caption drawn under every QR bitmap
    pub qr_caption: Option<String>,
    pub compositor: CompositorSettings,
    pub barcode: BarcodeEncoder,
    pub qr: QrSettings,
    /// Maximum characters per chunked QR tile
    pub split_threshold: usize,
    pub printer: PrinterConfig,
    pub raster: RasterOptions,
    pub pacing: Duration,
    /// Keep per-item bitmaps under `requests/<uuid>/`
    pub save_intermediates: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::for_printer(PrinterConfig::default())
    }
}

impl PipelineConfig {
    /// Defaults with layout widths matched to the printer's tape.
    pub fn for_printer(printer: PrinterConfig) -> Self {
        let width = printer.printable_width();
        Self {
            work_dir: PathBuf::from("."),
            font_path: None,
            qr_caption: None,
            compositor: CompositorSettings::for_tape(width),
            barcode: BarcodeEncoder::default(),
            qr: QrSettings {
                target_px: width,
                ..QrSettings::default()
            },
            split_threshold: DEFAULT_SPLIT_THRESHOLD,
            printer,
            raster: RasterOptions::default(),
            pacing: DEFAULT_PACING,
            save_intermediates: false,
        }
    }

    pub fn font_path(&self) -> PathBuf {
        self.font_path
            .clone()
            .unwrap_or_else(|| self.work_dir.join("fonts").join(DEFAULT_FONT_FILE))
    }

    pub fn output_dir(&self) -> PathBuf {
        self.work_dir.join("output")
    }

    /// Well-known location of the last composed label.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir().join("label.png")
    }

    pub fn requests_dir(&self) -> PathBuf {
        self.work_dir.join("requests")
    }

    /// Caption text, if one is set and not blank.
    pub fn caption(&self) -> Option<&str> {
        self.qr_caption
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_62mm_tape() {
        let config = PipelineConfig::default();
        assert_eq!(config.compositor.tape_max_width, 696);
        assert_eq!(config.compositor.min_width, 500);
        assert_eq!(config.qr.target_px, 696);
        assert_eq!(config.split_threshold, 1200);
        assert_eq!(config.pacing, Duration::from_millis(400));
    }

    #[test]
    fn test_narrow_tape_lowers_min_width() {
        let config = PipelineConfig::for_printer(PrinterConfig::parse("QL-700", "12").unwrap());
        assert_eq!(config.compositor.tape_max_width, 106);
        assert_eq!(config.compositor.min_width, 106);
    }

    #[test]
    fn test_paths() {
        let config = PipelineConfig {
            work_dir: PathBuf::from("/srv/labels"),
            ..Default::default()
        };
        assert_eq!(
            config.font_path(),
            PathBuf::from("/srv/labels/fonts/DejaVuSans-Bold.ttf")
        );
        assert_eq!(config.output_path(), PathBuf::from("/srv/labels/output/label.png"));
        assert_eq!(config.requests_dir(), PathBuf::from("/srv/labels/requests"));
    }

    #[test]
    fn test_blank_caption_is_none() {
        let mut config = PipelineConfig::default();
        assert_eq!(config.caption(), None);
        config.qr_caption = Some("  ".to_string());
        assert_eq!(config.caption(), None);
        config.qr_caption = Some(" Ward 4 ".to_string());
        assert_eq!(config.caption(), Some("Ward 4"));
    }
}
