//! # Printer Configuration
//!
//! Hardware specifications for Brother QL label printers and the endless
//! tapes they take.
//!
//! ## Supported Printers
//!
//! | Model | Head (dots) | Compression | Mode switch | Cutter |
//! |-------|-------------|-------------|-------------|--------|
//! | QL-500 | 720 | no | no | no |
//! | QL-550 / 560 / 570 | 720 | no | no | yes |
//! | QL-580N / 650TD | 720 | yes | yes | yes |
//! | QL-700 | 720 | no | no | yes |
//! | QL-710W / 720NW | 720 | yes | yes | yes |
//! | QL-800 | 720 | no | yes | yes |
//! | QL-810W / 820NWB | 720 | yes | yes | yes |
//! | QL-1050 / 1060N / 1100 | 1296 | yes | yes | yes |
//!
//! All models print at 300 DPI (~11.8 dots/mm).
//!
//! ## Endless Tapes
//!
//! ```text
//! ├─ left ─┼───── printable ─────┼─ offset_r ─┤
//! │ margin │   dots_printable    │  (right)   │
//! └────────┴─────────────────────┴────────────┘
//!           ◄──── print head (bytes_per_row × 8) ────►
//! ```
//!
//! ## Usage
//!
//! ```
//! use labelprint::printer::PrinterConfig;
//!
//! let config = PrinterConfig::parse("QL-700", "62").unwrap();
//! assert_eq!(config.printable_width(), 696);
//! assert_eq!(config.head_width(), 720);
//! ```

use std::fmt;

use crate::error::LabelError;

/// Resolution shared by every QL model.
pub const DPI: u16 = 300;

/// Feed margin for endless tape, in dots.
pub const ENDLESS_FEED_MARGIN: u16 = 35;

/// # Printer Model
///
/// Which optional protocol features a model understands, and how wide its
/// print head is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterModel {
    pub name: &'static str,

    /// Raster line length in bytes (90 normal, 162 wide)
    pub bytes_per_row: u16,

    /// Accepts TIFF PackBits raster lines
    pub compression: bool,

    /// Needs `ESC i a` to enter raster mode
    pub mode_setting: bool,

    /// Understands `ESC i K`
    pub expanded_mode: bool,

    /// Has an automatic cutter
    pub cutting: bool,

    /// Zero bytes sent to flush a half-received job
    pub invalidate_bytes: usize,

    /// Extra right offset on top of the tape offset, in dots
    pub additional_offset_r: u32,
}

impl PrinterModel {
    const BASE: Self = Self {
        name: "",
        bytes_per_row: 90,
        compression: true,
        mode_setting: true,
        expanded_mode: true,
        cutting: true,
        invalidate_bytes: 200,
        additional_offset_r: 0,
    };

    const WIDE: Self = Self {
        bytes_per_row: 162,
        additional_offset_r: 44,
        ..Self::BASE
    };

    pub const QL_500: Self = Self {
        name: "QL-500",
        compression: false,
        mode_setting: false,
        expanded_mode: false,
        cutting: false,
        ..Self::BASE
    };
    pub const QL_550: Self = Self {
        name: "QL-550",
        compression: false,
        mode_setting: false,
        ..Self::BASE
    };
    pub const QL_560: Self = Self {
        name: "QL-560",
        compression: false,
        mode_setting: false,
        ..Self::BASE
    };
    pub const QL_570: Self = Self {
        name: "QL-570",
        compression: false,
        mode_setting: false,
        ..Self::BASE
    };
    pub const QL_580N: Self = Self {
        name: "QL-580N",
        ..Self::BASE
    };
    pub const QL_650TD: Self = Self {
        name: "QL-650TD",
        ..Self::BASE
    };
    pub const QL_700: Self = Self {
        name: "QL-700",
        compression: false,
        mode_setting: false,
        ..Self::BASE
    };
    pub const QL_710W: Self = Self {
        name: "QL-710W",
        ..Self::BASE
    };
    pub const QL_720NW: Self = Self {
        name: "QL-720NW",
        ..Self::BASE
    };
    pub const QL_800: Self = Self {
        name: "QL-800",
        compression: false,
        invalidate_bytes: 400,
        ..Self::BASE
    };
    pub const QL_810W: Self = Self {
        name: "QL-810W",
        invalidate_bytes: 400,
        ..Self::BASE
    };
    pub const QL_820NWB: Self = Self {
        name: "QL-820NWB",
        invalidate_bytes: 400,
        ..Self::BASE
    };
    pub const QL_1050: Self = Self {
        name: "QL-1050",
        ..Self::WIDE
    };
    pub const QL_1060N: Self = Self {
        name: "QL-1060N",
        ..Self::WIDE
    };
    pub const QL_1100: Self = Self {
        name: "QL-1100",
        ..Self::WIDE
    };

    /// Every known model.
    pub const ALL: &'static [Self] = &[
        Self::QL_500,
        Self::QL_550,
        Self::QL_560,
        Self::QL_570,
        Self::QL_580N,
        Self::QL_650TD,
        Self::QL_700,
        Self::QL_710W,
        Self::QL_720NW,
        Self::QL_800,
        Self::QL_810W,
        Self::QL_820NWB,
        Self::QL_1050,
        Self::QL_1060N,
        Self::QL_1100,
    ];

    /// Print head width in dots.
    #[inline]
    pub fn head_width(&self) -> u32 {
        self.bytes_per_row as u32 * 8
    }

    #[inline]
    pub fn is_wide(&self) -> bool {
        self.bytes_per_row > Self::BASE.bytes_per_row
    }

    /// Look a model up by name, case-insensitive (`QL-700`, `ql700`).
    pub fn parse(name: &str) -> Result<Self, LabelError> {
        let wanted = normalize(name);
        Self::ALL
            .iter()
            .find(|m| normalize(m.name) == wanted)
            .copied()
            .ok_or_else(|| LabelError::Config(format!("unknown printer model '{}'", name)))
    }
}

impl fmt::Display for PrinterModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// # Tape Specification
///
/// Endless (continuous) DK tape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapeSpec {
    /// Identifier used on the command line (`"62"`)
    pub name: &'static str,
    pub width_mm: u8,
    pub dots_total: u32,
    pub dots_printable: u32,
    /// Right offset inside the print head, in dots
    pub offset_r: u32,
    /// Only fits wide (1296-dot) printers
    pub wide_only: bool,
}

impl TapeSpec {
    const fn endless(name: &'static str, width_mm: u8, total: u32, printable: u32, offset_r: u32) -> Self {
        Self {
            name,
            width_mm,
            dots_total: total,
            dots_printable: printable,
            offset_r,
            wide_only: false,
        }
    }

    pub const W12: Self = Self::endless("12", 12, 142, 106, 29);
    pub const W29: Self = Self::endless("29", 29, 342, 306, 6);
    pub const W38: Self = Self::endless("38", 38, 449, 413, 12);
    pub const W50: Self = Self::endless("50", 50, 590, 554, 12);
    pub const W54: Self = Self::endless("54", 54, 636, 590, 0);
    pub const W62: Self = Self::endless("62", 62, 732, 696, 12);
    pub const W102: Self = Self {
        wide_only: true,
        ..Self::endless("102", 102, 1200, 1164, 12)
    };

    pub const ALL: &'static [Self] = &[
        Self::W12,
        Self::W29,
        Self::W38,
        Self::W50,
        Self::W54,
        Self::W62,
        Self::W102,
    ];

    /// Accepts `62`, `62mm` or `DK-62`.
    pub fn parse(name: &str) -> Result<Self, LabelError> {
        let digits: String = name.chars().filter(|c| c.is_ascii_digit()).collect();
        Self::ALL
            .iter()
            .find(|t| t.name == digits)
            .copied()
            .ok_or_else(|| LabelError::Config(format!("unknown endless tape '{}'", name)))
    }
}

impl fmt::Display for TapeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}mm endless", self.width_mm)
    }
}

/// A printer model paired with the tape loaded in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterConfig {
    pub model: PrinterModel,
    pub tape: TapeSpec,
}

impl PrinterConfig {
    pub fn new(model: PrinterModel, tape: TapeSpec) -> Result<Self, LabelError> {
        if tape.wide_only && !model.is_wide() {
            return Err(LabelError::Config(format!(
                "{} tape needs a wide printer, {} has a {} dot head",
                tape,
                model,
                model.head_width()
            )));
        }
        Ok(Self { model, tape })
    }

    pub fn parse(model: &str, tape: &str) -> Result<Self, LabelError> {
        Self::new(PrinterModel::parse(model)?, TapeSpec::parse(tape)?)
    }

    /// Width the label image is scaled to.
    #[inline]
    pub fn printable_width(&self) -> u32 {
        self.tape.dots_printable
    }

    #[inline]
    pub fn head_width(&self) -> u32 {
        self.model.head_width()
    }

    /// Dots of white between the image and the right edge of the head.
    #[inline]
    pub fn right_offset(&self) -> u32 {
        self.tape.offset_r + self.model.additional_offset_r
    }

    /// Dots per millimeter at 300 DPI.
    #[inline]
    pub fn dots_per_mm(&self) -> f32 {
        DPI as f32 / 25.4
    }
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            model: PrinterModel::QL_700,
            tape: TapeSpec::W62,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
