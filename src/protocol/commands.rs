//! # Brother QL Raster Commands
//!
//! Byte builders for the raster command set spoken by Brother QL label
//! printers.
//!
//! ## Escape Sequence Structure
//!
//! Most commands are `ESC i <letter> <params...>`. Raster data lines and the
//! final print command are single-letter or single-byte commands.
//!
//! ## Byte Order
//!
//! Multi-byte integers are **little-endian**:
//! - `u16` 35 is sent as `[0x23, 0x00]`
//! - `u32` raster line counts as four bytes, low first
//!
//! ## Job Layout
//!
//! ```text
//! 00 × N           invalidate
//! 1B 40            initialize
//! 1B 69 53         status request
//! 1B 69 61 01      switch to raster mode      (models with mode setting)
//! 1B 69 7A ...     media & quality
//! 1B 69 4D 40      auto cut on                (models with cutter)
//! 1B 69 41 01      cut every label            (models with cutter)
//! 1B 69 4B 08      expanded mode: cut at end
//! 1B 69 64 23 00   margins: 35 dots
//! 4D 02            PackBits compression       (models with compression)
//! 67 00 nn ...     raster line × height
//! 1A               print with feed
//! ```

/// ESC (Escape) - Command prefix byte
pub const ESC: u8 = 0x1B;

/// Media type byte for endless (continuous) tape.
pub const MEDIA_ENDLESS: u8 = 0x0A;

// ============================================================================
// SESSION COMMANDS
// ============================================================================

/// # Invalidate (NUL × n)
///
/// Zero bytes that flush any half-received command out of the printer's
/// parser. 200 bytes for most models, 400 for the QL-800 family.
#[inline]
pub fn invalidate(n: usize) -> Vec<u8> {
    vec![0x00; n]
}

/// # Initialize (ESC @)
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC @ |
/// | Hex     | 1B 40 |
///
/// ## Example
///
/// ```
/// use labelprint::protocol::commands;
///
/// assert_eq!(commands::init(), vec![0x1B, 0x40]);
/// ```
#[inline]
pub fn init() -> Vec<u8> {
    vec![ESC, b'@']
}

/// # Status Information Request (ESC i S)
///
/// Asks the printer to send its 32-byte status block. The reply is not
/// read back over write-only transports.
#[inline]
pub fn status_request() -> Vec<u8> {
    vec![ESC, b'i', b'S']
}

/// # Switch to Raster Mode (ESC i a 01)
///
/// Only sent to models with dynamic command mode switching.
#[inline]
pub fn switch_to_raster() -> Vec<u8> {
    vec![ESC, b'i', b'a', 0x01]
}

// ============================================================================
// MEDIA & CUTTING
// ============================================================================

/// Parameters of the `ESC i z` media command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaInfo {
    pub media_type: u8,
    pub width_mm: u8,
    /// 0 for endless tape
    pub length_mm: u8,
    /// Prefer print quality over speed
    pub high_quality: bool,
}

impl MediaInfo {
    pub fn endless(width_mm: u8) -> Self {
        Self {
            media_type: MEDIA_ENDLESS,
            width_mm,
            length_mm: 0,
            high_quality: true,
        }
    }
}

/// # Print Information (ESC i z)
///
/// | Byte | Meaning |
/// |------|---------|
/// | n1 | validity flags: 0x80, type 0x02, width 0x04, length 0x08, quality 0x40 |
/// | n2 | media type |
/// | n3 | media width (mm) |
/// | n4 | media length (mm) |
/// | n5..n8 | raster line count, u32 LE |
/// | n9 | 0 on the first page, 1 otherwise |
/// | n10 | always 0 |
///
/// ## Example
///
/// ```
/// use labelprint::protocol::commands::{self, MediaInfo};
///
/// let cmd = commands::media_and_quality(MediaInfo::endless(62), 300, true);
/// assert_eq!(cmd, vec![0x1B, 0x69, 0x7A, 0xCE, 0x0A, 62, 0, 0x2C, 0x01, 0, 0, 0, 0]);
/// ```
pub fn media_and_quality(media: MediaInfo, raster_lines: u32, first_page: bool) -> Vec<u8> {
    let mut flags = 0x80 | 0x02 | 0x04 | 0x08;
    if media.high_quality {
        flags |= 0x40;
    }
    let mut cmd = vec![
        ESC,
        b'i',
        b'z',
        flags,
        media.media_type,
        media.width_mm,
        media.length_mm,
    ];
    cmd.extend(raster_lines.to_le_bytes());
    cmd.push(if first_page { 0 } else { 1 });
    cmd.push(0);
    cmd
}

/// # Various Mode (ESC i M)
///
/// Bit 6 enables the automatic cutter.
#[inline]
pub fn autocut(enabled: bool) -> Vec<u8> {
    vec![ESC, b'i', b'M', if enabled { 0x40 } else { 0x00 }]
}

/// # Cut Every (ESC i A n)
///
/// Cut after every `n` labels (1..=255).
#[inline]
pub fn cut_every(n: u8) -> Vec<u8> {
    vec![ESC, b'i', b'A', n.max(1)]
}

/// Flags of the `ESC i K` expanded mode command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpandedMode {
    pub two_color: bool,
    pub cut_at_end: bool,
    pub high_resolution: bool,
}

impl ExpandedMode {
    fn bits(&self) -> u8 {
        let mut bits = 0;
        if self.two_color {
            bits |= 0x01;
        }
        if self.cut_at_end {
            bits |= 0x08;
        }
        if self.high_resolution {
            bits |= 0x40;
        }
        bits
    }
}

/// # Expanded Mode (ESC i K)
#[inline]
pub fn expanded_mode(mode: ExpandedMode) -> Vec<u8> {
    vec![ESC, b'i', b'K', mode.bits()]
}

/// # Margin Amount (ESC i d)
///
/// Feed margin in dots, u16 LE. 35 for endless tape.
#[inline]
pub fn margins(dots: u16) -> Vec<u8> {
    let [lo, hi] = dots.to_le_bytes();
    vec![ESC, b'i', b'd', lo, hi]
}

// ============================================================================
// RASTER DATA
// ============================================================================

/// # Compression Mode (M n)
///
/// `0x02` selects TIFF PackBits for the raster lines that follow.
#[inline]
pub fn compression(enabled: bool) -> Vec<u8> {
    vec![b'M', if enabled { 0x02 } else { 0x00 }]
}

/// # Raster Graphics Transfer (g 00 n d1...dn)
///
/// One line of dots, already packed (and compressed when enabled).
///
/// ## Example
///
/// ```
/// use labelprint::protocol::commands;
///
/// let line = commands::raster_line(&[0xFF; 90]);
/// assert_eq!(&line[..3], &[0x67, 0x00, 90]);
/// assert_eq!(line.len(), 3 + 90);
/// ```
#[inline]
pub fn raster_line(row: &[u8]) -> Vec<u8> {
    let mut cmd = Vec::with_capacity(row.len() + 3);
    cmd.extend([b'g', 0x00, row.len().min(u8::MAX as usize) as u8]);
    cmd.extend(row);
    cmd
}

/// # Print (FF / Control-Z)
///
/// `0x1A` prints the last page and feeds; `0x0C` prints an intermediate
/// page of a multi-page job.
#[inline]
pub fn print(last_page: bool) -> Vec<u8> {
    vec![if last_page { 0x1A } else { 0x0C }]
}

// ============================================================================
// TESTS
// ============================================================================
