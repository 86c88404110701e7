//! QR code generation for label images.
//!
//! Every symbol uses error correction level H so a label survives scuffs.
//! Module size is an integer number of pixels derived from a target width,
//! so the same payload always produces the same pixels.

use image::{GrayImage, Luma};
use qrcode::{Color, EcLevel, QrCode, Version};

use super::EncodeError;
use crate::render::font::blank;

/// Highest QR version.
const MAX_VERSION: i16 = 40;

/// Symbol version policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QrVersion {
    /// Exactly this version; payloads that do not fit are rejected.
    Fixed(i16),
    /// Smallest version that fits, but never below this one.
    AtLeast(i16),
}

/// Geometry and version settings for QR symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrSettings {
    pub version: QrVersion,
    /// Quiet zone in modules
    pub border: u32,
    /// Width the symbol should approach, in pixels
    pub target_px: u32,
}

impl Default for QrSettings {
    fn default() -> Self {
        Self {
            version: QrVersion::AtLeast(3),
            border: 4,
            target_px: 696,
        }
    }
}

/// Renders single QR symbols.
#[derive(Debug, Clone, Default)]
pub struct QrEncoder {
    pub settings: QrSettings,
}

fn map_qr_error(data: &[u8], e: qrcode::types::QrError) -> EncodeError {
    match e {
        qrcode::types::QrError::DataTooLong => EncodeError::Capacity {
            len: data.len(),
            detail: "error correction H".to_string(),
        },
        other => EncodeError::Symbology(format!("QR encoding failed: {}", other)),
    }
}

impl QrEncoder {
    pub fn new(settings: QrSettings) -> Self {
        Self { settings }
    }

    /// Build the symbol matrix for `data`.
    pub fn symbol(&self, data: &str) -> Result<QrCode, EncodeError> {
        let bytes = data.as_bytes();
        match self.settings.version {
            QrVersion::Fixed(v) => {
                if !(1..=MAX_VERSION).contains(&v) {
                    return Err(EncodeError::Symbology(format!("invalid QR version {}", v)));
                }
                QrCode::with_version(bytes, Version::Normal(v), EcLevel::H)
                    .map_err(|e| map_qr_error(bytes, e))
            }
            QrVersion::AtLeast(min) => {
                let code = QrCode::with_error_correction_level(bytes, EcLevel::H)
                    .map_err(|e| map_qr_error(bytes, e))?;
                match code.version() {
                    Version::Normal(v) if v < min && min <= MAX_VERSION => {
                        QrCode::with_version(bytes, Version::Normal(min), EcLevel::H)
                            .map_err(|e| map_qr_error(bytes, e))
                    }
                    _ => Ok(code),
                }
            }
        }
    }

    /// Render `data` as black modules on white.
    pub fn encode(&self, data: &str) -> Result<GrayImage, EncodeError> {
        let code = self.symbol(data)?;
        Ok(self.render(&code))
    }

    fn render(&self, code: &QrCode) -> GrayImage {
        let modules = code.width() as u32;
        let total = modules + 2 * self.settings.border;
        let scale = (self.settings.target_px / total).max(1);
        let size = total * scale;
        let offset = self.settings.border * scale;

        let mut img = blank(size, size);
        for (i, color) in code.to_colors().iter().enumerate() {
            if *color != Color::Dark {
                continue;
            }
            let x = (i as u32) % modules;
            let y = (i as u32) / modules;
            for dy in 0..scale {
                for dx in 0..scale {
                    img.put_pixel(offset + x * scale + dx, offset + y * scale + dy, Luma([0u8]));
                }
            }
        }
        img
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimum_version_is_honored() {
        let enc = QrEncoder::default();
        let code = enc.symbol("ABC123").unwrap();
        assert_eq!(code.version(), Version::Normal(3));
    }

    #[test]
    fn test_grows_past_minimum_when_needed() {
        let enc = QrEncoder::default();
        let code = enc.symbol(&"x".repeat(300)).unwrap();
        match code.version() {
            Version::Normal(v) => assert!(v > 3),
            other => panic!("unexpected version {:?}", other),
        }
    }

    #[test]
    fn test_fixed_version_rejects_overflow() {
        let enc = QrEncoder::new(QrSettings {
            version: QrVersion::Fixed(3),
            ..Default::default()
        });
        // Version 3-H holds 24 bytes
        assert!(enc.encode("short").is_ok());
        let err = enc.encode(&"y".repeat(100)).unwrap_err();
        assert!(matches!(err, EncodeError::Capacity { len: 100, .. }));
    }

    #[test]
    fn test_capacity_ceiling() {
        let enc = QrEncoder::default();
        let err = enc.encode(&"z".repeat(5000)).unwrap_err();
        assert!(matches!(err, EncodeError::Capacity { .. }));
    }

    #[test]
    fn test_render_geometry() {
        let enc = QrEncoder::default();
        let img = enc.encode("ABC123").unwrap();
        // Version 3 = 29 modules + 8 border = 37; 696 / 37 = 18 px per module
        assert_eq!(img.width(), 37 * 18);
        assert_eq!(img.width(), img.height());
        // Quiet zone is white, finder pattern corner is black
        assert_eq!(img.get_pixel(0, 0).0[0], 255);
        assert_eq!(img.get_pixel(4 * 18, 4 * 18).0[0], 0);
    }

    #[test]
    fn test_deterministic() {
        let enc = QrEncoder::default();
        assert_eq!(enc.encode("ABC123").unwrap(), enc.encode("ABC123").unwrap());
    }
}
