//! # Error Types
//!
//! This module defines error types used throughout the labelprint library.
//!
//! Only [`LabelError::InvalidPayload`] is fatal for a request. Encode errors
//! skip the offending item, device errors are reported per copy.

use thiserror::Error;

use crate::request::LabelKind;

/// Main error type for labelprint operations
#[derive(Debug, Error)]
pub enum LabelError {
    /// The request document is not JSON or lacks a usable item list
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// A single item could not be turned into a symbol
    #[error("Failed to encode {kind} item '{key}': {reason}")]
    Encode {
        kind: LabelKind,
        key: String,
        reason: String,
    },

    /// Nothing to draw, or the canvas could not be produced
    #[error("Composition error: {0}")]
    Composition(String),

    /// Device absent, permission or transport failure
    #[error("Device error on {device}: {reason}")]
    Device { device: String, reason: String },

    /// Unknown printer model, tape or malformed device address
    #[error("Configuration error: {0}")]
    Config(String),

    /// Image processing error
    #[error("Image error: {0}")]
    Image(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LabelError {
    pub(crate) fn device(device: impl Into<String>, reason: impl ToString) -> Self {
        Self::Device {
            device: device.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the whole request must be rejected.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidPayload(_))
    }
}

impl From<image::ImageError> for LabelError {
    fn from(e: image::ImageError) -> Self {
        Self::Image(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_error_carries_item_context() {
        let err = LabelError::Encode {
            kind: LabelKind::Barcode,
            key: "sku".to_string(),
            reason: "unsupported character 'é'".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("barcode"));
        assert!(msg.contains("'sku'"));
        assert!(msg.contains("unsupported character"));
    }

    #[test]
    fn test_only_invalid_payload_is_fatal() {
        assert!(LabelError::InvalidPayload("not json".into()).is_fatal());
        assert!(!LabelError::Composition("empty".into()).is_fatal());
        assert!(!LabelError::device("usb://0x04f9:0x2042", "absent").is_fatal());
    }
}
