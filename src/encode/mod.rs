//! # Symbol Encoders
//!
//! Turn label item values into grayscale bitmaps.
//!
//! | Encoder | Input | Output |
//! |---------|-------|--------|
//! | [`barcode::BarcodeEncoder`] | identifier | Code 128 bars + human-readable text |
//! | [`qr::QrEncoder`] | short payload | one QR symbol, EC level H |
//! | [`chunked::ChunkedQrEncoder`] | structured document | zlib + base64, 1..n stacked QR tiles |
//! | [`gs1::Gs1CodeBuilder`] | product code, lot, expiry | GS1-128 element string |
//!
//! All encoders are deterministic: the same input always yields the same
//! pixels. Failures are [`EncodeError`]s; the pipeline attaches item context
//! and skips the item.

pub mod barcode;
pub mod chunked;
pub mod gs1;
pub mod qr;

pub use barcode::BarcodeEncoder;
pub use chunked::ChunkedQrEncoder;
pub use gs1::Gs1CodeBuilder;
pub use qr::{QrEncoder, QrSettings, QrVersion};

use thiserror::Error;

/// Why a value could not be encoded.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The symbology rejects the input
    #[error("{0}")]
    Symbology(String),

    /// Payload does not fit the symbol
    #[error("payload of {len} bytes exceeds QR capacity ({detail})")]
    Capacity { len: usize, detail: String },

    /// Serialization or compression of a document failed
    #[error("payload preparation failed: {0}")]
    Payload(String),
}
