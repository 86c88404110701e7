//! # Chunked QR Codes
//!
//! Structured documents are too large for one QR symbol. They are packed and
//! split across several symbols ("tiles") stacked top to bottom:
//!
//! ```text
//! document ──► canonical JSON ──► zlib ──► base64 ──► chunks of ≤ T chars
//!                                                          │
//!                 ┌─────────────┬─────────────┬────────────┘
//!                 ▼             ▼             ▼
//!              tile 0        tile 1   ...  tile n-1     (n = ceil(L / T))
//!                 └─────────────┴──── stacked vertically ─► one bitmap
//! ```
//!
//! A reader scans the tiles in order, concatenates the decoded text and
//! reverses base64, zlib and JSON to get the document back
//! ([`reassemble`]).
//!
//! ## Stitching
//!
//! Tiles are accumulated into one growing composite. The composite height is
//! the sum of every tile height; no tile is ever dropped.

use std::io::{Read, Write};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use image::GrayImage;
use image::imageops;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::EncodeError;
use super::qr::{QrEncoder, QrSettings, QrVersion};
use crate::render::font::blank;

/// Default maximum characters per tile.
pub const DEFAULT_SPLIT_THRESHOLD: usize = 1200;

/// Encodes documents into one or more stacked QR tiles.
#[derive(Debug, Clone)]
pub struct ChunkedQrEncoder {
    pub split_threshold: usize,
    pub qr: QrEncoder,
}

impl Default for ChunkedQrEncoder {
    fn default() -> Self {
        Self {
            split_threshold: DEFAULT_SPLIT_THRESHOLD,
            qr: QrEncoder::new(QrSettings {
                version: QrVersion::AtLeast(3),
                ..Default::default()
            }),
        }
    }
}

/// Canonical JSON, zlib, base64.
pub fn pack<T: Serialize + ?Sized>(document: &T) -> Result<String, EncodeError> {
    // serde_json::Value maps keep keys sorted, giving a canonical text
    let value = serde_json::to_value(document).map_err(|e| EncodeError::Payload(e.to_string()))?;
    let text = serde_json::to_string(&value).map_err(|e| EncodeError::Payload(e.to_string()))?;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(text.as_bytes())
        .map_err(|e| EncodeError::Payload(format!("compression failed: {}", e)))?;
    let compressed = encoder
        .finish()
        .map_err(|e| EncodeError::Payload(format!("compression failed: {}", e)))?;

    Ok(STANDARD.encode(compressed))
}

/// Split `encoded` into consecutive chunks of at most `threshold` chars.
///
/// Base64 is ASCII, so byte offsets are character offsets.
pub fn split(encoded: &str, threshold: usize) -> Vec<&str> {
    let threshold = threshold.max(1);
    if encoded.len() <= threshold {
        return vec![encoded];
    }
    encoded
        .as_bytes()
        .chunks(threshold)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .collect()
}

/// Reverse of [`pack`] over the ordered chunk texts read from the tiles.
pub fn reassemble<T, S>(chunks: &[S]) -> Result<T, EncodeError>
where
    T: DeserializeOwned,
    S: AsRef<str>,
{
    let encoded: String = chunks.iter().map(|c| c.as_ref()).collect();
    let compressed = STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| EncodeError::Payload(format!("base64: {}", e)))?;

    let mut text = String::new();
    ZlibDecoder::new(compressed.as_slice())
        .read_to_string(&mut text)
        .map_err(|e| EncodeError::Payload(format!("zlib: {}", e)))?;

    serde_json::from_str(&text).map_err(|e| EncodeError::Payload(format!("json: {}", e)))
}

/// Stack tiles vertically, each centered on the widest tile.
pub fn stitch(tiles: &[GrayImage]) -> GrayImage {
    let width = tiles.iter().map(|t| t.width()).max().unwrap_or(1);
    let height: u32 = tiles.iter().map(|t| t.height()).sum();

    let mut composite = blank(width, height);
    let mut y = 0i64;
    for tile in tiles {
        let x = ((width - tile.width()) / 2) as i64;
        imageops::replace(&mut composite, tile, x, y);
        y += tile.height() as i64;
    }
    composite
}

/// Result of chunked encoding, kept for inspection and tests.
#[derive(Debug, Clone)]
pub struct ChunkedSymbol {
    pub chunks: Vec<String>,
    pub tiles: Vec<GrayImage>,
    pub image: GrayImage,
}

impl ChunkedQrEncoder {
    pub fn new(split_threshold: usize, qr: QrEncoder) -> Self {
        Self {
            split_threshold,
            qr,
        }
    }

    /// Pack, split and render every tile.
    pub fn encode_symbol<T: Serialize + ?Sized>(
        &self,
        document: &T,
    ) -> Result<ChunkedSymbol, EncodeError> {
        let encoded = pack(document)?;
        let chunks: Vec<String> = split(&encoded, self.split_threshold)
            .into_iter()
            .map(str::to_string)
            .collect();

        tracing::debug!(
            encoded_len = encoded.len(),
            threshold = self.split_threshold,
            tiles = chunks.len(),
            "chunked QR payload"
        );

        let tiles = chunks
            .iter()
            .map(|chunk| self.qr.encode(chunk))
            .collect::<Result<Vec<_>, _>>()?;
        let image = stitch(&tiles);

        Ok(ChunkedSymbol {
            chunks,
            tiles,
            image,
        })
    }

    /// Stacked tile image for `document`.
    pub fn encode<T: Serialize + ?Sized>(&self, document: &T) -> Result<GrayImage, EncodeError> {
        Ok(self.encode_symbol(document)?.image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_pack_round_trip() {
        let doc = json!({"asset": "pump-7", "submodels": [1, 2, 3], "ok": true});
        let packed = pack(&doc).unwrap();
        let back: serde_json::Value = reassemble(&[packed]).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_pack_is_canonical() {
        let a: serde_json::Value = serde_json::from_str(r#"{"b":1,"a":2}"#).unwrap();
        let b: serde_json::Value = serde_json::from_str(r#"{"a":2,"b":1}"#).unwrap();
        assert_eq!(pack(&a).unwrap(), pack(&b).unwrap());
    }

    #[test]
    fn test_split_counts() {
        let text = "a".repeat(2501);
        let chunks = split(&text, 1200);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 1200);
        assert_eq!(chunks[1].len(), 1200);
        assert_eq!(chunks[2].len(), 101);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_split_at_threshold_is_single() {
        let text = "b".repeat(1200);
        assert_eq!(split(&text, 1200), vec![text.as_str()]);
        assert_eq!(split("", 1200), vec![""]);
    }

    #[test]
    fn test_split_exact_multiple() {
        let text = "c".repeat(3600);
        let chunks = split(&text, 1200);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.len() == 1200));
    }

    #[test]
    fn test_small_document_is_one_tile() {
        let enc = ChunkedQrEncoder::default();
        let symbol = enc.encode_symbol("short document").unwrap();
        assert_eq!(symbol.tiles.len(), 1);
        assert_eq!(symbol.image, symbol.tiles[0]);
    }

    #[test]
    fn test_stitch_keeps_every_tile() {
        let tiles: Vec<GrayImage> = (0..4u8)
            .map(|i| GrayImage::from_pixel(10, 5 + i as u32, image::Luma([i * 40])))
            .collect();
        let out = stitch(&tiles);
        assert_eq!(out.width(), 10);
        assert_eq!(out.height(), 5 + 6 + 7 + 8);
        let mut y = 0;
        for (i, tile) in tiles.iter().enumerate() {
            assert_eq!(out.get_pixel(0, y).0[0], i as u8 * 40, "tile {}", i);
            y += tile.height();
        }
    }

    #[test]
    fn test_stitch_centers_narrow_tiles() {
        let wide = GrayImage::from_pixel(20, 2, image::Luma([0]));
        let narrow = GrayImage::from_pixel(10, 2, image::Luma([0]));
        let out = stitch(&[wide, narrow]);
        assert_eq!(out.get_pixel(4, 3).0[0], 255);
        assert_eq!(out.get_pixel(5, 3).0[0], 0);
        assert_eq!(out.get_pixel(14, 3).0[0], 0);
        assert_eq!(out.get_pixel(15, 3).0[0], 255);
    }
}
