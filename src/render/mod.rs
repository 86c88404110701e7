//! # Rendering Module
//!
//! Turns encoded items into one grayscale label and that label into dots.
//!
//! ## Modules
//!
//! - [`font`]: TrueType text with a bitmap fallback
//! - [`caption`]: Text strips appended under QR symbols
//! - [`compose`]: Stacks text, barcodes and QR symbols on a tape-width canvas
//! - [`dither`]: Grayscale to black/white conversion and row packing
//!
//! ## Usage Example
//!
//! ```
//! use labelprint::render::compose::{Block, LabelCompositor};
//! use labelprint::render::font::LabelFont;
//!
//! let font = LabelFont::builtin();
//! let label = LabelCompositor::default()
//!     .compose(&[Block::Text { key: "Product", value: "Widget" }], &font)
//!     .unwrap();
//! assert_eq!(label.width(), 500);
//! ```

pub mod caption;
pub mod compose;
pub mod dither;
pub mod font;
