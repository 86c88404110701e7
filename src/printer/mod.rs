//! # Printer Module
//!
//! Printer hardware descriptions and copy dispatch.
//!
//! ## Modules
//!
//! - [`config`]: Brother QL models and endless tape specifications
//! - [`dispatch`]: Sends a raster job once per copy, with pacing

pub mod config;
pub mod dispatch;

pub use config::{PrinterConfig, PrinterModel, TapeSpec};
pub use dispatch::{CopyOutcome, PrintReport, Printer};
