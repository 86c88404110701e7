//! # labelprint - Label Printing for Brother QL Printers
//!
//! labelprint turns a small JSON document describing label items into a
//! single composed label and prints it on a Brother QL printer over USB.
//! It provides:
//!
//! - **Encoders**: Code 128 barcodes, QR symbols, chunked QR for large
//!   documents and GS1 element strings
//! - **Composition**: text, barcodes and QR stacked on a tape-width canvas
//! - **Raster protocol**: Brother QL raster command streams with PackBits
//! - **Transport**: USB printer class devices, files and in-memory sinks
//!
//! ## Quick Start
//!
//! ```no_run
//! use labelprint::{LabelPipeline, PipelineConfig, Printer};
//! use labelprint::transport::{DeviceAddress, DeviceSink};
//!
//! let pipeline = LabelPipeline::new(PipelineConfig::default());
//! let device = DeviceAddress::parse("usb://0x04f9:0x2042")?;
//! let printer = Printer::new(DeviceSink::new(device));
//!
//! let outcome = pipeline.process_json(
//!     r#"{"qty": 2, "labelItems": [
//!         {"labelType": "text", "labelKey": "Product", "labelValue": "Widget"},
//!         {"labelType": "QR", "labelKey": "", "labelValue": "ABC123"}
//!     ]}"#,
//!     &printer,
//! )?;
//! assert!(outcome.report.is_success());
//!
//! # Ok::<(), labelprint::LabelError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`request`] | Label request documents and quantities |
//! | [`package`] | Package descriptions converted to requests |
//! | [`encode`] | Barcode, QR, chunked QR and GS1 encoders |
//! | [`render`] | Fonts, captions, composition and dithering |
//! | [`protocol`] | Brother QL raster commands |
//! | [`printer`] | Models, tapes and copy dispatch |
//! | [`transport`] | Device backends |
//! | [`pipeline`] | End-to-end request processing |
//! | [`config`] | Pipeline configuration |
//! | [`error`] | Error types |
//!
//! ## Supported Printers
//!
//! QL-500 through QL-1100 on endless tape from 12mm to 102mm. Wide tapes
//! need a wide-head model (QL-1050, QL-1060N, QL-1100).

pub mod config;
pub mod encode;
pub mod error;
pub mod package;
pub mod pipeline;
pub mod printer;
pub mod protocol;
pub mod render;
pub mod request;
pub mod transport;

// Re-exports for convenience
pub use config::PipelineConfig;
pub use error::LabelError;
pub use pipeline::LabelPipeline;
pub use printer::{Printer, PrinterConfig};
pub use request::{LabelItem, LabelKind, LabelRequest, Quantity};
pub use transport::{DeviceAddress, RasterSink};
