//! # Brother QL Protocol Implementation
//!
//! Low-level command builders and the label-to-raster conversion for
//! Brother QL label printers.
//!
//! ## Module Structure
//!
//! - [`commands`]: Raster command byte builders (init, media, cut, lines)
//! - [`raster`]: Image preparation and complete print jobs
//!
//! ## Usage Example
//!
//! ```
//! use image::{GrayImage, Luma};
//! use labelprint::printer::PrinterConfig;
//! use labelprint::protocol::raster::{RasterOptions, Rasterizer};
//!
//! let label = GrayImage::from_pixel(696, 40, Luma([255]));
//! let rasterizer = Rasterizer::new(PrinterConfig::default(), RasterOptions::default());
//! let job = rasterizer.rasterize(&label, "/dev/usb/lp0").unwrap();
//!
//! assert_eq!(job.raster_lines, 40);
//! assert_eq!(job.instructions.last(), Some(&0x1A));
//! ```

pub mod commands;
pub mod raster;

pub use raster::{RasterJob, RasterOptions, Rasterizer};
