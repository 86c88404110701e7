//! # USB Printer Transport
//!
//! Writes raster jobs to a Brother QL attached through the Linux `usblp`
//! driver, which exposes each printer as a character device
//! (`/dev/usb/lp0`, `/dev/usb/lp1`, ...).
//!
//! ## Finding the Device
//!
//! A printer is usually configured by its USB id (`usb://0x04f9:0x2042`).
//! The id is resolved through sysfs:
//!
//! ```text
//! /sys/class/usbmisc/lp0/device  ──► USB interface (1-1:1.0)
//!                     device/../idVendor   04f9
//!                     device/../idProduct  2042
//! ```
//!
//! The first `lpN` whose parent USB device matches wins and maps to
//! `/dev/usb/lpN`.
//!
//! ## Permissions
//!
//! The device node is normally owned by the `lp` group:
//!
//! ```bash
//! $ sudo usermod -aG lp $USER
//! ```
//!
//! ## Chunked Writes
//!
//! Jobs are written in 4096-byte chunks with a short delay between chunks so
//! the printer's receive buffer keeps up.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use super::RasterSink;
use crate::error::LabelError;

/// Default usblp device path
pub const DEFAULT_DEVICE: &str = "/dev/usb/lp0";

/// Where the kernel lists usblp devices
pub const SYSFS_USBMISC: &str = "/sys/class/usbmisc";

/// Where usblp device nodes live
pub const DEV_USB: &str = "/dev/usb";

/// Default chunk size for writes (bytes)
const CHUNK_SIZE: usize = 4096;

/// Delay between chunks (milliseconds)
const CHUNK_DELAY_MS: u64 = 2;

/// # USB Printer Transport
///
/// ## Example
///
/// ```no_run
/// use labelprint::transport::{RasterSink, UsbPrinterTransport};
///
/// let mut transport = UsbPrinterTransport::open("/dev/usb/lp0")?;
/// transport.send(&[0x00; 200])?;
/// # Ok::<(), labelprint::LabelError>(())
/// ```
pub struct UsbPrinterTransport {
    file: File,
    path: PathBuf,
    chunk_size: usize,
    chunk_delay: Duration,
}

impl std::fmt::Debug for UsbPrinterTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsbPrinterTransport")
            .field("path", &self.path)
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

impl UsbPrinterTransport {
    /// Open the printer device node for writing.
    ///
    /// ## Errors
    ///
    /// Returns [`LabelError::Device`] if the device doesn't exist or access
    /// is denied.
    pub fn open<P: AsRef<Path>>(device: P) -> Result<Self, LabelError> {
        let path = device.as_ref();

        let file = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|e| LabelError::device(path.display().to_string(), format!("open failed: {}", e)))?;

        tracing::debug!(device = %path.display(), "opened printer device");

        Ok(Self {
            file,
            path: path.to_path_buf(),
            chunk_size: CHUNK_SIZE,
            chunk_delay: Duration::from_millis(CHUNK_DELAY_MS),
        })
    }

    /// Resolve a USB vendor/product id and open the matching device.
    pub fn open_usb_id(vendor: u16, product: u16) -> Result<Self, LabelError> {
        let id = format!("usb://0x{:04x}:0x{:04x}", vendor, product);
        let path = find_usb_printer(vendor, product)?
            .ok_or_else(|| LabelError::device(&id, "no usblp device with this id is attached"))?;
        tracing::info!(%id, device = %path.display(), "resolved USB printer");
        Self::open(path)
    }

    /// Set the chunk size for large writes. Default is 4096 bytes.
    pub fn set_chunk_size(&mut self, size: usize) {
        self.chunk_size = size.max(1);
    }

    /// Set the delay between chunks. Default is 2ms.
    pub fn set_chunk_delay(&mut self, delay: Duration) {
        self.chunk_delay = delay;
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_chunked(&mut self, data: &[u8]) -> Result<(), LabelError> {
        for chunk in data.chunks(self.chunk_size) {
            self.file
                .write_all(chunk)
                .map_err(|e| LabelError::device(self.describe(), format!("write failed: {}", e)))?;

            if data.len() > self.chunk_size && !self.chunk_delay.is_zero() {
                thread::sleep(self.chunk_delay);
            }
        }
        self.file
            .flush()
            .map_err(|e| LabelError::device(self.describe(), format!("flush failed: {}", e)))
    }
}

impl RasterSink for UsbPrinterTransport {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn send(&mut self, data: &[u8]) -> Result<(), LabelError> {
        self.write_chunked(data)
    }
}

// ============================================================================
// DEVICE LOOKUP
// ============================================================================

/// Find the usblp device node for a USB vendor/product id.
#[cfg(target_os = "linux")]
pub fn find_usb_printer(vendor: u16, product: u16) -> Result<Option<PathBuf>, LabelError> {
    find_usb_printer_in(Path::new(SYSFS_USBMISC), Path::new(DEV_USB), vendor, product)
}

#[cfg(not(target_os = "linux"))]
pub fn find_usb_printer(_vendor: u16, _product: u16) -> Result<Option<PathBuf>, LabelError> {
    Ok(None)
}

/// [`find_usb_printer`] against explicit sysfs and device directories.
pub fn find_usb_printer_in(
    sysfs: &Path,
    dev_dir: &Path,
    vendor: u16,
    product: u16,
) -> Result<Option<PathBuf>, LabelError> {
    let entries = match fs::read_dir(sysfs) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("lp"))
        .collect();
    names.sort();

    for name in names {
        let usb_dev = sysfs.join(&name).join("device").join("..");
        let (Some(v), Some(p)) = (
            read_hex_id(&usb_dev.join("idVendor")),
            read_hex_id(&usb_dev.join("idProduct")),
        ) else {
            continue;
        };
        if v == vendor && p == product {
            return Ok(Some(dev_dir.join(&name)));
        }
    }

    Ok(None)
}

fn read_hex_id(path: &Path) -> Option<u16> {
    let text = fs::read_to_string(path).ok()?;
    u16::from_str_radix(text.trim(), 16).ok()
}

// ============================================================================
// TESTS
// ============================================================================
