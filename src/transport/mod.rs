//! # Printer Transport Layer
//!
//! Everything a raster job can be sent to implements [`RasterSink`]: bytes
//! in, `Result` out.
//!
//! ## Available Transports
//!
//! - [`usb`]: Brother QL through the Linux usblp character device
//! - [`file`]: Raster dump to a regular file
//! - [`DeviceSink`]: Reopens a [`DeviceAddress`] for every job
//! - [`MemorySink`]: Keeps jobs in memory, for dry runs and tests
//!
//! ## Device Addresses
//!
//! | Form | Example | Sink |
//! |------|---------|------|
//! | USB id | `usb://0x04f9:0x2042` | resolved usblp device |
//! | File URL | `file:///tmp/job.bin` | [`FileSink`] |
//! | Path | `/dev/usb/lp0` | [`UsbPrinterTransport`] |
//!
//! A printer that is unplugged, busy or not yet resolvable fails only the
//! copies sent while it is away. [`DeviceSink`] resolves and opens the
//! device inside each `send`, so every copy reports its own error.

pub mod file;
pub mod usb;

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub use file::FileSink;
pub use usb::UsbPrinterTransport;

use crate::error::LabelError;

/// Destination for raster jobs.
pub trait RasterSink: Send {
    /// Human-readable device name for logs and errors.
    fn describe(&self) -> String;

    /// Deliver one complete job.
    fn send(&mut self, data: &[u8]) -> Result<(), LabelError>;
}

impl<S: RasterSink + ?Sized> RasterSink for Box<S> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn send(&mut self, data: &[u8]) -> Result<(), LabelError> {
        (**self).send(data)
    }
}

/// Where a printer is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceAddress {
    Usb { vendor: u16, product: u16 },
    File(PathBuf),
    Path(PathBuf),
}

impl DeviceAddress {
    /// Parse `usb://0xVVVV:0xPPPP`, `file:///path` or a bare path.
    pub fn parse(s: &str) -> Result<Self, LabelError> {
        let s = s.trim();
        if let Some(id) = s.strip_prefix("usb://") {
            let (v, p) = id
                .split_once(':')
                .ok_or_else(|| LabelError::Config(format!("malformed USB id '{}'", s)))?;
            return Ok(Self::Usb {
                vendor: parse_usb_id(v, s)?,
                product: parse_usb_id(p, s)?,
            });
        }
        if let Some(path) = s.strip_prefix("file://") {
            if path.is_empty() {
                return Err(LabelError::Config("empty file:// address".to_string()));
            }
            return Ok(Self::File(PathBuf::from(path)));
        }
        if s.is_empty() {
            return Err(LabelError::Config("empty device address".to_string()));
        }
        Ok(Self::Path(PathBuf::from(s)))
    }

    /// Open a sink for this address.
    pub fn open(&self) -> Result<Box<dyn RasterSink>, LabelError> {
        Ok(match self {
            Self::Usb { vendor, product } => Box::new(UsbPrinterTransport::open_usb_id(*vendor, *product)?),
            Self::File(path) => Box::new(FileSink::create(path)?),
            Self::Path(path) => Box::new(UsbPrinterTransport::open(path)?),
        })
    }
}

fn parse_usb_id(part: &str, whole: &str) -> Result<u16, LabelError> {
    let hex = part
        .strip_prefix("0x")
        .or_else(|| part.strip_prefix("0X"))
        .unwrap_or(part);
    u16::from_str_radix(hex, 16).map_err(|_| LabelError::Config(format!("malformed USB id '{}'", whole)))
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usb { vendor, product } => write!(f, "usb://0x{:04x}:0x{:04x}", vendor, product),
            Self::File(path) => write!(f, "file://{}", path.display()),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

// ============================================================================
// DEVICE SINK
// ============================================================================

/// Opens its device per job.
///
/// File dumps are created on the first job and appended to afterwards.
#[derive(Debug)]
pub struct DeviceSink {
    address: DeviceAddress,
    dump: Option<FileSink>,
}

impl DeviceSink {
    pub fn new(address: DeviceAddress) -> Self {
        Self { address, dump: None }
    }

    pub fn address(&self) -> &DeviceAddress {
        &self.address
    }
}

impl RasterSink for DeviceSink {
    fn describe(&self) -> String {
        self.address.to_string()
    }

    fn send(&mut self, data: &[u8]) -> Result<(), LabelError> {
        if let DeviceAddress::File(path) = &self.address {
            if self.dump.is_none() {
                self.dump = Some(FileSink::create(path)?);
            }
            if let Some(dump) = self.dump.as_mut() {
                return dump.send(data);
            }
        }
        self.address.open()?.send(data)
    }
}

// ============================================================================
// IN-MEMORY SINK
// ============================================================================

/// Records every job in memory. Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    jobs: Arc<Mutex<Vec<Vec<u8>>>>,
    attempts: Arc<Mutex<usize>>,
    fail_on: Vec<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that rejects the given 1-based send attempts.
    pub fn failing_on(attempts: &[usize]) -> Self {
        Self {
            fail_on: attempts.to_vec(),
            ..Self::default()
        }
    }

    /// Jobs delivered so far.
    pub fn jobs(&self) -> Vec<Vec<u8>> {
        self.jobs.lock().map(|j| j.clone()).unwrap_or_default()
    }

    /// Send attempts so far, failed ones included.
    pub fn attempts(&self) -> usize {
        self.attempts.lock().map(|a| *a).unwrap_or_default()
    }
}

impl RasterSink for MemorySink {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn send(&mut self, data: &[u8]) -> Result<(), LabelError> {
        let attempt = {
            let mut attempts = self
                .attempts
                .lock()
                .map_err(|_| LabelError::device("memory", "state poisoned"))?;
            *attempts += 1;
            *attempts
        };
        if self.fail_on.contains(&attempt) {
            return Err(LabelError::device("memory", format!("attempt {} rejected", attempt)));
        }
        self.jobs
            .lock()
            .map_err(|_| LabelError::device("memory", "state poisoned"))?
            .push(data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_usb_address() {
        assert_eq!(
            DeviceAddress::parse("usb://0x04f9:0x2042").unwrap(),
            DeviceAddress::Usb {
                vendor: 0x04f9,
                product: 0x2042
            }
        );
        assert_eq!(
            DeviceAddress::parse("usb://04F9:2042").unwrap(),
            DeviceAddress::Usb {
                vendor: 0x04f9,
                product: 0x2042
            }
        );
    }

    #[test]
    fn test_parse_paths() {
        assert_eq!(
            DeviceAddress::parse("file:///tmp/job.bin").unwrap(),
            DeviceAddress::File(PathBuf::from("/tmp/job.bin"))
        );
        assert_eq!(
            DeviceAddress::parse("/dev/usb/lp0").unwrap(),
            DeviceAddress::Path(PathBuf::from("/dev/usb/lp0"))
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["usb://04f9", "usb://zz:0x1", "usb://0x1:0x123456", "", "file://"] {
            assert!(
                matches!(DeviceAddress::parse(bad), Err(LabelError::Config(_))),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn test_display_round_trip() {
        for s in ["usb://0x04f9:0x2042", "file:///tmp/x.bin", "/dev/usb/lp1"] {
            assert_eq!(DeviceAddress::parse(s).unwrap().to_string(), s);
        }
    }

    #[test]
    fn test_file_address_opens_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.bin");
        let address = DeviceAddress::File(path.clone());
        let mut sink = address.open().unwrap();
        sink.send(&[0x1B, 0x40]).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![0x1B, 0x40]);
    }

    #[test]
    fn test_device_sink_reopens_per_job() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lp0");
        let mut sink = DeviceSink::new(DeviceAddress::Path(path.clone()));
        assert_eq!(sink.describe(), path.display().to_string());

        // Device absent: the job fails, the sink stays usable
        assert!(matches!(sink.send(b"a"), Err(LabelError::Device { .. })));

        std::fs::write(&path, b"").unwrap();
        sink.send(b"b").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"b".to_vec());
    }

    #[test]
    fn test_device_sink_appends_file_dumps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.bin");
        std::fs::write(&path, b"stale").unwrap();

        let mut sink = DeviceSink::new(DeviceAddress::File(path.clone()));
        sink.send(b"ab").unwrap();
        sink.send(b"cd").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"abcd".to_vec());
    }

    #[test]
    fn test_memory_sink_failures() {
        let mut sink = MemorySink::failing_on(&[2]);
        let probe = sink.clone();
        assert!(sink.send(b"a").is_ok());
        assert!(sink.send(b"b").is_err());
        assert!(sink.send(b"c").is_ok());
        assert_eq!(probe.attempts(), 3);
        assert_eq!(probe.jobs(), vec![b"a".to_vec(), b"c".to_vec()]);
    }
}
