//! Raster dumps to a regular file.
//!
//! Every job sent is appended, so a file holds exactly what a printer would
//! have received for the whole batch.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::RasterSink;
use crate::error::LabelError;

#[derive(Debug)]
pub struct FileSink {
    file: File,
    path: PathBuf,
}

impl FileSink {
    /// Create (or truncate) `path`, creating parent directories.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, LabelError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|e| LabelError::device(path.display().to_string(), e))?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }
}

impl RasterSink for FileSink {
    fn describe(&self) -> String {
        format!("file://{}", self.path.display())
    }

    fn send(&mut self, data: &[u8]) -> Result<(), LabelError> {
        self.file
            .write_all(data)
            .and_then(|_| self.file.flush())
            .map_err(|e| LabelError::device(self.describe(), e))
    }
}
