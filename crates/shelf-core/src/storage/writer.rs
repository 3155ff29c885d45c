//! Sequential writer for temp download files.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::temp_path;

/// Writer for `<destination>.part`. Owned by a single transfer.
pub struct StorageWriter {
    file: BufWriter<File>,
    temp_path: PathBuf,
    written: u64,
}

impl StorageWriter {
    /// Create (or truncate) the temp file for `final_path`, creating parent directories.
    pub fn create(final_path: &Path) -> io::Result<Self> {
        if let Some(parent) = final_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let temp_path = temp_path(final_path);
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        Ok(StorageWriter {
            file: BufWriter::new(file),
            temp_path,
            written: 0,
        })
    }

    pub fn append(&mut self, data: &[u8]) -> io::Result<()> {
        self.file.write_all(data)?;
        self.written += data.len() as u64;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Path to the current temp file.
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Flush, fsync and atomically rename the temp file to `final_path`.
    /// On error the temp file is removed.
    pub fn finalize(self, final_path: &Path) -> io::Result<()> {
        let StorageWriter {
            file, temp_path, ..
        } = self;
        let committed = file
            .into_inner()
            .map_err(|e| e.into_error())
            .and_then(|file| file.sync_all())
            .and_then(|()| fs::rename(&temp_path, final_path));
        if committed.is_err() {
            remove_temp(&temp_path);
        }
        committed
    }

    /// Drop the temp file. Used when the transfer fails or is cancelled.
    pub fn discard(self) {
        let StorageWriter { file, temp_path, .. } = self;
        drop(file);
        remove_temp(&temp_path);
    }
}

fn remove_temp(temp_path: &Path) {
    match fs::remove_file(temp_path) {
        Ok(()) => tracing::debug!(path = %temp_path.display(), "removed partial download"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %temp_path.display(), "could not remove partial download: {}", e)
        }
    }
}
