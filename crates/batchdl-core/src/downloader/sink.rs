//! Destination file that is only created once the response body arrives.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Sequential writer for one download. Creates missing parent directories and
/// truncates any existing file on first use, so a transport failure before the
/// body starts leaves the filesystem untouched.
pub(super) struct FileSink {
    path: PathBuf,
    file: Option<BufWriter<File>>,
    written: u64,
    error: Option<io::Error>,
}

impl FileSink {
    pub(super) fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            file: None,
            written: 0,
            error: None,
        }
    }

    fn open(&mut self) -> io::Result<&mut BufWriter<File>> {
        if self.file.is_none() {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let file = File::options()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&self.path)?;
            self.file = Some(BufWriter::new(file));
        }
        match self.file.as_mut() {
            Some(f) => Ok(f),
            None => Err(io::Error::new(io::ErrorKind::Other, "sink not open")),
        }
    }

    /// Append a chunk. On failure the io error is kept for [`take_error`](Self::take_error)
    /// and false is returned so the caller can abort the transfer.
    pub(super) fn write(&mut self, data: &[u8]) -> bool {
        let res = self.open().and_then(|f| f.write_all(data));
        match res {
            Ok(()) => {
                self.written += data.len() as u64;
                true
            }
            Err(e) => {
                self.error = Some(e);
                false
            }
        }
    }

    /// True once the destination file exists (body started streaming).
    pub(super) fn started(&self) -> bool {
        self.file.is_some()
    }

    pub(super) fn written(&self) -> u64 {
        self.written
    }

    pub(super) fn path(&self) -> &Path {
        &self.path
    }

    pub(super) fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    /// Flush and close. Creates the (empty) file if no body bytes arrived.
    pub(super) fn finish(mut self) -> io::Result<u64> {
        let file = self.open()?;
        file.flush()?;
        Ok(self.written)
    }

    /// Drop a partially written file. Best-effort.
    pub(super) fn discard(mut self) {
        if self.file.take().is_some() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                tracing::debug!(path = %self.path.display(), "remove partial file: {}", e);
            }
        }
    }
}
