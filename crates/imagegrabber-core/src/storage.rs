//! Download file lifecycle.
//!
//! An image is streamed into an anonymous temp file in the download directory
//! and persisted under its final name only after the whole body arrived, so
//! the existence check never mistakes a truncated transfer for a finished
//! image. The temp name has a fixed length, so any filename the directory can
//! hold can also be downloaded.

use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Prefix of in-flight temp files (`.imagegrabber-XXXXXX.part`).
const TEMP_PREFIX: &str = ".imagegrabber-";
const TEMP_SUFFIX: &str = ".part";

/// Sequential writer for one download attempt.
pub struct PartFile {
    file: NamedTempFile,
    written: u64,
}

impl PartFile {
    /// Create a fresh temp file next to where `final_path` will live.
    pub fn create(final_path: &Path) -> io::Result<Self> {
        let dir = match final_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let file = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(dir)?;
        Ok(Self { file, written: 0 })
    }

    pub fn write_chunk(&mut self, data: &[u8]) -> io::Result<()> {
        self.file.write_all(data)?;
        self.written += data.len() as u64;
        Ok(())
    }

    /// Flush and move the temp file over `final_path`. Returns the byte count.
    pub fn finalize(mut self, final_path: &Path) -> io::Result<u64> {
        self.file.flush()?;
        let written = self.written;
        self.file.persist(final_path).map_err(|e| e.error)?;
        Ok(written)
    }

    /// Remove the temp file after a failed attempt. Errors are only logged.
    pub fn discard(self) {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            tracing::debug!(path = %path.display(), "could not remove temp file: {}", e);
        }
    }
}
