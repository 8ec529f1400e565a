//! Local output file for the fetched stream.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Output file that received chunks are appended to, in receive order.
///
/// Creating an artifact truncates any previous content. Bytes go in through
/// `Write`; the file handle is held until [`Artifact::finish`] or drop,
/// whichever comes first.
pub struct Artifact {
    path: PathBuf,
    writer: BufWriter<File>,
    written: u64,
}

impl Artifact {
    /// Create or truncate the file at `path` and keep it open for appending.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    /// Flush buffered bytes and close the file. Returns the bytes stored.
    pub fn finish(mut self) -> io::Result<u64> {
        self.writer.flush()?;
        debug!(path = %self.path.display(), bytes = self.written, "Artifact closed");
        Ok(self.written)
    }
}

impl Write for Artifact {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.writer.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
