//! Output sinks for [`MdfWriter`](super::MdfWriter).
//!
//! The writer only needs sequential writes plus an absolute seek to patch
//! links and rewrite the file start, so a file and a growable byte buffer
//! both qualify.

use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use crate::Result;

/// Write and seek operations used by the writer.
pub trait MdfWrite {
    /// Write all bytes at the current position.
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;

    /// Seek to an absolute position.
    fn seek(&mut self, pos: u64) -> Result<u64>;

    /// Current position.
    fn position(&self) -> u64;

    /// Flush any buffered data.
    fn flush(&mut self) -> Result<()>;
}

/// Writes into a growable in-memory buffer.
#[derive(Debug, Default)]
pub struct VecWriter {
    buffer: Vec<u8>,
    position: u64,
}

impl VecWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            position: 0,
        }
    }

    /// Consume the writer and return the written bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl MdfWrite for VecWriter {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let pos = self.position as usize;
        let end = pos + bytes.len();

        if end > self.buffer.len() {
            self.buffer.resize(end, 0);
        }

        self.buffer[pos..end].copy_from_slice(bytes);
        self.position = end as u64;
        Ok(())
    }

    fn seek(&mut self, pos: u64) -> Result<u64> {
        self.position = pos;
        Ok(self.position)
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Buffered file output.
pub struct FileWriter {
    inner: BufWriter<File>,
    position: u64,
}

impl FileWriter {
    /// Creates (or truncates) `path` with a 1 MB write buffer.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_capacity(path, 1_048_576)
    }

    pub fn with_capacity(path: impl AsRef<Path>, capacity: usize) -> Result<Self> {
        let file = File::create(path)?;
        let inner = BufWriter::with_capacity(capacity, file);
        Ok(Self { inner, position: 0 })
    }
}

impl MdfWrite for FileWriter {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    fn seek(&mut self, pos: u64) -> Result<u64> {
        self.inner.seek(SeekFrom::Start(pos))?;
        self.position = pos;
        Ok(self.position)
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_writer_overwrites_after_seek() {
        let mut writer = VecWriter::new();
        writer.write_all(&[1, 2, 3, 4]).unwrap();
        writer.seek(1).unwrap();
        writer.write_all(&[9, 9]).unwrap();
        assert_eq!(writer.position(), 3);
        assert_eq!(writer.into_inner(), vec![1, 9, 9, 4]);
    }

    #[test]
    fn file_writer_patches_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let mut writer = FileWriter::new(&path).unwrap();
        writer.write_all(&[0u8; 8]).unwrap();
        writer.seek(0).unwrap();
        writer.write_all(&[7]).unwrap();
        writer.flush().unwrap();
        drop(writer);
        assert_eq!(std::fs::read(&path).unwrap(), vec![7, 0, 0, 0, 0, 0, 0, 0]);
    }
}
