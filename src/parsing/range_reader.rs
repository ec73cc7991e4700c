//! Random-access byte sources for the reader.

use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::blocks::{BLOCK_HEADER_SIZE, BlockHeader};
use crate::{Error, Result};

/// A byte-addressable stream the reader pulls blocks from.
pub trait ByteRangeReader {
    /// Reads exactly `length` bytes starting at `offset`.
    fn read_range(&mut self, offset: u64, length: u64) -> Result<Vec<u8>>;

    /// Reads the complete block at `address` (header included).
    ///
    /// When `expected_tag` is given the block's 4-byte tag must match it,
    /// otherwise [`Error::BlockIDError`] is returned before the body is read.
    fn read_block(&mut self, address: u64, expected_tag: Option<&str>) -> Result<Vec<u8>> {
        let raw_header = self.read_range(address, BLOCK_HEADER_SIZE as u64)?;
        let header = BlockHeader::from_bytes(&raw_header)?;
        if let Some(tag) = expected_tag.filter(|tag| header.id != *tag) {
            return Err(Error::BlockIDError {
                actual: header.id,
                expected: tag.to_string(),
            });
        }
        let length = header.length.max(BLOCK_HEADER_SIZE as u64);
        self.read_range(address, length)
    }

    /// Tag of the block at `address` without reading its body.
    fn peek_tag(&mut self, address: u64) -> Result<String> {
        let raw_header = self.read_range(address, BLOCK_HEADER_SIZE as u64)?;
        Ok(BlockHeader::from_bytes(&raw_header)?.id)
    }
}

fn check_range(offset: u64, length: u64, size: u64) -> Result<()> {
    if offset.checked_add(length).is_none_or(|end| end > size) {
        return Err(Error::TooShortBuffer {
            actual: size.saturating_sub(offset) as usize,
            expected: length as usize,
            file: file!(),
            line: line!(),
        });
    }
    Ok(())
}

/// Reads ranges from a local file.
pub struct FileRangeReader {
    file: std::fs::File,
    size: u64,
}

impl FileRangeReader {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let size = file.metadata()?.len();
        Ok(Self { file, size })
    }
}

impl ByteRangeReader for FileRangeReader {
    fn read_range(&mut self, offset: u64, length: u64) -> Result<Vec<u8>> {
        check_range(offset, length, self.size)?;
        self.file.seek(SeekFrom::Start(offset))?;
        let mut buffer = vec![0u8; length as usize];
        self.file.read_exact(&mut buffer)?;
        Ok(buffer)
    }
}

/// Reads ranges from a borrowed in-memory image.
pub struct SliceRangeReader<'a> {
    data: &'a [u8],
}

impl<'a> SliceRangeReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl ByteRangeReader for SliceRangeReader<'_> {
    fn read_range(&mut self, offset: u64, length: u64) -> Result<Vec<u8>> {
        check_range(offset, length, self.data.len() as u64)?;
        let start = offset as usize;
        Ok(self.data[start..start + length as usize].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::TextBlock;

    fn image() -> Vec<u8> {
        let mut bytes = vec![0u8; 8];
        bytes.extend_from_slice(&TextBlock::new("engine").to_bytes().unwrap());
        bytes
    }

    #[test]
    fn read_block_returns_whole_block() {
        let data = image();
        let mut reader = SliceRangeReader::new(&data);
        let block = reader.read_block(8, Some("##TX")).unwrap();
        assert_eq!(block.len(), 32);
        assert_eq!(reader.peek_tag(8).unwrap(), "##TX");
    }

    #[test]
    fn unexpected_tag_is_reported() {
        let data = image();
        let mut reader = SliceRangeReader::new(&data);
        assert!(matches!(
            reader.read_block(8, Some("##CN")),
            Err(Error::BlockIDError { .. })
        ));
    }

    #[test]
    fn out_of_bounds_is_too_short() {
        let data = image();
        let mut reader = SliceRangeReader::new(&data);
        assert!(matches!(
            reader.read_range(30, 100),
            Err(Error::TooShortBuffer { .. })
        ));
    }

    #[test]
    fn file_reader_matches_slice_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.bin");
        std::fs::write(&path, image()).unwrap();
        let mut reader = FileRangeReader::new(&path).unwrap();
        assert_eq!(reader.read_block(8, None).unwrap(), image()[8..].to_vec());
    }
}
