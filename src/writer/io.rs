// Low level block placement and link patching for MdfWriter
use std::path::Path;

use super::{FileWriter, MdfWrite, MdfWriter, VecWriter};
use crate::Result;
use crate::blocks::TextBlock;

impl MdfWriter<FileWriter> {
    /// Creates a writer for the file at `path` using a 1 MB internal buffer.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_writer(FileWriter::new(path)?))
    }
}

impl MdfWriter<VecWriter> {
    /// Creates a writer that serializes into memory.
    pub fn in_memory() -> Self {
        Self::from_writer(VecWriter::new())
    }
}

impl<W: MdfWrite> MdfWriter<W> {
    /// Writes a block at the next 8-byte boundary, zero-padding the gap.
    /// Returns the address the block was placed at.
    pub fn write_block(&mut self, block_bytes: &[u8]) -> Result<u64> {
        let align = (8 - (self.offset % 8)) % 8;
        if align != 0 {
            self.writer.write_all(&vec![0u8; align as usize])?;
            self.offset += align;
        }

        self.writer.write_all(block_bytes)?;
        let block_start = self.offset;
        self.offset += block_bytes.len() as u64;
        Ok(block_start)
    }

    /// Writes `count` zero bytes, reserving space that is filled in later.
    pub(super) fn reserve(&mut self, count: usize) -> Result<u64> {
        self.write_block(&vec![0u8; count])
    }

    /// Writes `text` unless an identical block was already placed, and
    /// returns its address. `None` yields the null address.
    pub fn write_text(&mut self, text: Option<&TextBlock>) -> Result<u64> {
        let Some(text) = text else {
            return Ok(0);
        };
        if let Some(address) = self.texts.lookup(text) {
            return Ok(address);
        }
        let address = self.write_block(&text.to_bytes()?)?;
        Ok(self.texts.insert(text, address))
    }

    /// Overwrites the u64 link at `offset` with `address`.
    pub fn update_link(&mut self, offset: u64, address: u64) -> Result<()> {
        self.writer.seek(offset)?;
        self.writer.write_all(&address.to_le_bytes())?;
        self.writer.seek(self.offset)?;
        Ok(())
    }

    /// Chains the blocks at `addresses` through the link at `link_offset`
    /// inside each block; the last block keeps a null link.
    pub(super) fn link_chain(&mut self, addresses: &[u64], link_offset: u64) -> Result<()> {
        for pair in addresses.windows(2) {
            self.update_link(pair[0] + link_offset, pair[1])?;
        }
        Ok(())
    }

    /// Rewrites `bytes` at the absolute `address` and returns to the end.
    pub(super) fn overwrite(&mut self, address: u64, bytes: &[u8]) -> Result<()> {
        self.writer.seek(address)?;
        self.writer.write_all(bytes)?;
        self.writer.seek(self.offset)?;
        Ok(())
    }

    /// Returns the current file offset (for block address calculation).
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Flushes all data to the destination.
    pub fn finalize(&mut self) -> Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_are_aligned() {
        let mut writer = MdfWriter::in_memory();
        assert_eq!(writer.write_block(&[1, 2, 3]).unwrap(), 0);
        assert_eq!(writer.write_block(&[4]).unwrap(), 8);
        assert_eq!(writer.offset(), 9);
    }

    #[test]
    fn texts_are_written_once() {
        let mut writer = MdfWriter::in_memory();
        let first = writer.write_text(Some(&TextBlock::new("speed"))).unwrap();
        let second = writer.write_text(Some(&TextBlock::new("speed"))).unwrap();
        assert_eq!(first, second);
        assert_eq!(writer.offset(), 32);
        assert_eq!(writer.write_text(None).unwrap(), 0);
    }

    #[test]
    fn chain_links_are_patched() {
        let mut writer = MdfWriter::in_memory();
        let a = writer.reserve(32).unwrap();
        let b = writer.reserve(32).unwrap();
        writer.link_chain(&[a, b], 24).unwrap();
        let bytes = writer.into_inner().into_inner();
        assert_eq!(&bytes[24..32], &32u64.to_le_bytes());
        assert_eq!(&bytes[56..64], &[0u8; 8]);
    }
}
