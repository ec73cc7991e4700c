use crate::{
    Result,
    blocks::common::{
        BLOCK_HEADER_SIZE, BlockHeader, BlockParse, padding_to_align_8, u64_to_usize,
        validate_buffer_size,
    },
};

/// Data Block (##DT) holding packed records.
///
/// Only a borrow of the payload is kept; the header's `length` covers the
/// 24-byte header plus the payload but not the alignment padding after it.
#[derive(Debug, Clone)]
pub struct DataBlock<'a> {
    pub header: BlockHeader,
    pub data: &'a [u8],
}

impl<'a> BlockParse<'a> for DataBlock<'a> {
    const ID: &'static str = "##DT";

    fn from_bytes(bytes: &'a [u8]) -> Result<Self> {
        let header = Self::parse_header(bytes)?;
        let total = u64_to_usize(header.length, "data block length")?.max(BLOCK_HEADER_SIZE);
        validate_buffer_size(bytes, total)?;
        Ok(Self {
            header,
            data: &bytes[BLOCK_HEADER_SIZE..total],
        })
    }
}

impl<'a> DataBlock<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            header: BlockHeader::new("##DT", (BLOCK_HEADER_SIZE + data.len()) as u64, 0),
            data,
        }
    }

    /// Header and payload followed by zero padding to the next 8-byte boundary.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let unpadded = BLOCK_HEADER_SIZE + self.data.len();
        let mut header = self.header.clone();
        header.length = unpadded as u64;

        let mut buffer = Vec::with_capacity(unpadded + 8);
        buffer.extend_from_slice(&header.to_bytes()?);
        buffer.extend_from_slice(self.data);
        buffer.resize(unpadded + padding_to_align_8(unpadded), 0);
        Ok(buffer)
    }
}
