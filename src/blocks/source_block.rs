use super::SI_BLOCK_SIZE;
use crate::{
    Result,
    blocks::common::{
        BlockHeader, BlockParse, debug_assert_aligned, read_u8, read_u64, validate_block_id,
        validate_buffer_size,
    },
};

/// Source Information Block (##SI) - where a channel's data was acquired.
///
/// The three links point to name, path and comment texts. Appended signals
/// get a source whose name and path are both the caller's source label.
#[derive(Debug, Clone)]
pub struct SourceBlock {
    pub header: BlockHeader,
    pub name_addr: u64,
    pub path_addr: u64,
    pub comment_addr: u64,
    /// 0 other, 1 ECU, 2 bus, 3 I/O, 4 tool, 5 user.
    pub source_type: u8,
    /// 0 none, 1 other, 2 CAN, 3 LIN ...
    pub bus_type: u8,
    /// Bit 0 marks a simulated source.
    pub flags: u8,
}

impl BlockParse<'_> for SourceBlock {
    const ID: &'static str = "##SI";

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let header = Self::parse_header(bytes)?;

        let link_count = header.link_count as usize;
        let data_start = 24 + link_count * 8;
        validate_buffer_size(bytes, data_start + 3)?;

        // Writers may emit fewer than three links; missing ones read as 0.
        let link = |index: usize| {
            if link_count > index {
                read_u64(bytes, 24 + index * 8)
            } else {
                0
            }
        };

        Ok(Self {
            header,
            name_addr: link(0),
            path_addr: link(1),
            comment_addr: link(2),
            source_type: read_u8(bytes, data_start),
            bus_type: read_u8(bytes, data_start + 1),
            flags: read_u8(bytes, data_start + 2),
        })
    }
}

impl SourceBlock {
    /// Serializes the SourceBlock: three links, three type bytes, five reserved.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        validate_block_id(&self.header, "##SI")?;

        let mut header = self.header.clone();
        header.length = SI_BLOCK_SIZE as u64;
        header.link_count = 3;

        let mut buffer = Vec::with_capacity(SI_BLOCK_SIZE);
        buffer.extend_from_slice(&header.to_bytes()?);
        buffer.extend_from_slice(&self.name_addr.to_le_bytes());
        buffer.extend_from_slice(&self.path_addr.to_le_bytes());
        buffer.extend_from_slice(&self.comment_addr.to_le_bytes());
        buffer.push(self.source_type);
        buffer.push(self.bus_type);
        buffer.push(self.flags);
        buffer.extend_from_slice(&[0u8; 5]);

        debug_assert_aligned(buffer.len());
        Ok(buffer)
    }
}

impl Default for SourceBlock {
    fn default() -> Self {
        Self {
            header: BlockHeader::new("##SI", SI_BLOCK_SIZE as u64, 3),
            name_addr: 0,
            path_addr: 0,
            comment_addr: 0,
            source_type: 0,
            bus_type: 0,
            flags: 0,
        }
    }
}
