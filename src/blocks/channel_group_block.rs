use super::CG_BLOCK_SIZE;
use crate::{
    Result,
    blocks::common::{
        BlockHeader, BlockParse, debug_assert_aligned, read_u16, read_u32, read_u64,
        validate_block_id, validate_block_length, validate_buffer_size,
    },
};

/// Channel Group Block (##CG).
///
/// Describes the packed record layout shared by the channels of a group:
/// `cycles_nr` records of `samples_byte_nr` data bytes each, followed by
/// `invalidation_bytes_nr` invalidation bytes.
#[derive(Debug, Clone)]
pub struct ChannelGroupBlock {
    pub header: BlockHeader,
    pub next_cg_addr: u64,
    pub first_ch_addr: u64,
    pub acq_name_addr: u64,
    pub acq_source_addr: u64,
    pub first_sample_reduction_addr: u64,
    pub comment_addr: u64,
    pub record_id: u64,
    pub cycles_nr: u64,
    pub flags: u16,
    pub path_separator: u16,
    pub reserved1: u32,
    pub samples_byte_nr: u32,
    pub invalidation_bytes_nr: u32,
}

impl BlockParse<'_> for ChannelGroupBlock {
    const ID: &'static str = "##CG";

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let header = Self::parse_header(bytes)?;
        validate_buffer_size(bytes, CG_BLOCK_SIZE)?;

        Ok(Self {
            header,
            next_cg_addr: read_u64(bytes, 24),
            first_ch_addr: read_u64(bytes, 32),
            acq_name_addr: read_u64(bytes, 40),
            acq_source_addr: read_u64(bytes, 48),
            first_sample_reduction_addr: read_u64(bytes, 56),
            comment_addr: read_u64(bytes, 64),
            record_id: read_u64(bytes, 72),
            cycles_nr: read_u64(bytes, 80),
            flags: read_u16(bytes, 88),
            path_separator: read_u16(bytes, 90),
            reserved1: read_u32(bytes, 92),
            samples_byte_nr: read_u32(bytes, 96),
            invalidation_bytes_nr: read_u32(bytes, 100),
        })
    }
}

impl ChannelGroupBlock {
    /// Channel group for `cycles_nr` records of `samples_byte_nr` bytes.
    pub fn new(cycles_nr: u64, samples_byte_nr: u32) -> Self {
        Self {
            cycles_nr,
            samples_byte_nr,
            ..Self::default()
        }
    }

    /// Serializes the ChannelGroupBlock to its 104-byte layout: six links,
    /// then record id, cycle count, flags, path separator, and the data and
    /// invalidation byte counts.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        validate_block_id(&self.header, "##CG")?;
        validate_block_length(&self.header, CG_BLOCK_SIZE as u64)?;

        let mut buffer = Vec::with_capacity(CG_BLOCK_SIZE);
        buffer.extend_from_slice(&self.header.to_bytes()?);

        for link in [
            self.next_cg_addr,
            self.first_ch_addr,
            self.acq_name_addr,
            self.acq_source_addr,
            self.first_sample_reduction_addr,
            self.comment_addr,
        ] {
            buffer.extend_from_slice(&link.to_le_bytes());
        }

        buffer.extend_from_slice(&self.record_id.to_le_bytes());
        buffer.extend_from_slice(&self.cycles_nr.to_le_bytes());
        buffer.extend_from_slice(&self.flags.to_le_bytes());
        buffer.extend_from_slice(&self.path_separator.to_le_bytes());
        buffer.extend_from_slice(&self.reserved1.to_le_bytes());
        buffer.extend_from_slice(&self.samples_byte_nr.to_le_bytes());
        buffer.extend_from_slice(&self.invalidation_bytes_nr.to_le_bytes());

        debug_assert_aligned(buffer.len());
        Ok(buffer)
    }
}

impl Default for ChannelGroupBlock {
    fn default() -> Self {
        ChannelGroupBlock {
            header: BlockHeader::new("##CG", CG_BLOCK_SIZE as u64, 6),
            next_cg_addr: 0,
            first_ch_addr: 0,
            acq_name_addr: 0,
            acq_source_addr: 0,
            first_sample_reduction_addr: 0,
            comment_addr: 0,
            record_id: 0,
            cycles_nr: 0,
            flags: 0,
            path_separator: 0,
            reserved1: 0,
            samples_byte_nr: 0,
            invalidation_bytes_nr: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_layout_fields() {
        let cg = ChannelGroupBlock {
            first_ch_addr: 0x240,
            acq_name_addr: 0x1a0,
            comment_addr: 0x1a0,
            invalidation_bytes_nr: 1,
            ..ChannelGroupBlock::new(1000, 13)
        };
        let bytes = cg.to_bytes().unwrap();
        assert_eq!(bytes.len(), CG_BLOCK_SIZE);
        let parsed = ChannelGroupBlock::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.first_ch_addr, 0x240);
        assert_eq!(parsed.acq_name_addr, 0x1a0);
        assert_eq!(parsed.comment_addr, 0x1a0);
        assert_eq!(parsed.cycles_nr, 1000);
        assert_eq!(parsed.samples_byte_nr, 13);
        assert_eq!(parsed.invalidation_bytes_nr, 1);
    }
}
