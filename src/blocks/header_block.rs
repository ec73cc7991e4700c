// src/blocks/header_block.rs
use super::HD_BLOCK_SIZE;
use crate::{
    Result,
    blocks::common::{
        BlockHeader, BlockParse, debug_assert_aligned, read_i16, read_u8, read_u64,
        validate_block_id, validate_block_length, validate_buffer_size,
    },
};

/// Header Block (##HD) - file level singleton following the identification block.
///
/// Owns the head pointers of the data group chain and the file history chain.
#[derive(Debug, Clone)]
pub struct HeaderBlock {
    pub header: BlockHeader,        // Common header from the first 24 bytes
    pub first_dg_addr: u64,         // bytes[24..32]
    pub file_history_addr: u64,     // bytes[32..40]
    pub channel_tree_addr: u64,     // bytes[40..48]
    pub first_attachment_addr: u64, // bytes[48..56]
    pub first_event_addr: u64,      // bytes[56..64]
    pub comment_addr: u64,          // bytes[64..72]
    pub abs_time: u64,              // bytes[72..80]
    pub tz_offset: i16,             // bytes[80..82]
    pub daylight_save_time: i16,    // bytes[82..84]
    pub time_flags: u8,             // byte[84]
    pub time_quality: u8,           // byte[85]
    pub flags: u8,                  // byte[86]
    pub reserved1: u8,              // byte[87]
    pub start_angle: u64,           // bytes[88..96]
    pub start_distance: u64,        // bytes[96..104]
}

impl HeaderBlock {
    /// Header stamped with the current system time.
    pub fn now() -> Self {
        Self {
            abs_time: super::file_history_block::now_ns(),
            ..Self::default()
        }
    }

    /// Serializes the HeaderBlock to its 104-byte layout.
    ///
    /// Links other than the data group, file history and comment heads are
    /// written as stored; this crate never produces channel trees,
    /// attachments or events, so they are normally 0.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        validate_block_id(&self.header, "##HD")?;
        validate_block_length(&self.header, HD_BLOCK_SIZE as u64)?;

        let mut buffer = Vec::with_capacity(HD_BLOCK_SIZE);
        buffer.extend_from_slice(&self.header.to_bytes()?);

        for link in [
            self.first_dg_addr,
            self.file_history_addr,
            self.channel_tree_addr,
            self.first_attachment_addr,
            self.first_event_addr,
            self.comment_addr,
        ] {
            buffer.extend_from_slice(&link.to_le_bytes());
        }

        buffer.extend_from_slice(&self.abs_time.to_le_bytes());
        buffer.extend_from_slice(&self.tz_offset.to_le_bytes());
        buffer.extend_from_slice(&self.daylight_save_time.to_le_bytes());
        buffer.push(self.time_flags);
        buffer.push(self.time_quality);
        buffer.push(self.flags);
        buffer.push(self.reserved1);
        buffer.extend_from_slice(&self.start_angle.to_le_bytes());
        buffer.extend_from_slice(&self.start_distance.to_le_bytes());

        debug_assert_aligned(buffer.len());
        Ok(buffer)
    }
}

impl BlockParse<'_> for HeaderBlock {
    const ID: &'static str = "##HD";

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let header = Self::parse_header(bytes)?;
        validate_buffer_size(bytes, HD_BLOCK_SIZE)?;

        Ok(Self {
            header,
            first_dg_addr: read_u64(bytes, 24),
            file_history_addr: read_u64(bytes, 32),
            channel_tree_addr: read_u64(bytes, 40),
            first_attachment_addr: read_u64(bytes, 48),
            first_event_addr: read_u64(bytes, 56),
            comment_addr: read_u64(bytes, 64),
            abs_time: read_u64(bytes, 72),
            tz_offset: read_i16(bytes, 80),
            daylight_save_time: read_i16(bytes, 82),
            time_flags: read_u8(bytes, 84),
            time_quality: read_u8(bytes, 85),
            flags: read_u8(bytes, 86),
            reserved1: read_u8(bytes, 87),
            start_angle: read_u64(bytes, 88),
            start_distance: read_u64(bytes, 96),
        })
    }
}

impl Default for HeaderBlock {
    fn default() -> Self {
        HeaderBlock {
            header: BlockHeader::new("##HD", HD_BLOCK_SIZE as u64, 6),
            first_dg_addr: 0,
            file_history_addr: 0,
            channel_tree_addr: 0,
            first_attachment_addr: 0,
            first_event_addr: 0,
            comment_addr: 0,
            abs_time: 0,
            tz_offset: 0,
            daylight_save_time: 0,
            time_flags: 0,
            time_quality: 0,
            flags: 0,
            reserved1: 0,
            start_angle: 0,
            start_distance: 0,
        }
    }
}
