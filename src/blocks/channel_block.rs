use super::CN_BLOCK_SIZE;
use crate::{
    Result,
    blocks::common::{
        BlockHeader, BlockParse, DataType, debug_assert_aligned, read_f64, read_u8, read_u16,
        read_u32, read_u64, validate_block_id, validate_block_length, validate_buffer_size,
    },
};

/// Role of a channel inside its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ChannelType {
    /// 0: ordinary signal channel.
    Value,
    /// 2: time base stored in the record.
    Master,
    /// 3: time base synthesized from the record index and the conversion.
    VirtualMaster,
    /// Any other code (variable length, sync, max length...), kept as read.
    Other(u8),
}

impl ChannelType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => ChannelType::Value,
            2 => ChannelType::Master,
            3 => ChannelType::VirtualMaster,
            other => ChannelType::Other(other),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            ChannelType::Value => 0,
            ChannelType::Master => 2,
            ChannelType::VirtualMaster => 3,
            ChannelType::Other(code) => code,
        }
    }

    /// True for the two time-base kinds.
    pub fn is_master(self) -> bool {
        matches!(self, ChannelType::Master | ChannelType::VirtualMaster)
    }
}

/// Channel Block (##CN) - one signal definition.
///
/// Link fields hold the addresses read from disk; the writer replaces them
/// with freshly allocated addresses on every save.
#[derive(Debug, Clone)]
pub struct ChannelBlock {
    pub header: BlockHeader,
    pub next_ch_addr: u64,
    pub component_addr: u64,
    pub name_addr: u64,
    pub source_addr: u64,
    pub conversion_addr: u64,
    pub data_addr: u64,
    pub unit_addr: u64,
    pub comment_addr: u64,
    pub channel_type: ChannelType,
    pub sync_type: u8,
    pub data_type: DataType,
    pub bit_offset: u8,
    pub byte_offset: u32,
    pub bit_count: u32,
    pub flags: u32,
    pub pos_invalidation_bit: u32,
    pub precision: u8,
    pub reserved1: u8,
    pub attachment_count: u16,
    pub min_raw_value: f64,
    pub max_raw_value: f64,
    pub lower_limit: f64,
    pub upper_limit: f64,
    pub lower_ext_limit: f64,
    pub upper_ext_limit: f64,
}

impl BlockParse<'_> for ChannelBlock {
    const ID: &'static str = "##CN";

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let header = Self::parse_header(bytes)?;
        validate_buffer_size(bytes, CN_BLOCK_SIZE)?;

        Ok(Self {
            header,
            // Links section (8 x u64 at offset 24)
            next_ch_addr: read_u64(bytes, 24),
            component_addr: read_u64(bytes, 32),
            name_addr: read_u64(bytes, 40),
            source_addr: read_u64(bytes, 48),
            conversion_addr: read_u64(bytes, 56),
            data_addr: read_u64(bytes, 64),
            unit_addr: read_u64(bytes, 72),
            comment_addr: read_u64(bytes, 80),
            // Format section at offset 88
            channel_type: ChannelType::from_u8(read_u8(bytes, 88)),
            sync_type: read_u8(bytes, 89),
            data_type: DataType::from_u8(read_u8(bytes, 90)),
            bit_offset: read_u8(bytes, 91),
            byte_offset: read_u32(bytes, 92),
            bit_count: read_u32(bytes, 96),
            flags: read_u32(bytes, 100),
            pos_invalidation_bit: read_u32(bytes, 104),
            precision: read_u8(bytes, 108),
            reserved1: read_u8(bytes, 109),
            attachment_count: read_u16(bytes, 110),
            // Range section (6 x f64 at offset 112)
            min_raw_value: read_f64(bytes, 112),
            max_raw_value: read_f64(bytes, 120),
            lower_limit: read_f64(bytes, 128),
            upper_limit: read_f64(bytes, 136),
            lower_ext_limit: read_f64(bytes, 144),
            upper_ext_limit: read_f64(bytes, 152),
        })
    }
}

impl ChannelBlock {
    /// Number of whole bytes the channel occupies inside a record.
    pub fn byte_width(&self) -> usize {
        (self.bit_offset as usize + self.bit_count as usize).div_ceil(8)
    }

    /// Set raw value range and limits to the same `[min, max]` interval.
    pub fn set_range(&mut self, min: f64, max: f64) {
        self.min_raw_value = min;
        self.max_raw_value = max;
        self.lower_limit = min;
        self.upper_limit = max;
    }

    /// Serializes the ChannelBlock to its fixed 160-byte layout.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        validate_block_id(&self.header, "##CN")?;
        validate_block_length(&self.header, CN_BLOCK_SIZE as u64)?;

        let mut buffer = Vec::with_capacity(CN_BLOCK_SIZE);
        buffer.extend_from_slice(&self.header.to_bytes()?);

        for link in [
            self.next_ch_addr,
            self.component_addr,
            self.name_addr,
            self.source_addr,
            self.conversion_addr,
            self.data_addr,
            self.unit_addr,
            self.comment_addr,
        ] {
            buffer.extend_from_slice(&link.to_le_bytes());
        }

        buffer.push(self.channel_type.to_u8());
        buffer.push(self.sync_type);
        buffer.push(self.data_type.to_u8());
        buffer.push(self.bit_offset);
        buffer.extend_from_slice(&self.byte_offset.to_le_bytes());
        buffer.extend_from_slice(&self.bit_count.to_le_bytes());
        buffer.extend_from_slice(&self.flags.to_le_bytes());
        buffer.extend_from_slice(&self.pos_invalidation_bit.to_le_bytes());
        buffer.push(self.precision);
        buffer.push(self.reserved1);
        buffer.extend_from_slice(&self.attachment_count.to_le_bytes());

        for value in [
            self.min_raw_value,
            self.max_raw_value,
            self.lower_limit,
            self.upper_limit,
            self.lower_ext_limit,
            self.upper_ext_limit,
        ] {
            buffer.extend_from_slice(&value.to_le_bytes());
        }

        debug_assert_aligned(buffer.len());
        Ok(buffer)
    }
}

impl Default for ChannelBlock {
    fn default() -> Self {
        Self {
            header: BlockHeader::new("##CN", CN_BLOCK_SIZE as u64, 8),
            next_ch_addr: 0,
            component_addr: 0,
            name_addr: 0,
            source_addr: 0,
            conversion_addr: 0,
            data_addr: 0,
            unit_addr: 0,
            comment_addr: 0,
            channel_type: ChannelType::Value,
            sync_type: 0,
            data_type: DataType::UnsignedIntegerLE,
            bit_offset: 0,
            byte_offset: 0,
            bit_count: 0,
            flags: 0,
            pos_invalidation_bit: 0,
            precision: 0,
            reserved1: 0,
            attachment_count: 0,
            min_raw_value: 0.0,
            max_raw_value: 0.0,
            lower_limit: 0.0,
            upper_limit: 0.0,
            lower_ext_limit: 0.0,
            upper_ext_limit: 0.0,
        }
    }
}
