use super::types::ConversionType;
use crate::blocks::common::{
    BLOCK_HEADER_SIZE, BlockHeader, BlockParse, read_f64, read_u8, read_u16, read_u64,
    validate_buffer_size,
};
use crate::{Error, Result};

/// Number of fixed links (name, unit, comment, inverse) before `refs`.
const FIXED_LINKS: usize = 4;

/// Bit 1 of `flags`: the physical range fields are valid.
pub const CC_FLAG_PHYSICAL_RANGE: u16 = 0b10;

/// A table length as the block's 16-bit count field.
pub(crate) fn table_count(len: usize, what: &str) -> Result<u16> {
    u16::try_from(len).map_err(|_| {
        Error::BlockSerializationError(format!(
            "conversion table has {len} {what}, at most {} fit in ##CC",
            u16::MAX
        ))
    })
}

/// Conversion Block (##CC) exactly as stored on disk.
///
/// `refs` holds the kind-specific links (table texts, formula, default);
/// `values` the kind-specific parameters. The typed view lives in
/// [`ChannelConversion`](super::ChannelConversion).
#[derive(Debug, Clone)]
pub struct ConversionBlock {
    pub header: BlockHeader,

    pub name_addr: u64,
    pub unit_addr: u64,
    pub comment_addr: u64,
    pub inverse_addr: u64,
    pub refs: Vec<u64>,

    pub conversion_type: ConversionType,
    pub precision: u8,
    pub flags: u16,
    pub ref_count: u16,
    pub value_count: u16,
    pub phys_range_min: f64,
    pub phys_range_max: f64,
    pub values: Vec<f64>,
}

impl BlockParse<'_> for ConversionBlock {
    const ID: &'static str = "##CC";

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let header = Self::parse_header(bytes)?;
        let link_count = header.link_count as usize;
        if link_count < FIXED_LINKS {
            return Err(Error::InconsistentCount {
                block: "##CC",
                declared: link_count,
                found: FIXED_LINKS,
            });
        }

        let data_start = BLOCK_HEADER_SIZE + link_count * 8;
        validate_buffer_size(bytes, data_start + 8)?;

        let link = |i: usize| read_u64(bytes, BLOCK_HEADER_SIZE + i * 8);
        let refs: Vec<u64> = (FIXED_LINKS..link_count).map(link).collect();

        let conversion_type = ConversionType::from_u8(read_u8(bytes, data_start));
        let precision = read_u8(bytes, data_start + 1);
        let flags = read_u16(bytes, data_start + 2);
        let ref_count = read_u16(bytes, data_start + 4);
        let value_count = read_u16(bytes, data_start + 6);

        // Some writers omit the range pair; its presence is detected from the
        // declared block length rather than from the flag.
        let mut offset = data_start + 8;
        let without_range = offset + value_count as usize * 8;
        let has_range = header.length as usize >= without_range + 16;
        let (phys_range_min, phys_range_max) = if has_range {
            validate_buffer_size(bytes, offset + 16)?;
            let range = (read_f64(bytes, offset), read_f64(bytes, offset + 8));
            offset += 16;
            range
        } else {
            (0.0, 0.0)
        };

        validate_buffer_size(bytes, offset + value_count as usize * 8)?;
        let values = (0..value_count as usize)
            .map(|i| read_f64(bytes, offset + i * 8))
            .collect();

        Ok(Self {
            header,
            name_addr: link(0),
            unit_addr: link(1),
            comment_addr: link(2),
            inverse_addr: link(3),
            refs,
            conversion_type,
            precision,
            flags,
            ref_count,
            value_count,
            phys_range_min,
            phys_range_max,
            values,
        })
    }
}

impl ConversionBlock {
    /// Empty block of the given kind; counts are fixed up by [`to_bytes`](Self::to_bytes).
    pub fn new(conversion_type: ConversionType) -> Self {
        Self {
            header: BlockHeader::new("##CC", 0, FIXED_LINKS as u64),
            name_addr: 0,
            unit_addr: 0,
            comment_addr: 0,
            inverse_addr: 0,
            refs: Vec::new(),
            conversion_type,
            precision: 0,
            flags: 0,
            ref_count: 0,
            value_count: 0,
            phys_range_min: 0.0,
            phys_range_max: 0.0,
            values: Vec::new(),
        }
    }

    /// Physical range if the flag marks it valid.
    pub fn physical_range(&self) -> Option<(f64, f64)> {
        (self.flags & CC_FLAG_PHYSICAL_RANGE != 0).then_some((self.phys_range_min, self.phys_range_max))
    }

    /// Serialized size: header, links, 8 bytes of type/count fields, the
    /// range pair and the values.
    pub fn byte_len(&self) -> usize {
        BLOCK_HEADER_SIZE + (FIXED_LINKS + self.refs.len()) * 8 + 8 + 16 + self.values.len() * 8
    }

    /// Serializes the block. Link count, ref count, value count and length
    /// are derived from `refs` and `values`; the range pair is always written.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.header.id != "##CC" {
            return Err(Error::BlockSerializationError(format!(
                "ConversionBlock must have ID '##CC', found '{}'",
                self.header.id
            )));
        }
        let ref_count = table_count(self.refs.len(), "references")?;
        let value_count = table_count(self.values.len(), "values")?;
        let size = self.byte_len();
        let mut header = self.header.clone();
        header.link_count = (FIXED_LINKS + self.refs.len()) as u64;
        header.length = size as u64;

        let mut buffer = Vec::with_capacity(size);
        buffer.extend_from_slice(&header.to_bytes()?);
        for link in [
            self.name_addr,
            self.unit_addr,
            self.comment_addr,
            self.inverse_addr,
        ]
        .iter()
        .chain(self.refs.iter())
        {
            buffer.extend_from_slice(&link.to_le_bytes());
        }
        buffer.push(self.conversion_type.to_u8());
        buffer.push(self.precision);
        buffer.extend_from_slice(&self.flags.to_le_bytes());
        buffer.extend_from_slice(&ref_count.to_le_bytes());
        buffer.extend_from_slice(&value_count.to_le_bytes());
        buffer.extend_from_slice(&self.phys_range_min.to_le_bytes());
        buffer.extend_from_slice(&self.phys_range_max.to_le_bytes());
        for v in &self.values {
            buffer.extend_from_slice(&v.to_le_bytes());
        }

        if buffer.len() != size {
            return Err(Error::BlockSerializationError(format!(
                "ConversionBlock expected size {size} but wrote {}",
                buffer.len()
            )));
        }
        Ok(buffer)
    }
}
