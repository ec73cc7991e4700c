use crate::{
    Error, Result,
    blocks::common::{
        BLOCK_HEADER_SIZE, BlockHeader, BlockParse, read_u8, read_u32, read_u64,
        validate_buffer_size,
    },
};

/// Data List Block (##DL): an ordered list of `##DT`/`##DZ` fragments whose
/// payloads concatenate to the group's record stream.
///
/// Lists chain through `next`; a reader follows the chain until it is 0.
#[derive(Debug, Clone)]
pub struct DataListBlock {
    pub header: BlockHeader,
    pub next: u64,
    pub data_links: Vec<u64>,
    /// Bit 0: all fragments have `data_block_len` payload bytes.
    pub flags: u8,
    pub data_block_nr: u32,
    pub data_block_len: Option<u64>,
    pub offsets: Option<Vec<u64>>,
}

impl BlockParse<'_> for DataListBlock {
    const ID: &'static str = "##DL";

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let header = Self::parse_header(bytes)?;
        let link_count = header.link_count as usize;
        if link_count == 0 {
            return Err(Error::InconsistentCount {
                block: "##DL",
                declared: 0,
                found: 1,
            });
        }

        let mut off = BLOCK_HEADER_SIZE;
        validate_buffer_size(bytes, off + link_count * 8 + 8)?;

        let next = read_u64(bytes, off);
        off += 8;
        let data_links: Vec<u64> = (1..link_count)
            .map(|i| read_u64(bytes, off + (i - 1) * 8))
            .collect();
        off += (link_count - 1) * 8;

        let flags = read_u8(bytes, off);
        let data_block_nr = read_u32(bytes, off + 4);
        off += 8;

        if data_block_nr as usize != data_links.len() {
            return Err(Error::InconsistentCount {
                block: "##DL",
                declared: data_block_nr as usize,
                found: data_links.len(),
            });
        }

        let (data_block_len, offsets) = if flags & 1 != 0 {
            validate_buffer_size(bytes, off + 8)?;
            (Some(read_u64(bytes, off)), None)
        } else {
            validate_buffer_size(bytes, off + data_links.len() * 8)?;
            let offsets = (0..data_links.len())
                .map(|i| read_u64(bytes, off + i * 8))
                .collect();
            (None, Some(offsets))
        };

        Ok(Self {
            header,
            next,
            data_links,
            flags,
            data_block_nr,
            data_block_len,
            offsets,
        })
    }
}

impl DataListBlock {
    /// A single list over fragments that each carry `data_block_len` bytes.
    pub fn new_equal(data_links: Vec<u64>, data_block_len: u64) -> Self {
        let link_count = data_links.len() as u64 + 1;
        let length = BLOCK_HEADER_SIZE as u64 + link_count * 8 + 8 + 8;
        Self {
            header: BlockHeader::new("##DL", length, link_count),
            next: 0,
            data_block_nr: data_links.len() as u32,
            data_links,
            flags: 1,
            data_block_len: Some(data_block_len),
            offsets: None,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let link_count = self.data_links.len() as u64 + 1;
        let tail = if self.flags & 1 != 0 {
            8
        } else {
            self.data_links.len() * 8
        };
        let length = BLOCK_HEADER_SIZE as u64 + link_count * 8 + 8 + tail as u64;

        if self.header.id != "##DL" {
            return Err(Error::BlockSerializationError(format!(
                "DataListBlock must have ID '##DL', found '{}'",
                self.header.id
            )));
        }
        if self.header.link_count != link_count || self.header.length != length {
            return Err(Error::BlockSerializationError(format!(
                "DataListBlock header ({} links, {} bytes) does not match content ({} links, {} bytes)",
                self.header.link_count, self.header.length, link_count, length
            )));
        }

        let mut buffer = Vec::with_capacity(length as usize);
        buffer.extend_from_slice(&self.header.to_bytes()?);
        buffer.extend_from_slice(&self.next.to_le_bytes());
        for link in &self.data_links {
            buffer.extend_from_slice(&link.to_le_bytes());
        }
        buffer.push(self.flags);
        buffer.extend_from_slice(&[0u8; 3]);
        buffer.extend_from_slice(&(self.data_links.len() as u32).to_le_bytes());
        if self.flags & 1 != 0 {
            buffer.extend_from_slice(&self.data_block_len.unwrap_or(0).to_le_bytes());
        } else {
            let offsets = self.offsets.as_deref().unwrap_or(&[]);
            for i in 0..self.data_links.len() {
                let offset = offsets.get(i).copied().unwrap_or(0);
                buffer.extend_from_slice(&offset.to_le_bytes());
            }
        }
        Ok(buffer)
    }
}
