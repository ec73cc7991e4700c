//! File History Block (##FH) - one entry of the file's change log.
//!
//! Each save appends an entry recording when the file was written; the
//! entry's comment is an `##MD` block naming the tool.

use super::FH_BLOCK_SIZE;
use crate::{
    Result,
    blocks::common::{
        BlockHeader, BlockParse, debug_assert_aligned, read_i16, read_u8, read_u64,
        validate_block_id, validate_buffer_size,
    },
};

/// Current system time in nanoseconds since the Unix epoch (0 if the clock is
/// before the epoch).
pub(crate) fn now_ns() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// File History Block (##FH).
///
/// History blocks form a singly linked list starting from the header block's
/// `file_history_addr`; the last entry has `next_fh_addr == 0`.
#[derive(Debug, Clone)]
pub struct FileHistoryBlock {
    /// Standard block header.
    pub header: BlockHeader,
    /// Link to next file history block (0 = end of list).
    pub next_fh_addr: u64,
    /// Link to MD block containing tool info and comment.
    pub comment_addr: u64,
    /// Absolute time of modification in nanoseconds since Jan 1, 1970 (UTC).
    pub time_ns: u64,
    /// Timezone offset from UTC in minutes.
    pub tz_offset_min: i16,
    /// Daylight saving time offset in minutes.
    pub dst_offset_min: i16,
    /// Time flags (bit 0 local time, bit 1 offsets valid).
    pub time_flags: u8,
}

impl BlockParse<'_> for FileHistoryBlock {
    const ID: &'static str = "##FH";

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let header = Self::parse_header(bytes)?;
        validate_buffer_size(bytes, FH_BLOCK_SIZE)?;

        Ok(Self {
            header,
            next_fh_addr: read_u64(bytes, 24),
            comment_addr: read_u64(bytes, 32),
            time_ns: read_u64(bytes, 40),
            tz_offset_min: read_i16(bytes, 48),
            dst_offset_min: read_i16(bytes, 50),
            time_flags: read_u8(bytes, 52),
        })
    }
}

impl FileHistoryBlock {
    /// Creates a new FileHistoryBlock with the given timestamp.
    pub fn new(time_ns: u64) -> Self {
        Self {
            header: BlockHeader::new("##FH", FH_BLOCK_SIZE as u64, 2),
            next_fh_addr: 0,
            comment_addr: 0,
            time_ns,
            tz_offset_min: 0,
            dst_offset_min: 0,
            time_flags: 0,
        }
    }

    /// Creates a new FileHistoryBlock with the current system time.
    pub fn now() -> Self {
        Self::new(now_ns())
    }

    /// Serializes the FileHistoryBlock to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        validate_block_id(&self.header, "##FH")?;

        let mut buffer = Vec::with_capacity(FH_BLOCK_SIZE);
        buffer.extend_from_slice(&self.header.to_bytes()?);
        buffer.extend_from_slice(&self.next_fh_addr.to_le_bytes());
        buffer.extend_from_slice(&self.comment_addr.to_le_bytes());
        buffer.extend_from_slice(&self.time_ns.to_le_bytes());
        buffer.extend_from_slice(&self.tz_offset_min.to_le_bytes());
        buffer.extend_from_slice(&self.dst_offset_min.to_le_bytes());
        buffer.push(self.time_flags);
        buffer.extend_from_slice(&[0u8; 3]); // reserved

        debug_assert_aligned(buffer.len());
        Ok(buffer)
    }
}

impl Default for FileHistoryBlock {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let original = FileHistoryBlock {
            next_fh_addr: 0x1000,
            comment_addr: 0x2000,
            time_ns: 1_704_067_200_000_000_000,
            tz_offset_min: 60,
            dst_offset_min: 60,
            time_flags: 0x03,
            ..FileHistoryBlock::default()
        };

        let bytes = original.to_bytes().unwrap();
        assert_eq!(bytes.len(), FH_BLOCK_SIZE);

        let parsed = FileHistoryBlock::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.next_fh_addr, original.next_fh_addr);
        assert_eq!(parsed.comment_addr, original.comment_addr);
        assert_eq!(parsed.time_ns, original.time_ns);
        assert_eq!(parsed.tz_offset_min, original.tz_offset_min);
        assert_eq!(parsed.dst_offset_min, original.dst_offset_min);
        assert_eq!(parsed.time_flags, original.time_flags);
    }

    #[test]
    fn now_is_after_epoch() {
        assert!(FileHistoryBlock::now().time_ns > 0);
    }
}
