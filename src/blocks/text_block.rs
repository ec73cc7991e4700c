use crate::{
    Error, Result,
    blocks::common::{
        BLOCK_HEADER_SIZE, BlockHeader, debug_assert_aligned, padding_to_align_8,
        u64_to_usize, validate_buffer_size,
    },
};

const TEXT_ID: &str = "##TX";
const METADATA_ID: &str = "##MD";

/// Text (`##TX`) or metadata (`##MD`) block.
///
/// Both carry a null-terminated UTF-8 string padded to an 8-byte boundary;
/// metadata blocks hold XML. The pair (content, is-metadata) is the identity
/// used when identical texts are shared between owners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub header: BlockHeader,
    pub text: String,
}

impl TextBlock {
    /// Creates a plain `##TX` block holding `text`.
    pub fn new(text: &str) -> Self {
        Self::with_id(TEXT_ID, text)
    }

    /// Creates a `##MD` block holding the XML fragment `xml`.
    pub fn metadata(xml: &str) -> Self {
        Self::with_id(METADATA_ID, xml)
    }

    fn with_id(id: &str, text: &str) -> Self {
        let unpadded_size = BLOCK_HEADER_SIZE + text.len() + 1;
        let block_len = unpadded_size + padding_to_align_8(unpadded_size);
        TextBlock {
            header: BlockHeader::new(id, block_len as u64, 0),
            text: text.to_string(),
        }
    }

    /// True when this is an `##MD` block.
    pub fn is_metadata(&self) -> bool {
        self.header.id == METADATA_ID
    }

    /// Parses either a `##TX` or a `##MD` block.
    ///
    /// Trailing NUL padding is removed from the content.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let header = BlockHeader::from_bytes(bytes)?;
        if header.id != TEXT_ID && header.id != METADATA_ID {
            return Err(Error::BlockIDError {
                actual: header.id,
                expected: "##TX / ##MD".to_string(),
            });
        }

        let total = u64_to_usize(header.length, "text block length")?;
        validate_buffer_size(bytes, total)?;
        let data = &bytes[BLOCK_HEADER_SIZE.min(total)..total];

        let text = String::from_utf8_lossy(data)
            .trim_end_matches('\0')
            .to_string();

        Ok(Self { header, text })
    }

    /// Serializes the block: header, text bytes, NUL terminator, zero padding.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.header.id != TEXT_ID && self.header.id != METADATA_ID {
            return Err(Error::BlockSerializationError(format!(
                "TextBlock must have ID '##TX' or '##MD', found '{}'",
                self.header.id
            )));
        }

        let unpadded_size = BLOCK_HEADER_SIZE + self.text.len() + 1;
        let total_size = unpadded_size + padding_to_align_8(unpadded_size);
        if self.header.length as usize != total_size {
            return Err(Error::BlockSerializationError(format!(
                "TextBlock header length ({}) does not match calculated size ({})",
                self.header.length, total_size
            )));
        }

        let mut buffer = Vec::with_capacity(total_size);
        buffer.extend_from_slice(&self.header.to_bytes()?);
        buffer.extend_from_slice(self.text.as_bytes());
        buffer.resize(total_size, 0);

        debug_assert_aligned(buffer.len());
        Ok(buffer)
    }
}

impl Default for TextBlock {
    fn default() -> Self {
        Self::new("")
    }
}
