//! DZ Block - Compressed Data Block
//!
//! A `##DZ` block replaces a `##DT` (or any data-carrying block) with its
//! zlib-compressed payload. Inflating and deflating require the
//! `compression` feature; without it both report [`Error::CompressionError`].

use crate::{
    Error, Result,
    blocks::common::{
        BlockHeader, BlockParse, padding_to_align_8, read_u8, read_u32, read_u64, u64_to_usize,
        validate_buffer_size,
    },
};

/// DZ block header size (standard 24 + DZ-specific 24 = 48 bytes).
pub const DZ_HEADER_SIZE: usize = 48;

/// Compression algorithm used in a DZ block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DzCompressionType {
    /// Plain deflate (zlib stream).
    Deflate = 0,
    /// Byte transposition over `zip_parameter` columns, then deflate.
    TranspositionDeflate = 1,
}

impl DzCompressionType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Deflate),
            1 => Some(Self::TranspositionDeflate),
            _ => None,
        }
    }
}

/// Parsed `##DZ` block borrowing its compressed bytes.
///
/// Layout after the common header:
/// - 24..26 original block type (e.g. `DT`)
/// - 26 compression type, 27 reserved
/// - 28..32 zip parameter (column count for transposition)
/// - 32..40 original length, 40..48 compressed length
/// - 48.. compressed bytes
#[derive(Debug, Clone)]
pub struct DzBlock<'a> {
    pub header: BlockHeader,
    pub original_block_type: [u8; 2],
    pub zip_type: DzCompressionType,
    pub zip_parameter: u32,
    pub original_data_length: u64,
    pub compressed_data_length: u64,
    pub data: &'a [u8],
}

impl<'a> BlockParse<'a> for DzBlock<'a> {
    const ID: &'static str = "##DZ";

    fn from_bytes(bytes: &'a [u8]) -> Result<Self> {
        let header = Self::parse_header(bytes)?;
        validate_buffer_size(bytes, DZ_HEADER_SIZE)?;

        let zip_type_raw = read_u8(bytes, 26);
        let zip_type = DzCompressionType::from_u8(zip_type_raw).ok_or_else(|| {
            Error::CompressionError(format!("unknown DZ compression type {}", zip_type_raw))
        })?;
        let compressed_data_length = read_u64(bytes, 40);
        let data_end =
            DZ_HEADER_SIZE + u64_to_usize(compressed_data_length, "DZ compressed length")?;
        validate_buffer_size(bytes, data_end)?;

        Ok(Self {
            header,
            original_block_type: [bytes[24], bytes[25]],
            zip_type,
            zip_parameter: read_u32(bytes, 28),
            original_data_length: read_u64(bytes, 32),
            compressed_data_length,
            data: &bytes[DZ_HEADER_SIZE..data_end],
        })
    }
}

/// Reorders `data` from row-major records of `columns` bytes to column-major.
/// Bytes after the last whole row stay in place.
pub fn transpose(data: &[u8], columns: usize) -> Vec<u8> {
    if columns <= 1 {
        return data.to_vec();
    }
    let rows = data.len() / columns;
    let body = rows * columns;
    let mut out = Vec::with_capacity(data.len());
    for col in 0..columns {
        out.extend((0..rows).map(|row| data[row * columns + col]));
    }
    out.extend_from_slice(&data[body..]);
    out
}

/// Inverse of [`transpose`].
pub fn inverse_transpose(data: &[u8], columns: usize) -> Vec<u8> {
    if columns <= 1 {
        return data.to_vec();
    }
    let rows = data.len() / columns;
    let body = rows * columns;
    let mut out = vec![0u8; data.len()];
    for col in 0..columns {
        for row in 0..rows {
            out[row * columns + col] = data[col * rows + row];
        }
    }
    out[body..].copy_from_slice(&data[body..]);
    out
}

impl DzBlock<'_> {
    /// Inflates the payload and undoes the transposition if one was applied.
    #[cfg(feature = "compression")]
    pub fn decompress(&self) -> Result<Vec<u8>> {
        use miniz_oxide::inflate::decompress_to_vec_zlib;

        let inflated = decompress_to_vec_zlib(self.data)
            .map_err(|e| Error::CompressionError(format!("DZ inflate failed: {:?}", e)))?;

        if inflated.len() as u64 != self.original_data_length {
            return Err(Error::CompressionError(format!(
                "DZ inflated size mismatch: expected {}, got {}",
                self.original_data_length,
                inflated.len()
            )));
        }

        match self.zip_type {
            DzCompressionType::Deflate => Ok(inflated),
            DzCompressionType::TranspositionDeflate => {
                if self.zip_parameter == 0 {
                    return Err(Error::CompressionError(
                        "DZ transposition with zero columns".to_string(),
                    ));
                }
                Ok(inverse_transpose(&inflated, self.zip_parameter as usize))
            }
        }
    }

    #[cfg(not(feature = "compression"))]
    pub fn decompress(&self) -> Result<Vec<u8>> {
        Err(Error::CompressionError(
            "DZ blocks require the `compression` feature".to_string(),
        ))
    }

    /// Serializes `payload` as a complete `##DZ` block replacing a `##DT`,
    /// padded to 8 bytes. A `record_size` above 1 selects transposition over
    /// that many columns.
    #[cfg(feature = "compression")]
    pub fn encode(payload: &[u8], record_size: usize) -> Result<Vec<u8>> {
        use miniz_oxide::deflate::compress_to_vec_zlib;

        let (zip_type, zip_parameter, compressed) = if record_size > 1 {
            let transposed = transpose(payload, record_size);
            (
                DzCompressionType::TranspositionDeflate,
                record_size as u32,
                compress_to_vec_zlib(&transposed, 6),
            )
        } else {
            (
                DzCompressionType::Deflate,
                0,
                compress_to_vec_zlib(payload, 6),
            )
        };

        let unpadded = DZ_HEADER_SIZE + compressed.len();
        let header = BlockHeader::new("##DZ", unpadded as u64, 0);

        let mut buffer = Vec::with_capacity(unpadded + 8);
        buffer.extend_from_slice(&header.to_bytes()?);
        buffer.extend_from_slice(b"DT");
        buffer.push(zip_type as u8);
        buffer.push(0);
        buffer.extend_from_slice(&zip_parameter.to_le_bytes());
        buffer.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        buffer.extend_from_slice(&(compressed.len() as u64).to_le_bytes());
        buffer.extend_from_slice(&compressed);
        buffer.resize(unpadded + padding_to_align_8(unpadded), 0);
        Ok(buffer)
    }

    #[cfg(not(feature = "compression"))]
    pub fn encode(_payload: &[u8], _record_size: usize) -> Result<Vec<u8>> {
        Err(Error::CompressionError(
            "DZ blocks require the `compression` feature".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dz_header(zip_type: u8, zip_param: u32, original_len: u64, compressed_len: u64) -> Vec<u8> {
        let mut bytes = BlockHeader::new("##DZ", DZ_HEADER_SIZE as u64 + compressed_len, 0)
            .to_bytes()
            .unwrap();
        bytes.extend_from_slice(b"DT");
        bytes.push(zip_type);
        bytes.push(0);
        bytes.extend_from_slice(&zip_param.to_le_bytes());
        bytes.extend_from_slice(&original_len.to_le_bytes());
        bytes.extend_from_slice(&compressed_len.to_le_bytes());
        bytes
    }

    #[test]
    fn parse_header_fields() {
        let mut bytes = dz_header(1, 8, 64, 3);
        bytes.extend_from_slice(&[1, 2, 3]);
        let dz = DzBlock::from_bytes(&bytes).unwrap();
        assert_eq!(dz.original_block_type, *b"DT");
        assert_eq!(dz.zip_type, DzCompressionType::TranspositionDeflate);
        assert_eq!(dz.zip_parameter, 8);
        assert_eq!(dz.original_data_length, 64);
        assert_eq!(dz.data, &[1, 2, 3]);
    }

    #[test]
    fn unknown_zip_type_is_rejected() {
        let mut bytes = dz_header(99, 0, 0, 1);
        bytes.push(0);
        assert!(matches!(
            DzBlock::from_bytes(&bytes),
            Err(Error::CompressionError(_))
        ));
    }

    #[test]
    fn transposition_keeps_partial_row() {
        let data: Vec<u8> = (1..=10).collect();
        let transposed = transpose(&data, 4);
        assert_eq!(transposed, vec![1, 5, 2, 6, 3, 7, 4, 8, 9, 10]);
        assert_eq!(inverse_transpose(&transposed, 4), data);
    }

    #[cfg(feature = "compression")]
    #[test]
    fn encode_then_decompress() {
        let payload: Vec<u8> = (0..200u32).map(|v| (v % 13) as u8).collect();
        for record_size in [1, 8] {
            let bytes = DzBlock::encode(&payload, record_size).unwrap();
            assert_eq!(bytes.len() % 8, 0);
            let dz = DzBlock::from_bytes(&bytes).unwrap();
            assert_eq!(dz.decompress().unwrap(), payload);
        }
    }

    #[cfg(feature = "compression")]
    #[test]
    fn size_mismatch_is_reported() {
        use miniz_oxide::deflate::compress_to_vec_zlib;
        let compressed = compress_to_vec_zlib(b"test", 6);
        let mut bytes = dz_header(0, 0, 100, compressed.len() as u64);
        bytes.extend_from_slice(&compressed);
        let dz = DzBlock::from_bytes(&bytes).unwrap();
        assert!(matches!(dz.decompress(), Err(Error::CompressionError(_))));
    }
}
