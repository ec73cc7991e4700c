// identification_block.rs
use super::ID_BLOCK_SIZE;
use crate::{
    Error, Result,
    blocks::common::{debug_assert_aligned, read_u16, validate_buffer_size},
};

/// Oldest format version this crate reads (4.00).
const MIN_VERSION: u16 = 400;

/// Identification Block - file format identifier at the start of every MDF file.
///
/// The identification block is always located at file offset 0 and carries
/// the human readable version string plus its numeric form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentificationBlock {
    /// File identifier string ("MDF     " or "UnFinMF ").
    pub file_id: String,
    /// Format version string (e.g., "4.10    ").
    pub format_version: String,
    /// Program identifier string (tool that created the file).
    pub program_id: String,
    /// Numeric version (e.g., 410 for version 4.10).
    pub version_number: u16,
    /// Standard unfinalized flags.
    pub unfinalized_flags: u16,
    /// Custom unfinalized flags (vendor-specific).
    pub custom_flags: u16,
}

impl Default for IdentificationBlock {
    fn default() -> Self {
        Self {
            file_id: String::from("MDF     "),
            format_version: String::from("4.10    "),
            program_id: String::from("mdf4mdl "),
            version_number: 410,
            unfinalized_flags: 0,
            custom_flags: 0,
        }
    }
}

impl IdentificationBlock {
    /// Build an identification block for a new file.
    ///
    /// `version` is the dotted version ("4.10"); it must be 4.00 or later.
    pub fn new(version: &str, program_id: &str) -> Result<Self> {
        let (major, minor) = Self::parse_block_version(version.as_bytes())?;
        let version_number = major * 100 + minor;
        if version_number < MIN_VERSION {
            return Err(Error::FileVersioningError(version.to_string()));
        }
        Ok(Self {
            format_version: version.to_string(),
            program_id: program_id.to_string(),
            version_number,
            ..Self::default()
        })
    }

    /// Version string with padding removed, e.g. `"4.10"`.
    pub fn version(&self) -> &str {
        self.format_version.trim_end_matches('\0').trim()
    }

    /// Copy `source` into `target`, truncating or space padding as needed.
    fn copy_string_with_padding(source: &str, target: &mut [u8]) {
        let src_bytes = source.as_bytes();
        let copy_len = core::cmp::min(src_bytes.len(), target.len());
        target[..copy_len].copy_from_slice(&src_bytes[..copy_len]);
        for byte in target.iter_mut().skip(copy_len) {
            *byte = b' ';
        }
    }

    /// Serializes the IdentificationBlock to its fixed 64-byte layout:
    /// file id, version string and program id (8 bytes each), 4 reserved bytes,
    /// the numeric version, 30 reserved bytes, then the two flag words.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::with_capacity(ID_BLOCK_SIZE);

        for field in [&self.file_id, &self.format_version, &self.program_id] {
            let mut raw = [0u8; 8];
            Self::copy_string_with_padding(field, &mut raw);
            buffer.extend_from_slice(&raw);
        }

        buffer.extend_from_slice(&[0u8; 4]);
        buffer.extend_from_slice(&self.version_number.to_le_bytes());
        buffer.extend_from_slice(&[0u8; 30]);
        buffer.extend_from_slice(&self.unfinalized_flags.to_le_bytes());
        buffer.extend_from_slice(&self.custom_flags.to_le_bytes());

        debug_assert_aligned(buffer.len());
        Ok(buffer)
    }

    /// Parses an identification block from a 64 byte slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        validate_buffer_size(bytes, ID_BLOCK_SIZE)?;

        let file_id = String::from_utf8_lossy(&bytes[0..8]).into_owned();
        if file_id != "MDF     " && file_id != "UnFinMF " {
            return Err(Error::FileIdentifierError(file_id));
        }

        let (major, minor) = Self::parse_block_version(&bytes[8..16])?;
        let version_number = major * 100 + minor;
        if version_number < MIN_VERSION {
            return Err(Error::FileVersioningError(version_number.to_string()));
        }

        Ok(Self {
            file_id,
            format_version: String::from_utf8_lossy(&bytes[8..16]).into_owned(),
            program_id: String::from_utf8_lossy(&bytes[16..24]).into_owned(),
            version_number: read_u16(bytes, 28),
            unfinalized_flags: read_u16(bytes, 60),
            custom_flags: read_u16(bytes, 62),
        })
    }

    /// Parse the textual version stored in the identification block.
    ///
    /// # Arguments
    /// * `bytes` - Up to eight bytes containing the version string, e.g. `"4.10\0"`.
    ///
    /// # Returns
    /// `(major, minor)` on success or an [`Error`] when the format is
    /// unexpected.
    pub fn parse_block_version(bytes: &[u8]) -> Result<(u16, u16)> {
        let raw = core::str::from_utf8(bytes)
            .map_err(|_| Error::InvalidVersionString("Invalid UTF-8".to_string()))?;

        let s = raw.trim_end_matches(char::from(0)).trim();
        let mut parts = s.split('.');
        let maj = parts
            .next()
            .ok_or_else(|| Error::InvalidVersionString("Missing major version".to_string()))?
            .parse::<u16>()
            .map_err(|_| Error::InvalidVersionString(format!("Invalid major version in {s:?}")))?;
        let min = parts
            .next()
            .unwrap_or("0")
            .parse::<u16>()
            .map_err(|_| Error::InvalidVersionString(format!("Invalid minor version in {s:?}")))?;
        Ok((maj, min))
    }
}
