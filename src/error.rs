//! Error types for MDF4 model operations.
//!
//! This module defines the [`Error`] enum which represents every failure that
//! can occur while reading, building, converting or writing a measurement
//! file, and [`ErrorKind`], a coarse classification callers can match on.
//!
//! # Example
//!
//! ```no_run
//! use mdf4_model::{Error, ErrorKind, Mdf, Result};
//!
//! fn print_channel(path: &str, name: &str) -> Result<()> {
//!     let mdf = Mdf::open(path)?;
//!     match mdf.get(name, None) {
//!         Ok(signal) => println!("{} samples", signal.samples.len()),
//!         Err(e) if e.kind() == ErrorKind::NotFound => println!("no channel {name}"),
//!         Err(e) => return Err(e),
//!     }
//!     Ok(())
//! }
//! ```

use core::fmt;

use crate::blocks::DataType;

/// Errors that can occur during MDF model operations.
#[derive(Debug)]
pub enum Error {
    /// Buffer provided for parsing was too small.
    ///
    /// This typically indicates a truncated file or a corrupt block length.
    TooShortBuffer {
        /// Actual number of bytes available
        actual: usize,
        /// Minimum number of bytes required
        expected: usize,
        /// Source file where the error was detected
        file: &'static str,
        /// Line number where the error was detected
        line: u32,
    },

    /// The file identifier is neither "MDF     " nor "UnFinMF ".
    FileIdentifierError(String),

    /// The MDF version is not supported (requires 4.00 or later).
    FileVersioningError(String),

    /// The version string in the identification block could not be parsed.
    InvalidVersionString(String),

    /// A block identifier did not match the expected value.
    BlockIDError {
        /// The identifier that was found
        actual: String,
        /// The identifier that was expected
        expected: String,
    },

    /// A block declares a link or value count that does not match what its
    /// type requires.
    InconsistentCount {
        /// Block (or conversion kind) carrying the count
        block: &'static str,
        /// Count the block declares
        declared: usize,
        /// Count the block actually provides or needs
        found: usize,
    },

    /// The conversion type code is not one of the supported kinds.
    UnsupportedConversion(u8),

    /// The channel data type / bit width pair cannot be decoded or encoded.
    UnsupportedDataType {
        /// Declared data type
        data_type: DataType,
        /// Declared bit count
        bit_count: u32,
    },

    /// A channel does not fit into the record layout of its group.
    RecordLayoutError(String),

    /// A conversion cannot be applied to the decoded raw samples.
    ConversionError(String),

    /// An algebraic formula could not be parsed or evaluated.
    FormulaError(String),

    /// Failed to serialize a block to bytes.
    BlockSerializationError(String),

    /// A compressed data block could not be inflated or deflated.
    CompressionError(String),

    /// No channel with the given name exists in the model.
    ChannelNotFound(String),

    /// A group index is past the end of the group list.
    GroupIndexOutOfRange {
        /// Requested group index
        index: usize,
        /// Number of groups in the model
        len: usize,
    },

    /// A channel index is past the end of a group's channel list.
    ChannelIndexOutOfRange {
        /// Group that was addressed
        group: usize,
        /// Requested channel index
        index: usize,
        /// Number of channels in the group
        len: usize,
    },

    /// The call itself is malformed (empty signal list, no save destination...).
    InvalidArgument(String),

    /// A configuration document could not be parsed or produced.
    ConfigError(String),

    /// An I/O error occurred while reading or writing the file.
    IOError(std::io::Error),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or unexpected on-disk content. A read that hits this aborts.
    Format,
    /// Unknown channel name or out of range index.
    NotFound,
    /// Invalid call shape.
    Argument,
    /// Underlying stream failure.
    Io,
}

impl Error {
    /// Classify the error into one of the four [`ErrorKind`] categories.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ChannelNotFound(_)
            | Error::GroupIndexOutOfRange { .. }
            | Error::ChannelIndexOutOfRange { .. } => ErrorKind::NotFound,
            Error::InvalidArgument(_) | Error::ConfigError(_) | Error::FormulaError(_) => {
                ErrorKind::Argument
            }
            Error::IOError(_) => ErrorKind::Io,
            _ => ErrorKind::Format,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TooShortBuffer {
                actual,
                expected,
                file,
                line,
            } => write!(
                f,
                "Buffer too small at {file}:{line}: need at least {expected} bytes, got {actual}"
            ),
            Error::FileIdentifierError(id) => {
                write!(
                    f,
                    r#"Invalid file identifier: Expected "MDF     ", found {id}"#
                )
            }
            Error::FileVersioningError(ver) => {
                write!(f, r#"File version too low: Expected ">= 4.00", found {ver}"#)
            }
            Error::InvalidVersionString(s) => write!(f, "Invalid version string: {s}"),
            Error::BlockIDError { actual, expected } => {
                write!(
                    f,
                    "Invalid block identifier: Expected {expected:?}, got {actual:?}"
                )
            }
            Error::InconsistentCount {
                block,
                declared,
                found,
            } => write!(
                f,
                "Inconsistent count in {block}: declared {declared}, found {found}"
            ),
            Error::UnsupportedConversion(code) => {
                write!(f, "Unsupported conversion type code {code}")
            }
            Error::UnsupportedDataType {
                data_type,
                bit_count,
            } => write!(f, "Unsupported data type {data_type} with {bit_count} bits"),
            Error::RecordLayoutError(s) => write!(f, "Record layout error: {s}"),
            Error::ConversionError(s) => write!(f, "Conversion error: {s}"),
            Error::FormulaError(s) => write!(f, "Formula error: {s}"),
            Error::BlockSerializationError(s) => write!(f, "Block serialization error: {s}"),
            Error::CompressionError(s) => write!(f, "Compression error: {s}"),
            Error::ChannelNotFound(name) => write!(f, "Channel {name:?} not found"),
            Error::GroupIndexOutOfRange { index, len } => {
                write!(f, "Group index {index} out of range (0..{len})")
            }
            Error::ChannelIndexOutOfRange { group, index, len } => write!(
                f,
                "Channel index {index} out of range (0..{len}) in group {group}"
            ),
            Error::InvalidArgument(s) => write!(f, "Invalid argument: {s}"),
            Error::ConfigError(s) => write!(f, "Configuration error: {s}"),
            Error::IOError(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IOError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IOError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigError(err.to_string())
    }
}

/// A specialized Result type for MDF operations.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(
            Error::ChannelNotFound("x".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            Error::GroupIndexOutOfRange { index: 3, len: 1 }.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            Error::InvalidArgument("empty".into()).kind(),
            ErrorKind::Argument
        );
        assert_eq!(
            Error::FormulaError("bad".into()).kind(),
            ErrorKind::Argument
        );
        assert_eq!(
            Error::BlockIDError {
                actual: "##XX".into(),
                expected: "##CN".into()
            }
            .kind(),
            ErrorKind::Format
        );
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        assert_eq!(Error::from(io).kind(), ErrorKind::Io);
    }

    #[test]
    fn display_mentions_counts() {
        let e = Error::InconsistentCount {
            block: "##CC",
            declared: 5,
            found: 3,
        };
        let text = e.to_string();
        assert!(text.contains("declared 5"));
        assert!(text.contains("found 3"));
    }
}
