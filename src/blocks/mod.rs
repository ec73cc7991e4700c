// src/blocks/mod.rs

// ============================================================================
// Block Size Constants
// ============================================================================
// Fixed sizes of the fixed-layout blocks. Variable-length blocks (TX, MD, DT,
// DZ, DL, CC) carry their size in header.length.

/// Identification block size (64 bytes) - file format identifier at offset 0.
pub(crate) const ID_BLOCK_SIZE: usize = 64;

/// Header block size (104 bytes) - file-level metadata after identification.
pub(crate) const HD_BLOCK_SIZE: usize = 104;

/// File history block size (56 bytes).
pub(crate) const FH_BLOCK_SIZE: usize = 56;

/// Data group block size (64 bytes).
pub(crate) const DG_BLOCK_SIZE: usize = 64;

/// Channel group block size (104 bytes).
pub(crate) const CG_BLOCK_SIZE: usize = 104;

/// Channel block size (160 bytes).
pub(crate) const CN_BLOCK_SIZE: usize = 160;

/// Source information block size (56 bytes).
pub(crate) const SI_BLOCK_SIZE: usize = 56;

// ============================================================================
// Submodules
// ============================================================================

mod channel_block;
mod channel_group_block;
pub(crate) mod common;
pub mod conversion;
mod data_block;
mod data_group_block;
mod data_list_block;
mod dz_block;
mod file_history_block;
mod header_block;
mod identification_block;
mod source_block;
mod text_block;

pub use common::{BLOCK_HEADER_SIZE, BlockHeader, BlockParse, DataType};

pub use channel_block::{ChannelBlock, ChannelType};
pub use channel_group_block::ChannelGroupBlock;
pub use data_block::DataBlock;
pub use data_group_block::DataGroupBlock;
pub use data_list_block::DataListBlock;
pub use dz_block::{DZ_HEADER_SIZE, DzBlock, DzCompressionType};
pub use file_history_block::FileHistoryBlock;
pub use header_block::HeaderBlock;
pub use identification_block::IdentificationBlock;
pub use source_block::SourceBlock;
pub use text_block::TextBlock;

pub use conversion::{
    ChannelConversion, ConversionBlock, ConversionKind, ConversionType, FormulaEvaluator,
    SimpleFormulaEvaluator,
};
