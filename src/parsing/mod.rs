//! Reading side: byte-range sources, record layout and the block-graph walk.

pub mod layout;
pub mod range_reader;
mod reader;

pub use layout::{RecordLayout, encode_records, virtual_master_timestamps};
pub use range_reader::{ByteRangeReader, FileRangeReader, SliceRangeReader};
pub use reader::{HistoryEntry, ParsedFile, read_file};
