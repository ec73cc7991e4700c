//! MDF4 file writer module.
//!
//! [`MdfWriter`] linearizes a complete in-memory model into a file in one
//! forward pass. Every block is placed at the next 8-byte boundary and gets
//! a strictly increasing address; `next` links of the history, channel and
//! data group chains are patched once the following block's address is
//! known, and the identification and header blocks are written last over the
//! space reserved for them at offset 0.
//!
//! Placement order:
//!
//! ```text
//! [ID + HD reserved] [HD comment] [FH texts] [FH chain]
//! per group: [texts] [CC] [SI] [CN chain] [CG] [DT | DZ]
//! [DG chain]
//! ```
//!
//! Identical texts are stored once through a [`TextStore`].

use log::info;

use crate::Result;
use crate::blocks::{HeaderBlock, IdentificationBlock, TextBlock};
use crate::config::Compression;
use crate::group::Group;
use crate::parsing::HistoryEntry;
use crate::text_store::TextStore;

mod groups;
mod init;
mod io;
mod traits;

pub use traits::{FileWriter, MdfWrite, VecWriter};

/// Byte offset of the `next` link, the first link of every chained block.
const NEXT_LINK_OFFSET: u64 = crate::blocks::BLOCK_HEADER_SIZE as u64;

/// Borrowed view of everything that goes into one file.
#[derive(Debug, Clone, Copy)]
pub struct FileContents<'a> {
    pub identification: &'a IdentificationBlock,
    pub header: &'a HeaderBlock,
    pub header_comment: Option<&'a TextBlock>,
    pub history: &'a [HistoryEntry],
    pub groups: &'a [Group],
}

/// Serializes a model through any [`MdfWrite`] sink.
///
/// Not thread-safe; one writer produces one file.
pub struct MdfWriter<W: MdfWrite> {
    writer: W,
    offset: u64,
    texts: TextStore,
    compression: Compression,
}

impl<W: MdfWrite> MdfWriter<W> {
    /// Wraps an existing sink positioned at its start.
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer,
            offset: 0,
            texts: TextStore::new(),
            compression: Compression::None,
        }
    }

    /// Selects how group payloads are stored.
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Consumes the writer and returns the sink.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Writes the complete file and returns its size in bytes.
    pub fn write_file(&mut self, contents: &FileContents<'_>) -> Result<u64> {
        self.reserve_head()?;
        let comment_addr = self.write_text(contents.header_comment)?;
        let first_fh = self.write_history(contents.history)?;

        let mut placed = Vec::with_capacity(contents.groups.len());
        for (index, group) in contents.groups.iter().enumerate() {
            placed.push(self.write_group(index, group)?);
        }
        let first_dg = self.write_data_groups(contents.groups, &placed)?;

        self.write_head(
            contents.identification,
            contents.header,
            first_dg,
            first_fh,
            comment_addr,
        )?;
        self.finalize()?;

        info!(
            "wrote {} groups, {} texts, {} bytes",
            contents.groups.len(),
            self.texts.len(),
            self.offset
        );
        Ok(self.offset)
    }
}
