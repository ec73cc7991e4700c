// File head: identification, header and the file history chain
use super::{MdfWrite, MdfWriter, NEXT_LINK_OFFSET};
use crate::Result;
use crate::blocks::{
    FileHistoryBlock, HD_BLOCK_SIZE, HeaderBlock, ID_BLOCK_SIZE, IdentificationBlock,
};
use crate::parsing::HistoryEntry;

impl<W: MdfWrite> MdfWriter<W> {
    /// Reserves the identification and header blocks at offset 0.
    pub(super) fn reserve_head(&mut self) -> Result<()> {
        self.writer.seek(0)?;
        self.offset = 0;
        self.reserve(ID_BLOCK_SIZE + HD_BLOCK_SIZE)?;
        Ok(())
    }

    /// Writes history comments then the history chain; returns the head
    /// address (0 without history).
    pub(super) fn write_history(&mut self, history: &[HistoryEntry]) -> Result<u64> {
        let mut comments = Vec::with_capacity(history.len());
        for entry in history {
            comments.push(self.write_text(entry.comment.as_ref())?);
        }

        let mut addresses = Vec::with_capacity(history.len());
        for (entry, comment_addr) in history.iter().zip(comments) {
            let block = FileHistoryBlock {
                header: FileHistoryBlock::default().header,
                next_fh_addr: 0,
                comment_addr,
                ..entry.block.clone()
            };
            addresses.push(self.write_block(&block.to_bytes()?)?);
        }
        self.link_chain(&addresses, NEXT_LINK_OFFSET)?;
        Ok(addresses.first().copied().unwrap_or(0))
    }

    /// Writes the identification and header over the reserved space.
    pub(super) fn write_head(
        &mut self,
        identification: &IdentificationBlock,
        header: &HeaderBlock,
        first_dg_addr: u64,
        file_history_addr: u64,
        comment_addr: u64,
    ) -> Result<()> {
        let header = HeaderBlock {
            header: HeaderBlock::default().header,
            first_dg_addr,
            file_history_addr,
            channel_tree_addr: 0,
            first_attachment_addr: 0,
            first_event_addr: 0,
            comment_addr,
            ..header.clone()
        };
        let mut bytes = identification.to_bytes()?;
        bytes.extend_from_slice(&header.to_bytes()?);
        self.overwrite(0, &bytes)
    }
}
