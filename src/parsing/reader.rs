//! File structure reader: walks the block graph of a file into the
//! in-memory model.

use std::collections::HashSet;

use log::{debug, warn};

use super::range_reader::ByteRangeReader;
use crate::blocks::{
    BLOCK_HEADER_SIZE, BlockParse, ChannelBlock, ChannelConversion, ChannelGroupBlock,
    ConversionBlock, DataBlock, DataGroupBlock, DataListBlock, DzBlock, FileHistoryBlock,
    HeaderBlock, IdentificationBlock, SourceBlock, TextBlock,
};
use crate::blocks::common::read_u64;
use crate::group::{ChannelTexts, Group, SourceInformation};
use crate::{Error, Result};

/// Offset of the header block, right after the 64-byte identification.
const HEADER_ADDRESS: u64 = 64;

/// One file history entry with its comment.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub block: FileHistoryBlock,
    pub comment: Option<TextBlock>,
}

/// Everything read from a file.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub identification: IdentificationBlock,
    pub header: HeaderBlock,
    pub header_comment: Option<TextBlock>,
    pub history: Vec<HistoryEntry>,
    pub groups: Vec<Group>,
}

/// Guards a linked chain against links pointing back into itself.
struct ChainGuard {
    chain: &'static str,
    seen: HashSet<u64>,
}

impl ChainGuard {
    fn new(chain: &'static str) -> Self {
        Self {
            chain,
            seen: HashSet::new(),
        }
    }

    fn visit(&mut self, address: u64) -> Result<()> {
        if !self.seen.insert(address) {
            return Err(Error::BlockSerializationError(format!(
                "{} chain loops back to {:#x}",
                self.chain, address
            )));
        }
        Ok(())
    }
}

/// Reads the complete model from `reader`.
///
/// Any malformed block aborts the read; no partial model is returned.
pub fn read_file<R: ByteRangeReader>(reader: &mut R) -> Result<ParsedFile> {
    let identification = IdentificationBlock::from_bytes(&reader.read_range(0, 64)?)?;
    let header = HeaderBlock::from_bytes(&reader.read_block(HEADER_ADDRESS, Some("##HD"))?)?;
    let header_comment = read_text(reader, header.comment_addr)?;
    debug!(
        "reading MDF {} written by {:?}",
        identification.version(),
        identification.program_id.trim()
    );

    let history = read_history(reader, header.file_history_addr)?;

    let mut groups = Vec::new();
    let mut guard = ChainGuard::new("data group");
    let mut dg_addr = header.first_dg_addr;
    while dg_addr != 0 {
        guard.visit(dg_addr)?;
        let data_group = DataGroupBlock::from_bytes(&reader.read_block(dg_addr, Some("##DG"))?)?;
        debug!("data group {} at {:#x}", groups.len(), dg_addr);
        dg_addr = data_group.next_dg_addr;
        groups.push(read_group(reader, data_group, groups.len())?);
    }

    Ok(ParsedFile {
        identification,
        header,
        header_comment,
        history,
        groups,
    })
}

fn read_history<R: ByteRangeReader>(reader: &mut R, first: u64) -> Result<Vec<HistoryEntry>> {
    let mut history = Vec::new();
    let mut guard = ChainGuard::new("file history");
    let mut address = first;
    while address != 0 {
        guard.visit(address)?;
        let block = FileHistoryBlock::from_bytes(&reader.read_block(address, Some("##FH"))?)?;
        let comment = read_text(reader, block.comment_addr)?;
        address = block.next_fh_addr;
        history.push(HistoryEntry { block, comment });
    }
    Ok(history)
}

/// Reads the `##TX`/`##MD` block at `address`; `None` for a null link.
pub(crate) fn read_text<R: ByteRangeReader>(
    reader: &mut R,
    address: u64,
) -> Result<Option<TextBlock>> {
    if address == 0 {
        return Ok(None);
    }
    TextBlock::from_bytes(&reader.read_block(address, None)?).map(Some)
}

fn read_group<R: ByteRangeReader>(
    reader: &mut R,
    data_group: DataGroupBlock,
    index: usize,
) -> Result<Group> {
    let data_group_comment = read_text(reader, data_group.comment_addr)?;

    if data_group.first_cg_addr == 0 {
        warn!("data group {index} has no channel group");
        return Ok(Group {
            data_group,
            data_group_comment,
            ..Group::default()
        });
    }

    let channel_group = ChannelGroupBlock::from_bytes(
        &reader.read_block(data_group.first_cg_addr, Some("##CG"))?,
    )?;
    if channel_group.next_cg_addr != 0 {
        warn!("data group {index} holds several channel groups, only the first is read");
    }
    let acquisition_name = read_text(reader, channel_group.acq_name_addr)?;
    let comment = read_text(reader, channel_group.comment_addr)?;

    let mut group = Group {
        data_group,
        channel_group,
        data_group_comment,
        acquisition_name,
        comment,
        ..Group::default()
    };

    let mut guard = ChainGuard::new("channel");
    let mut cn_addr = group.channel_group.first_ch_addr;
    while cn_addr != 0 {
        guard.visit(cn_addr)?;
        let channel = ChannelBlock::from_bytes(&reader.read_block(cn_addr, Some("##CN"))?)?;
        cn_addr = channel.next_ch_addr;

        let mut texts = ChannelTexts {
            name: read_text(reader, channel.name_addr)?,
            unit: read_text(reader, channel.unit_addr)?,
            comment: read_text(reader, channel.comment_addr)?,
            ..ChannelTexts::default()
        };
        let conversion = read_conversion(reader, channel.conversion_addr, &mut texts)?;
        let source = read_source(reader, channel.source_addr)?;

        group.channels.push(channel);
        group.conversions.push(conversion);
        group.sources.push(source);
        group.texts.push(texts);
    }
    debug!("data group {index}: {} channels", group.channels.len());

    group.payload = read_payload(reader, group.data_group.data_block_addr)?;
    let expected = group.layout().stride() as u64 * group.cycles();
    let found = group.payload.len() as u64;
    if found > expected {
        warn!(
            "data group {index}: {} payload bytes beyond {} declared records",
            found - expected,
            group.cycles()
        );
    } else if found < expected {
        warn!(
            "data group {index}: payload holds {} of {} declared records",
            group.record_count(),
            group.cycles()
        );
    }
    Ok(group)
}

fn read_conversion<R: ByteRangeReader>(
    reader: &mut R,
    address: u64,
    texts: &mut ChannelTexts,
) -> Result<Option<ChannelConversion>> {
    if address == 0 {
        return Ok(None);
    }
    let block = ConversionBlock::from_bytes(&reader.read_block(address, Some("##CC"))?)?;
    texts.conversion_name = read_text(reader, block.name_addr)?;
    texts.conversion_unit = read_text(reader, block.unit_addr)?;
    texts.conversion_comment = read_text(reader, block.comment_addr)?;

    let mut ref_texts = Vec::with_capacity(block.refs.len());
    for &link in &block.refs {
        if link == 0 {
            ref_texts.push(None);
            continue;
        }
        match reader.peek_tag(link)?.as_str() {
            "##TX" | "##MD" => ref_texts.push(read_text(reader, link)?.map(|t| t.text)),
            other => {
                warn!("conversion at {address:#x} references a {other} block, ignored");
                ref_texts.push(None);
            }
        }
    }
    ChannelConversion::from_block(&block, &ref_texts).map(Some)
}

fn read_source<R: ByteRangeReader>(
    reader: &mut R,
    address: u64,
) -> Result<Option<SourceInformation>> {
    if address == 0 {
        return Ok(None);
    }
    let block = SourceBlock::from_bytes(&reader.read_block(address, Some("##SI"))?)?;
    Ok(Some(SourceInformation {
        name: read_text(reader, block.name_addr)?,
        path: read_text(reader, block.path_addr)?,
        comment: read_text(reader, block.comment_addr)?,
        block,
    }))
}

/// Resolves the payload at `address` into one buffer: a `##DT`, a `##DZ`,
/// a `##DL` chain of either, or a `##HL` wrapping such a chain.
pub(crate) fn read_payload<R: ByteRangeReader>(reader: &mut R, address: u64) -> Result<Vec<u8>> {
    if address == 0 {
        return Ok(Vec::new());
    }
    match reader.peek_tag(address)?.as_str() {
        "##DL" => read_data_list(reader, address),
        "##HL" => {
            let bytes = reader.read_block(address, Some("##HL"))?;
            if bytes.len() < BLOCK_HEADER_SIZE + 8 {
                return Err(Error::TooShortBuffer {
                    actual: bytes.len(),
                    expected: BLOCK_HEADER_SIZE + 8,
                    file: file!(),
                    line: line!(),
                });
            }
            read_data_list(reader, read_u64(&bytes, BLOCK_HEADER_SIZE))
        }
        _ => read_fragment(reader, address),
    }
}

fn read_data_list<R: ByteRangeReader>(reader: &mut R, first: u64) -> Result<Vec<u8>> {
    let mut payload = Vec::new();
    let mut guard = ChainGuard::new("data list");
    let mut address = first;
    while address != 0 {
        guard.visit(address)?;
        let list = DataListBlock::from_bytes(&reader.read_block(address, Some("##DL"))?)?;
        for &link in &list.data_links {
            if link != 0 {
                payload.extend_from_slice(&read_fragment(reader, link)?);
            }
        }
        address = list.next;
    }
    Ok(payload)
}

fn read_fragment<R: ByteRangeReader>(reader: &mut R, address: u64) -> Result<Vec<u8>> {
    let bytes = reader.read_block(address, None)?;
    match &bytes[..4] {
        b"##DT" => Ok(DataBlock::from_bytes(&bytes)?.data.to_vec()),
        b"##DZ" => DzBlock::from_bytes(&bytes)?.decompress(),
        other => Err(Error::BlockIDError {
            actual: String::from_utf8_lossy(other).into_owned(),
            expected: "##DT / ##DZ / ##DL".to_string(),
        }),
    }
}
