// Per-group placement: texts, conversions, sources, channels, channel group,
// payload, and finally the data group chain
use log::debug;

use super::{MdfWrite, MdfWriter, NEXT_LINK_OFFSET};
use crate::Result;
use crate::blocks::{
    ChannelBlock, ChannelConversion, ChannelGroupBlock, DataBlock, DataGroupBlock, DzBlock,
    SourceBlock, TextBlock,
};
use crate::config::Compression;
use crate::group::{ChannelTexts, Group, SourceInformation};

/// Addresses of one written group, consumed by its data group block.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct PlacedGroup {
    channel_group: u64,
    data: u64,
    comment: u64,
}

/// Text links of one channel, its conversion and its source.
#[derive(Debug, Clone, Default)]
struct TextLinks {
    name: u64,
    unit: u64,
    comment: u64,
    conversion_name: u64,
    conversion_unit: u64,
    conversion_comment: u64,
    /// One per entry of the conversion's table references.
    conversion_refs: Vec<u64>,
    source_name: u64,
    source_path: u64,
    source_comment: u64,
}

impl<W: MdfWrite> MdfWriter<W> {
    pub(super) fn write_group(&mut self, index: usize, group: &Group) -> Result<PlacedGroup> {
        let comment = self.write_text(group.data_group_comment.as_ref())?;
        let acq_name = self.write_text(group.acquisition_name.as_ref())?;
        let cg_comment = self.write_text(group.comment.as_ref())?;
        let conversion = move |i: usize| group.conversions.get(i).and_then(Option::as_ref);
        let source = move |i: usize| group.sources.get(i).and_then(Option::as_ref);

        let mut text_links = Vec::with_capacity(group.channels.len());
        for i in 0..group.channels.len() {
            text_links.push(self.write_channel_texts(
                group.texts.get(i),
                conversion(i),
                source(i),
            )?);
        }

        let mut conversions = Vec::with_capacity(group.channels.len());
        for (i, links) in text_links.iter().enumerate() {
            conversions.push(self.write_conversion(conversion(i), links)?);
        }

        let mut sources = Vec::with_capacity(group.channels.len());
        for (i, links) in text_links.iter().enumerate() {
            sources.push(self.write_source(source(i), links)?);
        }

        let mut channels = Vec::with_capacity(group.channels.len());
        for (i, channel) in group.channels.iter().enumerate() {
            let links = &text_links[i];
            let block = ChannelBlock {
                header: ChannelBlock::default().header,
                next_ch_addr: 0,
                component_addr: 0,
                name_addr: links.name,
                source_addr: sources[i],
                conversion_addr: conversions[i],
                data_addr: 0,
                unit_addr: links.unit,
                comment_addr: links.comment,
                attachment_count: 0,
                ..channel.clone()
            };
            channels.push(self.write_block(&block.to_bytes()?)?);
        }
        self.link_chain(&channels, NEXT_LINK_OFFSET)?;

        let channel_group = ChannelGroupBlock {
            header: ChannelGroupBlock::default().header,
            next_cg_addr: 0,
            first_ch_addr: channels.first().copied().unwrap_or(0),
            acq_name_addr: acq_name,
            acq_source_addr: 0,
            first_sample_reduction_addr: 0,
            comment_addr: cg_comment,
            ..group.channel_group.clone()
        };
        let channel_group = self.write_block(&channel_group.to_bytes()?)?;
        let data = self.write_payload(group)?;

        debug!(
            "group {index}: channel group at {channel_group:#x}, {} channels, payload at {data:#x}",
            channels.len()
        );
        Ok(PlacedGroup {
            channel_group,
            data,
            comment,
        })
    }

    /// Every text a channel owns, its conversion's table texts included.
    fn write_channel_texts(
        &mut self,
        texts: Option<&ChannelTexts>,
        conversion: Option<&ChannelConversion>,
        source: Option<&SourceInformation>,
    ) -> Result<TextLinks> {
        let mut links = TextLinks::default();
        if let Some(texts) = texts {
            links.name = self.write_text(texts.name.as_ref())?;
            links.unit = self.write_text(texts.unit.as_ref())?;
            links.comment = self.write_text(texts.comment.as_ref())?;
            links.conversion_name = self.write_text(texts.conversion_name.as_ref())?;
            links.conversion_unit = self.write_text(texts.conversion_unit.as_ref())?;
            links.conversion_comment = self.write_text(texts.conversion_comment.as_ref())?;
        }
        if let Some(conversion) = conversion {
            for text in conversion.ref_texts() {
                let text = text.map(TextBlock::new);
                links.conversion_refs.push(self.write_text(text.as_ref())?);
            }
        }
        if let Some(source) = source {
            links.source_name = self.write_text(source.name.as_ref())?;
            links.source_path = self.write_text(source.path.as_ref())?;
            links.source_comment = self.write_text(source.comment.as_ref())?;
        }
        Ok(links)
    }

    fn write_conversion(
        &mut self,
        conversion: Option<&ChannelConversion>,
        links: &TextLinks,
    ) -> Result<u64> {
        let Some(conversion) = conversion else {
            return Ok(0);
        };
        let mut block = conversion.to_block()?;
        block.name_addr = links.conversion_name;
        block.unit_addr = links.conversion_unit;
        block.comment_addr = links.conversion_comment;
        for (slot, &address) in block.refs.iter_mut().zip(&links.conversion_refs) {
            *slot = address;
        }
        self.write_block(&block.to_bytes()?)
    }

    fn write_source(
        &mut self,
        source: Option<&SourceInformation>,
        links: &TextLinks,
    ) -> Result<u64> {
        let Some(source) = source else {
            return Ok(0);
        };
        let block = SourceBlock {
            header: SourceBlock::default().header,
            name_addr: links.source_name,
            path_addr: links.source_path,
            comment_addr: links.source_comment,
            ..source.block.clone()
        };
        self.write_block(&block.to_bytes()?)
    }

    /// Writes the payload as one `##DT` or `##DZ`; an empty payload gets no
    /// block and a null link.
    fn write_payload(&mut self, group: &Group) -> Result<u64> {
        if group.payload.is_empty() {
            return Ok(0);
        }
        let bytes = match self.compression {
            Compression::None => DataBlock::new(&group.payload).to_bytes()?,
            Compression::Deflate => DzBlock::encode(&group.payload, group.layout().stride())?,
        };
        self.write_block(&bytes)
    }

    /// Writes every data group contiguously and chains them; returns the
    /// head address (0 without groups).
    pub(super) fn write_data_groups(
        &mut self,
        groups: &[Group],
        placed: &[PlacedGroup],
    ) -> Result<u64> {
        let mut addresses = Vec::with_capacity(groups.len());
        for (group, placed) in groups.iter().zip(placed) {
            let block = DataGroupBlock {
                header: DataGroupBlock::default().header,
                next_dg_addr: 0,
                first_cg_addr: placed.channel_group,
                data_block_addr: placed.data,
                comment_addr: placed.comment,
                ..group.data_group.clone()
            };
            addresses.push(self.write_block(&block.to_bytes()?)?);
        }
        self.link_chain(&addresses, NEXT_LINK_OFFSET)?;
        Ok(addresses.first().copied().unwrap_or(0))
    }
}
