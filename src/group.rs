//! In-memory group aggregate.

use crate::blocks::{
    ChannelBlock, ChannelConversion, ChannelGroupBlock, DataGroupBlock, SourceBlock, TextBlock,
};
use crate::parsing::RecordLayout;

/// A channel's source with its resolved texts.
#[derive(Debug, Clone, Default)]
pub struct SourceInformation {
    pub block: SourceBlock,
    pub name: Option<TextBlock>,
    pub path: Option<TextBlock>,
    pub comment: Option<TextBlock>,
}

impl SourceInformation {
    /// Source whose name and path are both `label`.
    pub fn labelled(label: &str) -> Self {
        Self {
            block: SourceBlock::default(),
            name: Some(TextBlock::new(label)),
            path: Some(TextBlock::new(label)),
            comment: None,
        }
    }
}

/// Texts owned by one channel and its conversion.
#[derive(Debug, Clone, Default)]
pub struct ChannelTexts {
    pub name: Option<TextBlock>,
    pub unit: Option<TextBlock>,
    pub comment: Option<TextBlock>,
    pub conversion_name: Option<TextBlock>,
    pub conversion_unit: Option<TextBlock>,
    pub conversion_comment: Option<TextBlock>,
}

/// One data group with its single channel group, its channels and the
/// concatenated record payload.
///
/// `channels`, `conversions`, `sources` and `texts` are index-aligned.
#[derive(Debug, Clone, Default)]
pub struct Group {
    pub data_group: DataGroupBlock,
    pub channel_group: ChannelGroupBlock,
    pub channels: Vec<ChannelBlock>,
    pub conversions: Vec<Option<ChannelConversion>>,
    pub sources: Vec<Option<SourceInformation>>,
    pub texts: Vec<ChannelTexts>,
    pub data_group_comment: Option<TextBlock>,
    pub acquisition_name: Option<TextBlock>,
    pub comment: Option<TextBlock>,
    pub payload: Vec<u8>,
}

impl Group {
    pub fn layout(&self) -> RecordLayout {
        RecordLayout::for_group(&self.data_group, &self.channel_group)
    }

    /// Declared number of records.
    pub fn cycles(&self) -> u64 {
        self.channel_group.cycles_nr
    }

    /// Records present in the payload.
    pub fn record_count(&self) -> usize {
        self.layout().record_count(self.cycles(), self.payload.len())
    }

    pub fn channel_name(&self, index: usize) -> &str {
        self.texts
            .get(index)
            .and_then(|t| t.name.as_ref())
            .map_or("", |t| t.text.as_str())
    }

    /// The conversion's unit text, else the channel's own unit text.
    pub fn channel_unit(&self, index: usize) -> &str {
        self.texts
            .get(index)
            .and_then(|t| t.conversion_unit.as_ref().or(t.unit.as_ref()))
            .map_or("", |t| t.text.as_str())
    }

    /// Index of the master or virtual master channel. Should a group
    /// declare several, the last one is the time base.
    pub fn master_index(&self) -> Option<usize> {
        self.channels
            .iter()
            .rposition(|c| c.channel_type.is_master())
    }
}
