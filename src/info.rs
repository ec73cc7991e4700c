//! Structured summary of a model.

use serde::Serialize;

use crate::Result;
use crate::blocks::ChannelType;
use crate::group::Group;

/// File version and one entry per group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MdfInfo {
    pub version: String,
    pub program_id: String,
    pub groups: Vec<GroupInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupInfo {
    pub index: usize,
    pub cycles: u64,
    pub channel_count: usize,
    pub acquisition_name: Option<String>,
    pub channels: Vec<ChannelInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelInfo {
    pub name: String,
    pub channel_type: ChannelType,
    /// Display name of the stored data type.
    pub data_type: String,
    pub bit_count: u32,
    pub unit: String,
}

impl GroupInfo {
    pub(crate) fn from_group(index: usize, group: &Group) -> Self {
        let channels = group
            .channels
            .iter()
            .enumerate()
            .map(|(i, channel)| ChannelInfo {
                name: group.channel_name(i).to_string(),
                channel_type: channel.channel_type,
                data_type: channel.data_type.to_string(),
                bit_count: channel.bit_count,
                unit: group.channel_unit(i).to_string(),
            })
            .collect::<Vec<_>>();
        GroupInfo {
            index,
            cycles: group.cycles(),
            channel_count: channels.len(),
            acquisition_name: group.acquisition_name.as_ref().map(|t| t.text.clone()),
            channels,
        }
    }
}

impl MdfInfo {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
