use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::blocks::{
    ChannelBlock, ChannelConversion, ChannelGroupBlock, ChannelType, ConversionKind,
    DataGroupBlock, DataType, FileHistoryBlock, FormulaEvaluator, HeaderBlock,
    IdentificationBlock, SimpleFormulaEvaluator, TextBlock,
};
use crate::config::MdfConfig;
use crate::group::{ChannelTexts, Group, SourceInformation};
use crate::info::{GroupInfo, MdfInfo};
use crate::parsing::{
    ByteRangeReader, FileRangeReader, HistoryEntry, SliceRangeReader, encode_records, read_file,
    virtual_master_timestamps,
};
use crate::resample::{LinearResampler, Resampler, linspace, union_timestamps};
use crate::signal::{Samples, Signal};
use crate::writer::{FileContents, MdfWrite, MdfWriter};
use crate::{Error, Result};

/// Identifies a channel for [`Mdf::get`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSelector<'a> {
    /// Channel name; with duplicates the channel registered last wins.
    Name(&'a str),
    Index { group: usize, channel: usize },
}

impl<'a> From<&'a str> for ChannelSelector<'a> {
    fn from(name: &'a str) -> Self {
        ChannelSelector::Name(name)
    }
}

impl From<(usize, usize)> for ChannelSelector<'_> {
    fn from((group, channel): (usize, usize)) -> Self {
        ChannelSelector::Index { group, channel }
    }
}

/// Identifies a group for [`Mdf::remove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupSelector<'a> {
    Index(usize),
    /// The group holding the named channel.
    Channel(&'a str),
}

impl From<usize> for GroupSelector<'_> {
    fn from(index: usize) -> Self {
        GroupSelector::Index(index)
    }
}

impl<'a> From<&'a str> for GroupSelector<'a> {
    fn from(name: &'a str) -> Self {
        GroupSelector::Channel(name)
    }
}

/// In-memory measurement file.
///
/// Holds the file-level blocks, the groups in file order, and two
/// registries rebuilt whenever the group list changes: channel name to
/// `(group, channel)` and group to master channel index.
pub struct Mdf {
    config: MdfConfig,
    path: Option<PathBuf>,
    identification: IdentificationBlock,
    header: HeaderBlock,
    header_comment: Option<TextBlock>,
    history: Vec<HistoryEntry>,
    groups: Vec<Group>,
    channels_by_name: HashMap<String, (usize, usize)>,
    master_by_group: HashMap<usize, usize>,
    evaluator: Box<dyn FormulaEvaluator>,
    resampler: Box<dyn Resampler>,
}

impl fmt::Debug for Mdf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mdf")
            .field("path", &self.path)
            .field("version", &self.identification.version())
            .field("groups", &self.groups.len())
            .field("history", &self.history.len())
            .finish()
    }
}

impl Default for Mdf {
    fn default() -> Self {
        Self::new()
    }
}

impl Mdf {
    /// Empty model with the default configuration.
    pub fn new() -> Self {
        Self::empty(MdfConfig::default(), IdentificationBlock::default())
    }

    /// Empty model whose identification block follows `config`.
    pub fn with_config(config: MdfConfig) -> Result<Self> {
        let identification = IdentificationBlock::new(&config.version, &config.program_id)?;
        Ok(Self::empty(config, identification))
    }

    fn empty(config: MdfConfig, identification: IdentificationBlock) -> Self {
        Mdf {
            config,
            path: None,
            identification,
            header: HeaderBlock::now(),
            header_comment: None,
            history: Vec::new(),
            groups: Vec::new(),
            channels_by_name: HashMap::new(),
            master_by_group: HashMap::new(),
            evaluator: Box::new(SimpleFormulaEvaluator),
            resampler: Box::new(LinearResampler),
        }
    }

    /// Parses the file at `path`, or returns an empty model bound to `path`
    /// when no such file exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, MdfConfig::default())
    }

    pub fn open_with_config(path: impl AsRef<Path>, config: MdfConfig) -> Result<Self> {
        let path = path.as_ref();
        let mut mdf = if path.exists() {
            let mut reader = FileRangeReader::new(path)?;
            Self::from_reader(&mut reader, config)?
        } else {
            debug!("{} does not exist, starting an empty model", path.display());
            Self::with_config(config)?
        };
        mdf.path = Some(path.to_path_buf());
        Ok(mdf)
    }

    /// Parses a complete file image.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(&mut SliceRangeReader::new(bytes), MdfConfig::default())
    }

    /// Parses a file from any byte range source.
    pub fn from_reader<R: ByteRangeReader>(reader: &mut R, config: MdfConfig) -> Result<Self> {
        let parsed = read_file(reader)?;
        let mut mdf = Self::empty(config, parsed.identification);
        mdf.header = parsed.header;
        mdf.header_comment = parsed.header_comment;
        mdf.history = parsed.history;
        mdf.groups = parsed.groups;
        mdf.rebuild_registries();
        Ok(mdf)
    }

    /// Replaces the evaluator used for algebraic conversions.
    pub fn with_formula_evaluator(mut self, evaluator: impl FormulaEvaluator + 'static) -> Self {
        self.evaluator = Box::new(evaluator);
        self
    }

    /// Replaces the resampler used by `append` and rastered `get`.
    pub fn with_resampler(mut self, resampler: impl Resampler + 'static) -> Self {
        self.resampler = Box::new(resampler);
        self
    }

    pub fn config(&self) -> &MdfConfig {
        &self.config
    }

    /// Path the model was opened from or last saved to.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn identification(&self) -> &IdentificationBlock {
        &self.identification
    }

    pub fn header(&self) -> &HeaderBlock {
        &self.header
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, index: usize) -> Option<&Group> {
        self.groups.get(index)
    }

    /// Registered channel names.
    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels_by_name.keys().map(String::as_str)
    }

    /// `(group, channel)` registered under `name`.
    pub fn find_channel(&self, name: &str) -> Option<(usize, usize)> {
        self.channels_by_name.get(name).copied()
    }

    /// Master channel index of group `group`.
    pub fn master_channel(&self, group: usize) -> Option<usize> {
        self.master_by_group.get(&group).copied()
    }

    fn rebuild_registries(&mut self) {
        self.channels_by_name.clear();
        self.master_by_group.clear();
        for (g, group) in self.groups.iter().enumerate() {
            for c in 0..group.channels.len() {
                let name = group.channel_name(c);
                if !name.is_empty() {
                    self.channels_by_name.insert(name.to_string(), (g, c));
                }
            }
            match group.master_index() {
                Some(c) => {
                    self.master_by_group.insert(g, c);
                }
                None if !group.channels.is_empty() => warn!("group {g} has no master channel"),
                None => {}
            }
        }
    }

    /// Adds a group built from `signals` and returns its index.
    ///
    /// Signals on different time bases are resampled onto the sorted union
    /// of all timestamps. The group gets a float64 master channel followed
    /// by one channel per signal in the given order; every channel's source
    /// and the group's acquisition name carry `source_label`.
    pub fn append(&mut self, signals: Vec<Signal>, source_label: &str) -> Result<usize> {
        if signals.is_empty() {
            return Err(Error::InvalidArgument(
                "append needs at least one signal".to_string(),
            ));
        }
        for signal in &signals {
            if signal.samples.len() != signal.timestamps.len() {
                return Err(Error::InvalidArgument(format!(
                    "signal '{}' has {} samples for {} timestamps",
                    signal.name,
                    signal.samples.len(),
                    signal.timestamps.len()
                )));
            }
        }

        let (timestamps, signals) = self.common_time_base(signals)?;
        let cycles = timestamps.len();
        let time = Samples::F64(timestamps);

        let mut group = Group::default();
        let time_range = first_last(&time);
        let mut master = ChannelBlock {
            channel_type: ChannelType::Master,
            sync_type: 1,
            data_type: DataType::FloatLE,
            bit_count: 64,
            ..ChannelBlock::default()
        };
        let mut master_conversion = ChannelConversion::new(ConversionKind::Identity);
        if let Some((first, last)) = time_range {
            master.set_range(first, last);
            master_conversion = master_conversion.with_physical_range(first, last);
        }
        Self::push_channel(
            &mut group,
            master,
            master_conversion,
            &self.config.time_channel_name,
            &self.config.time_channel_unit,
            source_label,
        );

        let mut byte_offset = 8usize;
        let mut columns = vec![(&time, 8usize)];
        for signal in &signals {
            let (data_type, bit_count) = signal.samples.encoding();
            let width = (bit_count as usize / 8).max(1);
            let mut channel = ChannelBlock {
                data_type,
                bit_count,
                byte_offset: byte_offset as u32,
                ..ChannelBlock::default()
            };
            let sample_range = signal.samples.min_max();
            if let Some((min, max)) = sample_range {
                channel.set_range(min, max);
            }

            let kind = signal.conversion.clone().unwrap_or(ConversionKind::Identity);
            let mut conversion = ChannelConversion::new(kind);
            if let Some((min, max)) = signal.physical_range.or(sample_range) {
                conversion = conversion.with_physical_range(min, max);
            }
            Self::push_channel(
                &mut group,
                channel,
                conversion,
                &signal.name,
                &signal.unit,
                source_label,
            );

            columns.push((&signal.samples, width));
            byte_offset += width;
        }

        group.payload = encode_records(&columns, cycles);
        group.channel_group = ChannelGroupBlock::new(cycles as u64, byte_offset as u32);
        group.data_group = DataGroupBlock::default();
        group.acquisition_name = Some(TextBlock::new(source_label));
        group.comment = Some(TextBlock::new(source_label));

        self.groups.push(group);
        self.rebuild_registries();
        let index = self.groups.len() - 1;
        debug!(
            "appended group {index}: {} channels, {cycles} records of {byte_offset} bytes",
            signals.len() + 1
        );
        Ok(index)
    }

    /// Timestamps shared by all signals, resampling the signals when their
    /// time bases differ.
    fn common_time_base(&self, signals: Vec<Signal>) -> Result<(Vec<f64>, Vec<Signal>)> {
        let first = signals[0].timestamps.clone();
        if signals.iter().all(|s| s.timestamps == first) {
            return Ok((first, signals));
        }

        let union = union_timestamps(signals.iter().map(|s| s.timestamps.as_slice()));
        debug!(
            "resampling {} signals onto {} union timestamps",
            signals.len(),
            union.len()
        );
        let mut resampled = Vec::with_capacity(signals.len());
        for signal in signals {
            let samples =
                self.resampler
                    .resample(&signal.samples, &signal.timestamps, &union)?;
            resampled.push(Signal {
                samples,
                timestamps: union.clone(),
                ..signal
            });
        }
        Ok((union, resampled))
    }

    fn push_channel(
        group: &mut Group,
        channel: ChannelBlock,
        conversion: ChannelConversion,
        name: &str,
        unit: &str,
        source_label: &str,
    ) {
        group.channels.push(channel);
        group.conversions.push(Some(conversion));
        group.sources.push(Some(SourceInformation::labelled(source_label)));
        group.texts.push(ChannelTexts {
            name: Some(TextBlock::new(name)),
            conversion_unit: (!unit.is_empty()).then(|| TextBlock::new(unit)),
            ..ChannelTexts::default()
        });
    }

    fn resolve_channel(&self, selector: ChannelSelector<'_>) -> Result<(usize, usize)> {
        match selector {
            ChannelSelector::Name(name) => self
                .find_channel(name)
                .ok_or_else(|| Error::ChannelNotFound(name.to_string())),
            ChannelSelector::Index { group, channel } => {
                let Some(g) = self.groups.get(group) else {
                    return Err(Error::GroupIndexOutOfRange {
                        index: group,
                        len: self.groups.len(),
                    });
                };
                if channel >= g.channels.len() {
                    return Err(Error::ChannelIndexOutOfRange {
                        group,
                        index: channel,
                        len: g.channels.len(),
                    });
                }
                Ok((group, channel))
            }
        }
    }

    /// Physical values of channel `c` in group `g`.
    fn physical_values(&self, g: usize, c: usize) -> Result<Samples> {
        let group = &self.groups[g];
        let channel = &group.channels[c];
        let conversion = group.conversions.get(c).and_then(Option::as_ref);
        let count = group.record_count();

        if channel.channel_type == ChannelType::VirtualMaster {
            let linear = match conversion.map(|conv| &conv.kind) {
                None | Some(ConversionKind::Identity) => Some((1.0, 0.0)),
                Some(kind) => kind.linear_coefficients(),
            };
            if let Some((a, b)) = linear {
                return Ok(Samples::F64(virtual_master_timestamps(count, a, b)));
            }
        }

        let raw = if channel.channel_type == ChannelType::VirtualMaster {
            Samples::U64((0..count as u64).collect())
        } else {
            group
                .layout()
                .decode_channel(&group.payload, group.cycles(), channel)?
        };
        match conversion {
            Some(conversion) => conversion.apply(raw, self.evaluator.as_ref()),
            None => Ok(raw),
        }
    }

    /// Time base of group `g`: its master channel's physical values, or
    /// record indices when the group has no master.
    fn timestamps(&self, g: usize) -> Result<Vec<f64>> {
        let Some(master) = self.master_channel(g) else {
            warn!("group {g} has no master channel, using record indices as timestamps");
            let count = self.groups[g].record_count();
            return Ok((0..count).map(|i| i as f64).collect());
        };
        self.physical_values(g, master)?.to_f64().ok_or_else(|| {
            Error::ConversionError(format!("master channel of group {g} is not numeric"))
        })
    }

    /// Physical values, timestamps and unit of one channel.
    ///
    /// With `raster` the result is resampled onto `floor(t_last / raster)`
    /// evenly spaced points from 0 to the last timestamp. The returned
    /// signal carries the conversion table for the text conversion kinds.
    pub fn get<'a>(
        &self,
        selector: impl Into<ChannelSelector<'a>>,
        raster: Option<f64>,
    ) -> Result<Signal> {
        let (g, c) = self.resolve_channel(selector.into())?;
        if let Some(raster) = raster.filter(|r| r.is_nan() || *r <= 0.0) {
            return Err(Error::InvalidArgument(format!(
                "raster must be positive, got {raster}"
            )));
        }

        let group = &self.groups[g];
        let mut samples = self.physical_values(g, c)?;
        let mut timestamps = self.timestamps(g)?;
        if timestamps.len() != samples.len() {
            return Err(Error::RecordLayoutError(format!(
                "group {g}: {} timestamps for {} samples",
                timestamps.len(),
                samples.len()
            )));
        }

        if let (Some(raster), Some(&last)) = (raster, timestamps.last()) {
            let target = linspace(0.0, last, (last / raster).max(0.0) as usize);
            samples = self.resampler.resample(&samples, &timestamps, &target)?;
            timestamps = target;
        }

        let conversion = group.conversions.get(c).and_then(Option::as_ref);
        Ok(Signal {
            name: group.channel_name(c).to_string(),
            samples,
            timestamps,
            unit: group.channel_unit(c).to_string(),
            conversion: conversion.and_then(ChannelConversion::descriptor),
            physical_range: conversion.and_then(|conv| conv.physical_range),
        })
    }

    /// Removes a group and returns it.
    ///
    /// An unknown index or channel name leaves the model unchanged; the
    /// failure is logged and returned.
    pub fn remove<'a>(&mut self, selector: impl Into<GroupSelector<'a>>) -> Result<Group> {
        let index = match selector.into() {
            GroupSelector::Index(index) if index < self.groups.len() => Ok(index),
            GroupSelector::Index(index) => Err(Error::GroupIndexOutOfRange {
                index,
                len: self.groups.len(),
            }),
            GroupSelector::Channel(name) => self
                .find_channel(name)
                .map(|(g, _)| g)
                .ok_or_else(|| Error::ChannelNotFound(name.to_string())),
        };
        let index = index.inspect_err(|e| warn!("remove failed: {e}"))?;

        let group = self.groups.remove(index);
        self.rebuild_registries();
        debug!("removed group {index}");
        Ok(group)
    }

    /// History entry recorded with the next save.
    fn next_history_entry(&self) -> Result<HistoryEntry> {
        let action = if self.history.is_empty() {
            "created"
        } else {
            "updated"
        };
        let comment = history_comment_xml(&[
            ("TX", action),
            ("tool_id", self.config.history_tool_id.as_str()),
            ("tool_vendor", self.config.history_tool_vendor.as_str()),
            ("tool_version", self.config.history_tool_version.as_str()),
        ])?;
        Ok(HistoryEntry {
            block: FileHistoryBlock::now(),
            comment: Some(TextBlock::metadata(&comment)),
        })
    }

    fn write_with<W: MdfWrite>(
        &self,
        writer: &mut MdfWriter<W>,
        history: &[HistoryEntry],
    ) -> Result<u64> {
        writer.write_file(&FileContents {
            identification: &self.identification,
            header: &self.header,
            header_comment: self.header_comment.as_ref(),
            history,
            groups: &self.groups,
        })
    }

    /// Writes the model to `destination`, or to the path it was opened
    /// from, appending a file history entry.
    pub fn save(&mut self, destination: Option<&Path>) -> Result<()> {
        let Some(path) = destination.map(Path::to_path_buf).or_else(|| self.path.clone()) else {
            return Err(Error::InvalidArgument(
                "save needs a destination for a model without a path".to_string(),
            ));
        };

        let mut history = self.history.clone();
        history.push(self.next_history_entry()?);
        let mut writer = MdfWriter::new(&path)?.with_compression(self.config.compression);
        let size = self.write_with(&mut writer, &history)?;

        self.history = history;
        info!("saved {} groups to {} ({size} bytes)", self.groups.len(), path.display());
        self.path = Some(path);
        Ok(())
    }

    /// Serializes the model into memory as `save` would, without recording
    /// the new history entry in the model.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut history = self.history.clone();
        history.push(self.next_history_entry()?);
        let mut writer = MdfWriter::in_memory().with_compression(self.config.compression);
        self.write_with(&mut writer, &history)?;
        Ok(writer.into_inner().into_inner())
    }

    /// Version and per-group channel summary.
    pub fn info(&self) -> MdfInfo {
        MdfInfo {
            version: self.identification.version().to_string(),
            program_id: self.identification.program_id.trim().to_string(),
            groups: self
                .groups
                .iter()
                .enumerate()
                .map(|(i, group)| GroupInfo::from_group(i, group))
                .collect(),
        }
    }
}

/// First and last value of numeric samples.
fn first_last(samples: &Samples) -> Option<(f64, f64)> {
    let values = samples.to_f64()?;
    Some((*values.first()?, *values.last()?))
}

/// `<FHcomment>` body with one text element per `(tag, text)` pair.
fn history_comment_xml(elements: &[(&str, &str)]) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Start(BytesStart::new("FHcomment")))
        .map_err(xml_error)?;
    for &(tag, text) in elements {
        writer
            .write_event(Event::Start(BytesStart::new(tag)))
            .map_err(xml_error)?;
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_error)?;
        writer
            .write_event(Event::End(BytesEnd::new(tag)))
            .map_err(xml_error)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("FHcomment")))
        .map_err(xml_error)?;
    String::from_utf8(writer.into_inner()).map_err(xml_error)
}

fn xml_error(e: impl fmt::Display) -> Error {
    Error::BlockSerializationError(format!("FHcomment: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder()
            .filter_level(log::LevelFilter::max())
            .is_test(true)
            .try_init();
    }

    fn speed() -> Signal {
        Signal::new("speed", vec![1.0, 2.0, 3.0], vec![0.0, 0.1, 0.2]).with_unit("km/h")
    }

    #[test]
    fn append_builds_master_and_registries() {
        init();
        let mut mdf = Mdf::new();
        let index = mdf.append(vec![speed()], "bench").unwrap();
        assert_eq!(index, 0);
        assert_eq!(mdf.find_channel("t"), Some((0, 0)));
        assert_eq!(mdf.find_channel("speed"), Some((0, 1)));
        assert_eq!(mdf.master_channel(0), Some(0));

        let group = mdf.group(0).unwrap();
        assert_eq!(group.channel_group.samples_byte_nr, 16);
        assert_eq!(group.channel_group.cycles_nr, 3);
        assert_eq!(group.channel_unit(0), "s");
        assert_eq!(group.channels[1].byte_offset, 8);
    }

    #[test]
    fn append_rejects_empty_input() {
        let mut mdf = Mdf::new();
        assert!(matches!(
            mdf.append(Vec::new(), "x"),
            Err(Error::InvalidArgument(_))
        ));
        let bad = Signal::new("bad", vec![1.0], vec![0.0, 1.0]);
        assert!(mdf.append(vec![bad], "x").is_err());
        assert!(mdf.groups().is_empty());
    }

    #[test]
    fn get_decodes_values_and_unit() {
        let mut mdf = Mdf::new();
        mdf.append(vec![speed()], "bench").unwrap();
        let signal = mdf.get("speed", None).unwrap();
        assert_eq!(signal.samples, Samples::F64(vec![1.0, 2.0, 3.0]));
        assert_eq!(signal.timestamps, vec![0.0, 0.1, 0.2]);
        assert_eq!(signal.unit, "km/h");
        assert_eq!(signal.conversion, None);
    }

    #[test]
    fn mismatched_time_bases_are_merged() {
        let mut mdf = Mdf::new();
        let a = Signal::new("a", vec![0.0, 10.0], vec![0.0, 1.0]);
        let b = Signal::new("b", vec![5.0, 5.0], vec![0.5, 1.5]);
        mdf.append(vec![a, b], "mix").unwrap();
        let a = mdf.get("a", None).unwrap();
        assert_eq!(a.timestamps, vec![0.0, 0.5, 1.0, 1.5]);
        assert_eq!(a.samples, Samples::F64(vec![0.0, 5.0, 10.0, 10.0]));
    }

    #[test]
    fn lookup_errors_are_typed() {
        let mut mdf = Mdf::new();
        mdf.append(vec![speed()], "bench").unwrap();
        assert!(matches!(
            mdf.get("missing", None),
            Err(Error::ChannelNotFound(_))
        ));
        assert!(matches!(
            mdf.get((3usize, 0usize), None),
            Err(Error::GroupIndexOutOfRange { index: 3, len: 1 })
        ));
        assert!(matches!(
            mdf.get((0usize, 9usize), None),
            Err(Error::ChannelIndexOutOfRange { .. })
        ));
        assert!(matches!(
            mdf.get("speed", Some(0.0)),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn raster_resamples_from_zero() {
        let mut mdf = Mdf::new();
        let ramp = Signal::new("ramp", vec![0.0, 4.0], vec![0.0, 4.0]);
        mdf.append(vec![ramp], "r").unwrap();
        let signal = mdf.get("ramp", Some(1.0)).unwrap();
        let expected = linspace(0.0, 4.0, 4);
        assert_eq!(signal.timestamps, expected);
        assert_eq!(signal.samples, Samples::F64(expected));
    }

    #[test]
    fn remove_by_channel_name() {
        let mut mdf = Mdf::new();
        mdf.append(vec![speed()], "a").unwrap();
        mdf.append(vec![Signal::new("rpm", vec![1u16, 2], vec![0.0, 1.0])], "b")
            .unwrap();
        let removed = mdf.remove("speed").unwrap();
        assert_eq!(removed.channel_name(1), "speed");
        assert_eq!(mdf.find_channel("rpm"), Some((0, 1)));
        assert!(mdf.remove(5usize).is_err());
        assert_eq!(mdf.groups().len(), 1);
    }

    #[test]
    fn save_needs_a_destination() {
        let mut mdf = Mdf::new();
        assert!(matches!(mdf.save(None), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn history_comment_records_creation() {
        let mdf = Mdf::new();
        let entry = mdf.next_history_entry().unwrap();
        let comment = entry.comment.unwrap();
        assert!(comment.is_metadata());
        assert!(comment.text.contains("<TX>created</TX>"));
    }

    #[test]
    fn history_comment_escapes_tool_fields() {
        let config = MdfConfig {
            history_tool_vendor: "Smith & <Sons>".to_string(),
            ..MdfConfig::default()
        };
        let mdf = Mdf::with_config(config).unwrap();
        let comment = mdf.next_history_entry().unwrap().comment.unwrap();
        assert!(
            comment
                .text
                .contains("<tool_vendor>Smith &amp; &lt;Sons&gt;</tool_vendor>")
        );
        assert!(!comment.text.contains("<Sons>"));
    }
}
