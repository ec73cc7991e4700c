use mdf4_model::blocks::{
    ChannelBlock, ChannelConversion, ChannelGroupBlock, ChannelType, ConversionKind,
    HeaderBlock, IdentificationBlock, TextBlock,
};
use mdf4_model::writer::FileContents;
use mdf4_model::{
    ChannelTexts, Compression, DataType, Error, ErrorKind, Group, Mdf, MdfConfig, MdfWriter,
    Result, Samples, Signal,
};

fn init() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::max())
        .is_test(true)
        .try_init();
}

fn timestamps(n: usize) -> Vec<f64> {
    (0..n).map(|i| i as f64 * 0.25).collect()
}

fn signals() -> Vec<Signal> {
    vec![
        Signal::new("speed", vec![0.5, 1.5, 2.5, 3.5], timestamps(4)).with_unit("m/s"),
        Signal::new("gear", vec![-1i32, 0, 1, 2], timestamps(4)),
        Signal::new("rpm", vec![800u16, 1200, 3000, 65535], timestamps(4)).with_unit("1/min"),
        Signal::new(
            "state",
            vec![
                "idle".to_string(),
                "run".to_string(),
                "run".to_string(),
                "stopped".to_string(),
            ],
            timestamps(4),
        ),
    ]
}

#[test]
fn writer_and_parser_roundtrip() -> Result<()> {
    init();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("roundtrip.mf4");

    let mut mdf = Mdf::open(&path)?;
    assert!(mdf.groups().is_empty());
    mdf.append(signals(), "bench")?;
    mdf.save(None)?;

    let reread = Mdf::open(&path)?;
    assert_eq!(reread.groups().len(), 1);
    for original in signals() {
        let signal = reread.get(original.name.as_str(), None)?;
        assert_eq!(signal.samples, original.samples, "{}", original.name);
        assert_eq!(signal.timestamps, original.timestamps);
        assert_eq!(signal.unit, original.unit);
    }

    let time = reread.get("t", None)?;
    assert_eq!(time.unit, "s");
    assert_eq!(time.samples, Samples::F64(timestamps(4)));
    Ok(())
}

#[test]
fn history_grows_on_every_save() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("history.mf4");

    let mut mdf = Mdf::new();
    mdf.append(signals(), "bench")?;
    mdf.save(Some(&path))?;
    let mut reread = Mdf::open(&path)?;
    assert_eq!(reread.history().len(), 1);
    let comment = reread.history()[0].comment.as_ref().map(|c| c.text.clone());
    assert!(comment.unwrap_or_default().contains("<TX>created</TX>"));

    reread.save(None)?;
    let again = Mdf::open(&path)?;
    assert_eq!(again.history().len(), 2);
    let comment = again.history()[1].comment.as_ref().map(|c| c.text.clone());
    assert!(comment.unwrap_or_default().contains("<TX>updated</TX>"));
    Ok(())
}

#[test]
fn identical_texts_are_stored_once() -> Result<()> {
    let mut mdf = Mdf::new();
    mdf.append(
        vec![Signal::new("speed", vec![1.0, 2.0], vec![0.0, 1.0])],
        "can0",
    )?;
    mdf.append(
        vec![Signal::new("speed", vec![3.0, 4.0], vec![0.0, 1.0])],
        "can0",
    )?;
    let reread = Mdf::from_bytes(&mdf.to_bytes()?)?;

    let first = &reread.groups()[0];
    let second = &reread.groups()[1];
    assert_eq!(first.channels[1].name_addr, second.channels[1].name_addr);
    assert_eq!(first.channels[0].name_addr, second.channels[0].name_addr);
    let source = first.sources[1].as_ref().map(|s| (s.block.name_addr, s.block.path_addr));
    let (name, path) = source.unwrap_or_default();
    assert_ne!(name, 0);
    assert_eq!(name, path);

    // last registration wins
    assert_eq!(reread.find_channel("speed"), Some((1, 1)));
    Ok(())
}

#[test]
fn zero_cycle_group_reads_back_empty() -> Result<()> {
    let mut mdf = Mdf::new();
    mdf.append(
        vec![Signal::new("empty", Vec::<f64>::new(), Vec::new())],
        "none",
    )?;
    let reread = Mdf::from_bytes(&mdf.to_bytes()?)?;
    assert_eq!(reread.groups()[0].data_group.data_block_addr, 0);

    let signal = reread.get("empty", None)?;
    assert!(signal.samples.is_empty());
    assert!(signal.timestamps.is_empty());
    Ok(())
}

#[test]
fn remove_out_of_range_leaves_model_untouched() -> Result<()> {
    let mut mdf = Mdf::new();
    mdf.append(signals(), "bench")?;
    let err = mdf.remove(4usize).unwrap_err();
    assert!(matches!(err, Error::GroupIndexOutOfRange { index: 4, len: 1 }));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(mdf.remove("nope").is_err());
    assert_eq!(mdf.groups().len(), 1);
    assert!(mdf.get("speed", None).is_ok());

    mdf.remove(0usize)?;
    assert!(mdf.groups().is_empty());
    assert_eq!(mdf.get("speed", None).unwrap_err().kind(), ErrorKind::NotFound);
    Ok(())
}

#[test]
fn virtual_master_is_synthesized() -> Result<()> {
    let master = ChannelBlock {
        channel_type: ChannelType::VirtualMaster,
        sync_type: 1,
        data_type: DataType::UnsignedIntegerLE,
        bit_count: 0,
        ..ChannelBlock::default()
    };
    let value = ChannelBlock {
        data_type: DataType::UnsignedIntegerLE,
        bit_count: 8,
        ..ChannelBlock::default()
    };
    let group = Group {
        channel_group: ChannelGroupBlock::new(5, 1),
        channels: vec![master, value],
        conversions: vec![
            Some(ChannelConversion::new(ConversionKind::Linear { a: 0.01, b: 0.0 })),
            None,
        ],
        sources: vec![None, None],
        texts: vec![
            ChannelTexts {
                name: Some(TextBlock::new("time")),
                ..ChannelTexts::default()
            },
            ChannelTexts {
                name: Some(TextBlock::new("counter")),
                ..ChannelTexts::default()
            },
        ],
        payload: vec![10, 11, 12, 13, 14],
        ..Group::default()
    };

    let identification = IdentificationBlock::default();
    let header = HeaderBlock::default();
    let groups = [group];
    let mut writer = MdfWriter::in_memory();
    writer.write_file(&FileContents {
        identification: &identification,
        header: &header,
        header_comment: None,
        history: &[],
        groups: &groups,
    })?;
    let image = writer.into_inner().into_inner();

    let mdf = Mdf::from_bytes(&image)?;
    let counter = mdf.get("counter", None)?;
    assert_eq!(counter.samples, Samples::U8(vec![10, 11, 12, 13, 14]));
    assert_eq!(counter.timestamps, vec![0.0, 0.01, 0.02, 0.03, 0.04]);
    Ok(())
}

#[test]
fn last_declared_master_is_the_time_base() -> Result<()> {
    let virtual_master = ChannelBlock {
        channel_type: ChannelType::VirtualMaster,
        sync_type: 1,
        data_type: DataType::UnsignedIntegerLE,
        bit_count: 0,
        ..ChannelBlock::default()
    };
    let value = ChannelBlock {
        data_type: DataType::UnsignedIntegerLE,
        bit_count: 8,
        ..ChannelBlock::default()
    };
    let named = |name: &str| ChannelTexts {
        name: Some(TextBlock::new(name)),
        ..ChannelTexts::default()
    };
    let group = Group {
        channel_group: ChannelGroupBlock::new(3, 1),
        channels: vec![virtual_master.clone(), virtual_master, value],
        conversions: vec![
            Some(ChannelConversion::new(ConversionKind::Linear { a: 0.01, b: 0.0 })),
            Some(ChannelConversion::new(ConversionKind::Linear { a: 0.5, b: 1.0 })),
            None,
        ],
        sources: vec![None, None, None],
        texts: vec![named("coarse"), named("fine"), named("counter")],
        payload: vec![7, 8, 9],
        ..Group::default()
    };

    let identification = IdentificationBlock::default();
    let header = HeaderBlock::default();
    let groups = [group];
    let mut writer = MdfWriter::in_memory();
    writer.write_file(&FileContents {
        identification: &identification,
        header: &header,
        header_comment: None,
        history: &[],
        groups: &groups,
    })?;

    let mdf = Mdf::from_bytes(&writer.into_inner().into_inner())?;
    assert_eq!(mdf.master_channel(0), Some(1));
    assert_eq!(mdf.get("counter", None)?.timestamps, vec![1.0, 1.5, 2.0]);
    Ok(())
}

#[test]
fn nan_timestamps_do_not_break_resampling() -> Result<()> {
    init();
    let mut mdf = Mdf::new();
    mdf.append(
        vec![
            Signal::new("a", vec![1.0, 2.0], vec![0.0, 1.0]),
            Signal::new("b", vec![10i32, 20], vec![0.0, f64::NAN]),
        ],
        "nan",
    )?;
    let a = mdf.get("a", None)?;
    assert_eq!(a.timestamps.len(), 3);
    assert_eq!(a.timestamps[..2], [0.0, 1.0]);
    assert!(a.timestamps[2].is_nan());
    let Samples::F64(values) = &a.samples else {
        panic!("expected f64 samples, got {:?}", a.samples);
    };
    assert_eq!(values[..2], [1.0, 2.0]);
    assert!(values[2].is_nan());
    assert_eq!(mdf.get("b", None)?.samples.len(), 3);
    Ok(())
}

#[test]
fn compressed_payloads_roundtrip() -> Result<()> {
    if !cfg!(feature = "compression") {
        return Ok(());
    }
    let config = MdfConfig {
        compression: Compression::Deflate,
        ..MdfConfig::default()
    };
    let mut mdf = Mdf::with_config(config)?;
    let n = 500;
    let values: Vec<f64> = (0..n).map(|i| (i as f64 * 0.1).sin()).collect();
    mdf.append(vec![Signal::new("wave", values.clone(), timestamps(n))], "gen")?;

    let image = mdf.to_bytes()?;
    assert!(image.windows(4).any(|w| w == b"##DZ"));
    let reread = Mdf::from_bytes(&image)?;
    assert_eq!(reread.get("wave", None)?.samples, Samples::F64(values));
    Ok(())
}

#[test]
fn info_summarizes_groups() -> Result<()> {
    let mut mdf = Mdf::new();
    mdf.append(signals(), "bench")?;
    let info = mdf.info();
    assert_eq!(info.version, "4.10");
    assert_eq!(info.groups.len(), 1);
    assert_eq!(info.groups[0].cycles, 4);
    assert_eq!(info.groups[0].channel_count, 5);
    assert_eq!(info.groups[0].channels[0].channel_type, ChannelType::Master);
    assert_eq!(info.groups[0].acquisition_name.as_deref(), Some("bench"));
    assert!(info.to_json()?.contains("\"speed\""));
    Ok(())
}

#[test]
fn corrupt_image_is_a_format_error() {
    let mut mdf = Mdf::new();
    mdf.append(signals(), "bench").unwrap();
    let mut image = mdf.to_bytes().unwrap();
    // break the header tag
    image[64..68].copy_from_slice(b"##XX");
    let err = Mdf::from_bytes(&image).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}
