use mdf4_model::{
    ConversionKind, Error, ErrorKind, FormulaEvaluator, LinearResampler, Mdf, Resampler, Result,
    Samples, Signal,
};

fn ticks(n: usize) -> Vec<f64> {
    (0..n).map(|i| i as f64).collect()
}

/// Appends `signal`, serializes the model and reads it back.
fn reread(signal: Signal) -> Result<Mdf> {
    let mut mdf = Mdf::new();
    mdf.append(vec![signal], "conv")?;
    Mdf::from_bytes(&mdf.to_bytes()?)
}

#[test]
fn linear_conversion_is_applied() -> Result<()> {
    let raw = Signal::new("temp", vec![0i32, 10, -4], ticks(3))
        .with_unit("degC")
        .with_conversion(ConversionKind::Linear { a: 0.5, b: -40.0 });
    let signal = reread(raw)?.get("temp", None)?;
    assert_eq!(signal.samples, Samples::F64(vec![-40.0, -35.0, -42.0]));
    assert_eq!(signal.unit, "degC");
    assert_eq!(signal.conversion, None);
    Ok(())
}

#[test]
fn rational_conversion_is_applied() -> Result<()> {
    let raw = Signal::new("r", vec![1.0, 2.0], ticks(2)).with_conversion(
        ConversionKind::Rational {
            p: [0.0, 2.0, 1.0, 0.0, 0.0, 1.0],
        },
    );
    let signal = reread(raw)?.get("r", None)?;
    assert_eq!(signal.samples, Samples::F64(vec![3.0, 5.0]));
    Ok(())
}

#[test]
fn algebraic_formula_survives_the_file() -> Result<()> {
    let raw = Signal::new("alg", vec![1.0, 2.0, 3.0], ticks(3)).with_conversion(
        ConversionKind::Algebraic {
            formula: "X * X + 1".to_string(),
        },
    );
    let signal = reread(raw)?.get("alg", None)?;
    assert_eq!(signal.samples, Samples::F64(vec![2.0, 5.0, 10.0]));
    Ok(())
}

#[test]
fn deeply_nested_formula_is_rejected() -> Result<()> {
    let depth = 200_000;
    let formula = format!("{}X{}", "(".repeat(depth), ")".repeat(depth));
    let raw = Signal::new("deep", vec![1.0, 2.0], ticks(2))
        .with_conversion(ConversionKind::Algebraic { formula });
    let err = reread(raw)?.get("deep", None).unwrap_err();
    assert!(matches!(err, Error::FormulaError(_)));
    assert_eq!(err.kind(), ErrorKind::Argument);
    Ok(())
}

struct Negate;

impl FormulaEvaluator for Negate {
    fn evaluate(&self, _formula: &str, raw: &[f64]) -> Result<Vec<f64>> {
        Ok(raw.iter().map(|x| -x).collect())
    }
}

#[test]
fn injected_formula_evaluator_is_used() -> Result<()> {
    let raw = Signal::new("alg", vec![1.0, 2.0], ticks(2)).with_conversion(
        ConversionKind::Algebraic {
            formula: "sqrt(X)".to_string(),
        },
    );
    let mdf = reread(raw)?.with_formula_evaluator(Negate);
    assert_eq!(
        mdf.get("alg", None)?.samples,
        Samples::F64(vec![-1.0, -2.0])
    );
    Ok(())
}

#[test]
fn tabular_nearest_clips_to_table_bounds() -> Result<()> {
    let raw = Signal::new("n", vec![-5.0, 0.0, 1.5, 2.0, 99.0], ticks(5)).with_conversion(
        ConversionKind::TabularNearest {
            table: vec![(0.0, 10.0), (1.0, 20.0), (2.0, 30.0)],
        },
    );
    let signal = reread(raw)?.get("n", None)?;
    assert_eq!(
        signal.samples,
        Samples::F64(vec![10.0, 10.0, 20.0, 30.0, 30.0])
    );
    Ok(())
}

#[test]
fn tabular_interpolation_clamps_outside() -> Result<()> {
    let raw = Signal::new("i", vec![-1.0, 0.5, 5.0], ticks(3)).with_conversion(
        ConversionKind::TabularInterpolated {
            table: vec![(0.0, 0.0), (1.0, 100.0)],
        },
    );
    let signal = reread(raw)?.get("i", None)?;
    assert_eq!(signal.samples, Samples::F64(vec![0.0, 50.0, 100.0]));
    Ok(())
}

#[test]
fn tabular_interpolation_passes_nan_through() -> Result<()> {
    let raw = Signal::new("temp", vec![1.0, f64::NAN, 3.0], ticks(3)).with_conversion(
        ConversionKind::TabularInterpolated {
            table: vec![(0.0, 0.0), (10.0, 100.0)],
        },
    );
    let signal = reread(raw)?.get("temp", None)?;
    let Samples::F64(values) = &signal.samples else {
        panic!("expected f64 samples, got {:?}", signal.samples);
    };
    assert_eq!(values[0], 10.0);
    assert!(values[1].is_nan());
    assert_eq!(values[2], 30.0);
    Ok(())
}

#[test]
fn range_tabular_first_match_and_default() -> Result<()> {
    let raw = Signal::new("rt", vec![5u8, 15, 50], ticks(3)).with_conversion(
        ConversionKind::RangeTabular {
            ranges: vec![(0.0, 10.0, 1.0), (5.0, 20.0, 2.0)],
            default: -1.0,
        },
    );
    let signal = reread(raw)?.get("rt", None)?;
    assert_eq!(signal.samples, Samples::F64(vec![1.0, 2.0, -1.0]));
    Ok(())
}

#[test]
fn value_to_text_returns_its_table() -> Result<()> {
    let table = ConversionKind::ValueToText {
        table: vec![(0.0, "off".to_string()), (1.0, "on".to_string())],
        default: Some("unknown".to_string()),
    };
    let raw = Signal::new("switch", vec![0u8, 1, 7], ticks(3)).with_conversion(table.clone());
    let signal = reread(raw)?.get("switch", None)?;
    assert_eq!(signal.samples, Samples::U8(vec![0, 1, 7]));
    assert_eq!(signal.conversion.as_ref(), Some(&table));
    assert_eq!(
        table.to_text(&signal.samples),
        Some(vec!["off".to_string(), "on".to_string(), "unknown".to_string()])
    );
    Ok(())
}

#[test]
fn range_to_text_descriptor_roundtrips() -> Result<()> {
    let table = ConversionKind::RangeToText {
        ranges: vec![
            (0.0, 9.0, "low".to_string()),
            (5.0, 20.0, "mid".to_string()),
        ],
        default: Some("high".to_string()),
    };
    let raw = Signal::new("level", vec![7u16, 12, 90], ticks(3)).with_conversion(table.clone());
    let signal = reread(raw)?.get("level", None)?;
    assert_eq!(signal.conversion.as_ref(), Some(&table));
    assert_eq!(
        table.to_text(&signal.samples),
        Some(vec!["low".to_string(), "mid".to_string(), "high".to_string()])
    );

    // the descriptor can be appended again unchanged
    let mut mdf = Mdf::new();
    mdf.append(vec![signal.clone()], "copy")?;
    assert_eq!(mdf.get("level", None)?.conversion, signal.conversion);
    Ok(())
}

#[test]
fn text_to_value_maps_keys() -> Result<()> {
    let raw = Signal::new(
        "mode",
        vec!["eco".to_string(), "sport".to_string(), "other".to_string()],
        ticks(3),
    )
    .with_conversion(ConversionKind::TextToValue {
        table: vec![("eco".to_string(), 1.0), ("sport".to_string(), 2.0)],
        default: 0.0,
    });
    let signal = reread(raw)?.get("mode", None)?;
    assert_eq!(signal.samples, Samples::F64(vec![1.0, 2.0, 0.0]));
    assert!(signal.conversion.is_some());
    Ok(())
}

#[test]
fn text_to_text_translates() -> Result<()> {
    let raw = Signal::new(
        "lang",
        vec!["ja".to_string(), "nein".to_string(), "?".to_string()],
        ticks(3),
    )
    .with_conversion(ConversionKind::TextToText {
        pairs: vec![
            ("ja".to_string(), "yes".to_string()),
            ("nein".to_string(), "no".to_string()),
        ],
        default: Some("n/a".to_string()),
    });
    let signal = reread(raw)?.get("lang", None)?;
    assert_eq!(
        signal.samples,
        Samples::Text(vec!["yes".to_string(), "no".to_string(), "n/a".to_string()])
    );
    Ok(())
}

#[test]
fn physical_range_is_kept() -> Result<()> {
    let raw = Signal::new("p", vec![1.0, 2.0], ticks(2)).with_physical_range(-10.0, 10.0);
    let signal = reread(raw)?.get("p", None)?;
    assert_eq!(signal.physical_range, Some((-10.0, 10.0)));

    let raw = Signal::new("q", vec![3.0, -2.0], ticks(2));
    assert_eq!(reread(raw)?.get("q", None)?.physical_range, Some((-2.0, 3.0)));
    Ok(())
}

struct Hold;

impl Resampler for Hold {
    fn resample(&self, samples: &Samples, timestamps: &[f64], target: &[f64]) -> Result<Samples> {
        // previous-sample hold for every type
        let text = match samples {
            Samples::F64(v) => Samples::Text(v.iter().map(f64::to_string).collect()),
            other => other.clone(),
        };
        match LinearResampler.resample(&text, timestamps, target)? {
            Samples::Text(v) => Ok(Samples::F64(
                v.iter().map(|s| s.parse().unwrap_or(f64::NAN)).collect(),
            )),
            other => Ok(other),
        }
    }
}

#[test]
fn injected_resampler_drives_raster() -> Result<()> {
    let mut mdf = Mdf::new().with_resampler(Hold);
    mdf.append(
        vec![Signal::new("step", vec![0.0, 10.0, 20.0], vec![0.0, 1.0, 2.0])],
        "hold",
    )?;
    let signal = mdf.get("step", Some(0.5))?;
    assert_eq!(signal.timestamps.len(), 4);
    assert_eq!(
        signal.samples,
        Samples::F64(vec![0.0, 0.0, 10.0, 20.0])
    );
    Ok(())
}
