use super::base::{CC_FLAG_PHYSICAL_RANGE, ConversionBlock, table_count};
use super::formula::FormulaEvaluator;
use super::types::ConversionType;
use super::{linear, table_lookup, text};
use crate::signal::Samples;
use crate::{Error, Result};

/// A conversion rule with its tables held as typed, ordered entries.
///
/// Table entries keep their declared order; every lookup returns the first
/// matching entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionKind {
    Identity,
    /// `phys = raw * a + b`
    Linear { a: f64, b: f64 },
    /// `(p0 x² + p1 x + p2) / (p3 x² + p4 x + p5)`
    Rational { p: [f64; 6] },
    Algebraic { formula: String },
    TabularInterpolated { table: Vec<(f64, f64)> },
    TabularNearest { table: Vec<(f64, f64)> },
    RangeTabular {
        ranges: Vec<(f64, f64, f64)>,
        default: f64,
    },
    ValueToText {
        table: Vec<(f64, String)>,
        default: Option<String>,
    },
    RangeToText {
        ranges: Vec<(f64, f64, String)>,
        default: Option<String>,
    },
    TextToValue {
        table: Vec<(String, f64)>,
        default: f64,
    },
    TextToText {
        pairs: Vec<(String, String)>,
        default: Option<String>,
    },
}

impl ConversionKind {
    pub fn conversion_type(&self) -> ConversionType {
        match self {
            ConversionKind::Identity => ConversionType::Identity,
            ConversionKind::Linear { .. } => ConversionType::Linear,
            ConversionKind::Rational { .. } => ConversionType::Rational,
            ConversionKind::Algebraic { .. } => ConversionType::Algebraic,
            ConversionKind::TabularInterpolated { .. } => ConversionType::TableLookupInterp,
            ConversionKind::TabularNearest { .. } => ConversionType::TableLookupNoInterp,
            ConversionKind::RangeTabular { .. } => ConversionType::RangeLookup,
            ConversionKind::ValueToText { .. } => ConversionType::ValueToText,
            ConversionKind::RangeToText { .. } => ConversionType::RangeToText,
            ConversionKind::TextToValue { .. } => ConversionType::TextToValue,
            ConversionKind::TextToText { .. } => ConversionType::TextToText,
        }
    }

    /// `(a, b)` for the linear kind.
    pub fn linear_coefficients(&self) -> Option<(f64, f64)> {
        match self {
            ConversionKind::Linear { a, b } => Some((*a, *b)),
            _ => None,
        }
    }

    /// Maps numeric samples through a VALUE-TO-TEXT or RANGE-TO-TEXT table.
    /// Unmatched values take the default label, or their own decimal form
    /// when there is none. `None` for the other kinds or non-numeric input.
    pub fn to_text(&self, raw: &Samples) -> Option<Vec<String>> {
        let values = raw.to_f64()?;
        let label = |found: Option<&str>, default: &Option<String>, v: f64| {
            found
                .map(str::to_string)
                .or_else(|| default.clone())
                .unwrap_or_else(|| v.to_string())
        };
        match self {
            ConversionKind::ValueToText { table, default } => Some(
                values
                    .iter()
                    .map(|&v| label(text::value_to_text(table, v), default, v))
                    .collect(),
            ),
            ConversionKind::RangeToText { ranges, default } => Some(
                values
                    .iter()
                    .map(|&v| label(text::range_to_text(ranges, v), default, v))
                    .collect(),
            ),
            _ => None,
        }
    }
}

fn count_error(declared: usize, found: usize) -> Error {
    Error::InconsistentCount {
        block: "##CC",
        declared,
        found,
    }
}

/// A channel's conversion: the typed rule plus the block attributes that
/// survive a read/write cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelConversion {
    pub kind: ConversionKind,
    pub physical_range: Option<(f64, f64)>,
    pub precision: u8,
    pub flags: u16,
}

impl ChannelConversion {
    pub fn new(kind: ConversionKind) -> Self {
        Self {
            kind,
            physical_range: None,
            precision: 0,
            flags: 0,
        }
    }

    pub fn with_physical_range(mut self, min: f64, max: f64) -> Self {
        self.physical_range = Some((min, max));
        self
    }

    /// Builds the typed view of `block`.
    ///
    /// `ref_texts[i]` is the resolved text of `block.refs[i]` (`None` for a
    /// null link or a non-text target). The number of table entries is taken
    /// from the block's own counts, which must agree with each other.
    pub fn from_block(block: &ConversionBlock, ref_texts: &[Option<String>]) -> Result<Self> {
        if block.ref_count as usize != block.refs.len() {
            return Err(count_error(block.ref_count as usize, block.refs.len()));
        }
        if block.value_count as usize != block.values.len() {
            return Err(count_error(block.value_count as usize, block.values.len()));
        }
        if ref_texts.len() != block.refs.len() {
            return Err(count_error(block.refs.len(), ref_texts.len()));
        }

        let vals = &block.values;
        let text_at = |i: usize| ref_texts[i].clone().unwrap_or_default();
        let need_values = |n: usize| {
            if vals.len() < n {
                Err(count_error(vals.len(), n))
            } else {
                Ok(())
            }
        };

        let kind = match block.conversion_type {
            ConversionType::Identity => ConversionKind::Identity,
            ConversionType::Linear => {
                need_values(2)?;
                ConversionKind::Linear {
                    a: vals[1],
                    b: vals[0],
                }
            }
            ConversionType::Rational => {
                need_values(6)?;
                ConversionKind::Rational {
                    p: [vals[0], vals[1], vals[2], vals[3], vals[4], vals[5]],
                }
            }
            ConversionType::Algebraic => {
                let formula = ref_texts.first().cloned().flatten().ok_or_else(|| {
                    Error::ConversionError("algebraic conversion without formula text".into())
                })?;
                ConversionKind::Algebraic { formula }
            }
            ConversionType::TableLookupInterp | ConversionType::TableLookupNoInterp => {
                if vals.len() % 2 != 0 {
                    return Err(count_error(vals.len(), vals.len() + 1));
                }
                let table = vals.chunks_exact(2).map(|c| (c[0], c[1])).collect();
                if block.conversion_type == ConversionType::TableLookupInterp {
                    ConversionKind::TabularInterpolated { table }
                } else {
                    ConversionKind::TabularNearest { table }
                }
            }
            ConversionType::RangeLookup => {
                if vals.len() % 3 != 1 {
                    return Err(count_error(vals.len(), (vals.len() / 3) * 3 + 1));
                }
                let n = vals.len() / 3;
                ConversionKind::RangeTabular {
                    ranges: vals[..3 * n]
                        .chunks_exact(3)
                        .map(|c| (c[0], c[1], c[2]))
                        .collect(),
                    default: vals[3 * n],
                }
            }
            ConversionType::ValueToText => {
                let n = vals.len();
                if block.refs.len() != n + 1 {
                    return Err(count_error(block.refs.len(), n + 1));
                }
                ConversionKind::ValueToText {
                    table: (0..n).map(|i| (vals[i], text_at(i))).collect(),
                    default: ref_texts[n].clone(),
                }
            }
            ConversionType::RangeToText => {
                if vals.len() % 2 != 0 {
                    return Err(count_error(vals.len(), vals.len() + 1));
                }
                let n = vals.len() / 2;
                if block.refs.len() != n + 1 {
                    return Err(count_error(block.refs.len(), n + 1));
                }
                ConversionKind::RangeToText {
                    ranges: (0..n)
                        .map(|i| (vals[2 * i], vals[2 * i + 1], text_at(i)))
                        .collect(),
                    default: ref_texts[n].clone(),
                }
            }
            ConversionType::TextToValue => {
                let n = block.refs.len();
                if vals.len() != n + 1 {
                    return Err(count_error(vals.len(), n + 1));
                }
                ConversionKind::TextToValue {
                    table: (0..n).map(|i| (text_at(i), vals[i])).collect(),
                    default: vals[n],
                }
            }
            ConversionType::TextToText => {
                if block.refs.len() % 2 != 1 {
                    return Err(count_error(block.refs.len(), block.refs.len() + 1));
                }
                let n = block.refs.len() / 2;
                ConversionKind::TextToText {
                    pairs: (0..n)
                        .map(|i| (text_at(2 * i), text_at(2 * i + 1)))
                        .collect(),
                    default: ref_texts[2 * n].clone(),
                }
            }
            ConversionType::Unknown(code) => return Err(Error::UnsupportedConversion(code)),
        };

        Ok(Self {
            kind,
            physical_range: block.physical_range(),
            precision: block.precision,
            flags: block.flags & !CC_FLAG_PHYSICAL_RANGE,
        })
    }

    /// Texts referenced from the block's `refs`, in link order. The writer
    /// stores each `Some` as a `##TX` block and links it at the same index;
    /// `None` becomes a null link.
    pub fn ref_texts(&self) -> Vec<Option<&str>> {
        match &self.kind {
            ConversionKind::Algebraic { formula } => vec![Some(formula.as_str())],
            ConversionKind::ValueToText { table, default } => table
                .iter()
                .map(|(_, t)| Some(t.as_str()))
                .chain(std::iter::once(default.as_deref()))
                .collect(),
            ConversionKind::RangeToText { ranges, default } => ranges
                .iter()
                .map(|(_, _, t)| Some(t.as_str()))
                .chain(std::iter::once(default.as_deref()))
                .collect(),
            ConversionKind::TextToValue { table, .. } => {
                table.iter().map(|(t, _)| Some(t.as_str())).collect()
            }
            ConversionKind::TextToText { pairs, default } => pairs
                .iter()
                .flat_map(|(i, o)| [Some(i.as_str()), Some(o.as_str())])
                .chain(std::iter::once(default.as_deref()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// On-disk block with all links null and one `refs` slot per entry of
    /// [`ref_texts`](Self::ref_texts). Tables longer than the 16-bit count
    /// fields allow are a [`Error::BlockSerializationError`].
    pub fn to_block(&self) -> Result<ConversionBlock> {
        let mut block = ConversionBlock::new(self.kind.conversion_type());
        block.precision = self.precision;
        block.flags = self.flags & !CC_FLAG_PHYSICAL_RANGE;
        if let Some((min, max)) = self.physical_range {
            block.flags |= CC_FLAG_PHYSICAL_RANGE;
            block.phys_range_min = min;
            block.phys_range_max = max;
        }
        block.values = match &self.kind {
            ConversionKind::Identity | ConversionKind::Algebraic { .. } => Vec::new(),
            ConversionKind::Linear { a, b } => vec![*b, *a],
            ConversionKind::Rational { p } => p.to_vec(),
            ConversionKind::TabularInterpolated { table }
            | ConversionKind::TabularNearest { table } => {
                table.iter().flat_map(|&(k, v)| [k, v]).collect()
            }
            ConversionKind::RangeTabular { ranges, default } => ranges
                .iter()
                .flat_map(|&(lo, hi, v)| [lo, hi, v])
                .chain(std::iter::once(*default))
                .collect(),
            ConversionKind::ValueToText { table, .. } => table.iter().map(|(k, _)| *k).collect(),
            ConversionKind::RangeToText { ranges, .. } => {
                ranges.iter().flat_map(|(lo, hi, _)| [*lo, *hi]).collect()
            }
            ConversionKind::TextToValue { table, default } => table
                .iter()
                .map(|(_, v)| *v)
                .chain(std::iter::once(*default))
                .collect(),
            ConversionKind::TextToText { .. } => Vec::new(),
        };
        block.refs = vec![0; self.ref_texts().len()];
        block.ref_count = table_count(block.refs.len(), "references")?;
        block.value_count = table_count(block.values.len(), "values")?;
        Ok(block)
    }

    /// The table descriptor handed back to callers for the text kinds.
    pub fn descriptor(&self) -> Option<ConversionKind> {
        self.kind
            .conversion_type()
            .is_text_based()
            .then(|| self.kind.clone())
    }

    /// Converts raw samples to physical samples.
    ///
    /// VALUE-TO-TEXT and RANGE-TO-TEXT leave the raw values in place (their
    /// table is reported through [`descriptor`](Self::descriptor)); the
    /// text-input kinds require text samples.
    pub fn apply(&self, raw: Samples, evaluator: &dyn FormulaEvaluator) -> Result<Samples> {
        let numeric = |raw: &Samples| {
            raw.to_f64().ok_or_else(|| {
                Error::ConversionError(format!(
                    "{:?} conversion needs numeric samples",
                    self.kind.conversion_type()
                ))
            })
        };
        let textual = |raw: &Samples| -> Result<Vec<String>> {
            raw.as_text().map(<[String]>::to_vec).ok_or_else(|| {
                Error::ConversionError(format!(
                    "{:?} conversion needs text samples",
                    self.kind.conversion_type()
                ))
            })
        };

        let converted = match &self.kind {
            ConversionKind::Identity
            | ConversionKind::ValueToText { .. }
            | ConversionKind::RangeToText { .. } => raw,
            ConversionKind::Linear { a, b } if *a == 1.0 && *b == 0.0 => raw,
            ConversionKind::Linear { a, b } => {
                Samples::F64(linear::apply_linear(&numeric(&raw)?, *a, *b))
            }
            ConversionKind::Rational { p } => {
                Samples::F64(linear::apply_rational(&numeric(&raw)?, p))
            }
            ConversionKind::Algebraic { formula } => {
                Samples::F64(evaluator.evaluate(formula, &numeric(&raw)?)?)
            }
            ConversionKind::TabularInterpolated { table } => Samples::F64(
                numeric(&raw)?
                    .into_iter()
                    .map(|v| table_lookup::interpolate(table, v))
                    .collect(),
            ),
            ConversionKind::TabularNearest { table } => Samples::F64(
                numeric(&raw)?
                    .into_iter()
                    .map(|v| table_lookup::nearest(table, v))
                    .collect(),
            ),
            ConversionKind::RangeTabular { ranges, default } => Samples::F64(
                numeric(&raw)?
                    .into_iter()
                    .map(|v| table_lookup::range_lookup(ranges, *default, v))
                    .collect(),
            ),
            ConversionKind::TextToValue { table, default } => Samples::F64(
                textual(&raw)?
                    .iter()
                    .map(|s| text::text_to_value(table, *default, s))
                    .collect(),
            ),
            ConversionKind::TextToText { pairs, default } => Samples::Text(
                textual(&raw)?
                    .iter()
                    .map(|s| text::text_to_text(pairs, default.as_deref(), s))
                    .collect(),
            ),
        };
        Ok(converted)
    }
}
