//! Typed sample arrays and the signal bundle exchanged with callers.

use crate::blocks::DataType;
use crate::blocks::conversion::ConversionKind;

/// A channel's samples in their stored (raw) or converted representation.
///
/// Integer variants keep the stored width so that a signal read back from a
/// file is re-appended with the same encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    Text(Vec<String>),
    Bytes(Vec<Vec<u8>>),
}

/// Expands `$body` once per numeric variant with `$v` bound to the vector.
macro_rules! numeric_dispatch {
    ($samples:expr, $v:ident => $body:expr, $($other:pat => $fallback:expr),+) => {
        match $samples {
            Samples::U8($v) => $body,
            Samples::U16($v) => $body,
            Samples::U32($v) => $body,
            Samples::U64($v) => $body,
            Samples::I8($v) => $body,
            Samples::I16($v) => $body,
            Samples::I32($v) => $body,
            Samples::I64($v) => $body,
            Samples::F32($v) => $body,
            Samples::F64($v) => $body,
            $($other => $fallback,)+
        }
    };
}

impl Samples {
    pub fn len(&self) -> usize {
        numeric_dispatch!(self, v => v.len(), Samples::Text(v) => v.len(), Samples::Bytes(v) => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Widens numeric samples to `f64`; `None` for text and bytes.
    pub fn to_f64(&self) -> Option<Vec<f64>> {
        numeric_dispatch!(self, v => Some(v.iter().map(|&x| x as f64).collect()), _ => None)
    }

    pub fn as_text(&self) -> Option<&[String]> {
        match self {
            Samples::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Smallest and largest numeric sample, ignoring NaN.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        let values = self.to_f64()?;
        values
            .into_iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// An empty array of the same variant.
    pub fn empty_like(&self) -> Samples {
        match self {
            Samples::U8(_) => Samples::U8(Vec::new()),
            Samples::U16(_) => Samples::U16(Vec::new()),
            Samples::U32(_) => Samples::U32(Vec::new()),
            Samples::U64(_) => Samples::U64(Vec::new()),
            Samples::I8(_) => Samples::I8(Vec::new()),
            Samples::I16(_) => Samples::I16(Vec::new()),
            Samples::I32(_) => Samples::I32(Vec::new()),
            Samples::I64(_) => Samples::I64(Vec::new()),
            Samples::F32(_) => Samples::F32(Vec::new()),
            Samples::F64(_) => Samples::F64(Vec::new()),
            Samples::Text(_) => Samples::Text(Vec::new()),
            Samples::Bytes(_) => Samples::Bytes(Vec::new()),
        }
    }

    /// On-disk encoding used when these samples are appended: little-endian
    /// numbers of their natural width, fixed-width UTF-8 text sized to the
    /// longest entry, fixed-width byte arrays sized likewise.
    pub fn encoding(&self) -> (DataType, u32) {
        let bytes = |n: usize| (n as u32) * 8;
        match self {
            Samples::U8(_) => (DataType::UnsignedIntegerLE, 8),
            Samples::U16(_) => (DataType::UnsignedIntegerLE, 16),
            Samples::U32(_) => (DataType::UnsignedIntegerLE, 32),
            Samples::U64(_) => (DataType::UnsignedIntegerLE, 64),
            Samples::I8(_) => (DataType::SignedIntegerLE, 8),
            Samples::I16(_) => (DataType::SignedIntegerLE, 16),
            Samples::I32(_) => (DataType::SignedIntegerLE, 32),
            Samples::I64(_) => (DataType::SignedIntegerLE, 64),
            Samples::F32(_) => (DataType::FloatLE, 32),
            Samples::F64(_) => (DataType::FloatLE, 64),
            Samples::Text(v) => (
                DataType::StringUtf8,
                bytes(v.iter().map(String::len).max().unwrap_or(0).max(1)),
            ),
            Samples::Bytes(v) => (
                DataType::ByteArray,
                bytes(v.iter().map(Vec::len).max().unwrap_or(0).max(1)),
            ),
        }
    }

    /// Appends sample `index` to `out` as exactly `width` little-endian bytes.
    /// Text and byte samples are zero-padded.
    pub fn write_le(&self, index: usize, width: usize, out: &mut Vec<u8>) {
        let start = out.len();
        match self {
            Samples::U8(v) => out.push(v[index]),
            Samples::U16(v) => out.extend_from_slice(&v[index].to_le_bytes()),
            Samples::U32(v) => out.extend_from_slice(&v[index].to_le_bytes()),
            Samples::U64(v) => out.extend_from_slice(&v[index].to_le_bytes()),
            Samples::I8(v) => out.extend_from_slice(&v[index].to_le_bytes()),
            Samples::I16(v) => out.extend_from_slice(&v[index].to_le_bytes()),
            Samples::I32(v) => out.extend_from_slice(&v[index].to_le_bytes()),
            Samples::I64(v) => out.extend_from_slice(&v[index].to_le_bytes()),
            Samples::F32(v) => out.extend_from_slice(&v[index].to_le_bytes()),
            Samples::F64(v) => out.extend_from_slice(&v[index].to_le_bytes()),
            Samples::Text(v) => out.extend_from_slice(v[index].as_bytes()),
            Samples::Bytes(v) => out.extend_from_slice(&v[index]),
        }
        out.resize(start + width, 0);
    }
}

impl From<Vec<f64>> for Samples {
    fn from(v: Vec<f64>) -> Self {
        Samples::F64(v)
    }
}

impl From<Vec<f32>> for Samples {
    fn from(v: Vec<f32>) -> Self {
        Samples::F32(v)
    }
}

impl From<Vec<i32>> for Samples {
    fn from(v: Vec<i32>) -> Self {
        Samples::I32(v)
    }
}

impl From<Vec<u8>> for Samples {
    fn from(v: Vec<u8>) -> Self {
        Samples::U8(v)
    }
}

impl From<Vec<u16>> for Samples {
    fn from(v: Vec<u16>) -> Self {
        Samples::U16(v)
    }
}

impl From<Vec<u32>> for Samples {
    fn from(v: Vec<u32>) -> Self {
        Samples::U32(v)
    }
}

impl From<Vec<String>> for Samples {
    fn from(v: Vec<String>) -> Self {
        Samples::Text(v)
    }
}

/// A named sample array with its time base.
///
/// This is both the input of [`Mdf::append`](crate::Mdf::append) and the
/// result of [`Mdf::get`](crate::Mdf::get). On the way in `samples` are raw
/// values and `conversion` the rule stored with them; on the way out `samples`
/// are physical values and `conversion` is only set for the text table kinds,
/// whose table the caller needs to interpret the values.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub name: String,
    pub samples: Samples,
    pub timestamps: Vec<f64>,
    pub unit: String,
    pub conversion: Option<ConversionKind>,
    /// Physical range stored with the conversion; defaults to the sample range.
    pub physical_range: Option<(f64, f64)>,
}

impl Signal {
    pub fn new(name: impl Into<String>, samples: impl Into<Samples>, timestamps: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            samples: samples.into(),
            timestamps,
            unit: String::new(),
            conversion: None,
            physical_range: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_conversion(mut self, conversion: ConversionKind) -> Self {
        self.conversion = Some(conversion);
        self
    }

    pub fn with_physical_range(mut self, min: f64, max: f64) -> Self {
        self.physical_range = Some((min, max));
        self
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_max_skips_nan() {
        let s = Samples::F64(vec![3.0, f64::NAN, -1.0, 7.5]);
        assert_eq!(s.min_max(), Some((-1.0, 7.5)));
        assert_eq!(Samples::F64(vec![]).min_max(), None);
        assert_eq!(Samples::Text(vec!["a".into()]).min_max(), None);
    }

    #[test]
    fn text_encoding_uses_longest_entry() {
        let s = Samples::Text(vec!["ab".into(), "abcde".into()]);
        assert_eq!(s.encoding(), (DataType::StringUtf8, 40));
        let mut out = Vec::new();
        s.write_le(0, 5, &mut out);
        assert_eq!(out, b"ab\0\0\0");
    }

    #[test]
    fn numeric_write_is_little_endian() {
        let mut out = Vec::new();
        Samples::I16(vec![-2]).write_le(0, 2, &mut out);
        assert_eq!(out, vec![0xfe, 0xff]);
    }
}
