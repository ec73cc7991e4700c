//! Record layout engine: maps between a flat buffer of fixed-stride records
//! and per-channel sample arrays.

use crate::blocks::{ChannelBlock, ChannelGroupBlock, DataGroupBlock, DataType};
use crate::signal::Samples;
use crate::{Error, Result};

/// Byte layout of one record: `record_id_size` id bytes, `data_bytes` bytes
/// of channel data, then `invalidation_bytes` invalidation bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordLayout {
    pub record_id_size: usize,
    pub data_bytes: usize,
    pub invalidation_bytes: usize,
}

impl RecordLayout {
    pub fn new(record_id_size: usize, data_bytes: usize, invalidation_bytes: usize) -> Self {
        Self {
            record_id_size,
            data_bytes,
            invalidation_bytes,
        }
    }

    pub fn for_group(dg: &DataGroupBlock, cg: &ChannelGroupBlock) -> Self {
        Self::new(
            dg.record_id_size as usize,
            cg.samples_byte_nr as usize,
            cg.invalidation_bytes_nr as usize,
        )
    }

    /// Bytes per record.
    pub fn stride(&self) -> usize {
        self.record_id_size + self.data_bytes + self.invalidation_bytes
    }

    /// Records actually present: the declared cycle count, capped by what the
    /// payload can hold.
    pub fn record_count(&self, cycles: u64, payload_len: usize) -> usize {
        let declared = usize::try_from(cycles).unwrap_or(usize::MAX);
        match self.stride() {
            0 => 0,
            stride => declared.min(payload_len / stride),
        }
    }

    /// Decodes `channel`'s raw samples from every record in `payload`.
    ///
    /// Integers are read from `ceil((bit_offset + bit_count) / 8)` bytes at
    /// the channel's byte offset, shifted right by `bit_offset` and masked to
    /// `bit_count` bits; signed types are sign-extended from bit `bit_count - 1`.
    pub fn decode_channel(
        &self,
        payload: &[u8],
        cycles: u64,
        channel: &ChannelBlock,
    ) -> Result<Samples> {
        let count = self.record_count(cycles, payload.len());
        let data_type = channel.data_type;
        let bit_count = channel.bit_count;
        let unsupported = || Error::UnsupportedDataType {
            data_type,
            bit_count,
        };

        let width = if data_type.is_string() || is_byte_like(data_type) {
            (bit_count / 8) as usize
        } else {
            channel.byte_width()
        };
        let start = channel.byte_offset as usize;
        if start + width > self.data_bytes {
            return Err(Error::RecordLayoutError(format!(
                "channel at byte {} with {} bytes exceeds the {}-byte record",
                start, width, self.data_bytes
            )));
        }

        let stride = self.stride();
        let fields = (0..count).map(|i| {
            let offset = i * stride + self.record_id_size + start;
            &payload[offset..offset + width]
        });

        let big_endian = data_type.is_big_endian();
        let bit_offset = channel.bit_offset as u32;
        let bits = |field: &[u8]| extract_bits(field, big_endian, bit_offset, bit_count);
        let signed = |field: &[u8]| sign_extend(bits(field), bit_count);

        let samples = match data_type {
            DataType::UnsignedIntegerLE | DataType::UnsignedIntegerBE => match bit_count {
                1..=8 => Samples::U8(fields.map(|f| bits(f) as u8).collect()),
                9..=16 => Samples::U16(fields.map(|f| bits(f) as u16).collect()),
                17..=32 => Samples::U32(fields.map(|f| bits(f) as u32).collect()),
                33..=64 => Samples::U64(fields.map(|f| bits(f)).collect()),
                _ => return Err(unsupported()),
            },
            DataType::SignedIntegerLE | DataType::SignedIntegerBE => match bit_count {
                1..=8 => Samples::I8(fields.map(|f| signed(f) as i8).collect()),
                9..=16 => Samples::I16(fields.map(|f| signed(f) as i16).collect()),
                17..=32 => Samples::I32(fields.map(|f| signed(f) as i32).collect()),
                33..=64 => Samples::I64(fields.map(|f| signed(f)).collect()),
                _ => return Err(unsupported()),
            },
            DataType::FloatLE | DataType::FloatBE => match bit_count {
                32 => Samples::F32(fields.map(|f| f32::from_bits(bits(f) as u32)).collect()),
                64 => Samples::F64(fields.map(|f| f64::from_bits(bits(f))).collect()),
                _ => return Err(unsupported()),
            },
            DataType::StringLatin1
            | DataType::StringUtf8
            | DataType::StringUtf16LE
            | DataType::StringUtf16BE => {
                Samples::Text(fields.map(|f| decode_text(f, data_type)).collect())
            }
            DataType::ByteArray | DataType::MimeSample | DataType::MimeStream => {
                Samples::Bytes(fields.map(<[u8]>::to_vec).collect())
            }
            _ => return Err(unsupported()),
        };
        Ok(samples)
    }
}

fn is_byte_like(data_type: DataType) -> bool {
    matches!(
        data_type,
        DataType::ByteArray | DataType::MimeSample | DataType::MimeStream
    )
}

/// Assembles `field` into an integer (byte order per `big_endian`), shifts
/// out `bit_offset` bits and keeps the low `bit_count` bits.
fn extract_bits(field: &[u8], big_endian: bool, bit_offset: u32, bit_count: u32) -> u64 {
    // nine bytes are possible when a 64-bit field starts mid-byte
    let raw: u128 = if big_endian {
        field.iter().fold(0, |acc, &b| (acc << 8) | b as u128)
    } else {
        field.iter().rev().fold(0, |acc, &b| (acc << 8) | b as u128)
    };
    let shifted = (raw >> bit_offset) as u64;
    if bit_count >= 64 {
        shifted
    } else {
        shifted & ((1u64 << bit_count) - 1)
    }
}

fn sign_extend(value: u64, bit_count: u32) -> i64 {
    if bit_count == 0 || bit_count >= 64 {
        return value as i64;
    }
    let shift = 64 - bit_count;
    ((value << shift) as i64) >> shift
}

fn decode_text(field: &[u8], data_type: DataType) -> String {
    let text: String = match data_type {
        DataType::StringLatin1 => field.iter().map(|&b| b as char).collect(),
        DataType::StringUtf16LE | DataType::StringUtf16BE => {
            let units: Vec<u16> = field
                .chunks_exact(2)
                .map(|c| {
                    if data_type == DataType::StringUtf16LE {
                        u16::from_le_bytes([c[0], c[1]])
                    } else {
                        u16::from_be_bytes([c[0], c[1]])
                    }
                })
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => String::from_utf8_lossy(field).into_owned(),
    };
    text.trim_end_matches('\0').to_string()
}

/// Timestamps of a virtual master channel: `t[i] = i * a + b`.
pub fn virtual_master_timestamps(count: usize, a: f64, b: f64) -> Vec<f64> {
    (0..count).map(|i| i as f64 * a + b).collect()
}

/// Interleaves `columns` (samples, byte width) into `count` records, each
/// column written in order at the running offset.
pub fn encode_records(columns: &[(&Samples, usize)], count: usize) -> Vec<u8> {
    let stride: usize = columns.iter().map(|(_, width)| width).sum();
    let mut buffer = Vec::with_capacity(stride * count);
    for i in 0..count {
        for (samples, width) in columns {
            samples.write_le(i, *width, &mut buffer);
        }
    }
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(data_type: DataType, byte_offset: u32, bit_offset: u8, bit_count: u32) -> ChannelBlock {
        ChannelBlock {
            data_type,
            byte_offset,
            bit_offset,
            bit_count,
            ..ChannelBlock::default()
        }
    }

    #[test]
    fn bit_field_is_shifted_and_masked() {
        let layout = RecordLayout::new(0, 3, 0);
        let payload = [0x00, 0b1011_1000, 0xff, 0x11, 0b0000_1111, 0x22];
        let cn = channel(DataType::UnsignedIntegerLE, 1, 3, 5);
        let samples = layout.decode_channel(&payload, 2, &cn).unwrap();
        assert_eq!(samples, Samples::U8(vec![0b10111, 0b00001]));
    }

    #[test]
    fn signed_fields_are_sign_extended() {
        let layout = RecordLayout::new(0, 2, 0);
        let payload = [0xf0, 0x0f, 0x70, 0x00];
        // 12 bits from bit 4 of a LE 16-bit word
        let cn = channel(DataType::SignedIntegerLE, 0, 4, 12);
        let samples = layout.decode_channel(&payload, 2, &cn).unwrap();
        assert_eq!(samples, Samples::I16(vec![0x0ff, 0x007]));

        let cn = channel(DataType::SignedIntegerLE, 0, 0, 8);
        let samples = layout.decode_channel(&payload, 2, &cn).unwrap();
        assert_eq!(samples, Samples::I8(vec![-16, 112]));
    }

    #[test]
    fn big_endian_and_record_id() {
        let layout = RecordLayout::new(1, 2, 0);
        let payload = [9, 0x01, 0x02, 9, 0x03, 0x04];
        let cn = channel(DataType::UnsignedIntegerBE, 0, 0, 16);
        assert_eq!(
            layout.decode_channel(&payload, 2, &cn).unwrap(),
            Samples::U16(vec![0x0102, 0x0304])
        );
    }

    #[test]
    fn invalidation_bytes_count_in_stride() {
        let layout = RecordLayout::new(0, 1, 1);
        let payload = [5, 0xff, 6, 0xff, 7, 0xff];
        let cn = channel(DataType::UnsignedIntegerLE, 0, 0, 8);
        assert_eq!(
            layout.decode_channel(&payload, 3, &cn).unwrap(),
            Samples::U8(vec![5, 6, 7])
        );
    }

    #[test]
    fn floats_and_text() {
        let mut payload = Vec::new();
        for (v, s) in [(1.5f64, b"ab\0\0"), (-2.0, b"wxyz")] {
            payload.extend_from_slice(&v.to_le_bytes());
            payload.extend_from_slice(s);
        }
        let layout = RecordLayout::new(0, 12, 0);
        let f = channel(DataType::FloatLE, 0, 0, 64);
        let s = channel(DataType::StringUtf8, 8, 0, 32);
        assert_eq!(
            layout.decode_channel(&payload, 2, &f).unwrap(),
            Samples::F64(vec![1.5, -2.0])
        );
        assert_eq!(
            layout.decode_channel(&payload, 2, &s).unwrap(),
            Samples::Text(vec!["ab".into(), "wxyz".into()])
        );
    }

    #[test]
    fn zero_cycles_yield_empty_samples() {
        let layout = RecordLayout::new(0, 8, 0);
        let cn = channel(DataType::FloatLE, 0, 0, 64);
        assert_eq!(
            layout.decode_channel(&[], 0, &cn).unwrap(),
            Samples::F64(vec![])
        );
    }

    #[test]
    fn channel_outside_record_is_rejected() {
        let layout = RecordLayout::new(0, 4, 0);
        let cn = channel(DataType::UnsignedIntegerLE, 2, 0, 32);
        assert!(matches!(
            layout.decode_channel(&[0; 8], 2, &cn),
            Err(Error::RecordLayoutError(_))
        ));
        let odd = channel(DataType::FloatLE, 0, 0, 24);
        assert!(matches!(
            layout.decode_channel(&[0; 8], 2, &odd),
            Err(Error::UnsupportedDataType { bit_count: 24, .. })
        ));
    }

    #[test]
    fn record_count_is_capped_by_payload() {
        let layout = RecordLayout::new(0, 4, 0);
        assert_eq!(layout.record_count(10, 12), 3);
        assert_eq!(layout.record_count(2, 12), 2);
        assert_eq!(RecordLayout::default().record_count(5, 0), 0);
    }

    #[test]
    fn virtual_master_is_exact() {
        assert_eq!(
            virtual_master_timestamps(5, 0.01, 0.0),
            vec![0.0, 0.01, 0.02, 0.03, 0.04]
        );
    }

    #[test]
    fn records_are_interleaved() {
        let t = Samples::F64(vec![0.0, 1.0]);
        let v = Samples::U16(vec![7, 8]);
        let bytes = encode_records(&[(&t, 8), (&v, 2)], 2);
        assert_eq!(bytes.len(), 20);
        assert_eq!(&bytes[8..10], &[7, 0]);
        assert_eq!(&bytes[18..20], &[8, 0]);
    }
}
