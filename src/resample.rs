//! Moving samples from one time base onto another.

use crate::blocks::conversion::table_lookup::{interpolate, nearest_index};
use crate::signal::Samples;
use crate::{Error, Result};

/// Interpolates a signal onto new timestamps.
///
/// Used by `append` to bring signals onto their union time base and by
/// `get` to resample onto a fixed raster.
pub trait Resampler {
    /// Returns one sample per entry of `target`. `timestamps` is sorted and
    /// index-aligned with `samples`.
    fn resample(&self, samples: &Samples, timestamps: &[f64], target: &[f64]) -> Result<Samples>;
}

/// Piecewise-linear interpolation with the outer samples held beyond the
/// ends. Integer signals are rounded back to their type; text and byte
/// signals take the latest sample at or before each target time.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearResampler;

impl Resampler for LinearResampler {
    fn resample(&self, samples: &Samples, timestamps: &[f64], target: &[f64]) -> Result<Samples> {
        if samples.len() != timestamps.len() {
            return Err(Error::InvalidArgument(format!(
                "{} samples for {} timestamps",
                samples.len(),
                timestamps.len()
            )));
        }
        if target.is_empty() {
            return Ok(samples.empty_like());
        }
        if samples.is_empty() {
            return Err(Error::InvalidArgument(
                "cannot resample an empty signal".to_string(),
            ));
        }

        let Some(values) = samples.to_f64() else {
            let keys: Vec<(f64, f64)> = timestamps.iter().map(|&t| (t, 0.0)).collect();
            let pick = |t: &f64| nearest_index(&keys, *t);
            return Ok(match samples {
                Samples::Text(v) => Samples::Text(target.iter().map(|t| v[pick(t)].clone()).collect()),
                Samples::Bytes(v) => {
                    Samples::Bytes(target.iter().map(|t| v[pick(t)].clone()).collect())
                }
                other => other.empty_like(),
            });
        };

        let table: Vec<(f64, f64)> = timestamps.iter().copied().zip(values).collect();
        let interpolated = target.iter().map(|&t| interpolate(&table, t));
        Ok(match samples {
            Samples::U8(_) => Samples::U8(interpolated.map(|x| x.round() as u8).collect()),
            Samples::U16(_) => Samples::U16(interpolated.map(|x| x.round() as u16).collect()),
            Samples::U32(_) => Samples::U32(interpolated.map(|x| x.round() as u32).collect()),
            Samples::U64(_) => Samples::U64(interpolated.map(|x| x.round() as u64).collect()),
            Samples::I8(_) => Samples::I8(interpolated.map(|x| x.round() as i8).collect()),
            Samples::I16(_) => Samples::I16(interpolated.map(|x| x.round() as i16).collect()),
            Samples::I32(_) => Samples::I32(interpolated.map(|x| x.round() as i32).collect()),
            Samples::I64(_) => Samples::I64(interpolated.map(|x| x.round() as i64).collect()),
            Samples::F32(_) => Samples::F32(interpolated.map(|x| x as f32).collect()),
            _ => Samples::F64(interpolated.collect()),
        })
    }
}

/// Sorted union of several timestamp arrays, exact duplicates merged.
pub fn union_timestamps<'a>(sets: impl IntoIterator<Item = &'a [f64]>) -> Vec<f64> {
    let mut all: Vec<f64> = sets.into_iter().flatten().copied().collect();
    all.sort_by(f64::total_cmp);
    all.dedup();
    all
}

/// `count` evenly spaced points from `start` to `stop`, both included.
pub fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (count - 1) as f64;
            (0..count).map(|i| start + step * i as f64).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_are_interpolated_and_clamped() {
        let out = LinearResampler
            .resample(&Samples::F64(vec![0.0, 10.0]), &[1.0, 2.0], &[0.0, 1.5, 3.0])
            .unwrap();
        assert_eq!(out, Samples::F64(vec![0.0, 5.0, 10.0]));
    }

    #[test]
    fn integers_keep_their_type() {
        let out = LinearResampler
            .resample(&Samples::U8(vec![0, 3]), &[0.0, 1.0], &[0.5])
            .unwrap();
        assert_eq!(out, Samples::U8(vec![2]));
    }

    #[test]
    fn text_takes_previous_sample() {
        let samples = Samples::Text(vec!["off".into(), "on".into()]);
        let out = LinearResampler
            .resample(&samples, &[0.0, 1.0], &[-1.0, 0.5, 1.0, 2.0])
            .unwrap();
        assert_eq!(
            out,
            Samples::Text(vec!["off".into(), "off".into(), "on".into(), "on".into()])
        );
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        assert!(
            LinearResampler
                .resample(&Samples::F64(vec![1.0]), &[0.0, 1.0], &[0.0])
                .is_err()
        );
    }

    #[test]
    fn union_is_sorted_without_duplicates() {
        let a = [0.0, 1.0, 2.0];
        let b = [0.5, 1.0];
        assert_eq!(
            union_timestamps([&a[..], &b[..]]),
            vec![0.0, 0.5, 1.0, 2.0]
        );
    }

    #[test]
    fn linspace_includes_both_ends() {
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }
}
