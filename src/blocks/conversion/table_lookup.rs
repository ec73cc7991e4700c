//! Value-to-value table conversions.
//!
//! Tables keep their declared order. Breakpoint tables are expected to be
//! sorted by raw value; range tables are scanned front to back and the first
//! matching entry wins.

/// Piecewise-linear interpolation over `(raw, phys)` breakpoints, clamped to
/// the outer breakpoints.
///
/// NaN input, or a table whose keys do not bracket `raw` (NaN keys), yields
/// NaN.
pub fn interpolate(table: &[(f64, f64)], raw: f64) -> f64 {
    let Some(&(first_key, first_val)) = table.first() else {
        return raw;
    };
    if raw.is_nan() {
        return raw;
    }
    if raw <= first_key {
        return first_val;
    }
    let (last_key, last_val) = table[table.len() - 1];
    if raw >= last_key {
        return last_val;
    }
    // first index whose key is > raw
    let hi = table.partition_point(|&(k, _)| k <= raw);
    let (Some(&(k0, v0)), Some(&(k1, v1))) =
        (hi.checked_sub(1).and_then(|lo| table.get(lo)), table.get(hi))
    else {
        return f64::NAN;
    };
    if k1 == k0 {
        return v0;
    }
    v0 + (raw - k0) * (v1 - v0) / (k1 - k0)
}

/// Index of the largest breakpoint `<= raw`, clipped to `[0, len - 1]`.
pub fn nearest_index(table: &[(f64, f64)], raw: f64) -> usize {
    table
        .partition_point(|&(k, _)| k <= raw)
        .saturating_sub(1)
        .min(table.len().saturating_sub(1))
}

/// Physical value of the largest breakpoint `<= raw`, without interpolation.
pub fn nearest(table: &[(f64, f64)], raw: f64) -> f64 {
    if table.is_empty() {
        return raw;
    }
    table[nearest_index(table, raw)].1
}

/// First `(lower, upper, phys)` triple with `lower <= raw <= upper`, else
/// `default`.
pub fn range_lookup(ranges: &[(f64, f64, f64)], default: f64, raw: f64) -> f64 {
    ranges
        .iter()
        .find(|&&(lo, hi, _)| lo <= raw && raw <= hi)
        .map_or(default, |&(_, _, phys)| phys)
}
