//! Closed-form numeric conversions.

/// `phys = raw * a + b`.
pub fn apply_linear(raw: &[f64], a: f64, b: f64) -> Vec<f64> {
    raw.iter().map(|&x| x * a + b).collect()
}

/// `phys = (P1 x² + P2 x + P3) / (P4 x² + P5 x + P6)`.
///
/// A zero denominator follows IEEE arithmetic (inf or NaN).
pub fn apply_rational(raw: &[f64], p: &[f64; 6]) -> Vec<f64> {
    raw.iter()
        .map(|&x| {
            let num = p[0] * x * x + p[1] * x + p[2];
            let den = p[3] * x * x + p[4] * x + p[5];
            num / den
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_scales_then_offsets() {
        assert_eq!(apply_linear(&[0.0, 10.0], 0.5, -1.0), vec![-1.0, 4.0]);
    }

    #[test]
    fn rational_reduces_to_linear() {
        // (0x² + 2x + 1) / (0x² + 0x + 1)
        let p = [0.0, 2.0, 1.0, 0.0, 0.0, 1.0];
        assert_eq!(apply_rational(&[0.0, 1.0, 3.0], &p), vec![1.0, 3.0, 7.0]);
    }

    #[test]
    fn rational_quadratic_terms() {
        let p = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        // x² / x
        assert_eq!(apply_rational(&[2.0, 4.0], &p), vec![2.0, 4.0]);
        assert!(apply_rational(&[0.0], &p)[0].is_nan());
    }
}
