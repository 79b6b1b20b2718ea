// Copyright 2026 The preeq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Fixed-Point Quantization
//!
//! Coefficients become `round(x * 2^shift)` stored as `i32`.  Rounding is half-to-even, so a value
//! landing exactly between two integers goes to the even one.  This matches `rint` and avoids the
//! slight bias away from zero that half-away rounding adds when many coefficients sit on ties.
//!
//! The error of every quantized coefficient is at most `2^-(shift + 1)`.

use crate::PreeqError;

/// Largest usable shift.  An `i32` has 31 bits below the sign.
pub const MAX_SHIFT: u32 = 31;

/// Quantize `coeffs` to `i32` with `shift` fractional bits.
pub fn quantize(coeffs: &[f64], shift: u32) -> Result<Vec<i32>, PreeqError> {
    if shift > MAX_SHIFT {
        return Err(PreeqError::InvalidParameter(format!(
            "scale shift {shift} exceeds {MAX_SHIFT}"
        )));
    }

    let scale = (shift as f64).exp2();
    coeffs
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let scaled = (x * scale).round_ties_even();
            if scaled.is_finite() && scaled >= i32::MIN as f64 && scaled <= i32::MAX as f64 {
                Ok(scaled as i32)
            } else {
                Err(PreeqError::DesignFailure(format!(
                    "coefficient {i} ({x}) does not fit in i32 at shift {shift}"
                )))
            }
        })
        .collect()
}

/// Map fixed-point values back to real values.  Handy for checking quantization error.
pub fn dequantize(values: &[i32], shift: u32) -> Vec<f64> {
    let scale = (-(shift as f64)).exp2();
    values.iter().map(|&v| v as f64 * scale).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_quantize_ties_to_even() {
        // With one fractional bit, quarters land exactly on halves.
        let q = quantize(&[0.25, 0.75, 1.25, 1.75, -0.25, -0.75, -1.25], 1).unwrap();
        assert_eq!(q, vec![0, 2, 2, 4, 0, -2, -2]);

        // Ties at a realistic shift
        let half_lsb = (-31.0f64).exp2();
        let q = quantize(&[half_lsb, 3.0 * half_lsb, -half_lsb, -3.0 * half_lsb], 30).unwrap();
        assert_eq!(q, vec![0, 2, 0, -2]);
    }

    #[test]
    fn test_quantize_error_bound() {
        let shift = 30;
        let coeffs: Vec<f64> = (0..200).map(|i| ((i as f64) * 0.731).sin() * 0.9).collect();
        let q = quantize(&coeffs, shift).unwrap();
        let back = dequantize(&q, shift);
        let bound = (-(shift as f64)).exp2();
        for (x, y) in coeffs.iter().zip(back.iter()) {
            assert!((x - y).abs() < bound, "{x} vs {y}");
            assert!((x - y).abs() <= bound / 2.0, "{x} vs {y}");
        }
    }

    #[test]
    fn test_quantize_range() {
        // -2.0 at 30 bits is exactly i32::MIN
        assert_eq!(quantize(&[-2.0], 30).unwrap(), vec![i32::MIN]);
        assert!(matches!(
            quantize(&[2.0], 30),
            Err(PreeqError::DesignFailure(_))
        ));
        assert!(matches!(
            quantize(&[f64::NAN], 30),
            Err(PreeqError::DesignFailure(_))
        ));
        assert!(matches!(
            quantize(&[0.5], 32),
            Err(PreeqError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_quantize_zero_shift() {
        assert_eq!(quantize(&[0.4, 0.6, 2.5, -7.0], 0).unwrap(), vec![0, 1, 2, -7]);
        assert_eq!(dequantize(&[3, -3], 0), vec![3.0, -3.0]);
    }
}
