// Copyright 2026 The preeq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Frequency Response
//!
//! Evaluates an FIR's transfer function on the upper half of the unit circle.  Samples are at
//! `w = π k / points` for `k` in `0..points`, so DC is included and Nyquist is not.
//!
//! This is a plain DFT at arbitrary points, `O(taps * points)`.  Filters here are a few dozen taps
//! and the response is only for inspection, so there's no call for an FFT.

use num_complex::Complex64;

use crate::PreeqError;

use std::f64::consts::PI as PI64;

/// Complex response of a filter at a set of normalized angular frequencies.
#[derive(Clone, Debug)]
pub struct FrequencyResponse {
    /// Angular frequency in radians per sample, `[0, π)`.
    pub w: Vec<f64>,
    /// Response at each frequency in `w`.
    pub h: Vec<Complex64>,
}

impl FrequencyResponse {
    pub fn len(&self) -> usize {
        self.w.len()
    }

    pub fn is_empty(&self) -> bool {
        self.w.is_empty()
    }

    /// Linear gain.
    pub fn magnitude(&self) -> Vec<f64> {
        self.h.iter().map(|h| h.norm()).collect()
    }

    /// Gain in dB.  Exact zeros come out as negative infinity.
    pub fn magnitude_db(&self) -> Vec<f64> {
        self.h.iter().map(|h| 20.0 * h.norm().log10()).collect()
    }

    /// Frequencies normalized so Nyquist is `1`, the same units the band edges use.
    pub fn normalized(&self) -> Vec<f64> {
        self.w.iter().map(|w| w / PI64).collect()
    }
}

/// Evaluate the response of FIR `coeffs` at `points` evenly spaced frequencies.
pub fn freqz(coeffs: &[f64], points: usize) -> Result<FrequencyResponse, PreeqError> {
    if coeffs.is_empty() {
        return Err(PreeqError::InvalidParameter(
            "cannot evaluate an empty filter".to_owned(),
        ));
    }
    if points == 0 {
        return Err(PreeqError::InvalidParameter(
            "frequency response needs at least one point".to_owned(),
        ));
    }

    let w: Vec<f64> = (0..points)
        .map(|k| PI64 * k as f64 / points as f64)
        .collect();
    let h = w
        .iter()
        .map(|&w| {
            coeffs
                .iter()
                .enumerate()
                .map(|(n, &b)| b * Complex64::from_polar(1.0, -w * n as f64))
                .sum::<Complex64>()
        })
        .collect();

    Ok(FrequencyResponse { w, h })
}
