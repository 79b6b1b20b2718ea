// Copyright 2026 The preeq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Inverse-Sinc Design
//!
//! Builds the pre-equalizer for a zero-order-hold DAC.  The whole band from DC to Nyquist is
//! covered by `taps - 1` touching bands, each asking for `1 / sinc` at its edges.  With as many
//! bands as the filter has degrees of freedom, the least-squares fit tracks the target closely
//! everywhere except for a little droop right at Nyquist where a type I filter can't keep rising.

use super::{DesignArgs, firls::firls, freqz, quantize, sinc};
use crate::PreeqError;

/// Everything produced by one design.  The fixed-point coefficients and response are the real
/// outputs.  The rest is kept for inspection.
#[derive(Clone, Debug)]
pub struct Design {
    /// Quantized coefficients, `round(real * 2^scale_shift)`.
    pub coefficients: Vec<i32>,
    /// Response of the unquantized filter.
    pub response: freqz::FrequencyResponse,
    /// Band edges, Nyquist normalized.
    pub bands: Vec<f64>,
    /// Target gain at each band edge.
    pub desired: Vec<f64>,
    /// Coefficients before quantization.
    pub real: Vec<f64>,
    /// Shift used for quantization.
    pub scale_shift: u32,
}

impl Design {
    /// Index of the center tap.
    pub fn center(&self) -> usize {
        self.coefficients.len() / 2
    }

    /// Worst absolute difference between the real response and the target at band edges below
    /// `limit` (Nyquist normalized).
    pub fn max_error_below(&self, limit: f64) -> f64 {
        let mag = self.response.magnitude();
        self.response
            .normalized()
            .iter()
            .zip(mag)
            .filter(|(f, _)| **f <= limit)
            .map(|(f, m)| (m - inverse_sinc(*f)).abs())
            .fold(0.0, f64::max)
    }
}

/// Gain needed at Nyquist normalized frequency `f` to cancel the hold.
pub fn inverse_sinc(f: f64) -> f64 {
    1.0 / sinc(f / 2.0)
}

/// Band edges for a `taps` long inverse-sinc design.  Interior points of an even grid over `[0, 1]`
/// are each repeated so that neighboring bands touch, then `0` and `1` close the ends.
pub fn bands(taps: usize) -> Result<Vec<f64>, PreeqError> {
    check_taps(taps)?;
    let grid = super::linspace(0.0, 1.0, taps);

    let mut bands = Vec::with_capacity(2 * (taps - 2) + 2);
    bands.push(0.0);
    for &f in &grid[1..taps - 1] {
        bands.push(f);
        bands.push(f);
    }
    bands.push(1.0);
    Ok(bands)
}

/// Target gain at each band edge.
pub fn desired(bands: &[f64]) -> Vec<f64> {
    bands.iter().map(|&f| inverse_sinc(f)).collect()
}

/// Design a `taps` long inverse-sinc filter and quantize it with `scale_shift` fractional bits.
pub fn design(taps: usize, scale_shift: u32) -> Result<Design, PreeqError> {
    design_with(&DesignArgs {
        taps,
        scale_shift,
        ..Default::default()
    })
}

/// Design using every knob in `args`.  `args.fir_shift` belongs to the consumer and is ignored.
pub fn design_with(args: &DesignArgs) -> Result<Design, PreeqError> {
    check_taps(args.taps)?;
    if args.scale_shift > quantize::MAX_SHIFT {
        return Err(PreeqError::InvalidParameter(format!(
            "scale shift must be at most {}, got {}",
            quantize::MAX_SHIFT,
            args.scale_shift
        )));
    }

    let bands = bands(args.taps)?;
    let desired = desired(&bands);
    let real = firls(args.taps, &bands, &desired, None)?;
    let response = freqz::freqz(&real, args.response_points)?;
    let coefficients = quantize::quantize(&real, args.scale_shift)?;

    log::debug!(
        "designed {} taps, center {:.9}, dc gain {:.6}",
        args.taps,
        real[args.taps / 2],
        response.h[0].norm(),
    );

    Ok(Design {
        coefficients,
        response,
        bands,
        desired,
        real,
        scale_shift: args.scale_shift,
    })
}

fn check_taps(taps: usize) -> Result<(), PreeqError> {
    if taps < 3 || taps % 2 == 0 {
        Err(PreeqError::InvalidParameter(format!(
            "tap count must be odd and at least 3, got {taps}"
        )))
    } else {
        Ok(())
    }
}
