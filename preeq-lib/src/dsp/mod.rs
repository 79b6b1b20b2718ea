// Copyright 2026 The preeq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Digital Signal Processing
//!
//! A zero-order-hold DAC is a boxcar in time.  Its frequency response is `sinc(f / fs)`, which at
//! Nyquist is down to `2 / π`, about -3.9dB.  We can't change the hold, but we can run the samples
//! through a filter whose response is `1 / sinc` before they ever reach the converter.  The product
//! of the two is flat.
//!
//! ## Design Flow
//!
//! 1. Chop `[0, 1]` (Nyquist normalized) into `taps - 1` contiguous bands.
//! 2. Ask for `1 / sinc(f / 2)` at every band edge.  The `/ 2` converts Nyquist normalized
//!    frequency to cycles per sample.
//! 3. Fit a linear-phase FIR to those targets in the least-squares sense, see [`firls`].
//! 4. Evaluate the response for inspection, see [`freqz`].
//! 5. Quantize for fixed-point hardware, see [`quantize`].
//!
//! Least-squares rather than equiripple because the target is smooth and known everywhere.  There
//! are no stop bands to hold down, and we would rather have small error on average than an error
//! that is equally bad at every extremum.
//!
//! ## Precision
//!
//! All design math is `f64`.  The only narrowing happens in quantization, which is checked.

use num_traits::{Float, FloatConst};

pub mod design;
pub mod firls;
pub mod freqz;
pub mod quantize;

/// Default number of taps.  Odd, so the filter has a center tap and an integer group delay.
pub const DEFAULT_TAPS: usize = 63;
/// Bits of fractional precision used to turn coefficients into integers.
pub const DEFAULT_SCALE_SHIFT: u32 = 30;
/// Shift written into the header for the downstream accumulator.  This is not the quantization
/// shift.  The consumer sums table entries and drops this many bits to land in an 8-bit sample.
pub const DEFAULT_FIR_SHIFT: u32 = 24;
/// Points used when evaluating a frequency response, matching the usual `freqz` default.
pub const DEFAULT_RESPONSE_POINTS: usize = 512;

/// Arguments for one design.  Both shifts are carried because they really are independent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DesignArgs {
    /// Number of coefficients.  Must be odd and at least 3.
    pub taps: usize,
    /// Quantization precision.  Each coefficient is multiplied by `2^scale_shift`.
    pub scale_shift: u32,
    /// Shift emitted into the header for use by the consumer.
    pub fir_shift: u32,
    /// Number of frequency response points to evaluate.
    pub response_points: usize,
}

impl Default for DesignArgs {
    fn default() -> Self {
        DesignArgs {
            taps: DEFAULT_TAPS,
            scale_shift: DEFAULT_SCALE_SHIFT,
            fir_shift: DEFAULT_FIR_SHIFT,
            response_points: DEFAULT_RESPONSE_POINTS,
        }
    }
}

/// Normalized sinc, `sin(πx) / (πx)`, with the removable singularity at zero filled in.
pub fn sinc<T: Float + FloatConst>(x: T) -> T {
    if x.is_zero() {
        T::one()
    } else {
        let pi_x = T::PI() * x;
        pi_x.sin() / pi_x
    }
}

/// `count` evenly spaced points from `start` to `end` inclusive.  The last point is exactly `end`
/// rather than accumulated.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count)
                .map(|i| {
                    if i == count - 1 {
                        end
                    } else {
                        start + step * i as f64
                    }
                })
                .collect()
        }
    }
}
