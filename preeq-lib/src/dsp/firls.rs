// Copyright 2026 The preeq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Least-Squares FIR Design
//!
//! Fits an odd-length, symmetric (type I linear phase) FIR to a piecewise-linear target by
//! minimizing the weighted integral of squared error over the given bands.
//!
//! ## Formulation
//!
//! A type I filter of `2M + 1` taps has an amplitude response that is a cosine series:
//!
//! `A(f) = Σ a(n) cos(πnf)` for `n` in `0..=M`, with `f` normalized so Nyquist is `1`.
//!
//! Setting the gradient of `∫ W(f) (A(f) - D(f))² df` to zero gives a linear system `Q a = b`.
//! With `W` constant and `D` linear on each band, both sides have closed forms:
//!
//! - `Q(k, n) = q(k - n) + q(k + n)`, a Toeplitz plus Hankel matrix where
//!   `q(n) = Σ W [f sinc(nf)]` evaluated across each band.
//! - `b(n) = Σ W [f (mf + c) sinc(nf) + m cos(πnf) / (πn)²]` across each band, and for `n = 0`
//!   the cosine term is replaced by its limit, `-m f² / 2`.
//!
//! The common factor of `1/2` and `1/π` are dropped from both sides.  The halving comes back when
//! the cosine series is unfolded into taps: the center tap is `2 a(0)` and every other tap is
//! `a(n)` mirrored on both sides.
//!
//! `Q` is symmetric positive definite whenever the bands cover any frequency with positive weight,
//! so Cholesky is the first choice.  An SVD least-squares solve picks up the pieces when it isn't.

use nalgebra::{DMatrix, DVector};

use super::sinc;
use crate::PreeqError;

use std::f64::consts::PI as PI64;

/// Singular values below this are treated as zero by the fallback solver.
const SVD_EPS: f64 = 1e-12;

/// One band of the target: edges in Nyquist normalized frequency, a linear desired response
/// between them, and a constant weight.
#[derive(Clone, Copy, Debug)]
struct Band {
    lo: f64,
    hi: f64,
    /// slope of the desired response
    m: f64,
    /// intercept of the desired response
    c: f64,
    weight: f64,
}

impl Band {
    /// Antiderivative piece for `q(n)`
    fn q_edge(f: f64, n: usize) -> f64 {
        f * sinc(n as f64 * f)
    }

    /// Antiderivative piece for `b(n)`
    fn b_edge(&self, f: f64, n: usize) -> f64 {
        let linear = f * (self.m * f + self.c) * sinc(n as f64 * f);
        if n == 0 {
            linear - self.m * f * f / 2.0
        } else {
            let pn = PI64 * n as f64;
            linear + self.m * (pn * f).cos() / (pn * pn)
        }
    }

    fn q(&self, n: usize) -> f64 {
        self.weight * (Self::q_edge(self.hi, n) - Self::q_edge(self.lo, n))
    }

    fn b(&self, n: usize) -> f64 {
        self.weight * (self.b_edge(self.hi, n) - self.b_edge(self.lo, n))
    }
}

/// Design a linear-phase FIR with `numtaps` coefficients.
///
/// - `bands` holds pairs of band edges in `[0, 1]`, where `1` is Nyquist.  The whole sequence must
///   be non-decreasing, so bands may touch but never overlap.  Gaps between pairs are don't-care
///   regions.
/// - `desired` holds the target gain at each edge.  The target is linear within each band.
/// - `weight` optionally holds one non-negative weight per band.  Defaults to all ones.
pub fn firls(
    numtaps: usize,
    bands: &[f64],
    desired: &[f64],
    weight: Option<&[f64]>,
) -> Result<Vec<f64>, PreeqError> {
    let bands = validate(numtaps, bands, desired, weight)?;
    let m = (numtaps - 1) / 2;

    // q is needed up to k + n = 2M for the Hankel half
    let q: Vec<f64> = (0..numtaps)
        .map(|n| bands.iter().map(|b| b.q(n)).sum())
        .collect();
    let q_mat = DMatrix::from_fn(m + 1, m + 1, |k, n| q[k.abs_diff(n)] + q[k + n]);
    let b_vec = DVector::from_fn(m + 1, |n, _| bands.iter().map(|b| b.b(n)).sum::<f64>());

    let a: Vec<f64> = solve(q_mat, b_vec)?.iter().copied().collect();

    if a.iter().any(|x| !x.is_finite()) {
        return Err(PreeqError::DesignFailure(
            "least-squares solution is not finite".to_owned(),
        ));
    }

    let mut coeffs = Vec::with_capacity(numtaps);
    coeffs.extend(a[1..].iter().rev());
    coeffs.push(2.0 * a[0]);
    coeffs.extend(&a[1..]);
    Ok(coeffs)
}

fn solve(q: DMatrix<f64>, b: DVector<f64>) -> Result<DVector<f64>, PreeqError> {
    if let Some(chol) = q.clone().cholesky() {
        return Ok(chol.solve(&b));
    }

    log::warn!("least-squares system is not positive definite, falling back to SVD");
    q.svd(true, true)
        .solve(&b, SVD_EPS)
        .map_err(|e| PreeqError::DesignFailure(format!("least-squares solve: {e}")))
}

fn validate(
    numtaps: usize,
    bands: &[f64],
    desired: &[f64],
    weight: Option<&[f64]>,
) -> Result<Vec<Band>, PreeqError> {
    fn invalid<T>(msg: String) -> Result<T, PreeqError> {
        Err(PreeqError::InvalidParameter(msg))
    }

    if numtaps % 2 == 0 {
        return invalid(format!("numtaps must be odd, got {numtaps}"));
    }
    if bands.is_empty() || bands.len() % 2 != 0 {
        return invalid(format!(
            "bands must contain pairs of edges, got {} values",
            bands.len()
        ));
    }
    if desired.len() != bands.len() {
        return invalid(format!(
            "desired has {} values but bands has {}",
            desired.len(),
            bands.len()
        ));
    }
    if bands.iter().chain(desired).any(|x| !x.is_finite()) {
        return invalid("bands and desired must be finite".to_owned());
    }
    if bands.iter().any(|&f| !(0.0..=1.0).contains(&f)) {
        return invalid("band edges must lie within [0, 1]".to_owned());
    }
    if bands.windows(2).any(|w| w[1] < w[0]) {
        return invalid("band edges must be non-decreasing".to_owned());
    }

    let nbands = bands.len() / 2;
    let weight = match weight {
        Some(w) if w.len() != nbands => {
            return invalid(format!(
                "weight has {} values but there are {nbands} bands",
                w.len()
            ));
        }
        Some(w) if w.iter().any(|x| !x.is_finite() || *x < 0.0) => {
            return invalid("weights must be finite and non-negative".to_owned());
        }
        Some(w) => w.to_vec(),
        None => vec![1.0; nbands],
    };

    bands
        .chunks_exact(2)
        .zip(desired.chunks_exact(2))
        .zip(weight)
        .map(|((f, d), weight)| {
            let (lo, hi) = (f[0], f[1]);
            if hi <= lo {
                return invalid(format!("band [{lo}, {hi}] has no width"));
            }
            let m = (d[1] - d[0]) / (hi - lo);
            Ok(Band {
                lo,
                hi,
                m,
                c: d[0] - lo * m,
                weight,
            })
        })
        .collect()
}
