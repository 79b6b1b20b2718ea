// Copyright 2026 The preeq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End to end: design, quantize, write a header, and feed the same coefficients to the noise
//! generator, all through the public API.

use assert_approx_eq::assert_approx_eq;

use preeq_lib::{
    dsp::{DEFAULT_FIR_SHIFT, design},
    emit,
    histogram::Histogram,
    noise::{self, Lfsr64, NoiseArgs, TableFilter},
    prelude::*,
};

#[test]
fn test_default_design_to_header() {
    let d = design::design_with(&DesignArgs::default()).unwrap();
    assert_eq!(d.coefficients.len(), 63);
    assert_eq!(d.bands.len(), 2 * 63 - 2);

    let c = &d.coefficients;
    for k in 0..c.len() {
        assert_eq!(c[k], c[c.len() - 1 - k]);
    }
    // Center dominates, a bit above unity at 2^30
    let center = c[d.center()] as i64;
    assert!(center > 1 << 30);
    assert!(c.iter().enumerate().all(|(k, v)| k == d.center() || (*v as i64).abs() < center));

    let mags = d.response.magnitude();
    assert_approx_eq!(mags[0], 1.0, 1e-3);
    assert!(d.max_error_below(0.9) < 1e-2);

    let text = emit::render_header(DEFAULT_FIR_SHIFT, c);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 63 + 3);
    assert_eq!(lines[0], "const int fir_shift = 24;");
    assert_eq!(lines[1], "std::vector<int32_t> coeff = {");
    assert_eq!(lines[2], format!("  {:>10},", c[0]));
    assert_eq!(lines[65], "};");
}

#[test]
fn test_small_designs() {
    let d = design::design(3, 30).unwrap();
    assert_eq!(d.bands, vec![0.0, 0.5, 0.5, 1.0]);
    assert_eq!(d.coefficients[0], d.coefficients[2]);
    assert!(d.coefficients[0] < 0);

    assert!(matches!(
        design::design(2, 30),
        Err(PreeqError::InvalidParameter(_))
    ));
    assert!(matches!(
        design::design(63, 32),
        Err(PreeqError::InvalidParameter(_))
    ));
}

#[test]
fn test_header_text() {
    assert_eq!(
        emit::render_header(24, &[1000, -2000, 1000]),
        concat!(
            "const int fir_shift = 24;\n",
            "std::vector<int32_t> coeff = {\n",
            "        1000,\n",
            "       -2000,\n",
            "        1000,\n",
            "};\n",
        )
    );
}

#[test]
fn test_designed_noise_histogram() {
    let d = design::design(31, 30).unwrap();
    let filter = TableFilter::new(&d.coefficients, DEFAULT_FIR_SHIFT).unwrap();
    let mut lfsr = Lfsr64::with_seed(0x9E37_79B9_7F4A_7C15).unwrap();
    let args = NoiseArgs {
        threads: 3,
        buffer_log2: 12,
        buffers: 2,
    };

    let mut out = Vec::new();
    let written = noise::generate(&mut out, "memory", &filter, &mut lfsr, &args).unwrap();
    assert_eq!(written, 8192);
    assert_eq!(out.len(), 8192);

    let hist = Histogram::from_reader(&out[..]).unwrap();
    assert_eq!(hist.total(), 8192);
    // Symmetric ±c sums, so the output stays roughly centered
    assert!(hist.mean().unwrap().abs() < 8.0);
}
