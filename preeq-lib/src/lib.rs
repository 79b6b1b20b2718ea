// Copyright 2026 The preeq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pre-equalization tooling for zero-order-hold DACs.
//!
//! A DAC that holds each sample for a full period multiplies the spectrum of its output by a sinc.
//! By the time a flat signal reaches Nyquist it has lost almost 4dB.  This crate designs the FIR
//! that boosts the upper band by the inverse of that roll-off and quantizes it for fixed-point
//! hardware.
//!
//! - [`dsp`] contains the design core.  Everything there is a pure computation.
//! - [`emit`] writes the coefficients out as a C++ header fragment.
//! - [`noise`] applies the coefficients to a maximal-length LFSR to produce pre-equalized white
//!   noise, a handy test signal for the DAC.
//! - [`histogram`] counts byte values, mostly to sanity check generated noise.
//! - [`config`] merges defaults with a TOML configuration file.

pub mod config;
pub mod dsp;
pub mod emit;
pub mod histogram;
pub mod noise;

#[derive(thiserror::Error, Debug)]
pub enum PreeqError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("design failed: {0}")]
    DesignFailure(String),

    #[error("cannot write {path}: {source}")]
    OutputWriteFailure {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read {path}: {source}")]
    InputReadFailure {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config: {0}")]
    Config(String),
}

impl PreeqError {
    /// Attach a destination name to an output error.
    pub(crate) fn output(path: impl Into<String>, source: std::io::Error) -> Self {
        PreeqError::OutputWriteFailure {
            path: path.into(),
            source,
        }
    }

    /// Attach a source name to an input error.
    pub(crate) fn input(path: impl Into<String>, source: std::io::Error) -> Self {
        PreeqError::InputReadFailure {
            path: path.into(),
            source,
        }
    }
}

pub mod prelude {
    pub use crate::PreeqError;
    pub use crate::dsp::{DesignArgs, design::Design};
}
