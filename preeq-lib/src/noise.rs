// Copyright 2026 The preeq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Pre-Equalized Noise
//!
//! White noise is the easiest way to see a DAC's hold droop on a spectrum analyzer, and noise that
//! has been through the pre-equalizer should come out flat.
//!
//! ## Source
//!
//! A 64-bit Fibonacci LFSR with taps at `x^64 + x^63 + x^61 + x^60 + 1` produces a maximal-length
//! bit sequence.  Each new bit is shifted in at the bottom, so the state word is always the latest
//! 64 bits of the sequence, newest at bit 0.
//!
//! ## Filtering Without Multiplies
//!
//! Treat each bit as `±1`.  Running the FIR over the bit sequence is then just a signed sum of
//! coefficients, and because the state word already holds the last 64 bits, one state is one output
//! sample.  Splitting the word into bytes, every byte's contribution can be looked up in a 256 entry
//! table built once from the eight coefficients it covers.  Eight lookups and adds per sample.
//!
//! ## Bounded Output
//!
//! [`generate`] writes a fixed number of buffers and returns.  Pipe it somewhere and run it again
//! if you need more.

use std::io::Write;

use crate::PreeqError;

/// Bits in the LFSR state, and thus the most coefficients a [`TableFilter`] can apply.
pub const MAX_TAPS: usize = 64;
/// Largest buffer, as a power of two.
pub const MAX_BUFFER_LOG2: u32 = 30;

/// 64-bit maximal-length LFSR.  Repeats after `2^64 - 1` steps, which at 100MHz is a few thousand
/// years.
#[derive(Clone, Debug)]
pub struct Lfsr64 {
    state: u64,
}

impl Default for Lfsr64 {
    fn default() -> Self {
        Lfsr64::new()
    }
}

impl Lfsr64 {
    pub fn new() -> Self {
        Lfsr64 { state: 1 }
    }

    /// Start from `seed`.  Zero is the one state the LFSR can never leave, so it is rejected.
    pub fn with_seed(seed: u64) -> Result<Self, PreeqError> {
        if seed == 0 {
            return Err(PreeqError::InvalidParameter(
                "LFSR seed must be non-zero".to_owned(),
            ));
        }
        Ok(Lfsr64 { state: seed })
    }

    pub fn state(&self) -> u64 {
        self.state
    }

    /// Advance one bit and return the new state.
    #[inline]
    pub fn step(&mut self) -> u64 {
        let s = self.state;
        let bit = ((s >> 63) ^ (s >> 62) ^ (s >> 60) ^ (s >> 59)) & 1;
        self.state = (s << 1) | bit;
        self.state
    }

    /// Fill `buffer` with successive states.
    pub fn fill(&mut self, buffer: &mut [u64]) {
        for slot in buffer.iter_mut() {
            *slot = self.step();
        }
    }
}

impl Iterator for Lfsr64 {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.step())
    }
}

/// FIR over the bits of an LFSR state using per-byte lookup tables.
#[derive(Clone, Debug)]
pub struct TableFilter {
    /// One table per byte of state that has any coefficient behind it.
    tables: Vec<[i64; 256]>,
    shift: u32,
}

impl TableFilter {
    /// Build tables for `coefficients`, applied to state bits `0..len`.  Missing coefficients up to
    /// the next byte boundary are zero.  Each output is the sum shifted right by `shift`.
    pub fn new(coefficients: &[i32], shift: u32) -> Result<Self, PreeqError> {
        if coefficients.is_empty() || coefficients.len() > MAX_TAPS {
            return Err(PreeqError::InvalidParameter(format!(
                "table filter takes 1 to {MAX_TAPS} coefficients, got {}",
                coefficients.len()
            )));
        }
        if shift >= 63 {
            return Err(PreeqError::InvalidParameter(format!(
                "output shift {shift} would discard the whole sum"
            )));
        }

        let tables = coefficients
            .chunks(8)
            .map(|chunk| {
                let mut table = [0i64; 256];
                for (j, entry) in table.iter_mut().enumerate() {
                    *entry = chunk
                        .iter()
                        .enumerate()
                        .map(|(k, &c)| {
                            if j & (1 << k) != 0 {
                                c as i64
                            } else {
                                -(c as i64)
                            }
                        })
                        .sum();
                }
                table
            })
            .collect();

        Ok(TableFilter { tables, shift })
    }

    pub fn shift(&self) -> u32 {
        self.shift
    }

    /// Filter one state word.  Saturates into `i8`.
    #[inline]
    pub fn sample(&self, state: u64) -> i8 {
        let bytes = state.to_le_bytes();
        let sum: i64 = self
            .tables
            .iter()
            .zip(bytes.iter())
            .map(|(table, &b)| table[b as usize])
            .sum();
        (sum >> self.shift).clamp(i8::MIN as i64, i8::MAX as i64) as i8
    }

    /// Filter `states` into `out`, splitting the work over `threads` workers.  The worker count is
    /// capped at the available parallelism.
    pub fn filter(&self, states: &[u64], out: &mut [i8], threads: usize) -> Result<(), PreeqError> {
        if states.len() != out.len() {
            return Err(PreeqError::InvalidParameter(format!(
                "{} states but {} output slots",
                states.len(),
                out.len()
            )));
        }
        if threads == 0 {
            return Err(PreeqError::InvalidParameter(
                "need at least one thread".to_owned(),
            ));
        }
        if states.is_empty() {
            return Ok(());
        }

        // More workers than cores only adds spawn cost
        let workers = threads.min(max_workers());
        let chunk = states.len().div_ceil(workers);
        std::thread::scope(|s| {
            for (input, output) in states.chunks(chunk).zip(out.chunks_mut(chunk)) {
                s.spawn(move || {
                    for (x, y) in input.iter().zip(output.iter_mut()) {
                        *y = self.sample(*x);
                    }
                });
            }
        });
        Ok(())
    }
}

/// How much noise to make and how.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseArgs {
    /// Worker threads per buffer.
    pub threads: usize,
    /// Samples per buffer, as a power of two.
    pub buffer_log2: u32,
    /// Number of buffers to write.
    pub buffers: usize,
}

impl Default for NoiseArgs {
    fn default() -> Self {
        NoiseArgs {
            threads: 4,
            buffer_log2: 17,
            buffers: 8,
        }
    }
}

impl NoiseArgs {
    /// Check the arguments up front so nothing is written for a run that can't succeed.
    pub fn validate(&self) -> Result<(), PreeqError> {
        if self.threads == 0 {
            return Err(PreeqError::InvalidParameter(
                "need at least one thread".to_owned(),
            ));
        }
        if self.buffer_log2 > MAX_BUFFER_LOG2 {
            return Err(PreeqError::InvalidParameter(format!(
                "buffer size 2^{} exceeds 2^{MAX_BUFFER_LOG2}",
                self.buffer_log2
            )));
        }
        Ok(())
    }
}

fn max_workers() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

/// Write `args.buffers` buffers of filtered LFSR output to `w` as signed bytes.  `name` is only
/// used for error reporting.  Returns the number of bytes written.
pub fn generate<W: Write>(
    w: &mut W,
    name: &str,
    filter: &TableFilter,
    lfsr: &mut Lfsr64,
    args: &NoiseArgs,
) -> Result<usize, PreeqError> {
    args.validate()?;

    let size = 1usize << args.buffer_log2;
    let mut states = vec![0u64; size];
    let mut filtered = vec![0i8; size];
    let mut bytes = vec![0u8; size];

    for _ in 0..args.buffers {
        lfsr.fill(&mut states);
        filter.filter(&states, &mut filtered, args.threads)?;
        for (b, s) in bytes.iter_mut().zip(filtered.iter()) {
            *b = *s as u8;
        }
        w.write_all(&bytes)
            .map_err(|e| PreeqError::output(name, e))?;
    }
    w.flush().map_err(|e| PreeqError::output(name, e))?;

    log::debug!("wrote {} buffers of {size} samples to {name}", args.buffers);
    Ok(size * args.buffers)
}
