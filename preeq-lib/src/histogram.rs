// Copyright 2026 The preeq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Byte Histogram
//!
//! Quick look at the distribution of a file of signed 8-bit samples, such as the output of
//! [`crate::noise::generate`].  Bin `i` counts the value `i - 128`, so the bins run from `-128` up
//! to `127`.

use std::{
    fs::File,
    io::{self, BufReader, Read, Write},
    path::Path,
};

use crate::PreeqError;

/// Default input, where the noise generator writes by default.
pub const DEFAULT_INPUT: &str = "noise.dat";

const CHUNK: usize = 1024;

/// Counts of each signed byte value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Histogram {
    bins: [u64; 256],
}

impl Default for Histogram {
    fn default() -> Self {
        Histogram { bins: [0; 256] }
    }
}

impl Histogram {
    /// Count every byte from `reader` until end of input.
    pub fn from_reader<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut hist = Histogram::default();
        let mut buf = [0u8; CHUNK];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hist.add(&buf[..n]);
        }
        Ok(hist)
    }

    /// Count every byte in the file at `path`.
    pub fn from_file(path: &Path) -> Result<Self, PreeqError> {
        let name = path.display().to_string();
        let file = File::open(path).map_err(|e| PreeqError::input(&name, e))?;
        let hist =
            Histogram::from_reader(BufReader::new(file)).map_err(|e| PreeqError::input(&name, e))?;
        log::debug!("counted {} bytes from {name}", hist.total());
        Ok(hist)
    }

    /// Count `bytes`, read as `i8`.
    pub fn add(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.bins[bin(b as i8)] += 1;
        }
    }

    /// Count for `value`.
    pub fn count(&self, value: i8) -> u64 {
        self.bins[bin(value)]
    }

    /// All 256 counts, `-128` first.
    pub fn bins(&self) -> &[u64; 256] {
        &self.bins
    }

    pub fn total(&self) -> u64 {
        self.bins.iter().sum()
    }

    /// Mean sample value, or `None` when nothing was counted.
    pub fn mean(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let sum: f64 = self
            .bins
            .iter()
            .enumerate()
            .map(|(i, &c)| (i as f64 - 128.0) * c as f64)
            .sum();
        Some(sum / total as f64)
    }

    /// One count per line, `-128` first.
    pub fn write_counts<W: Write>(&self, w: &mut W) -> io::Result<()> {
        for c in self.bins.iter() {
            writeln!(w, "{c}")?;
        }
        Ok(())
    }
}

#[inline]
fn bin(value: i8) -> usize {
    (value as i16 + 128) as usize
}
