// Copyright 2026 The preeq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # preeq
//!
//! Designs the DAC pre-equalizer and writes it out as `fir_coeff.h`.  Run with no arguments to get
//! the stock 63 tap filter.  The other subcommands make and inspect test noise.
//!
//! ## Usage
//!
//! ```text
//! preeq                          # same as `preeq design`
//! preeq design --taps 31 --response
//! preeq noise --buffers 64 --output noise.dat
//! preeq histogram noise.dat
//! preeq config
//! ```
//!
//! Set `RUST_LOG=debug` for design diagnostics.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use clap::{Parser, Subcommand};

use preeq_lib::{
    config::PreeqConfig,
    dsp::design,
    emit,
    histogram::Histogram,
    noise::{self, Lfsr64, TableFilter},
    prelude::*,
};

#[derive(Parser, Debug)]
#[command(name = "preeq")]
#[command(about = "Inverse-sinc FIR design for zero-order-hold DAC pre-equalization.", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Preeq(#[from] PreeqError),
    #[error("stdout: {0}")]
    Stdout(#[from] io::Error),
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Design the filter and write the header
    Design(DesignCmd),
    /// Write pre-equalized LFSR noise as signed bytes
    Noise(NoiseCmd),
    /// Count the signed byte values of a file
    Histogram(HistogramCmd),
    /// Show the merged configuration
    Config(ConfigCmd),
}

#[derive(clap::Args, Debug, Default)]
struct DesignCmd {
    /// Number of taps, odd and at least 3
    #[arg(long)]
    taps: Option<usize>,

    /// Fractional bits used for quantization
    #[arg(long)]
    scale_shift: Option<u32>,

    /// Shift written into the header for the consumer
    #[arg(long)]
    fir_shift: Option<u32>,

    /// Header destination
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Print the frequency response against the target
    #[arg(long)]
    response: bool,
}

#[derive(clap::Args, Debug)]
struct NoiseCmd {
    /// Worker threads
    #[arg(long, short)]
    threads: Option<usize>,

    /// Buffer size as a power of two
    #[arg(long, short)]
    buffer: Option<u32>,

    /// Number of buffers to write
    #[arg(long)]
    buffers: Option<usize>,

    /// Non-zero LFSR starting state
    #[arg(long)]
    seed: Option<u64>,

    /// Destination, `-` for stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct HistogramCmd {
    /// File of signed bytes
    #[arg(index = 1)]
    path: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct ConfigCmd {}

fn main() -> Result<(), CliError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let cfg = PreeqConfig::load(args.config.as_deref())?;

    match args.command {
        None => cmd_design(cfg, DesignCmd::default()),
        Some(Command::Design(a)) => cmd_design(cfg, a),
        Some(Command::Noise(a)) => cmd_noise(cfg, a),
        Some(Command::Histogram(a)) => cmd_histogram(cfg, a),
        Some(Command::Config(_)) => cmd_config(cfg),
    }
}

const INDENT: usize = 2;
const LABEL_W: usize = 24; // includes colon
const VALUE_W: usize = 22;

macro_rules! header {
    ($($arg:tt)*) => {{
        const WIDTH: usize = INDENT + LABEL_W + 1 + VALUE_W;
        let title = format!($($arg)*);
        println!("\n{title}");
        println!("{}", "=".repeat(WIDTH));
    }};
}

macro_rules! row {
    ($label:expr, $fmt:expr, $value:expr) => {{
        let value = format!($fmt, $value);
        println!(
            "{:indent$}{label:<label_w$} {:>value_w$}",
            "",
            value,
            indent = INDENT,
            label = format!("{}:", $label),
            label_w = LABEL_W,
            value_w = VALUE_W,
        );
    }};
}

fn cmd_design(mut cfg: PreeqConfig, args: DesignCmd) -> Result<(), CliError> {
    if let Some(taps) = args.taps {
        cfg.design.taps = taps;
    }
    if let Some(shift) = args.scale_shift {
        cfg.design.scale_shift = shift;
    }
    if let Some(shift) = args.fir_shift {
        cfg.design.fir_shift = shift;
    }
    if let Some(output) = args.output {
        cfg.header_path = output;
    }

    let design = design::design_with(&cfg.design)?;
    emit::write_header_file(&cfg.header_path, cfg.design.fir_shift, &design.coefficients)?;

    header!("Inverse-Sinc Design");
    row!("Taps", "{}", design.coefficients.len());
    row!("Scale shift", "{} bits", design.scale_shift);
    row!("FIR shift", "{}", cfg.design.fir_shift);
    row!("Center tap", "{}", design.coefficients[design.center()]);
    row!("Max error to 0.9", "{:.2e}", design.max_error_below(0.9));
    row!("Header", "{}", cfg.header_path.display());

    if args.response {
        print_response(&design);
    }
    Ok(())
}

/// Coarse table standing in for a plot: gain against target every few bins.
fn print_response(design: &Design) {
    const STRIDE: usize = 32;
    let freqs = design.response.normalized();
    let mags = design.response.magnitude();

    header!("Response (Nyquist = 1)");
    println!(
        "{:indent$}{:>8} {:>12} {:>12} {:>10}",
        "",
        "freq",
        "gain",
        "target",
        "err dB",
        indent = INDENT
    );
    for (f, m) in freqs.iter().zip(mags.iter()).step_by(STRIDE) {
        let target = design::inverse_sinc(*f);
        let err_db = 20.0 * (m / target).log10();
        println!(
            "{:indent$}{:>8.4} {:>12.6} {:>12.6} {:>10.4}",
            "",
            f,
            m,
            target,
            err_db,
            indent = INDENT
        );
    }
}

fn cmd_noise(mut cfg: PreeqConfig, args: NoiseCmd) -> Result<(), CliError> {
    if let Some(threads) = args.threads {
        cfg.noise.threads = threads;
    }
    if let Some(buffer) = args.buffer {
        cfg.noise.buffer_log2 = buffer;
    }
    if let Some(buffers) = args.buffers {
        cfg.noise.buffers = buffers;
    }
    if let Some(seed) = args.seed {
        cfg.seed = seed;
    }
    if let Some(output) = args.output {
        cfg.noise_path = output;
    }
    // Before the output is created, so a bad run never truncates existing noise
    cfg.noise.validate()?;

    let design = design::design_with(&cfg.design)?;
    if design.coefficients.len() > noise::MAX_TAPS {
        log::warn!(
            "{} taps designed, only the first {} reach the LFSR",
            design.coefficients.len(),
            noise::MAX_TAPS
        );
    }
    let taps = design.coefficients.len().min(noise::MAX_TAPS);
    let filter = TableFilter::new(&design.coefficients[..taps], cfg.design.fir_shift)?;
    let mut lfsr = Lfsr64::with_seed(cfg.seed)?;

    let written = if cfg.noise_path.as_os_str() == "-" {
        let stdout = io::stdout();
        let mut w = BufWriter::new(stdout.lock());
        noise::generate(&mut w, "stdout", &filter, &mut lfsr, &cfg.noise)?
    } else {
        let name = cfg.noise_path.display().to_string();
        let file = File::create(&cfg.noise_path).map_err(|e| PreeqError::OutputWriteFailure {
            path: name.clone(),
            source: e,
        })?;
        let mut w = BufWriter::new(file);
        noise::generate(&mut w, &name, &filter, &mut lfsr, &cfg.noise)?
    };

    log::info!("wrote {written} samples to {}", cfg.noise_path.display());
    Ok(())
}

fn cmd_histogram(cfg: PreeqConfig, args: HistogramCmd) -> Result<(), CliError> {
    let path = args.path.unwrap_or(cfg.noise_path);
    let hist = Histogram::from_file(&path)?;

    if let Some(mean) = hist.mean() {
        log::info!("{} samples, mean {mean:.4}", hist.total());
    }

    let stdout = io::stdout();
    let mut w = BufWriter::new(stdout.lock());
    hist.write_counts(&mut w)?;
    w.flush()?;
    Ok(())
}

fn cmd_config(cfg: PreeqConfig) -> Result<(), CliError> {
    header!("preeq Configuration");
    row!("Taps", "{}", cfg.design.taps);
    row!("Scale shift", "{} bits", cfg.design.scale_shift);
    row!("FIR shift", "{}", cfg.design.fir_shift);
    row!("Response points", "{}", cfg.design.response_points);
    row!("Header", "{}", cfg.header_path.display());
    row!("Noise threads", "{}", cfg.noise.threads);
    row!("Noise buffer", "2^{}", cfg.noise.buffer_log2);
    row!("Noise buffers", "{}", cfg.noise.buffers);
    row!("LFSR seed", "{:#x}", cfg.seed);
    row!("Noise file", "{}", cfg.noise_path.display());
    match PreeqConfig::user_path() {
        Some(p) => row!("User config", "{}", p.display()),
        None => row!("User config", "{}", "none"),
    }
    Ok(())
}
