// config.rs
//
// Configuration and CLI argument parsing for the layout tool

use crate::assembler::MAX_PASSES;
use crate::samples::{self, Sample};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Complete configuration for the layout tool
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Lay out and encode a built-in RISC-V sample program",
    after_help = "By default, successful assembly produces no output.\n\
                  Use -v to see convergence progress.\n\
                  When --dump-code is used, no output file is generated."
)]
pub struct Config {
    /// Program to build
    #[arg(value_enum)]
    pub sample: SampleKind,

    /// Write output to <FILE>
    #[arg(short, long, value_name = "FILE", default_value = "a.out")]
    pub output: PathBuf,

    /// Load address of the first byte (decimal or 0x hex)
    #[arg(short = 't', long, value_name = "ADDRESS", default_value = "0x10000", value_parser = parse_address)]
    pub origin: u32,

    /// Give up if the layout has not converged after this many passes
    #[arg(long, value_name = "N", default_value_t = MAX_PASSES)]
    pub max_passes: usize,

    /// Show convergence progress and debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Print a listing of the final image instead of writing the output file
    #[arg(long)]
    pub dump_code: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    /// Print "Hello world" and exit
    Hello,
    /// Exit with status 0
    Exit,
}

impl SampleKind {
    pub fn build(self) -> Sample {
        match self {
            SampleKind::Hello => samples::hello(),
            SampleKind::Exit => samples::exit(),
        }
    }
}

/// Parse an address string (decimal or hex with 0x prefix)
pub fn parse_address(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(&hex.replace('_', ""), 16)
            .map_err(|_| format!("invalid hex address: {}", s))
    } else {
        s.parse::<u32>().map_err(|_| format!("invalid address: {}", s))
    }
}
