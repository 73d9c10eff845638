// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface: `convert`, `batch` and `config`.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracewerk_core::TurnPolicy;

/// Convert raster images into filled SVG outlines.
#[derive(Parser, Debug)]
#[command(name = "tracewerk", version)]
#[command(about = "Trace raster images into even-odd filled SVG paths", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert a single image.
    Convert {
        /// Image to convert.
        input: PathBuf,

        /// Destination SVG (defaults to the input path with an .svg extension).
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: ConversionArgs,
    },

    /// Convert every image in a directory.
    Batch {
        /// Directory scanned for images.
        #[arg(long, default_value = "Images/ToConvert")]
        input_dir: PathBuf,

        /// Directory receiving the SVG files (created if missing).
        #[arg(long, default_value = "Images/Converted")]
        output_dir: PathBuf,

        /// Images converted at the same time.
        #[arg(short = 'j', long, default_value_t = 1)]
        jobs: usize,

        /// Write a JSON report of the run to this file.
        #[arg(long)]
        report: Option<PathBuf>,

        #[command(flatten)]
        options: ConversionArgs,
    },

    /// Print the effective configuration as JSON.
    Config {
        /// Also save it to this file.
        #[arg(long)]
        write: Option<PathBuf>,

        #[command(flatten)]
        options: ConversionArgs,
    },
}

/// Settings shared by every subcommand. Unset flags fall back to the
/// configuration file, then to the built-in defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct ConversionArgs {
    /// JSON configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Threshold 0-255, or `auto` for Otsu's method.
    #[arg(short, long)]
    pub threshold: Option<ThresholdArg>,

    /// Gaussian blur kernel size (odd, 1 disables).
    #[arg(short, long)]
    pub blur: Option<i32>,

    /// Trace light shapes on a dark background.
    #[arg(long)]
    pub invert: bool,

    /// How diagonal pixel pairs are resolved.
    #[arg(long, value_enum)]
    pub turn_policy: Option<TurnPolicyArg>,

    /// Drop shapes with an area at or below this many square pixels.
    #[arg(long)]
    pub speckle_area: Option<f64>,

    /// Decimal places in SVG coordinates.
    #[arg(long)]
    pub precision: Option<usize>,

    /// Also write a PNG of the thresholded bitmap next to each SVG.
    #[arg(long)]
    pub preview: bool,
}

/// `--threshold` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdArg {
    Auto,
    Fixed(i32),
}

impl FromStr for ThresholdArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        s.parse::<i32>()
            .map(Self::Fixed)
            .map_err(|_| format!("expected a number between 0 and 255 or `auto`, got `{s}`"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TurnPolicyArg {
    /// Keep diagonal neighbours apart.
    Right,
    /// Join diagonal neighbours.
    Left,
}

impl From<TurnPolicyArg> for TurnPolicy {
    fn from(arg: TurnPolicyArg) -> Self {
        match arg {
            TurnPolicyArg::Right => TurnPolicy::Right,
            TurnPolicyArg::Left => TurnPolicy::Left,
        }
    }
}
