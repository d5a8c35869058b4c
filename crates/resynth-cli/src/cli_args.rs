//! CLI argument definitions for the `resynth` command-line interface.

use clap::{Parser, Subcommand};

/// Resynth - incremental synthesis of bandwidth-enhanced partials
#[derive(Parser, Debug)]
#[command(name = "resynth")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a partial set to a 16-bit WAV file
    Render {
        /// Path to the partial set (JSON)
        #[arg(short, long)]
        input: String,

        /// Path of the WAV file to write
        #[arg(short, long)]
        output: String,

        /// Samples synthesized per block
        #[arg(long, default_value_t = 512)]
        block_size: usize,

        /// Sample rate in Hz (overrides the document)
        #[arg(long)]
        sample_rate: Option<f64>,

        /// Fade time in seconds (overrides the document)
        #[arg(long)]
        fade_time: Option<f64>,

        /// Noise seed (overrides the document)
        #[arg(long)]
        seed: Option<u32>,

        /// Transposition in semitones
        #[arg(long, allow_hyphen_values = true)]
        transpose: Option<f64>,

        /// Scale the output so its peak sits just below full scale
        #[arg(long)]
        normalize: bool,
    },

    /// Show how each partial maps onto the sample clock
    Inspect {
        /// Path to the partial set (JSON)
        #[arg(short, long)]
        input: String,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },
}
