//! CLI definitions for fecprobe.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[clap(
    name = "fecprobe",
    version,
    about = "Erasure-coded transport probe\n\nDrive the fec-transport pipeline through a simulated lossy link and measure how much of the stream survives.",
    long_about = None
)]
pub struct Cli {
    /// Path to fecprobe.toml config file
    #[clap(long, short, default_value = "fecprobe.toml")]
    pub config: PathBuf,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a loss-simulation benchmark and output a structured report
    Bench {
        /// Number of coding groups to push through the link
        #[clap(long, default_value = "10000")]
        groups: u64,

        /// Write JSON report to this file (default: stdout)
        #[clap(long)]
        output: Option<PathBuf>,
    },

    /// Print an example fecprobe.toml to stdout
    Init,
}
