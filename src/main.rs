//! fecprobe — loss-simulation probe for the fec-transport pipeline.
//!
//! Encodes a stream of coding groups, impairs it like an unreliable link
//! (drops, bounded reordering), reassembles it through the group buffer,
//! and reports what survived. Run `fecprobe --help` for usage.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod bench;
mod cli;
mod config;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .init();

    let cli = Cli::parse();

    let config = match &cli.command {
        Commands::Init => None,
        _ => {
            if cli.config.exists() {
                Some(config::ProbeConfig::load(&cli.config)?)
            } else {
                eprintln!(
                    "No '{}' found — using defaults; run `fecprobe init > {}` to customize.",
                    cli.config.display(),
                    cli.config.display()
                );
                Some(config::ProbeConfig::default_example())
            }
        }
    };

    match cli.command {
        Commands::Init => {
            let example = config::ProbeConfig::default_example();
            print!("{}", toml::to_string_pretty(&example)?);
        }
        Commands::Bench { groups, output } => {
            bench::run(config.as_ref().unwrap(), groups, output)?;
        }
    }

    Ok(())
}
