//! postpack - post-process a finished build output.

#![allow(dead_code)]

mod archive;
mod cli;
mod codec;
mod config;
mod freshness;
mod logger;
mod pipeline;
mod scan;
mod utils;

use std::io::{IsTerminal, stdout};

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::Cli;
use config::PostpackConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    let color = match cli.color {
        ColorChoice::Always => {
            owo_colors::set_override(true);
            true
        }
        ColorChoice::Never => {
            owo_colors::set_override(false);
            false
        }
        ColorChoice::Auto => stdout().is_terminal(),
    };

    let config = PostpackConfig::load(&cli)?;
    cli::run::run_command(&config, &cli.command(), color)
}
