//! Command-line interface definitions.

use clap::builder::{OsStringValueParser, TypedValueParser};
use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::codec::compress::Algorithm;

/// Post-process a finished build: precompress, optimize images, archive
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Build output directory (relative to project root)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Public assets directory (relative to project root, "" to skip)
    #[arg(
        short,
        long,
        global = true,
        value_hint = clap::ValueHint::DirPath,
        value_parser = OsStringValueParser::new().map(PathBuf::from),
    )]
    pub public: Option<PathBuf>,

    /// Config file path (default: postpack.toml)
    #[arg(short = 'C', long, global = true, default_value = "postpack.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Maximum in-flight jobs per phase (0 = unbounded)
    #[arg(short = 'j', long, global = true)]
    pub jobs: Option<usize>,

    /// Show skipped files and resolved options
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands (default: run)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Compress, optimize images, then archive the output
    #[command(visible_alias = "r")]
    Run,

    /// Precompress text assets in the output directory
    #[command(visible_alias = "c")]
    Compress {
        #[command(flatten)]
        args: CompressArgs,
    },

    /// Optimize images in the output and public directories
    #[command(visible_alias = "i")]
    Images,

    /// Bundle the output directory into a zip archive
    #[command(visible_alias = "a")]
    Archive {
        /// Archive name, without `.zip` (default: output directory name)
        #[arg(short, long)]
        target: Option<String>,
    },
}

/// Compression command arguments.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct CompressArgs {
    /// Compression algorithm
    #[arg(short, long, value_enum)]
    pub algorithm: Option<Algorithm>,

    /// Files smaller than this many bytes are left alone
    #[arg(short, long)]
    pub threshold: Option<u64>,

    /// Remove each original after its compressed sibling is written
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub delete_original: Option<bool>,
}

impl Cli {
    /// The selected command; no subcommand means `run`.
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_run() {
        let cli = Cli::parse_from(["postpack"]);
        assert!(matches!(cli.command(), Commands::Run));
        assert_eq!(cli.config, PathBuf::from("postpack.toml"));
    }

    #[test]
    fn test_compress_args() {
        let cli = Cli::parse_from([
            "postpack",
            "compress",
            "--algorithm",
            "brotli",
            "--threshold",
            "0",
            "--delete-original",
        ]);
        let Commands::Compress { args } = cli.command() else {
            panic!("expected compress");
        };
        assert_eq!(args.algorithm, Some(Algorithm::Brotli));
        assert_eq!(args.threshold, Some(0));
        assert_eq!(args.delete_original, Some(true));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["postpack", "archive", "-o", "build", "-j", "4", "-t", "site"]);
        assert_eq!(cli.output, Some(PathBuf::from("build")));
        assert_eq!(cli.jobs, Some(4));
        assert!(matches!(cli.command(), Commands::Archive { target: Some(t) } if t == "site"));
    }
}
