//! Configuration management for `postpack.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── paths      # [paths]
//! │   ├── run        # [run]
//! │   ├── compress   # [compress]
//! │   ├── image      # [image]
//! │   └── archive    # [archive]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   └── field      # FieldPath
//! └── mod.rs         # PostpackConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section      | Purpose                                          |
//! |--------------|--------------------------------------------------|
//! | `[paths]`    | Output and public directories                    |
//! | `[run]`      | Concurrency limit and codec deadline             |
//! | `[compress]` | Precompression filter, threshold, algorithm      |
//! | `[image]`    | Image filter and optimizer stages                |
//! | `[archive]`  | Zip archive name                                 |
//!
//! A missing config file is not an error: every section has defaults and
//! the current directory becomes the project root.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{ArchiveConfig, CompressConfig, ImageConfig, PathsConfig, RunConfig};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::{
    cli::{Cli, Commands, CompressArgs},
    debug, log,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_CONFIG_NAME: &str = "postpack.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing postpack.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostpackConfig {
    /// Absolute path to the config file, if one was found (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Project root directory (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    pub paths: PathsConfig,
    pub run: RunConfig,
    pub compress: CompressConfig,
    pub image: ImageConfig,
    pub archive: ArchiveConfig,
}

impl PostpackConfig {
    /// Load configuration for a CLI invocation.
    ///
    /// Searches upward from cwd for the config file. Its parent directory is
    /// the project root; without a file the cwd is the root.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.root = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| cwd.clone());
                config.config_path = Some(path);
                config
            }
            None if cli.config != Path::new(DEFAULT_CONFIG_NAME) => {
                return Err(ConfigError::NotFound(cli.config.clone()).into());
            }
            None => Self {
                root: cwd,
                ..Self::default()
            },
        };

        config.apply_cli(cli);
        config.finalize();
        match &config.config_path {
            Some(path) => debug!("config"; "loaded {}", path.display()),
            None => debug!("config"; "no {} found, using defaults", cli.config.display()),
        }
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string, resolving paths against `root`.
    #[cfg(test)]
    pub fn from_str_in(content: &str, root: &Path) -> Result<Self> {
        let (mut config, ignored) = Self::parse_with_ignored(content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, Path::new(DEFAULT_CONFIG_NAME));
        }
        config.root = root.to_path_buf();
        config.finalize();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields. They are ignored, not fatal.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply CLI overrides. CLI values win over file values.
    fn apply_cli(&mut self, cli: &Cli) {
        crate::logger::set_verbose(cli.verbose);

        Self::update_option(&mut self.paths.output, cli.output.as_ref());
        if let Some(public) = &cli.public {
            self.paths.public = Some(public.clone());
        }
        Self::update_option(&mut self.run.concurrency, cli.jobs.as_ref());

        match cli.command() {
            Commands::Compress { args } => self.apply_compress_args(&args),
            Commands::Archive { target } => {
                if target.is_some() {
                    self.archive.target = target;
                }
            }
            Commands::Run | Commands::Images => {}
        }
    }

    fn apply_compress_args(&mut self, args: &CompressArgs) {
        Self::update_option(&mut self.compress.algorithm, args.algorithm.as_ref());
        Self::update_option(&mut self.compress.threshold, args.threshold.as_ref());
        Self::update_option(
            &mut self.compress.delete_original,
            args.delete_original.as_ref(),
        );
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // paths
    // ========================================================================

    /// Normalize the root and make directory paths absolute.
    fn finalize(&mut self) {
        self.root = crate::utils::path::normalize_path(&self.root);
        self.paths.normalize(&self.root);
    }

    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Archive base name: `[archive] target`, or the output directory name.
    pub fn archive_target(&self) -> String {
        self.archive.target.clone().unwrap_or_else(|| {
            self.paths
                .output
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "dist".to_string())
        })
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate every section, collecting all errors at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        self.paths.validate(&self.root, &mut diag);
        self.compress.validate(&mut diag);
        self.image.validate(&mut diag);
        self.archive.validate(&mut diag);

        diag.print_warnings();
        diag.into_result().map_err(ConfigError::Diagnostics)
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config text. Panics if there are unknown fields (to catch config
/// typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> PostpackConfig {
    let (parsed, ignored) = PostpackConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_from_str_invalid_toml() {
        let result: Result<PostpackConfig, _> = toml::from_str("[paths\noutput = \"dist\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.paths.output, PathBuf::from("dist"));
        assert_eq!(config.paths.public, Some(PathBuf::from("public")));
        assert_eq!(config.run.concurrency, 32);
        assert_eq!(config.compress.threshold, 1025);
        assert!(!config.image.disable);
        assert!(config.archive.target.is_none());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[compress]\nthreshold = 10\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = PostpackConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.compress.threshold, 10);
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_from_str_in_resolves_paths() {
        let dir = TempDir::new().unwrap();
        let config =
            PostpackConfig::from_str_in("[paths]\noutput = \"build\"", dir.path()).unwrap();
        assert!(config.paths.output.is_absolute());
        assert!(config.paths.output.ends_with("build"));
        assert_eq!(config.archive_target(), "build");
    }

    #[test]
    fn test_validation_collects_errors() {
        let dir = TempDir::new().unwrap();
        let content = "[compress]\nfilter = \"(\"\nalgorithm = \"deflate\"\n[archive]\ntarget = \"a/b\"";
        let err = PostpackConfig::from_str_in(content, dir.path()).unwrap_err();
        let ConfigError::Diagnostics(diag) = err.downcast::<ConfigError>().unwrap() else {
            panic!("expected diagnostics");
        };
        assert_eq!(diag.len(), 3);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "postpack",
            "-o",
            "out",
            "-j",
            "2",
            "compress",
            "--algorithm",
            "brotli",
            "--threshold",
            "0",
        ]);
        let mut config = test_parse_config("[compress]\nthreshold = 4096\nalgorithm = \"gzip\"");
        config.apply_cli(&cli);

        assert_eq!(config.paths.output, PathBuf::from("out"));
        assert_eq!(config.run.concurrency, 2);
        assert_eq!(config.compress.threshold, 0);
        assert_eq!(
            config.compress.algorithm,
            crate::codec::compress::Algorithm::Brotli
        );
    }

    #[test]
    fn test_cli_empty_public_disables_public_pass() {
        let dir = TempDir::new().unwrap();
        let cli = Cli::parse_from(["postpack", "--public", ""]);
        let mut config = test_parse_config("[paths]\npublic = \"assets\"");
        config.root = dir.path().to_path_buf();
        config.apply_cli(&cli);
        config.finalize();

        assert_eq!(config.paths.public, None);
        assert!(config.paths.public_images_root(config.get_root()).is_none());
    }
}
