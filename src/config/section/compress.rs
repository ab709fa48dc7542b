//! `[compress]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [compress]
//! disable = false
//! filter = '(?i)\.(js|mjs|json|css|html)$'
//! threshold = 1025            # Files smaller than this are skipped
//! algorithm = "brotli"        # gzip | brotli | deflate | deflate-raw
//! extension = ".br"           # Defaults per algorithm (.gz, .br)
//! options = { quality = 9 }   # Merged over the algorithm defaults
//! delete_original = false     # Remove the source after compressing
//! verbose = true              # Print a size table after the phase
//! ```

use serde::{Deserialize, Serialize};

use crate::codec::compress::{Algorithm, Compressor};
use crate::codec::{CodecError, CodecOptions, unknown_options};
use crate::config::{ConfigDiagnostics, FieldPath};
use crate::scan::PathFilter;

pub const DEFAULT_COMPRESS_FILTER: &str = r"(?i)\.(js|mjs|json|css|html)$";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressConfig {
    pub disable: bool,
    pub filter: String,
    pub threshold: u64,
    pub algorithm: Algorithm,
    pub extension: Option<String>,
    pub options: CodecOptions,
    pub delete_original: bool,
    pub verbose: bool,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            disable: false,
            filter: DEFAULT_COMPRESS_FILTER.to_string(),
            threshold: 1025,
            algorithm: Algorithm::Gzip,
            extension: None,
            options: CodecOptions::new(),
            delete_original: false,
            verbose: true,
        }
    }
}

impl CompressConfig {
    pub const FILTER: FieldPath = FieldPath::new("compress.filter");
    pub const EXTENSION: FieldPath = FieldPath::new("compress.extension");
    pub const OPTIONS: FieldPath = FieldPath::new("compress.options");

    pub fn path_filter(&self) -> Result<PathFilter, regex::Error> {
        PathFilter::pattern(&self.filter)
    }

    /// Output extension with a leading dot: configured, else the algorithm's.
    pub fn extension(&self) -> Option<String> {
        let ext = self
            .extension
            .as_deref()
            .or(self.algorithm.default_extension())?;
        if ext.starts_with('.') {
            Some(ext.to_string())
        } else {
            Some(format!(".{ext}"))
        }
    }

    pub fn compressor(&self) -> Result<Compressor, CodecError> {
        Compressor::new(self.algorithm, &self.options)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.disable {
            return;
        }

        if let Err(e) = self.path_filter() {
            diag.error(Self::FILTER, format!("invalid pattern: {e}"));
        }

        match self.extension() {
            None => diag.error_with_hint(
                Self::EXTENSION,
                format!("`{}` has no conventional extension", self.algorithm.name()),
                "set one explicitly, e.g. extension = \".zz\"",
            ),
            Some(ext) if ext == "." => {
                diag.error(Self::EXTENSION, "extension must not be empty");
            }
            Some(_) => {}
        }

        if let Err(e) = self.compressor() {
            diag.error(Self::OPTIONS, e.to_string());
        }

        for key in unknown_options(&self.algorithm.default_options(), &self.options) {
            diag.warn(
                Self::OPTIONS,
                format!("`{key}` is not a `{}` option, ignoring", self.algorithm.name()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;
    use std::path::Path;

    #[test]
    fn test_compress_defaults() {
        let config = test_parse_config("");
        let compress = &config.compress;
        assert!(!compress.disable);
        assert_eq!(compress.threshold, 1025);
        assert_eq!(compress.algorithm, Algorithm::Gzip);
        assert_eq!(compress.extension().as_deref(), Some(".gz"));
        assert!(!compress.delete_original);
        assert!(compress.verbose);
    }

    #[test]
    fn test_default_filter() {
        let filter = CompressConfig::default().path_filter().unwrap();
        assert!(filter.matches(Path::new("dist/app.JS")));
        assert!(filter.matches(Path::new("dist/index.html")));
        assert!(!filter.matches(Path::new("dist/logo.png")));
        assert!(!filter.matches(Path::new("dist/app.js.gz")));
    }

    #[test]
    fn test_extension_resolution() {
        let config = test_parse_config("[compress]\nalgorithm = \"brotliCompress\"");
        assert_eq!(config.compress.extension().as_deref(), Some(".br"));

        let config = test_parse_config("[compress]\nalgorithm = \"deflate\"\nextension = \"zz\"");
        assert_eq!(config.compress.extension().as_deref(), Some(".zz"));
    }

    #[test]
    fn test_options_table() {
        let config = test_parse_config("[compress]\nalgorithm = \"brotli\"\noptions = { quality = 5 }");
        assert!(matches!(
            config.compress.compressor().unwrap(),
            Compressor::Brotli { quality: 5, .. }
        ));
    }

    #[test]
    fn test_validate_errors() {
        let config = test_parse_config(
            "[compress]\nalgorithm = \"deflate-raw\"\nfilter = \"[\"\noptions = { level = 99 }",
        );
        let mut diag = ConfigDiagnostics::new();
        config.compress.validate(&mut diag);
        assert_eq!(diag.len(), 3);
    }

    #[test]
    fn test_misspelled_option_warns() {
        let config = test_parse_config("[compress]\noptions = { levle = 3 }");
        let mut diag = ConfigDiagnostics::new();
        config.compress.validate(&mut diag);
        assert!(!diag.has_errors());
        let warnings: Vec<_> = diag.warnings().map(ToString::to_string).collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("levle"));
    }

    #[test]
    fn test_disabled_skips_validation() {
        let config = test_parse_config("[compress]\ndisable = true\nfilter = \"[\"");
        let mut diag = ConfigDiagnostics::new();
        config.compress.validate(&mut diag);
        assert!(!diag.has_errors());
    }
}
