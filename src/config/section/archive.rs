//! `[archive]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [archive]
//! disable = false
//! target = "site"     # Writes <root>/site.zip with a top-level site/ folder
//! ```
//!
//! Without `target` the output directory name is used.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub disable: bool,
    pub target: Option<String>,
}

impl ArchiveConfig {
    pub const TARGET: FieldPath = FieldPath::new("archive.target");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        let Some(target) = &self.target else {
            return;
        };
        if target.is_empty() || target == "." || target == ".." {
            diag.error(Self::TARGET, format!("`{target}` is not a usable archive name"));
        } else if target.contains(['/', '\\']) {
            diag.error_with_hint(
                Self::TARGET,
                "archive name must not contain path separators",
                "the archive is always written to the project root",
            );
        } else if target.ends_with(".zip") {
            diag.warn(Self::TARGET, "`.zip` is appended automatically");
        }
    }
}
