//! `[paths]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [paths]
//! output = "dist"      # Build output directory (compressed, archived)
//! public = "public"    # Public assets (images optimized in place)
//! ```
//!
//! Relative paths are resolved against the project root. A missing public
//! directory is not an error; the image phase just finds nothing there.
//! `public = ""` turns the public image pass off.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::utils::path::resolve_in_root;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub output: PathBuf,
    /// `None` once normalized from an empty string.
    pub public: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output: "dist".into(),
            public: Some("public".into()),
        }
    }
}

impl PathsConfig {
    pub const OUTPUT: FieldPath = FieldPath::new("paths.output");
    pub const PUBLIC: FieldPath = FieldPath::new("paths.public");

    pub(crate) fn normalize(&mut self, root: &Path) {
        self.output = resolve_in_root(&self.output, root);
        self.public = self
            .public
            .take()
            .filter(|public| !public.as_os_str().is_empty())
            .map(|public| resolve_in_root(&public, root));
    }

    /// The public directory, when it gets an image pass of its own.
    ///
    /// `None` when it is unset or overlaps the output directory or the
    /// project root.
    pub fn public_images_root(&self, root: &Path) -> Option<&Path> {
        let public = self.public.as_deref()?;
        Overlap::of(public, &self.output, root)
            .is_none()
            .then_some(public)
    }

    pub fn validate(&self, root: &Path, diag: &mut ConfigDiagnostics) {
        if self.output == root {
            diag.error_with_hint(
                Self::OUTPUT,
                "output directory is the project root",
                "point it at the build output, e.g. \"dist\"",
            );
        }
        let Some(public) = self.public.as_deref() else {
            return;
        };
        match Overlap::of(public, &self.output, root) {
            Some(Overlap::InsideOutput) => diag.warn(
                Self::PUBLIC,
                "inside the output directory; its images are optimized by the output pass only",
            ),
            Some(Overlap::ContainsOutput) => diag.warn(
                Self::PUBLIC,
                "contains the output directory; public image pass skipped",
            ),
            Some(Overlap::ContainsRoot) => diag.warn(
                Self::PUBLIC,
                "contains the project root; public image pass skipped",
            ),
            None => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Overlap {
    InsideOutput,
    ContainsOutput,
    ContainsRoot,
}

impl Overlap {
    fn of(public: &Path, output: &Path, root: &Path) -> Option<Self> {
        if public.starts_with(output) {
            Some(Self::InsideOutput)
        } else if root.starts_with(public) {
            Some(Self::ContainsRoot)
        } else if output.starts_with(public) {
            Some(Self::ContainsOutput)
        } else {
            None
        }
    }
}
