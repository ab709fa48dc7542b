//! Phase reports.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::TransformResult;
use crate::logger::{SizeRow, size_table};
use crate::utils::path::display_relative;

/// Outcome of one phase over one root.
///
/// `written` holds only files whose output reached disk. Failed files are
/// listed in `failures` and never appear in `written`; files skipped as
/// fresh (or below the threshold) are only counted.
#[derive(Debug, Clone, Default)]
pub struct PhaseReport {
    pub phase: &'static str,
    pub root: PathBuf,
    pub disabled: bool,
    pub scanned: usize,
    pub skipped: usize,
    pub written: BTreeMap<PathBuf, TransformResult>,
    pub failures: Vec<(PathBuf, String)>,
}

impl PhaseReport {
    pub fn new(phase: &'static str, root: &Path) -> Self {
        Self {
            phase,
            root: root.to_path_buf(),
            ..Self::default()
        }
    }

    pub fn disabled(phase: &'static str, root: &Path) -> Self {
        Self {
            disabled: true,
            ..Self::new(phase, root)
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn bytes_before(&self) -> u64 {
        self.written.values().map(|r| r.original_size).sum()
    }

    pub fn bytes_after(&self) -> u64 {
        self.written.values().map(|r| r.transformed_size).sum()
    }

    /// Size table lines, paths shown relative to `base`.
    pub fn size_lines(&self, label: &str, base: &Path, color: bool) -> Vec<String> {
        let names: Vec<String> = self
            .written
            .values()
            .map(|r| display_relative(&r.output_path, base))
            .collect();
        let rows: Vec<SizeRow<'_>> = self
            .written
            .values()
            .zip(&names)
            .map(|(r, name)| SizeRow {
                name,
                before: r.original_size,
                after: r.transformed_size,
            })
            .collect();
        size_table(&rows, label, color)
    }

    /// Fold another report over the same phase into this one.
    ///
    /// Used to present the two image locations as one table.
    pub fn merge(&mut self, other: PhaseReport) {
        self.disabled &= other.disabled;
        self.scanned += other.scanned;
        self.skipped += other.skipped;
        self.written.extend(other.written);
        self.failures.extend(other.failures);
    }
}
