//! Path filters.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use regex::Regex;

use super::FileRecord;

/// Decides whether a discovered file participates in a phase.
///
/// Exactly one variant is active per filter value. The pattern is compiled
/// once when the filter is built, never per file.
#[derive(Clone)]
pub enum PathFilter {
    /// Regex tested against the full path string.
    Pattern(Regex),
    /// Arbitrary predicate over the path.
    Predicate(Arc<dyn Fn(&Path) -> bool + Send + Sync>),
}

impl PathFilter {
    /// Compile a pattern filter.
    pub fn pattern(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Self::Pattern)
    }

    /// Wrap a predicate.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Path) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }

    pub fn matches(&self, path: &Path) -> bool {
        match self {
            Self::Pattern(re) => re.is_match(&path.to_string_lossy()),
            Self::Predicate(f) => f(path),
        }
    }
}

impl fmt::Debug for PathFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Keep the records accepted by `filter`. No filter accepts everything.
pub fn apply_filter(records: Vec<FileRecord>, filter: Option<&PathFilter>) -> Vec<FileRecord> {
    match filter {
        Some(filter) => records
            .into_iter()
            .filter(|r| filter.matches(&r.path))
            .collect(),
        None => records,
    }
}
