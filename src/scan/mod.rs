//! File discovery for pipeline phases.
//!
//! - [`walk`]: recursive directory scan into [`FileRecord`]s (pure, read-only)
//! - [`filter`]: [`PathFilter`] deciding which records take part in a phase
//!
//! Filtering runs after scanning, so scan cost does not depend on how
//! selective the filter is.

mod filter;
mod walk;

pub use filter::{PathFilter, apply_filter};
pub use walk::{FileRecord, scan_dir};
