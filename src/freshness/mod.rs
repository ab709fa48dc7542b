//! Freshness detection: mtime against the last successful processing time.
//!
//! A file is *stale* when it has to be processed this run. Each phase owns
//! one [`StalenessCache`]; the host decides its lifetime by keeping the phase
//! (or the `Arc` it was built with) alive across runs.

mod cache;

pub use cache::StalenessCache;
