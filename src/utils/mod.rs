//! Shared helpers.
//!
//! - [`exec`]: external command execution with stdin piping
//! - [`path`]: path normalization against the project root
//! - [`plural`]: count formatting for log lines

pub mod exec;
pub mod path;
pub mod plural;
