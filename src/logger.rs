//! Logging utilities with colored output.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `debug!` macro for output only shown with `--verbose`
//! - `size_table` for the per-file size summary printed after a phase
//!
//! # Example
//!
//! ```ignore
//! log!("compress"; "{} files written", count);
//! debug!("image"; "fresh, skipping {}", path.display());
//! ```

use crossterm::{
    execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use std::{
    io::{Write, stdout},
    sync::atomic::{AtomicBool, Ordering},
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
#[inline]
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);

    let mut stdout = stdout().lock();
    execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    match module_lower {
        "compress" => prefix.bright_cyan().bold().to_string(),
        "image" => prefix.bright_magenta().bold().to_string(),
        "archive" => prefix.bright_blue().bold().to_string(),
        "done" => prefix.bright_green().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Size Table
// ============================================================================

/// One row of a size table.
pub struct SizeRow<'a> {
    pub name: &'a str,
    pub before: u64,
    pub after: u64,
}

/// Render size rows as aligned lines:
///
/// ```text
/// dist/assets/app.js    12.40kb / gzip: 3.10kb   75.00%
/// ```
///
/// `label` names the transform (`gzip`, `tiny`, ...). Rows are returned
/// uncolored when `color` is false, which keeps them testable.
pub fn size_table(rows: &[SizeRow<'_>], label: &str, color: bool) -> Vec<String> {
    let width = rows.iter().map(|r| r.name.len()).max().unwrap_or(0);

    rows.iter()
        .map(|row| {
            let pad = " ".repeat(2 + width - row.name.len());
            let sizes = format!(
                "{:.2}kb / {label}: {:.2}kb",
                kb(row.before),
                kb(row.after)
            );
            let ratio = format!("{:.2}%", saved_percent(row.before, row.after));
            if color {
                format!(
                    "{}{pad}{}  {}",
                    row.name.bright_blue(),
                    sizes.dimmed(),
                    if row.after <= row.before {
                        ratio.green().to_string()
                    } else {
                        ratio.red().to_string()
                    }
                )
            } else {
                format!("{}{pad}{sizes}  {ratio}", row.name)
            }
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
pub fn kb(bytes: u64) -> f64 {
    bytes as f64 / 1024.0
}

/// Percentage of bytes saved; negative when the output grew.
#[allow(clippy::cast_precision_loss)]
pub fn saved_percent(before: u64, after: u64) -> f64 {
    if before == 0 {
        return 0.0;
    }
    (1.0 - after as f64 / before as f64) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saved_percent() {
        assert!((saved_percent(2000, 500) - 75.0).abs() < f64::EPSILON);
        assert!((saved_percent(0, 10)).abs() < f64::EPSILON);
        assert!(saved_percent(100, 150) < 0.0);
    }

    #[test]
    fn test_size_table_alignment() {
        let rows = [
            SizeRow {
                name: "dist/app.js",
                before: 2048,
                after: 512,
            },
            SizeRow {
                name: "dist/a.css",
                before: 1024,
                after: 1024,
            },
        ];
        let lines = size_table(&rows, "gzip", false);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "dist/app.js  2.00kb / gzip: 0.50kb  75.00%");
        assert_eq!(lines[1], "dist/a.css   1.00kb / gzip: 1.00kb  0.00%");
    }
}
