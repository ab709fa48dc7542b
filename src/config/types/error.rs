//! Configuration errors and collected validation diagnostics.

use super::FieldPath;
use owo_colors::OwoColorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in config file")]
    Toml(#[from] toml::de::Error),

    #[error("config file `{}` not found", .0.display())]
    NotFound(PathBuf),

    // No #[from]: source() would print the diagnostics twice
    #[error("{0}")]
    Diagnostics(ConfigDiagnostics),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// One finding from validation.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub field: FieldPath,
    pub message: String,
    pub hint: Option<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = self.field.as_str();
        match self.severity {
            Severity::Error => write!(f, "{} {}", field.cyan(), self.message)?,
            Severity::Warning => write!(f, "{} {}", field.yellow(), self.message)?,
        }
        if let Some(hint) = &self.hint {
            write!(f, "\n    {} {hint}", "hint:".dimmed())?;
        }
        Ok(())
    }
}

/// Everything validation found, in the order sections were checked.
///
/// Warnings never fail a load; any error does.
#[derive(Debug, Default)]
pub struct ConfigDiagnostics {
    items: Vec<Diagnostic>,
}

impl ConfigDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, severity: Severity, field: FieldPath, message: String, hint: Option<String>) {
        self.items.push(Diagnostic {
            severity,
            field,
            message,
            hint,
        });
    }

    pub fn error(&mut self, field: FieldPath, message: impl Into<String>) {
        self.push(Severity::Error, field, message.into(), None);
    }

    pub fn error_with_hint(
        &mut self,
        field: FieldPath,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) {
        self.push(Severity::Error, field, message.into(), Some(hint.into()));
    }

    pub fn warn(&mut self, field: FieldPath, message: impl Into<String>) {
        self.push(Severity::Warning, field, message.into(), None);
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.severity == Severity::Warning)
    }

    /// Number of errors.
    pub fn len(&self) -> usize {
        self.errors().count()
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn print_warnings(&self) {
        let mut warnings = self.warnings().peekable();
        if warnings.peek().is_none() {
            return;
        }
        crate::log!("warning"; "questionable config values:");
        for warning in warnings {
            eprintln!("- {warning}");
        }
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.has_errors() { Err(self) } else { Ok(()) }
    }
}

impl fmt::Display for ConfigDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.len();
        write!(f, "{}", "invalid configuration".red().bold())?;
        if count > 1 {
            write!(f, " ({count} errors)")?;
        }
        for error in self.errors() {
            write!(f, "\n  {} {error}", "-".red())?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigDiagnostics {}
