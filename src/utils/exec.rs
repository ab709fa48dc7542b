//! External command execution.
//!
//! Provides a builder for running codec binaries that read their input on
//! stdin and write the result to stdout.
//!
//! # Examples
//!
//! ```ignore
//! use crate::utils::exec::Cmd;
//!
//! let output = Cmd::new("jpegtran")
//!     .args(["-copy", "none", "-optimize"])
//!     .stdin(jpeg_bytes)
//!     .run()?;
//! ```

use anyhow::{Context, Result, anyhow};
use std::{
    ffi::{OsStr, OsString},
    io::Write,
    process::{Command, Output, Stdio},
};

/// Command builder for external process execution.
#[derive(Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    stdin_data: Option<Vec<u8>>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Add a single argument. Empty arguments are dropped.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    /// Set stdin data to pipe to the process.
    pub fn stdin<D: AsRef<[u8]>>(mut self, data: D) -> Self {
        self.stdin_data = Some(data.as_ref().to_vec());
        self
    }

    /// Get the program name for error messages.
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    /// Execute the command and return its output.
    ///
    /// Stdin is fed from a separate thread so a child that starts writing
    /// before it has read all input cannot deadlock on a full pipe.
    pub fn run(self) -> Result<Output> {
        let name = self.program_name();

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn `{name}`"))?;

        let writer = match (child.stdin.take(), self.stdin_data) {
            (Some(mut stdin), Some(data)) => Some(std::thread::spawn(move || stdin.write_all(&data))),
            _ => None,
        };

        let output = child
            .wait_with_output()
            .with_context(|| format!("Failed to wait for `{name}`"))?;

        if !output.status.success() {
            anyhow::bail!(format_error(&name, &output));
        }

        if let Some(writer) = writer {
            writer
                .join()
                .map_err(|_| anyhow!("stdin writer for `{name}` panicked"))?
                .with_context(|| format!("Failed to write stdin to `{name}`"))?;
        }

        Ok(output)
    }
}

/// Format error message for failed command.
fn format_error(name: &str, output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let detail = stderr.trim();
    if detail.is_empty() {
        format!("`{name}` exited with {}", output.status)
    } else {
        format!("`{name}` exited with {}: {detail}", output.status)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_stdin_roundtrip() {
        let output = Cmd::new("cat").stdin(b"hello").run().unwrap();
        assert_eq!(output.stdout, b"hello");
    }

    #[test]
    fn test_missing_program() {
        let err = Cmd::new("postpack-no-such-binary").run().unwrap_err();
        assert!(format!("{err:#}").contains("postpack-no-such-binary"));
    }

    #[test]
    fn test_failing_program() {
        let err = Cmd::new("sh").args(["-c", "echo bad >&2; exit 3"]).run().unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("bad"));
    }
}
