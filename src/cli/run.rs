//! Command execution and result reporting.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use super::Commands;
use crate::archive::ArchiveSummary;
use crate::config::PostpackConfig;
use crate::log;
use crate::logger::kb;
use crate::pipeline::{Orchestrator, PhaseReport};
use crate::utils::path::display_relative;
use crate::utils::plural::plural_count;

/// Run `command` against `config` on a fresh tokio runtime.
///
/// Per-file failures are logged and counted; only structural failures
/// (unreadable output root, archive write errors) return `Err`.
pub fn run_command(config: &PostpackConfig, command: &Commands, color: bool) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let orchestrator = Orchestrator::from_config(config)?;
    let started = Instant::now();
    let printer = Printer { config, color };

    runtime.block_on(async {
        match command {
            Commands::Run => {
                let summary = orchestrator.run().await?;
                printer.phase(&summary.compress, orchestrator.compress_label());
                printer.phase(&summary.images, orchestrator.image_label());
                printer.archive(summary.archive.as_ref());
            }
            Commands::Compress { .. } => {
                let report = orchestrator.run_compress().await?;
                printer.phase(&report, orchestrator.compress_label());
            }
            Commands::Images => {
                let report = orchestrator.run_images().await?;
                printer.phase(&report, orchestrator.image_label());
            }
            Commands::Archive { .. } => {
                let summary = orchestrator.run_archive().await?;
                printer.archive(summary.as_ref());
            }
        }
        anyhow::Ok(())
    })?;

    log!("done"; "in {:.2?}", started.elapsed());
    Ok(())
}

struct Printer<'a> {
    config: &'a PostpackConfig,
    color: bool,
}

impl Printer<'_> {
    fn phase(&self, report: &PhaseReport, label: &str) {
        if report.disabled {
            return;
        }

        let verbose = match report.phase {
            "compress" => self.config.compress.verbose,
            _ => self.config.image.verbose,
        };
        if verbose {
            for line in report.size_lines(label, self.config.get_root(), self.color) {
                log!(report.phase; "{}", line);
            }
        }

        log!(
            report.phase;
            "{} written ({:.2}kb -> {:.2}kb), {} fresh",
            plural_count(report.written.len(), "file"),
            kb(report.bytes_before()),
            kb(report.bytes_after()),
            report.skipped
        );
        if !report.is_clean() {
            log!(
                "error";
                "{}: {} failed, see above",
                report.phase,
                plural_count(report.failures.len(), "file")
            );
        }
    }

    fn archive(&self, summary: Option<&ArchiveSummary>) {
        let Some(summary) = summary else {
            return;
        };
        log!(
            "archive";
            "{} ({}, {:.2}kb)",
            self.relative(&summary.path),
            plural_count(summary.files, "file"),
            kb(summary.bytes)
        );
    }

    fn relative(&self, path: &Path) -> String {
        display_relative(path, self.config.get_root())
    }
}

