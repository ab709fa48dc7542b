//! Phase wiring and run ordering.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use super::{CompressJob, ImageJob, PhaseLimits, PhaseReport, PipelinePhase};
use crate::archive::{ArchiveBuilder, ArchiveSummary};
use crate::codec::image::Stage;
use crate::config::PostpackConfig;
use crate::debug;
use crate::freshness::StalenessCache;

/// Everything one run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub compress: PhaseReport,
    /// Both image locations, merged.
    pub images: PhaseReport,
    /// `None` when archiving is disabled.
    pub archive: Option<ArchiveSummary>,
}

/// Owns the phases of one project.
///
/// Every phase keeps its own [`StalenessCache`]; keep the orchestrator
/// alive to make later runs incremental.
pub struct Orchestrator {
    output: PathBuf,
    /// `None` when the public directory gets no pass of its own.
    public: Option<PathBuf>,
    compress: PipelinePhase<CompressJob>,
    output_images: PipelinePhase<ImageJob>,
    public_images: PipelinePhase<ImageJob>,
    archive: Option<ArchiveBuilder>,
}

impl Orchestrator {
    /// Build from a loaded and validated configuration.
    pub fn from_config(config: &PostpackConfig) -> Result<Self> {
        let limits = PhaseLimits {
            concurrency: config.run.concurrency,
            deadline: config.run.deadline(),
        };

        let compress = if config.compress.disable {
            PipelinePhase::disabled("compress")
        } else {
            PipelinePhase::new(
                "compress",
                CompressJob::from_config(&config.compress)?,
                Arc::new(StalenessCache::new()),
            )
            .with_filter(Some(config.compress.path_filter()?))
            .with_limits(limits)
        };

        let public = config
            .paths
            .public_images_root(config.get_root())
            .map(Path::to_path_buf);

        let chain = if config.image.disable {
            None
        } else {
            Some(config.image.chain()?).filter(|chain| !chain.is_empty())
        };
        let (output_images, public_images) = match chain {
            None => (
                PipelinePhase::disabled("image"),
                PipelinePhase::disabled("image"),
            ),
            Some(chain) => {
                let stages: Vec<_> = chain.stages().map(Stage::name).collect();
                debug!("image"; "stages: {}", stages.join(", "));
                let job = ImageJob::new(chain);
                let phase = |job: ImageJob| -> Result<PipelinePhase<ImageJob>> {
                    Ok(
                        PipelinePhase::new("image", job, Arc::new(StalenessCache::new()))
                            .with_filter(Some(config.image.path_filter()?))
                            .with_limits(limits),
                    )
                };
                let public_phase = match public {
                    Some(_) => phase(job.clone())?,
                    None => PipelinePhase::disabled("image"),
                };
                (phase(job)?, public_phase)
            }
        };

        let archive = (!config.archive.disable).then(|| {
            ArchiveBuilder::for_project(
                config.get_root(),
                &config.paths.output,
                &config.archive_target(),
            )
        });

        Ok(Self {
            output: config.paths.output.clone(),
            public,
            compress,
            output_images,
            public_images,
            archive,
        })
    }

    /// Compression and images concurrently, then the archive.
    ///
    /// The archive is built only after both phases have settled. A
    /// structural failure in either phase aborts the run before archiving.
    pub async fn run(&self) -> Result<RunSummary> {
        let (compress, images) = tokio::join!(self.run_compress(), self.run_images());
        let compress = compress?;
        let images = images?;
        let archive = self.run_archive().await?;

        Ok(RunSummary {
            compress,
            images,
            archive,
        })
    }

    pub async fn run_compress(&self) -> Result<PhaseReport> {
        self.compress.run(&self.output).await
    }

    /// Image phase over the output and public roots, reported as one.
    pub async fn run_images(&self) -> Result<PhaseReport> {
        let Some(public_root) = &self.public else {
            return self.output_images.run(&self.output).await;
        };
        let (output, public) = tokio::join!(
            self.output_images.run(&self.output),
            self.public_images.run(public_root)
        );
        let mut report = output?;
        report.merge(public?);
        Ok(report)
    }

    pub async fn run_archive(&self) -> Result<Option<ArchiveSummary>> {
        let Some(builder) = self.archive.clone() else {
            debug!("archive"; "disabled, skipping");
            return Ok(None);
        };

        let summary = tokio::task::spawn_blocking(move || builder.build())
            .await
            .context("archive task panicked")??;
        Ok(Some(summary))
    }

    pub fn compress_label(&self) -> &'static str {
        self.compress.label()
    }

    pub fn image_label(&self) -> &'static str {
        self.output_images.label()
    }
}
