//! One scan → filter → staleness → fan-out cycle over a root directory.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::{JobError, PhaseReport, TransformJob, TransformResult};
use crate::freshness::StalenessCache;
use crate::scan::{PathFilter, apply_filter, scan_dir};
use crate::utils::path::display_relative;
use crate::{debug, log};

/// Bounds on a phase's fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseLimits {
    /// Max jobs in flight; 0 means unbounded.
    pub concurrency: usize,
    /// Deadline for each codec call.
    pub deadline: Option<Duration>,
}

impl Default for PhaseLimits {
    fn default() -> Self {
        Self {
            concurrency: 32,
            deadline: None,
        }
    }
}

impl PhaseLimits {
    fn permits(&self) -> usize {
        match self.concurrency {
            0 => Semaphore::MAX_PERMITS,
            n => n,
        }
    }
}

/// A pipeline phase: owns its job, filter and staleness cache.
///
/// The cache is injected so a host can keep it across runs; a phase built
/// with a fresh cache reprocesses everything once.
pub struct PipelinePhase<J> {
    name: &'static str,
    job: Option<Arc<J>>,
    filter: Option<PathFilter>,
    cache: Arc<StalenessCache>,
    limits: PhaseLimits,
}

impl<J: TransformJob> PipelinePhase<J> {
    pub fn new(name: &'static str, job: J, cache: Arc<StalenessCache>) -> Self {
        Self {
            name,
            job: Some(Arc::new(job)),
            filter: None,
            cache,
            limits: PhaseLimits::default(),
        }
    }

    /// A phase that does nothing and reports success.
    pub fn disabled(name: &'static str) -> Self {
        Self {
            name,
            job: None,
            filter: None,
            cache: Arc::default(),
            limits: PhaseLimits::default(),
        }
    }

    pub fn with_filter(mut self, filter: Option<PathFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_limits(mut self, limits: PhaseLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn cache(&self) -> &Arc<StalenessCache> {
        &self.cache
    }

    pub fn label(&self) -> &'static str {
        self.job.as_ref().map_or(self.name, |job| job.label())
    }

    /// Process every stale, filter-accepted file under `root`.
    ///
    /// Per-file failures end up in the report. Only a failure of the phase
    /// machinery itself (the scan task dying) is returned as `Err`.
    pub async fn run(&self, root: &Path) -> Result<PhaseReport> {
        let Some(job) = &self.job else {
            debug!(self.name; "disabled, skipping {}", root.display());
            return Ok(PhaseReport::disabled(self.name, root));
        };

        let mut report = PhaseReport::new(self.name, root);

        let scan_root = root.to_path_buf();
        let records = tokio::task::spawn_blocking(move || scan_dir(&scan_root))
            .await
            .with_context(|| format!("[{}] scanning {} failed", self.name, root.display()))?;
        let candidates = apply_filter(records, self.filter.as_ref());
        report.scanned = candidates.len();

        let threshold = job.threshold();
        let (stale, fresh): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|record| self.cache.is_stale(record, threshold));

        report.skipped = fresh.len();
        for record in &fresh {
            debug!(self.name; "skip {}", display_relative(&record.path, root));
        }

        let semaphore = Arc::new(Semaphore::new(self.limits.permits()));
        let mut tasks = JoinSet::new();
        let mut in_flight = HashMap::new();

        for record in stale {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .context("job semaphore closed")?;
            let job = Arc::clone(job);
            let cache = Arc::clone(&self.cache);
            let deadline = self.limits.deadline;
            let path = record.path.clone();

            let handle = tasks.spawn(async move {
                let path = record.path.clone();
                let outcome = job.run(record, deadline).await;
                if outcome.is_ok() {
                    // output is on disk; only now is the file fresh
                    cache.mark_processed(&path, processed_at(&path).await);
                }
                drop(permit);
                (path, outcome)
            });
            in_flight.insert(handle.id(), path);
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            let (path, outcome): (_, Result<TransformResult, JobError>) = match joined {
                Ok((id, done)) => {
                    in_flight.remove(&id);
                    done
                }
                Err(e) => {
                    let Some(path) = in_flight.remove(&e.id()) else {
                        continue;
                    };
                    (path, Err(JobError::Panicked(self.name)))
                }
            };

            match outcome {
                Ok(result) => {
                    report.written.insert(path, result);
                }
                Err(e) => {
                    let cause = format!("{:#}", anyhow::Error::from(e));
                    log!("error"; "[{}] {}: {}", self.name, display_relative(&path, root), cause);
                    report.failures.push((path, cause));
                }
            }
        }

        report.failures.sort();
        Ok(report)
    }
}

/// Timestamp to record for a freshly written file.
///
/// In-place writes bump the file's own mtime, so take whichever is later to
/// keep the next scan from seeing it as modified.
async fn processed_at(path: &Path) -> SystemTime {
    let now = SystemTime::now();
    match tokio::fs::metadata(path).await.and_then(|m| m.modified()) {
        Ok(modified) => modified.max(now),
        Err(_) => now,
    }
}
