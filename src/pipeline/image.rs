//! Image job: runs the optimizer chain and rewrites the file in place.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::compress::read;
use super::{JobError, TransformJob, TransformResult, run_blocking};
use crate::codec::image::{ImageChain, ImageFormat};
use crate::scan::FileRecord;

/// Shared by both image locations; each location still gets its own phase
/// and cache.
#[derive(Clone)]
pub struct ImageJob {
    chain: Arc<ImageChain>,
}

impl ImageJob {
    pub fn new(chain: ImageChain) -> Self {
        Self {
            chain: Arc::new(chain),
        }
    }

    async fn optimize(
        &self,
        record: &FileRecord,
        deadline: Option<Duration>,
    ) -> Result<TransformResult, JobError> {
        let data = read(&record.path).await?;
        let original_size = data.len() as u64;

        // Nothing in the chain understands this file: leave it untouched.
        let Some(format) = ImageFormat::from_path(&record.path)
            .filter(|format| self.chain.handles(*format))
        else {
            return Ok(TransformResult {
                path: record.path.clone(),
                original_size,
                transformed_size: original_size,
                output_path: record.path.clone(),
            });
        };

        let chain = Arc::clone(&self.chain);
        let (optimized, _) =
            run_blocking("image", deadline, move || chain.apply(format, data)).await?;

        tokio::fs::write(&record.path, &optimized)
            .await
            .map_err(|source| JobError::Write {
                path: record.path.clone(),
                source,
            })?;

        Ok(TransformResult {
            path: record.path.clone(),
            original_size,
            transformed_size: optimized.len() as u64,
            output_path: record.path.clone(),
        })
    }
}

impl TransformJob for ImageJob {
    fn label(&self) -> &'static str {
        "tiny"
    }

    fn run(
        &self,
        record: FileRecord,
        deadline: Option<Duration>,
    ) -> impl Future<Output = Result<TransformResult, JobError>> + Send {
        async move { self.optimize(&record, deadline).await }
    }
}
