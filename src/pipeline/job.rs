//! Per-file transform jobs and their outcome types.

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::codec::CodecError;
use crate::scan::FileRecord;

/// Sizes before and after one successful transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformResult {
    pub path: PathBuf,
    pub original_size: u64,
    pub transformed_size: u64,
    /// Where the transformed bytes were written. Equal to `path` for
    /// in-place transforms.
    pub output_path: PathBuf,
}

/// Why one file could not be transformed. Never aborts a phase.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("failed to read `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write `{}`", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to remove `{}`", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("{codec} did not finish within {}s", limit.as_secs())]
    Timeout {
        codec: &'static str,
        limit: Duration,
    },

    #[error("{0} worker panicked")]
    Panicked(&'static str),
}

/// One file's worth of work inside a phase.
///
/// Implementations read the file, transform it, write the output and return
/// the sizes. They do not touch the staleness cache; the phase records a
/// success only after `run` returns `Ok`.
pub trait TransformJob: Send + Sync + 'static {
    /// Label for logs and size tables (`gzip`, `image`, ...).
    fn label(&self) -> &'static str;

    /// Files smaller than this are never stale. `None` for no threshold.
    fn threshold(&self) -> Option<u64> {
        None
    }

    fn run(
        &self,
        record: FileRecord,
        deadline: Option<Duration>,
    ) -> impl Future<Output = Result<TransformResult, JobError>> + Send;
}

/// Run a codec call on the blocking pool, optionally bounded by `deadline`.
///
/// On timeout the blocking thread is left to finish on its own; its result
/// is discarded.
pub(crate) async fn run_blocking<T, F>(
    codec: &'static str,
    deadline: Option<Duration>,
    f: F,
) -> Result<T, JobError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, CodecError> + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(f);
    let joined = match deadline {
        Some(limit) => tokio::time::timeout(limit, handle)
            .await
            .map_err(|_| JobError::Timeout { codec, limit })?,
        None => handle.await,
    };
    let output = joined.map_err(|_| JobError::Panicked(codec))?;
    Ok(output?)
}
