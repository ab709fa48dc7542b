//! Precompression job: writes `<file><ext>` next to each original.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::{JobError, TransformJob, TransformResult, run_blocking};
use crate::codec::Codec;
use crate::codec::compress::{Compressor, output_path};
use crate::config::CompressConfig;
use crate::scan::FileRecord;

pub struct CompressJob {
    compressor: Arc<Compressor>,
    extension: String,
    threshold: u64,
    delete_original: bool,
}

impl CompressJob {
    pub fn new(compressor: Compressor, extension: impl Into<String>, threshold: u64) -> Self {
        Self {
            compressor: Arc::new(compressor),
            extension: extension.into(),
            threshold,
            delete_original: false,
        }
    }

    pub fn delete_original(mut self, enabled: bool) -> Self {
        self.delete_original = enabled;
        self
    }

    /// Build from a validated `[compress]` section.
    pub fn from_config(config: &CompressConfig) -> anyhow::Result<Self> {
        let extension = config.extension().ok_or_else(|| {
            anyhow::anyhow!(
                "no output extension configured for `{}`",
                config.algorithm.name()
            )
        })?;
        Ok(Self::new(config.compressor()?, extension, config.threshold)
            .delete_original(config.delete_original))
    }

    async fn compress(
        &self,
        record: &FileRecord,
        deadline: Option<Duration>,
    ) -> Result<TransformResult, JobError> {
        let data = read(&record.path).await?;
        let original_size = data.len() as u64;

        // The source is read fully before it may be deleted; from here on the
        // in-memory copy is the only one.
        if self.delete_original {
            tokio::fs::remove_file(&record.path)
                .await
                .map_err(|source| JobError::Remove {
                    path: record.path.clone(),
                    source,
                })?;
        }

        let backup = self.delete_original.then(|| data.clone());
        let output = output_path(&record.path, &self.extension);
        let written = self.encode_and_write(data, &output, deadline).await;

        match written {
            Ok(transformed_size) => Ok(TransformResult {
                path: record.path.clone(),
                original_size,
                transformed_size,
                output_path: output,
            }),
            Err(e) => {
                // Put a deleted original back rather than lose it.
                if let Some(data) = backup
                    && let Err(restore) = tokio::fs::write(&record.path, &data).await
                {
                    crate::log!("error"; "could not restore {}: {}", record.path.display(), restore);
                }
                Err(e)
            }
        }
    }

    async fn encode_and_write(
        &self,
        data: Vec<u8>,
        output: &Path,
        deadline: Option<Duration>,
    ) -> Result<u64, JobError> {
        let compressor = Arc::clone(&self.compressor);
        let codec = compressor.name();
        let packed = run_blocking(codec, deadline, move || compressor.transform(&data)).await?;

        tokio::fs::write(output, &packed)
            .await
            .map_err(|source| JobError::Write {
                path: output.to_path_buf(),
                source,
            })?;
        Ok(packed.len() as u64)
    }
}

impl TransformJob for CompressJob {
    fn label(&self) -> &'static str {
        self.compressor.name()
    }

    fn threshold(&self) -> Option<u64> {
        Some(self.threshold)
    }

    fn run(
        &self,
        record: FileRecord,
        deadline: Option<Duration>,
    ) -> impl Future<Output = Result<TransformResult, JobError>> + Send {
        async move { self.compress(&record, deadline).await }
    }
}

pub(super) async fn read(path: &Path) -> Result<Vec<u8>, JobError> {
    tokio::fs::read(path).await.map_err(|source| JobError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecOptions;
    use crate::codec::compress::Algorithm;
    use crate::pipeline::PipelinePhase;
    use crate::scan::PathFilter;
    use flate2::read::GzDecoder;
    use std::fs;
    use std::io::Read;
    use tempfile::TempDir;

    fn gzip_job() -> CompressJob {
        let compressor = Compressor::new(Algorithm::Gzip, &CodecOptions::new()).unwrap();
        CompressJob::new(compressor, ".gz", 1025)
    }

    fn js(len: usize) -> String {
        "let x = 1;\n".repeat(len / 11 + 1)[..len].to_string()
    }

    fn gunzip(path: &Path) -> String {
        let mut out = String::new();
        GzDecoder::new(fs::File::open(path).unwrap())
            .read_to_string(&mut out)
            .unwrap();
        out
    }

    #[tokio::test]
    async fn test_threshold_and_sibling() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("app.js"), js(2000)).unwrap();
        fs::write(dir.path().join("tiny.js"), js(500)).unwrap();

        let phase = PipelinePhase::new("compress", gzip_job(), Arc::default())
            .with_filter(Some(PathFilter::pattern(r"\.js$").unwrap()));
        let report = phase.run(dir.path()).await.unwrap();

        assert_eq!(report.written.len(), 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(gunzip(&dir.path().join("app.js.gz")), js(2000));
        assert!(!dir.path().join("tiny.js.gz").exists());
        assert!(dir.path().join("app.js").exists());

        let result = report.written.values().next().unwrap();
        assert_eq!(result.original_size, 2000);
        assert!(result.transformed_size < 2000);
    }

    #[tokio::test]
    async fn test_below_threshold_never_compressed() {
        let dir = TempDir::new().unwrap();
        let small = dir.path().join("small.css");
        fs::write(&small, js(1024)).unwrap();

        let phase = PipelinePhase::new("compress", gzip_job(), Arc::default());
        for _ in 0..2 {
            fs::File::options()
                .write(true)
                .open(&small)
                .unwrap()
                .set_modified(std::time::SystemTime::now() + Duration::from_secs(120))
                .unwrap();
            let report = phase.run(dir.path()).await.unwrap();
            assert!(report.written.is_empty());
        }
        assert!(!dir.path().join("small.css.gz").exists());
        assert!(phase.cache().is_empty());
    }

    #[tokio::test]
    async fn test_delete_original() {
        let dir = TempDir::new().unwrap();
        let app = dir.path().join("app.js");
        fs::write(&app, js(4000)).unwrap();

        let job = gzip_job().delete_original(true);
        let record = crate::scan::scan_dir(dir.path()).remove(0);
        let result = job.run(record, None).await.unwrap();

        assert!(!app.exists());
        assert_eq!(result.output_path, dir.path().join("app.js.gz"));
        assert_eq!(gunzip(&result.output_path), js(4000));
    }

    #[tokio::test]
    async fn test_failed_write_restores_original() {
        let dir = TempDir::new().unwrap();
        let app = dir.path().join("app.js");
        fs::write(&app, js(4000)).unwrap();
        // a directory where the output file should go makes the write fail
        fs::create_dir(dir.path().join("app.js.gz")).unwrap();

        let job = gzip_job().delete_original(true);
        let record = crate::scan::scan_dir(dir.path()).remove(0);
        let err = job.run(record, None).await.unwrap_err();

        assert!(matches!(err, JobError::Write { .. }));
        assert_eq!(fs::read_to_string(&app).unwrap(), js(4000));
    }

    #[tokio::test]
    async fn test_custom_extension_with_brotli() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), js(3000)).unwrap();

        let compressor = Compressor::new(Algorithm::Brotli, &CodecOptions::new()).unwrap();
        let phase = PipelinePhase::new("compress", CompressJob::new(compressor, ".brotli", 0), Arc::default());
        let report = phase.run(dir.path()).await.unwrap();
        assert_eq!(report.written.len(), 1);

        let packed = fs::read(dir.path().join("index.html.brotli")).unwrap();
        let mut out = String::new();
        brotli::Decompressor::new(packed.as_slice(), 4096)
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, js(3000));
    }
}
