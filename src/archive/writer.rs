//! Zip container backend.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use super::{ArchiveError, Archiver};

/// Writes a deflate-compressed zip into memory.
///
/// Every entry carries the same 1980-01-01 timestamp, so archiving an
/// unchanged tree twice yields identical bytes.
pub struct ZipArchiver {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
}

impl ZipArchiver {
    pub fn new() -> Result<Self, ArchiveError> {
        let fixed_time = DateTime::from_date_and_time(1980, 1, 1, 0, 0, 0)
            .map_err(|_| ArchiveError::Container("failed to build fixed timestamp".into()))?;

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(9))
            .last_modified_time(fixed_time);

        Ok(Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            options,
        })
    }
}

impl Archiver for ZipArchiver {
    fn add_directory(&mut self, path: &str) -> Result<(), ArchiveError> {
        self.writer.add_directory(path, self.options)?;
        Ok(())
    }

    fn add_file(&mut self, path: &str, content: &[u8]) -> Result<(), ArchiveError> {
        self.writer.start_file(path, self.options)?;
        self.writer
            .write_all(content)
            .map_err(|e| ArchiveError::Container(format!("writing `{path}`: {e}")))?;
        Ok(())
    }

    fn finalize(self) -> Result<Vec<u8>, ArchiveError> {
        Ok(self.writer.finish()?.into_inner())
    }
}
