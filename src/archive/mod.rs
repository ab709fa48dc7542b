//! Output tree archival.
//!
//! ```text
//! dist/                       dist.zip
//! ├── index.html      ──►     dist/
//! └── assets/                 dist/assets/
//!     └── app.js              dist/assets/app.js
//!                             dist/index.html
//! ```
//!
//! The tree is read into an [`ArchiveNode`] first, then fed to an
//! [`Archiver`]. The finished bytes are staged in a temporary file next to
//! the destination and renamed over it, so an existing archive is only
//! replaced by a complete one.

mod node;
mod writer;

pub use node::ArchiveNode;
pub use writer::ZipArchiver;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

/// Container backend: receives entries in order, then produces the bytes.
pub trait Archiver {
    /// Add a directory entry. `path` ends with `/`.
    fn add_directory(&mut self, path: &str) -> Result<(), ArchiveError>;

    fn add_file(&mut self, path: &str, content: &[u8]) -> Result<(), ArchiveError>;

    fn finalize(self) -> Result<Vec<u8>, ArchiveError>;
}

/// Archival failures. All of them abort the archive phase.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("output directory `{}` does not exist", .0.display())]
    MissingRoot(PathBuf),

    #[error("output path `{}` is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("cannot resolve `{}`", path.display())]
    Unresolvable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("zip: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("archive: {0}")]
    Container(String),

    #[error("failed to write archive `{}`", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ArchiveError {
    pub(crate) fn read(path: &Path, source: io::Error) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    fn write(path: &Path, source: io::Error) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// What a successful build wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub path: PathBuf,
    pub files: usize,
    pub bytes: u64,
}

/// Archives one output directory as `<target>/...` into a zip file.
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    output_root: PathBuf,
    target: String,
    destination: PathBuf,
}

impl ArchiveBuilder {
    pub fn new(output_root: impl Into<PathBuf>, target: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            target: target.into(),
            destination: destination.into(),
        }
    }

    /// Destination `<project_root>/<target>.zip`.
    pub fn for_project(project_root: &Path, output_root: &Path, target: &str) -> Self {
        Self::new(
            output_root,
            target,
            project_root.join(format!("{target}.zip")),
        )
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Build the archive and move it into place.
    ///
    /// Blocking; call from `spawn_blocking` in async code.
    pub fn build(&self) -> Result<ArchiveSummary, ArchiveError> {
        let root = self.resolve_root()?;
        let staging_dir = self
            .destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let destination = staging_dir
            .canonicalize()
            .map_err(|source| ArchiveError::Unresolvable {
                path: staging_dir.to_path_buf(),
                source,
            })?
            .join(self.destination.file_name().unwrap_or_default());

        let tree = ArchiveNode::from_dir(&root, &self.target, Some(&destination))?;
        let files = tree.file_count();

        let mut archiver = ZipArchiver::new()?;
        tree.emit("", &mut archiver)?;
        drop(tree);
        let bytes = archiver.finalize()?;

        let mut staged = NamedTempFile::new_in(staging_dir)
            .map_err(|source| ArchiveError::write(&destination, source))?;
        staged
            .write_all(&bytes)
            .and_then(|()| staged.as_file().sync_all())
            .map_err(|source| ArchiveError::write(&destination, source))?;
        staged
            .persist(&destination)
            .map_err(|e| ArchiveError::write(&destination, e.error))?;

        Ok(ArchiveSummary {
            path: destination,
            files,
            bytes: bytes.len() as u64,
        })
    }

    fn resolve_root(&self) -> Result<PathBuf, ArchiveError> {
        let root = self.output_root.canonicalize().map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ArchiveError::MissingRoot(self.output_root.clone())
            } else {
                ArchiveError::Unresolvable {
                    path: self.output_root.clone(),
                    source,
                }
            }
        })?;
        if !root.is_dir() {
            return Err(ArchiveError::NotADirectory(root));
        }
        Ok(root)
    }
}
