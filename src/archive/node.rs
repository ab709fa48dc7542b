//! In-memory archive tree.

use std::fs;
use std::path::Path;

use rayon::prelude::*;

use super::{ArchiveError, Archiver};

/// One entry destined for the archive.
///
/// Children are sorted by name so the same tree always produces the same
/// entry order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveNode {
    Directory {
        name: String,
        children: Vec<ArchiveNode>,
    },
    File {
        name: String,
        content: Vec<u8>,
    },
}

impl ArchiveNode {
    pub fn name(&self) -> &str {
        match self {
            Self::Directory { name, .. } | Self::File { name, .. } => name,
        }
    }

    /// Mirror `root` as a directory node called `name`.
    ///
    /// `exclude` names one file to leave out, so an archive written inside
    /// the tree never contains itself. Symlinked directories are skipped;
    /// symlinked files are read through.
    pub fn from_dir(root: &Path, name: &str, exclude: Option<&Path>) -> Result<Self, ArchiveError> {
        let mut dirs = Vec::new();
        let mut files = Vec::new();

        let entries = fs::read_dir(root).map_err(|source| ArchiveError::read(root, source))?;
        for entry in entries {
            let entry = entry.map_err(|source| ArchiveError::read(root, source))?;
            let path = entry.path();
            if exclude == Some(path.as_path()) {
                continue;
            }
            let file_type = entry
                .file_type()
                .map_err(|source| ArchiveError::read(&path, source))?;

            if file_type.is_dir() {
                dirs.push(path);
            } else if file_type.is_file() || (file_type.is_symlink() && path.is_file()) {
                files.push(path);
            }
        }

        let mut children = dirs
            .iter()
            .map(|dir| Self::from_dir(dir, &entry_name(dir), exclude))
            .collect::<Result<Vec<_>, _>>()?;

        let file_nodes = files
            .par_iter()
            .map(|path| {
                let content = fs::read(path).map_err(|source| ArchiveError::read(path, source))?;
                Ok(Self::File {
                    name: entry_name(path),
                    content,
                })
            })
            .collect::<Result<Vec<_>, ArchiveError>>()?;

        children.extend(file_nodes);
        children.sort_by(|a, b| a.name().cmp(b.name()));

        Ok(Self::Directory {
            name: name.to_string(),
            children,
        })
    }

    /// Number of files in this subtree.
    pub fn file_count(&self) -> usize {
        match self {
            Self::File { .. } => 1,
            Self::Directory { children, .. } => children.iter().map(Self::file_count).sum(),
        }
    }

    /// Feed this subtree to `archiver`, entry names prefixed by `parent`.
    pub fn emit<A: Archiver>(&self, parent: &str, archiver: &mut A) -> Result<(), ArchiveError> {
        match self {
            Self::Directory { name, children } => {
                let path = format!("{parent}{name}/");
                archiver.add_directory(&path)?;
                for child in children {
                    child.emit(&path, archiver)?;
                }
                Ok(())
            }
            Self::File { name, content } => archiver.add_file(&format!("{parent}{name}"), content),
        }
    }
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
