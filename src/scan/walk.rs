//! Recursive directory scanning.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use jwalk::WalkDir;

/// A discovered file. Produced by [`scan_dir`], never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

/// Collect all files under `root` recursively, sorted by path.
///
/// Symlinks are not followed, so every directory is visited once.
/// A missing or empty root yields an empty list rather than an error;
/// entries whose metadata cannot be read are dropped.
pub fn scan_dir(root: &Path) -> Vec<FileRecord> {
    if !root.exists() {
        return Vec::new();
    }

    let mut records: Vec<_> = WalkDir::new(root)
        .skip_hidden(false)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let meta = e.metadata().ok()?;
            Some(FileRecord {
                path: e.path(),
                size: meta.len(),
                modified: meta.modified().ok()?,
            })
        })
        .collect();

    records.sort_by(|a, b| a.path.cmp(&b.path));
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_missing_root() {
        let dir = TempDir::new().unwrap();
        assert!(scan_dir(&dir.path().join("nope")).is_empty());
    }

    #[test]
    fn test_scan_empty_root() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        assert!(scan_dir(dir.path()).is_empty());
    }

    #[test]
    fn test_scan_nested() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("assets/js")).unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        fs::write(dir.path().join("assets/js/app.js"), "let a = 1;").unwrap();
        fs::write(dir.path().join(".DS_Store"), "junk").unwrap();
        fs::write(dir.path().join(".htaccess"), "deny").unwrap();

        let records = scan_dir(dir.path());
        let names: Vec<_> = records
            .iter()
            .map(|r| r.path.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            names,
            vec![
                PathBuf::from(".DS_Store"),
                PathBuf::from(".htaccess"),
                PathBuf::from("assets/js/app.js"),
                PathBuf::from("index.html"),
            ]
        );
        let app = &records[2];
        assert_eq!(app.size, 10);
    }
}
