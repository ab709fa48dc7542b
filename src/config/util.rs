//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find config file by searching upward from current directory
///
/// Starts from cwd and walks up parent directories until finding `config_name`
/// Returns the absolute path to the config file if found
///
/// # Example
/// ```text
/// /home/user/app/dist/assets/    ← cwd
/// /home/user/app/postpack.toml   ← found!
/// ```
pub fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_file_from(&cwd, config_name)
}

fn find_config_file_from(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.is_file() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => return None, // Reached filesystem root
        }
    }
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_upward() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("dist/assets/js");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("postpack-test.toml"), "").unwrap();

        let found = find_config_file_from(&nested, Path::new("postpack-test.toml")).unwrap();
        assert_eq!(found, dir.path().join("postpack-test.toml"));
    }

    #[test]
    fn test_find_config_absolute() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        assert!(find_config_file_from(dir.path(), &path).is_none());

        fs::write(&path, "").unwrap();
        assert_eq!(find_config_file_from(Path::new("/"), &path), Some(path));
    }

    #[test]
    fn test_directory_is_not_config() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("weird.toml")).unwrap();
        let nested = dir.path().join("a");
        fs::create_dir(&nested).unwrap();
        // may still find one further up on a dev machine, but never the dir
        let found = find_config_file_from(&nested, Path::new("weird.toml"));
        assert_ne!(found, Some(dir.path().join("weird.toml")));
    }
}
