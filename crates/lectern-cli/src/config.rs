//! Path resolution for the CLI's index database.
//!
//! The data directory is resolved in precedence order:
//! 1. `--data-dir` flag
//! 2. `$LECTERN_DATA_DIR` environment variable
//! 3. Platform standard data directory

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Database file name
const DATABASE_FILENAME: &str = "lectern.redb";

/// Environment variable overriding the data directory
const DATA_DIR_ENV: &str = "LECTERN_DATA_DIR";

/// Returns the data directory, creating it when missing.
pub fn get_data_dir(custom_dir: Option<&PathBuf>) -> Result<PathBuf> {
    let dir = if let Some(dir) = custom_dir {
        dir.clone()
    } else if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        PathBuf::from(dir)
    } else {
        ProjectDirs::from("", "", "lectern")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| anyhow!("Could not determine data directory"))?
    };

    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;
    Ok(dir)
}

/// Returns the path to the database file.
pub fn database_path(custom_dir: Option<&PathBuf>) -> Result<PathBuf> {
    Ok(get_data_dir(custom_dir)?.join(DATABASE_FILENAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn custom_data_dir_wins() {
        let dir = TempDir::new().unwrap();
        let custom = dir.path().join("store");
        let resolved = get_data_dir(Some(&custom)).unwrap();
        assert_eq!(resolved, custom);
        assert!(custom.is_dir());
    }

    #[test]
    fn database_path_appends_the_filename() {
        let dir = TempDir::new().unwrap();
        let custom = dir.path().to_path_buf();
        let path = database_path(Some(&custom)).unwrap();
        assert_eq!(path, custom.join("lectern.redb"));
    }
}
