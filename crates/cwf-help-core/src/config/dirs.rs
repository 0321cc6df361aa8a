use directories::ProjectDirs;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::search::INDEX_FILE;

/// Application directories following platform conventions
#[derive(Debug, Clone)]
pub struct Directories {
    /// Config directory (~/.config/cwf-help)
    pub config: PathBuf,

    /// Data directory (~/.local/share/cwf-help)
    pub data: PathBuf,

    /// Config file path
    pub config_file: PathBuf,

    /// Directory holding the search index
    pub index_dir: PathBuf,
}

impl Directories {
    /// Resolve the standard directories for the current user.
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self> {
        let project = ProjectDirs::from("org", "carewebframework", "cwf-help")
            .ok_or_else(|| Error::Config("cannot determine home directory".to_string()))?;

        let config = project.config_dir().to_path_buf();
        let data = project.data_dir().to_path_buf();

        Ok(Self {
            config_file: config.join("config.json"),
            index_dir: data.join("index"),
            config,
            data,
        })
    }

    #[must_use]
    pub fn with_base(base: PathBuf) -> Self {
        Self {
            config_file: base.join("config.json"),
            index_dir: base.join("index"),
            config: base.clone(),
            data: base,
        }
    }

    #[must_use]
    pub fn index_file(&self) -> PathBuf {
        self.index_dir.join(INDEX_FILE)
    }

    /// Ensure all directories exist.
    ///
    /// # Errors
    ///
    /// Returns an error if any directory cannot be created.
    pub fn ensure_exists(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config)?;
        std::fs::create_dir_all(&self.data)?;
        std::fs::create_dir_all(&self.index_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_base_sets_all_paths() {
        let base = PathBuf::from("/tmp/test-cwf-help");
        let dirs = Directories::with_base(base.clone());

        assert_eq!(dirs.config, base);
        assert_eq!(dirs.data, base);
        assert_eq!(dirs.config_file, base.join("config.json"));
        assert_eq!(dirs.index_dir, base.join("index"));
        assert_eq!(dirs.index_file(), base.join("index").join("search-index.json"));
    }

    #[test]
    fn test_ensure_exists_creates_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dirs = Directories::with_base(temp_dir.path().join("nested"));

        assert!(!dirs.index_dir.exists());
        dirs.ensure_exists().unwrap();
        dirs.ensure_exists().unwrap();

        assert!(dirs.config.exists());
        assert!(dirs.index_dir.exists());
    }
}
