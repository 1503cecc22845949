//! OS directory resolution for the config file and logs.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while resolving or creating platform directories.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The OS did not provide a configuration directory.
    #[error("could not determine OS configuration directory")]
    NoConfigDir,
    /// Directory creation failed.
    #[error("platform I/O error: {0}")]
    Io(#[from] io::Error),
}

const APP_NAME: &str = "haunted-house";

/// Per-user directories of the viewer.
///
/// Follows OS conventions (XDG on Linux, Known Folders on Windows, Library on
/// macOS).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDirs {
    /// Holds `config.ron`.
    pub config_dir: PathBuf,
    /// Debug-build log files.
    pub log_dir: PathBuf,
}

impl PlatformDirs {
    /// Resolve the directories without creating them.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::NoConfigDir`] if the OS does not expose a
    /// configuration directory.
    pub fn resolve() -> Result<Self, PlatformError> {
        let config_base = dirs::config_dir().ok_or(PlatformError::NoConfigDir)?;
        let log_base = dirs::data_local_dir().unwrap_or_else(|| config_base.clone());
        Ok(Self {
            config_dir: config_base.join(APP_NAME),
            log_dir: log_base.join(APP_NAME).join("logs"),
        })
    }

    /// Root both directories under `root`, keeping the config directory
    /// exactly as given.
    pub fn with_config_dir(root: &Path) -> Self {
        Self {
            config_dir: root.to_path_buf(),
            log_dir: root.join("logs"),
        }
    }

    /// Create both directories on disk.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Io`] if a directory cannot be created.
    pub fn create_all(&self) -> Result<(), PlatformError> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_uses_app_name() {
        // Headless CI may have no config dir at all.
        if let Ok(dirs) = PlatformDirs::resolve() {
            assert!(dirs.config_dir.ends_with(APP_NAME));
            assert!(dirs.log_dir.ends_with("logs"));
        }
    }

    #[test]
    fn test_custom_root_and_create() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("custom");
        let dirs = PlatformDirs::with_config_dir(&root);
        assert_eq!(dirs.config_dir, root);
        assert!(!dirs.log_dir.exists());

        dirs.create_all().unwrap();
        assert!(dirs.config_dir.is_dir());
        assert!(dirs.log_dir.is_dir());
        // A second call is a no-op.
        dirs.create_all().unwrap();
    }

    #[test]
    fn test_io_error_converts() {
        let err: PlatformError = io::Error::other("disk full").into();
        assert!(err.to_string().contains("disk full"));
    }
}
