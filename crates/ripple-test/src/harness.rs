//! Test harness helpers: log capture and config sandboxes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

/// Route `tracing` output through the test writer.
///
/// Safe to call from every test; only the first call installs a subscriber.
/// `RUST_LOG` takes precedence over `default_filter`.
pub fn setup_test_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Temporary home and workspace directories for config loading tests.
///
/// Both directories are removed when the sandbox is dropped.
#[derive(Debug)]
pub struct ConfigSandbox {
    home: TempDir,
    workspace: TempDir,
}

impl ConfigSandbox {
    /// Create empty home and workspace directories.
    ///
    /// # Errors
    ///
    /// Returns an error if a temporary directory cannot be created.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            home: TempDir::new()?,
            workspace: TempDir::new()?,
        })
    }

    /// Directory to pass as the config home override.
    #[must_use]
    pub fn home(&self) -> &Path {
        self.home.path()
    }

    /// Workspace root directory.
    #[must_use]
    pub fn workspace(&self) -> &Path {
        self.workspace.path()
    }

    /// Write the user-level `config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_user(&self, content: &str) -> io::Result<PathBuf> {
        write_config(self.home.path(), content)
    }

    /// Write the workspace-level `.ripple/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_workspace(&self, content: &str) -> io::Result<PathBuf> {
        write_config(&self.workspace.path().join(".ripple"), content)
    }
}

fn write_config(dir: &Path, content: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join("config.toml");
    fs::write(&path, content)?;
    Ok(path)
}
