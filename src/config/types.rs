/// Core types shared across the teardown pipeline
use crate::kernel::fs::RemoveError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directories torn down by a single run.
/// Immutable for the duration of one `Step::run`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeardownTarget {
    /// Persistent runtime state; may itself be a separately mounted volume
    pub data_dir: PathBuf,
    /// Transient runtime state (sockets, pid files)
    pub run_dir: PathBuf,
    /// Kubelet root, whose mounts are always owned by the runtime
    pub kubelet_dir: PathBuf,
}

impl TeardownTarget {
    /// Target with the kubelet root at `<data_dir>/kubelet`.
    pub fn new(data_dir: impl Into<PathBuf>, run_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let kubelet_dir = data_dir.join("kubelet");
        Self {
            data_dir,
            run_dir: run_dir.into(),
            kubelet_dir,
        }
    }

    pub fn with_kubelet_dir(mut self, kubelet_dir: impl Into<PathBuf>) -> Self {
        self.kubelet_dir = kubelet_dir.into();
        self
    }
}

/// Which of the two top-level directories an erase failure concerns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EraseTarget {
    /// Data dir that is not a mount point of its own
    DataDir,
    /// Contents of a data dir that is a mount point
    MountedDataDir,
    RunDir,
}

impl EraseTarget {
    fn describe(&self) -> &'static str {
        match self {
            EraseTarget::DataDir => "generated data-dir",
            EraseTarget::MountedDataDir => "contents of mounted data-dir",
            EraseTarget::RunDir => "generated run-dir",
        }
    }
}

impl std::fmt::Display for EraseTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.describe())
    }
}

/// Custom error types for node teardown
#[derive(Error, Debug)]
pub enum TeardownError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The mount table could not be read or parsed
    #[error("failed to list mounts: {0}")]
    Enumeration(String),

    /// Both the normal and the lazy unmount of an owned mount failed
    #[error("failed unmount {}: {source}", path.display())]
    Unmount {
        path: PathBuf,
        source: nix::errno::Errno,
    },

    /// Recursive deletion failed in a way that is not tolerated
    #[error("failed to delete {target} ({}): {source}", path.display())]
    Erase {
        target: EraseTarget,
        path: PathBuf,
        source: RemoveError,
    },
}

impl TeardownError {
    /// Path the error is about, when it concerns a single path.
    pub fn path(&self) -> Option<&Path> {
        match self {
            TeardownError::Unmount { path, .. } | TeardownError::Erase { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Result type alias for teardown operations
pub type Result<T> = std::result::Result<T, TeardownError>;
