/// Configuration loading from a JSON file with CLI overrides
use crate::config::types::{TeardownError, TeardownTarget, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_DIR: &str = "/var/lib/k0s";
pub const DEFAULT_RUN_DIR: &str = "/run/k0s";

/// Teardown configuration as read from disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeardownConfig {
    pub data_dir: PathBuf,
    pub run_dir: PathBuf,
    /// Kubelet root; `<data_dir>/kubelet` when unset
    pub kubelet_dir: Option<PathBuf>,
}

impl Default for TeardownConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            run_dir: PathBuf::from(DEFAULT_RUN_DIR),
            kubelet_dir: None,
        }
    }
}

impl TeardownConfig {
    /// Load configuration from a JSON file. Missing fields take their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TeardownError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        serde_json::from_str(&content)
            .map_err(|e| TeardownError::Config(format!("Failed to parse config JSON: {}", e)))
    }

    /// Apply overrides given on the command line.
    pub fn with_overrides(
        mut self,
        data_dir: Option<PathBuf>,
        run_dir: Option<PathBuf>,
        kubelet_dir: Option<PathBuf>,
    ) -> Self {
        if let Some(data_dir) = data_dir {
            self.data_dir = data_dir;
        }
        if let Some(run_dir) = run_dir {
            self.run_dir = run_dir;
        }
        if kubelet_dir.is_some() {
            self.kubelet_dir = kubelet_dir;
        }
        self
    }

    /// Resolve into the immutable target of a run.
    pub fn target(&self) -> TeardownTarget {
        let target = TeardownTarget::new(&self.data_dir, &self.run_dir);
        match &self.kubelet_dir {
            Some(kubelet_dir) => target.with_kubelet_dir(kubelet_dir),
            None => target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let target = TeardownConfig::default().target();
        assert_eq!(target.data_dir, PathBuf::from("/var/lib/k0s"));
        assert_eq!(target.run_dir, PathBuf::from("/run/k0s"));
        assert_eq!(target.kubelet_dir, PathBuf::from("/var/lib/k0s/kubelet"));
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"data_dir": "/srv/k0s"}}"#).unwrap();

        let config = TeardownConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/k0s"));
        assert_eq!(config.run_dir, PathBuf::from(DEFAULT_RUN_DIR));
        assert_eq!(config.target().kubelet_dir, PathBuf::from("/srv/k0s/kubelet"));
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = TeardownConfig::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, TeardownError::Config(_)));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = TeardownConfig::load_from_file("/nonexistent/teardown.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_overrides_win() {
        let config = TeardownConfig::default().with_overrides(
            Some(PathBuf::from("/data")),
            None,
            Some(PathBuf::from("/var/lib/kubelet")),
        );
        let target = config.target();
        assert_eq!(target.data_dir, PathBuf::from("/data"));
        assert_eq!(target.run_dir, PathBuf::from(DEFAULT_RUN_DIR));
        assert_eq!(target.kubelet_dir, PathBuf::from("/var/lib/kubelet"));
    }
}
