// Config validation
// Teardown is destructive, so a bad target must fail before anything is touched.

use crate::config::types::{TeardownError, TeardownTarget, Result};
use crate::safety::is_under;
use std::path::{Component, Path};

/// Validation result with detailed errors
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate a teardown target, failing on any error.
pub fn validate_target(target: &TeardownTarget) -> Result<ValidationResult> {
    let mut result = ValidationResult::new();

    validate_path("data_dir", &target.data_dir, &mut result);
    validate_path("run_dir", &target.run_dir, &mut result);
    validate_path("kubelet_dir", &target.kubelet_dir, &mut result);

    if target.data_dir == target.run_dir {
        result.add_error(format!(
            "data_dir and run_dir must differ (both {})",
            target.data_dir.display()
        ));
    }

    if !is_under(&target.data_dir, &target.kubelet_dir) {
        result.add_warning(format!(
            "kubelet_dir {} is outside data_dir {}",
            target.kubelet_dir.display(),
            target.data_dir.display()
        ));
    }

    if !result.is_valid() {
        return Err(TeardownError::Config(format!(
            "Config validation failed:\n{}",
            result.errors.join("\n")
        )));
    }

    Ok(result)
}

fn validate_path(name: &str, path: &Path, result: &mut ValidationResult) {
    if !path.is_absolute() {
        result.add_error(format!("{} must be absolute: {}", name, path.display()));
        return;
    }

    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        result.add_error(format!(
            "{} must not contain '..': {}",
            name,
            path.display()
        ));
    }

    if path.parent().is_none() {
        result.add_error(format!("{} must not be the filesystem root", name));
    }
}
