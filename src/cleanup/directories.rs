/// Directory teardown step
/// Unmounts everything the runtime mounted under its directories, then
/// erases the data dir and the run dir.
use crate::cleanup::step::Step;
use crate::config::types::{Result, TeardownTarget};
use crate::kernel::fs::{DirRemover, SecureRemover};
use crate::kernel::mount::{Mounter, ProcMounter};
use crate::safety::{erase, unmount_all};
use log::{debug, info};
use serde::Serialize;
use std::path::PathBuf;

pub const STEP_NAME: &str = "remove directories step";

/// Outcome of a successful teardown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeardownReport {
    pub step: &'static str,
    pub data_dir_mounted: bool,
    pub unmounted: Vec<PathBuf>,
    pub lazily_unmounted: Vec<PathBuf>,
    /// Directories whose removal completed (contents only for a mounted data dir)
    pub removed: Vec<PathBuf>,
}

/// Removes all kubelet mounts and deletes the generated data and run dirs.
pub struct RemoveDirectories<M = ProcMounter, R = SecureRemover> {
    target: TeardownTarget,
    mounter: M,
    remover: R,
}

impl RemoveDirectories {
    /// Step backed by the live mount table and filesystem
    pub fn new(target: TeardownTarget) -> Self {
        Self::with_capabilities(target, ProcMounter::new(), SecureRemover)
    }
}

impl<M: Mounter, R: DirRemover> RemoveDirectories<M, R> {
    pub fn with_capabilities(target: TeardownTarget, mounter: M, remover: R) -> Self {
        Self {
            target,
            mounter,
            remover,
        }
    }

    pub fn mounter(&self) -> &M {
        &self.mounter
    }

    pub fn remover(&self) -> &R {
        &self.remover
    }

    /// Run the teardown and report what it did.
    ///
    /// Nothing is deleted unless every owned mount was released.
    pub fn execute(&self) -> Result<TeardownReport> {
        let records = self.mounter.list()?;
        debug!("{} mounts listed", records.len());

        let summary = unmount_all(&self.mounter, &records, &self.target)?;
        info!(
            "released {} mounts ({} lazily)",
            summary.unmounted.len() + summary.lazily_unmounted.len(),
            summary.lazily_unmounted.len()
        );

        erase(&self.remover, &self.target, summary.data_dir_mounted)?;

        Ok(TeardownReport {
            step: STEP_NAME,
            data_dir_mounted: summary.data_dir_mounted,
            unmounted: summary.unmounted,
            lazily_unmounted: summary.lazily_unmounted,
            removed: vec![self.target.data_dir.clone(), self.target.run_dir.clone()],
        })
    }
}

impl<M: Mounter, R: DirRemover> Step for RemoveDirectories<M, R> {
    fn name(&self) -> &'static str {
        STEP_NAME
    }

    fn run(&self) -> Result<()> {
        self.execute().map(|_| ())
    }
}
