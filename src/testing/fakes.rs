/// In-memory mount table and remover
/// Stand-ins for the OS capabilities, recording every call made to them.
use crate::config::types::{Result, TeardownError};
use crate::kernel::fs::{DirRemover, RemoveError, RemoveOp};
use crate::kernel::mount::{MountRecord, Mounter};
use nix::errno::Errno;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// A call made to a [`FakeMounter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountCall {
    List,
    Unmount(PathBuf),
    UnmountLazy(PathBuf),
}

/// Mount table held in memory, oldest mount first.
/// A successful unmount removes the entry, so a second run sees it gone.
#[derive(Debug, Default)]
pub struct FakeMounter {
    mounts: RefCell<Vec<MountRecord>>,
    calls: RefCell<Vec<MountCall>>,
    list_error: Option<String>,
    unmount_errors: HashMap<PathBuf, Errno>,
    lazy_errors: HashMap<PathBuf, Errno>,
}

impl FakeMounter {
    pub fn new(paths: &[&str]) -> Self {
        let mounts = paths
            .iter()
            .enumerate()
            .map(|(idx, path)| MountRecord {
                mount_id: idx as u32 + 1,
                ..MountRecord::at(*path)
            })
            .collect();
        Self {
            mounts: RefCell::new(mounts),
            ..Self::default()
        }
    }

    /// Make `list` fail as if the mount table were unreadable.
    pub fn fail_list(mut self, reason: &str) -> Self {
        self.list_error = Some(reason.to_string());
        self
    }

    pub fn fail_unmount(mut self, path: &str, errno: Errno) -> Self {
        self.unmount_errors.insert(PathBuf::from(path), errno);
        self
    }

    pub fn fail_unmount_lazy(mut self, path: &str, errno: Errno) -> Self {
        self.lazy_errors.insert(PathBuf::from(path), errno);
        self
    }

    /// Current table without recording a call.
    pub fn list_now(&self) -> Vec<MountRecord> {
        self.mounts.borrow().clone()
    }

    pub fn calls(&self) -> Vec<MountCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| **c != MountCall::List)
            .cloned()
            .collect()
    }

    /// All calls including `List`.
    pub fn all_calls(&self) -> Vec<MountCall> {
        self.calls.borrow().clone()
    }

    fn detach(&self, path: &Path) {
        self.mounts.borrow_mut().retain(|m| m.path != path);
    }
}

impl Mounter for FakeMounter {
    fn list(&self) -> Result<Vec<MountRecord>> {
        self.calls.borrow_mut().push(MountCall::List);
        if let Some(reason) = &self.list_error {
            return Err(TeardownError::Enumeration(reason.clone()));
        }
        Ok(self.list_now())
    }

    fn unmount(&self, path: &Path) -> nix::Result<()> {
        self.calls
            .borrow_mut()
            .push(MountCall::Unmount(path.to_path_buf()));
        if let Some(errno) = self.unmount_errors.get(path) {
            return Err(*errno);
        }
        self.detach(path);
        Ok(())
    }

    fn unmount_lazy(&self, path: &Path) -> nix::Result<()> {
        self.calls
            .borrow_mut()
            .push(MountCall::UnmountLazy(path.to_path_buf()));
        if let Some(errno) = self.lazy_errors.get(path) {
            return Err(*errno);
        }
        self.detach(path);
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct InjectedFailure {
    op: RemoveOp,
    path: PathBuf,
    errno: i32,
}

/// Remover that only records which roots it was asked to remove.
#[derive(Debug, Default)]
pub struct FakeRemover {
    calls: RefCell<Vec<PathBuf>>,
    failures: HashMap<PathBuf, InjectedFailure>,
}

impl FakeRemover {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `remove_all(root)` fail with `{op, path}` and `errno`.
    pub fn fail(mut self, root: &str, op: RemoveOp, path: &str, errno: i32) -> Self {
        self.failures.insert(
            PathBuf::from(root),
            InjectedFailure {
                op,
                path: PathBuf::from(path),
                errno,
            },
        );
        self
    }

    /// Roots passed to `remove_all`, in call order.
    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.borrow().clone()
    }
}

impl DirRemover for FakeRemover {
    fn remove_all(&self, path: &Path) -> std::result::Result<(), RemoveError> {
        self.calls.borrow_mut().push(path.to_path_buf());
        match self.failures.get(path) {
            Some(failure) => Err(RemoveError::new(
                failure.op,
                &failure.path,
                io::Error::from_raw_os_error(failure.errno),
            )),
            None => Ok(()),
        }
    }
}
