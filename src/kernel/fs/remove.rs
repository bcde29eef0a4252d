//! Recursive removal using openat/fstatat/unlinkat.
//!
//! Symlinks are never followed below the root. Directories on another device
//! are walked like any other; a live mount point below the root has its
//! contents removed and then fails the final unlink with EBUSY. Every failure
//! carries the operation and the exact path it happened on, so callers can
//! classify errors without string matching.

use nix::errno::Errno;
use std::ffi::{CStr, CString, OsStr};
use std::fmt;
use std::io;
use std::os::fd::RawFd;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The operation a removal failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOp {
    Open,
    Stat,
    ReadDir,
    /// Removing a directory entry, including the root itself
    Unlink,
}

impl RemoveOp {
    pub fn as_str(self) -> &'static str {
        match self {
            RemoveOp::Open => "openat",
            RemoveOp::Stat => "fstatat",
            RemoveOp::ReadDir => "readdir",
            RemoveOp::Unlink => "unlinkat",
        }
    }
}

impl fmt::Display for RemoveOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed removal: `{op, path}` plus the OS error.
#[derive(Debug, Error)]
#[error("{op} {}: {source}", path.display())]
pub struct RemoveError {
    pub op: RemoveOp,
    pub path: PathBuf,
    pub source: io::Error,
}

impl RemoveError {
    pub fn new(op: RemoveOp, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self {
            op,
            path: path.into(),
            source,
        }
    }

    fn last_os_error(op: RemoveOp, path: &Path) -> Self {
        Self::new(op, path, io::Error::last_os_error())
    }

    /// True if this is the failure to unlink exactly `dir`.
    pub fn is_unlink_of(&self, dir: &Path) -> bool {
        self.op == RemoveOp::Unlink && self.path == dir
    }
}

/// Recursive removal capability consumed by the directory eraser.
pub trait DirRemover {
    /// Remove `path` and everything below it. A missing path is not an error.
    fn remove_all(&self, path: &Path) -> Result<(), RemoveError>;
}

/// Production remover backed by [`remove_tree`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SecureRemover;

impl DirRemover for SecureRemover {
    fn remove_all(&self, path: &Path) -> Result<(), RemoveError> {
        remove_tree(path)
    }
}

struct FdGuard(RawFd);

impl FdGuard {
    fn as_raw_fd(&self) -> RawFd {
        self.0
    }
}

impl Drop for FdGuard {
    fn drop(&mut self) {
        if self.0 >= 0 {
            // SAFETY: the guard exclusively owns this descriptor.
            unsafe {
                libc::close(self.0);
            }
        }
    }
}

fn c_name(name: &OsStr, path: &Path) -> Result<CString, RemoveError> {
    CString::new(name.as_bytes()).map_err(|_| {
        RemoveError::new(
            RemoveOp::Open,
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "path contains NUL byte"),
        )
    })
}

/// Open the directory holding the root. Symlinks in the parent chain are
/// resolved; only entries below it are opened without following.
fn open_parent(path: &Path) -> Result<FdGuard, RemoveError> {
    let path_c = c_name(path.as_os_str(), path)?;
    // SAFETY: path_c is a valid NUL-terminated string.
    let fd = unsafe {
        libc::open(
            path_c.as_ptr(),
            libc::O_RDONLY | libc::O_DIRECTORY | libc::O_CLOEXEC,
        )
    };
    if fd < 0 {
        return Err(RemoveError::last_os_error(RemoveOp::Open, path));
    }
    Ok(FdGuard(fd))
}

/// `fstatat` without following symlinks; `None` if the entry is gone.
fn stat_at(parent_fd: RawFd, name: &CStr, path: &Path) -> Result<Option<libc::stat>, RemoveError> {
    let mut st = std::mem::MaybeUninit::<libc::stat>::zeroed();
    // SAFETY: name is NUL-terminated and st is large enough for a stat.
    let rc = unsafe {
        libc::fstatat(
            parent_fd,
            name.as_ptr(),
            st.as_mut_ptr(),
            libc::AT_SYMLINK_NOFOLLOW,
        )
    };
    if rc != 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::NotFound {
            return Ok(None);
        }
        return Err(RemoveError::new(RemoveOp::Stat, path, err));
    }

    // SAFETY: fstatat succeeded and initialised the buffer.
    Ok(Some(unsafe { st.assume_init() }))
}

fn unlink_at(parent_fd: RawFd, name: &CStr, flags: i32, path: &Path) -> Result<(), RemoveError> {
    // SAFETY: name is NUL-terminated.
    let rc = unsafe { libc::unlinkat(parent_fd, name.as_ptr(), flags) };
    if rc != 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::NotFound {
            return Ok(());
        }
        return Err(RemoveError::new(RemoveOp::Unlink, path, err));
    }
    Ok(())
}

fn is_dir(st: &libc::stat) -> bool {
    st.st_mode & libc::S_IFMT == libc::S_IFDIR
}

fn remove_dir_at(parent_fd: RawFd, name: &CStr, path: &Path) -> Result<(), RemoveError> {
    // SAFETY: name is NUL-terminated.
    let child_fd = unsafe {
        libc::openat(
            parent_fd,
            name.as_ptr(),
            libc::O_RDONLY | libc::O_DIRECTORY | libc::O_CLOEXEC | libc::O_NOFOLLOW,
        )
    };
    if child_fd < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::NotFound {
            return Ok(());
        }
        return Err(RemoveError::new(RemoveOp::Open, path, err));
    }
    let child = FdGuard(child_fd);

    remove_dir_contents(child.as_raw_fd(), path)?;
    drop(child);
    unlink_at(parent_fd, name, libc::AT_REMOVEDIR, path)
}

/// Read all entry names of `dir_fd` before anything is unlinked.
fn read_names(dir_fd: RawFd, path: &Path) -> Result<Vec<CString>, RemoveError> {
    // SAFETY: dup of a descriptor we hold; ownership moves to the DIR stream.
    let iter_fd = unsafe { libc::dup(dir_fd) };
    if iter_fd < 0 {
        return Err(RemoveError::last_os_error(RemoveOp::ReadDir, path));
    }

    // SAFETY: iter_fd is a valid directory descriptor.
    let dir = unsafe { libc::fdopendir(iter_fd) };
    if dir.is_null() {
        let err = RemoveError::last_os_error(RemoveOp::ReadDir, path);
        // SAFETY: fdopendir failed, so iter_fd is still ours to close.
        unsafe {
            libc::close(iter_fd);
        }
        return Err(err);
    }

    let mut names = Vec::new();
    let result = loop {
        Errno::clear();
        // SAFETY: dir is a valid, open DIR stream.
        let entry = unsafe { libc::readdir(dir) };
        if entry.is_null() {
            let err = io::Error::last_os_error();
            if err.raw_os_error().unwrap_or(0) != 0 {
                break Err(RemoveError::new(RemoveOp::ReadDir, path, err));
            }
            break Ok(());
        }

        // SAFETY: readdir returned a valid dirent with a NUL-terminated name.
        let name = unsafe { CStr::from_ptr((*entry).d_name.as_ptr()) };
        let bytes = name.to_bytes();
        if bytes == b"." || bytes == b".." {
            continue;
        }
        names.push(name.to_owned());
    };

    // SAFETY: closes the stream and the duplicated descriptor.
    unsafe {
        libc::closedir(dir);
    }

    result.map(|()| names)
}

fn remove_dir_contents(dir_fd: RawFd, path: &Path) -> Result<(), RemoveError> {
    for name in read_names(dir_fd, path)? {
        let child_path = path.join(OsStr::from_bytes(name.to_bytes()));
        let Some(st) = stat_at(dir_fd, &name, &child_path)? else {
            continue;
        };

        if is_dir(&st) {
            remove_dir_at(dir_fd, &name, &child_path)?;
        } else {
            unlink_at(dir_fd, &name, 0, &child_path)?;
        }
    }

    Ok(())
}

/// Remove `path` and everything below it.
///
/// A missing `path` is success. When `path` is itself a mount point its
/// contents are removed and the final unlink fails with op
/// [`RemoveOp::Unlink`] on `path`.
pub fn remove_tree(path: &Path) -> Result<(), RemoveError> {
    let name = path.file_name().ok_or_else(|| {
        RemoveError::new(
            RemoveOp::Open,
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "path has no final component"),
        )
    })?;
    let name_c = c_name(name, path)?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let parent_fd = match open_parent(parent) {
        Ok(fd) => fd,
        Err(e) if e.source.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    let Some(st) = stat_at(parent_fd.as_raw_fd(), &name_c, path)? else {
        return Ok(());
    };

    if is_dir(&st) {
        remove_dir_at(parent_fd.as_raw_fd(), &name_c, path)
    } else {
        unlink_at(parent_fd.as_raw_fd(), &name_c, 0, path)
    }
}
