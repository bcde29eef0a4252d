/// Mount table access
/// Enumerates /proc/self/mountinfo and unmounts through nix.
///
/// The kernel lists mounts in the order they were attached to the namespace.
/// Callers rely on that order to approximate mount chronology; it is an
/// assumed OS contract and is not verified here.
use crate::config::types::{Result, TeardownError};
use std::ffi::OsString;
use std::os::unix::ffi::OsStringExt;
use std::path::{Path, PathBuf};

pub const PROC_MOUNTINFO: &str = "/proc/self/mountinfo";

/// One active mount point, as reported by the kernel at a single point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountRecord {
    pub mount_id: u32,
    pub parent_id: u32,
    /// major:minor of the mounted device
    pub device: String,
    pub path: PathBuf,
    pub mount_options: String,
    pub filesystem_type: String,
    pub source: String,
}

impl MountRecord {
    /// Record carrying only a path, for callers that have nothing else.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            mount_id: 0,
            parent_id: 0,
            device: String::new(),
            path: path.into(),
            mount_options: String::new(),
            filesystem_type: String::new(),
            source: String::new(),
        }
    }
}

/// Mount enumeration and unmount capability.
pub trait Mounter {
    /// Current mounts, oldest first. The order is preserved verbatim.
    fn list(&self) -> Result<Vec<MountRecord>>;

    /// Normal unmount; fails if the mount is busy.
    fn unmount(&self, path: &Path) -> nix::Result<()>;

    /// Detached unmount; the mount is released once it is no longer busy.
    fn unmount_lazy(&self, path: &Path) -> nix::Result<()>;
}

/// Production mounter backed by procfs and umount(2)
#[derive(Debug, Clone)]
pub struct ProcMounter {
    mountinfo: PathBuf,
}

impl Default for ProcMounter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcMounter {
    pub fn new() -> Self {
        Self::with_mountinfo(PROC_MOUNTINFO)
    }

    /// Read the mount table from another mountinfo-formatted file.
    pub fn with_mountinfo(path: impl Into<PathBuf>) -> Self {
        Self {
            mountinfo: path.into(),
        }
    }
}

impl Mounter for ProcMounter {
    fn list(&self) -> Result<Vec<MountRecord>> {
        let content = std::fs::read_to_string(&self.mountinfo).map_err(|e| {
            TeardownError::Enumeration(format!(
                "Failed to read {}: {}",
                self.mountinfo.display(),
                e
            ))
        })?;
        parse_mountinfo(&content)
    }

    #[cfg(target_os = "linux")]
    fn unmount(&self, path: &Path) -> nix::Result<()> {
        nix::mount::umount(path)
    }

    #[cfg(target_os = "linux")]
    fn unmount_lazy(&self, path: &Path) -> nix::Result<()> {
        nix::mount::umount2(path, nix::mount::MntFlags::MNT_DETACH)
    }

    #[cfg(not(target_os = "linux"))]
    fn unmount(&self, _path: &Path) -> nix::Result<()> {
        Err(nix::errno::Errno::ENOSYS)
    }

    #[cfg(not(target_os = "linux"))]
    fn unmount_lazy(&self, _path: &Path) -> nix::Result<()> {
        Err(nix::errno::Errno::ENOSYS)
    }
}

/// Parse the full contents of a mountinfo file, keeping line order.
/// A malformed line fails the whole parse: a mount that cannot be read
/// cannot be judged safe to leave behind.
pub fn parse_mountinfo(content: &str) -> Result<Vec<MountRecord>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            parse_mountinfo_line(line).ok_or_else(|| {
                TeardownError::Enumeration(format!(
                    "malformed mountinfo line {}: {:?}",
                    idx + 1,
                    line
                ))
            })
        })
        .collect()
}

/// Parse a single line from /proc/self/mountinfo
/// Format: mount_id parent_id major:minor root mount_point options [optional...] - fs_type source super_options
fn parse_mountinfo_line(line: &str) -> Option<MountRecord> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    if parts.len() < 10 {
        return None;
    }

    let mount_id = parts[0].parse::<u32>().ok()?;
    let parent_id = parts[1].parse::<u32>().ok()?;

    // Optional fields end at the first "-" after the fixed six
    let sep_pos = parts.iter().skip(6).position(|&p| p == "-")? + 6;
    if sep_pos + 2 >= parts.len() {
        return None;
    }

    Some(MountRecord {
        mount_id,
        parent_id,
        device: parts[2].to_string(),
        path: PathBuf::from(unescape_octal(parts[4])),
        mount_options: parts[5].to_string(),
        filesystem_type: parts[sep_pos + 1].to_string(),
        source: parts[sep_pos + 2].to_string(),
    })
}

/// Decode the `\ooo` escapes the kernel uses for space, tab, newline and backslash.
fn unescape_octal(field: &str) -> OsString {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() {
            let digits = &bytes[i + 1..i + 4];
            if digits.iter().all(|d| (b'0'..=b'7').contains(d)) {
                let value = digits
                    .iter()
                    .fold(0u32, |acc, d| acc * 8 + u32::from(d - b'0'));
                if let Ok(byte) = u8::try_from(value) {
                    out.push(byte);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    OsString::from_vec(out)
}
