/// Mount ownership classification
/// Pure functions: no I/O, no canonicalisation against the live filesystem.
use crate::config::types::TeardownTarget;
use crate::kernel::mount::MountRecord;
use std::path::{Component, Path, PathBuf};

/// How a mount relates to the runtime's directories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipDecision {
    /// The data dir itself is a mount point; left mounted, contents removed later
    DataDirRoot,
    /// Under the kubelet dir or the data dir; must be unmounted
    Owned,
    Unrelated,
}

/// Lexically normalise a path: drop `.`, fold `..` into the preceding component.
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// True if `path` is `base` or lies below it.
///
/// Containment is decided on the relative path from `base` to `path`, component
/// by component, so `/data2` is not under `/data`. An absolute and a relative
/// path are never related.
pub fn is_under(base: &Path, path: &Path) -> bool {
    if base.is_absolute() != path.is_absolute() {
        return false;
    }
    let base = clean(base);
    let path = clean(path);
    match path.strip_prefix(&base) {
        Ok(rel) => !matches!(rel.components().next(), Some(Component::ParentDir)),
        Err(_) => false,
    }
}

/// Classify one mount against the teardown target.
pub fn classify(record: &MountRecord, target: &TeardownTarget) -> OwnershipDecision {
    if clean(&record.path) == clean(&target.data_dir) {
        return OwnershipDecision::DataDirRoot;
    }
    if is_under(&target.kubelet_dir, &record.path) || is_under(&target.data_dir, &record.path) {
        return OwnershipDecision::Owned;
    }
    OwnershipDecision::Unrelated
}
