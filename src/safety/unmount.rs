/// Unmount strategy for owned mounts
///
/// Mounts are detached newest first so that nested and bind mounts go before
/// their parents. A busy mount falls back to a lazy (detached) unmount; if that
/// fails too the whole teardown stops before anything is deleted.
///
/// Shared bind mounts below the data dir propagate, so unmounting them may
/// also detach their peers outside of it. That is the configured behaviour of
/// a shared mount and is accepted here.
use crate::config::types::{Result, TeardownError, TeardownTarget};
use crate::kernel::mount::{MountRecord, Mounter};
use crate::safety::ownership::{classify, OwnershipDecision};
use log::{debug, warn};
use serde::Serialize;
use std::path::PathBuf;

/// What the unmount pass did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnmountSummary {
    /// The data dir is itself a mount point and was left mounted
    pub data_dir_mounted: bool,
    /// Released by a normal unmount, in the order they were released
    pub unmounted: Vec<PathBuf>,
    /// Released by the lazy fallback
    pub lazily_unmounted: Vec<PathBuf>,
}

/// Unmount every owned mount in `records`, newest first.
///
/// `records` must be in kernel listing order (oldest first).
pub fn unmount_all<M: Mounter + ?Sized>(
    mounter: &M,
    records: &[MountRecord],
    target: &TeardownTarget,
) -> Result<UnmountSummary> {
    let mut summary = UnmountSummary::default();

    for record in records.iter().rev() {
        match classify(record, target) {
            OwnershipDecision::DataDirRoot => {
                // Not mounted by the runtime; only its contents go.
                summary.data_dir_mounted = true;
            }
            OwnershipDecision::Owned => {
                let path = &record.path;
                debug!("{} is mounted! attempting to unmount...", path.display());
                match mounter.unmount(path) {
                    Ok(()) => summary.unmounted.push(path.clone()),
                    Err(e) => {
                        warn!("unmount of {} failed ({}), lazy unmounting", path.display(), e);
                        mounter.unmount_lazy(path).map_err(|source| {
                            TeardownError::Unmount {
                                path: path.clone(),
                                source,
                            }
                        })?;
                        summary.lazily_unmounted.push(path.clone());
                    }
                }
            }
            OwnershipDecision::Unrelated => {}
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fakes::{FakeMounter, MountCall};
    use nix::errno::Errno;
    use std::path::Path;

    fn target() -> TeardownTarget {
        TeardownTarget::new("/data", "/run/k0s")
    }

    #[test]
    fn test_nested_mounts_released_child_first() {
        let mounter = FakeMounter::new(&["/data", "/data/kubelet", "/data/kubelet/pods/x"]);

        let summary = unmount_all(&mounter, &mounter.list_now(), &target()).unwrap();

        assert_eq!(
            mounter.calls(),
            vec![
                MountCall::Unmount(PathBuf::from("/data/kubelet/pods/x")),
                MountCall::Unmount(PathBuf::from("/data/kubelet")),
            ]
        );
        assert!(summary.data_dir_mounted);
        assert!(summary.lazily_unmounted.is_empty());
    }

    #[test]
    fn test_unrelated_mounts_untouched() {
        let mounter = FakeMounter::new(&["/", "/sys", "/data2", "/run/k0s", "/var/lib"]);

        let summary = unmount_all(&mounter, &mounter.list_now(), &target()).unwrap();

        assert!(mounter.calls().is_empty());
        assert!(!summary.data_dir_mounted);
    }

    #[test]
    fn test_lazy_fallback_does_not_retry_normal_unmount() {
        let mounter = FakeMounter::new(&["/data/kubelet/pods/x", "/data/kubelet/pods/y"])
            .fail_unmount("/data/kubelet/pods/x", Errno::EBUSY);

        let summary = unmount_all(&mounter, &mounter.list_now(), &target()).unwrap();

        assert_eq!(
            mounter.calls(),
            vec![
                MountCall::Unmount(PathBuf::from("/data/kubelet/pods/y")),
                MountCall::Unmount(PathBuf::from("/data/kubelet/pods/x")),
                MountCall::UnmountLazy(PathBuf::from("/data/kubelet/pods/x")),
            ]
        );
        assert_eq!(summary.unmounted, vec![PathBuf::from("/data/kubelet/pods/y")]);
        assert_eq!(
            summary.lazily_unmounted,
            vec![PathBuf::from("/data/kubelet/pods/x")]
        );
    }

    #[test]
    fn test_both_attempts_failing_aborts_with_path() {
        let mounter = FakeMounter::new(&["/data/a", "/data/b", "/data/c"])
            .fail_unmount("/data/b", Errno::EBUSY)
            .fail_unmount_lazy("/data/b", Errno::EINVAL);

        let err = unmount_all(&mounter, &mounter.list_now(), &target()).unwrap_err();

        match err {
            TeardownError::Unmount { path, source } => {
                assert_eq!(path, PathBuf::from("/data/b"));
                assert_eq!(source, Errno::EINVAL);
            }
            other => panic!("unexpected error: {other}"),
        }
        // /data/a is older than /data/b and is never reached
        assert!(!mounter
            .calls()
            .contains(&MountCall::Unmount(PathBuf::from("/data/a"))));
    }

    #[test]
    fn test_out_of_order_list_is_taken_verbatim() {
        // A parent listed after its child is released first: the list order is
        // trusted as chronology and never re-sorted.
        let mounter = FakeMounter::new(&["/data/kubelet/pods/x", "/data/kubelet"]);

        unmount_all(&mounter, &mounter.list_now(), &target()).unwrap();

        assert_eq!(
            mounter.calls(),
            vec![
                MountCall::Unmount(PathBuf::from("/data/kubelet")),
                MountCall::Unmount(PathBuf::from("/data/kubelet/pods/x")),
            ]
        );
    }

    #[test]
    fn test_data_dir_mount_flagged_without_filesystem_check() {
        // Appearing in the mount list is taken as proof the data dir is its own
        // filesystem; nothing confirms it is a separate device.
        let mounter = FakeMounter::new(&["/data"]);

        let summary = unmount_all(&mounter, &mounter.list_now(), &target()).unwrap();

        assert!(summary.data_dir_mounted);
        assert!(mounter.calls().is_empty());
    }

    #[test]
    fn test_kubelet_dir_outside_data_dir_is_owned() {
        let target = target().with_kubelet_dir("/var/lib/kubelet");
        let mounter = FakeMounter::new(&["/var/lib/kubelet/pods/x"]);

        unmount_all(&mounter, &mounter.list_now(), &target).unwrap();

        assert_eq!(
            mounter.calls(),
            vec![MountCall::Unmount(Path::new("/var/lib/kubelet/pods/x").to_path_buf())]
        );
    }
}
