//! Integration tests for the directory teardown step
//!
//! The mount table and the filesystem are faked, so these run unprivileged
//! and assert on the exact sequence of OS calls the step makes.

use nix::errno::Errno;
use node_teardown::kernel::fs::RemoveOp;
use node_teardown::safety::is_under;
use node_teardown::testing::{FakeMounter, FakeRemover, MountCall};
use node_teardown::{RemoveDirectories, Step, TeardownError, TeardownTarget};
use std::path::{Path, PathBuf};

fn target() -> TeardownTarget {
    TeardownTarget::new("/data", "/run/k0s")
}

fn step(mounter: FakeMounter, remover: FakeRemover) -> RemoveDirectories<FakeMounter, FakeRemover> {
    RemoveDirectories::with_capabilities(target(), mounter, remover)
}

#[test]
fn test_containment_properties() {
    let base = Path::new("/var/lib/k0s");
    assert!(is_under(base, base));
    assert!(is_under(base, &base.join("x")));
    assert!(!is_under(base, Path::new("/var/lib/k0s2")));
    assert!(!is_under(base, base.parent().unwrap()));
}

#[test]
fn test_nested_mounts_released_before_parents() {
    let step = step(
        FakeMounter::new(&["/data", "/data/kubelet", "/data/kubelet/pods/x"]),
        FakeRemover::new(),
    );

    step.run().unwrap();

    assert_eq!(
        step.mounter().calls(),
        vec![
            MountCall::Unmount(PathBuf::from("/data/kubelet/pods/x")),
            MountCall::Unmount(PathBuf::from("/data/kubelet")),
        ]
    );
    // The data dir mount is the boundary and stays mounted
    assert_eq!(step.mounter().list_now().len(), 1);
}

#[test]
fn test_lazy_fallback_lets_teardown_proceed() {
    let step = step(
        FakeMounter::new(&["/data/kubelet/pods/x"])
            .fail_unmount("/data/kubelet/pods/x", Errno::EBUSY),
        FakeRemover::new(),
    );

    step.run().unwrap();

    assert_eq!(
        step.mounter().calls(),
        vec![
            MountCall::Unmount(PathBuf::from("/data/kubelet/pods/x")),
            MountCall::UnmountLazy(PathBuf::from("/data/kubelet/pods/x")),
        ]
    );
    assert_eq!(
        step.remover().calls(),
        vec![PathBuf::from("/data"), PathBuf::from("/run/k0s")]
    );
}

#[test]
fn test_failed_unmount_means_no_deletion() {
    let step = step(
        FakeMounter::new(&["/data", "/data/kubelet/pods/x"])
            .fail_unmount("/data/kubelet/pods/x", Errno::EBUSY)
            .fail_unmount_lazy("/data/kubelet/pods/x", Errno::EINVAL),
        FakeRemover::new(),
    );

    let err = step.run().unwrap_err();

    assert_eq!(err.path(), Some(Path::new("/data/kubelet/pods/x")));
    assert!(err.to_string().contains("failed unmount /data/kubelet/pods/x"));
    assert!(step.remover().calls().is_empty());
}

#[test]
fn test_mounted_data_dir_root_unlink_is_success() {
    let step = step(
        FakeMounter::new(&["/data"]),
        FakeRemover::new().fail("/data", RemoveOp::Unlink, "/data", libc::EBUSY),
    );

    step.run().unwrap();
    assert_eq!(
        step.remover().calls(),
        vec![PathBuf::from("/data"), PathBuf::from("/run/k0s")]
    );
}

#[test]
fn test_mounted_data_dir_subpath_unlink_fails() {
    let step = step(
        FakeMounter::new(&["/data"]),
        FakeRemover::new().fail("/data", RemoveOp::Unlink, "/data/containerd", libc::EBUSY),
    );

    let err = step.run().unwrap_err();

    assert!(matches!(err, TeardownError::Erase { .. }));
    assert_eq!(step.remover().calls(), vec![PathBuf::from("/data")]);
}

#[test]
fn test_unmounted_data_dir_any_failure_fails() {
    for op in [RemoveOp::Unlink, RemoveOp::Open, RemoveOp::Stat, RemoveOp::ReadDir] {
        let step = step(
            FakeMounter::new(&[]),
            FakeRemover::new().fail("/data", op, "/data", libc::EBUSY),
        );
        assert!(step.run().is_err(), "{op} on an unmounted data dir must fail");
    }
}

#[test]
fn test_second_run_is_a_no_op() {
    let step = step(
        FakeMounter::new(&["/", "/data/kubelet", "/data/kubelet/pods/x"]),
        FakeRemover::new(),
    );

    step.run().unwrap();
    let first = step.mounter().calls().len();

    step.run().unwrap();

    // No further unmounts; removal of absent directories is success
    assert_eq!(step.mounter().calls().len(), first);
    assert_eq!(step.remover().calls().len(), 4);
}

#[test]
fn test_enumeration_error_is_fatal() {
    let step = step(FakeMounter::new(&[]).fail_list("EACCES"), FakeRemover::new());

    let err = step.run().unwrap_err();

    assert!(matches!(err, TeardownError::Enumeration(_)));
    assert!(step.remover().calls().is_empty());
}
