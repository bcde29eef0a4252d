/// Directory eraser
/// Removes the data dir, then the run dir. The one tolerated failure is the
/// data dir refusing to be unlinked because it is itself a mount point; its
/// contents are gone by then, which is all this step needs.
use crate::config::types::{EraseTarget, Result, TeardownError, TeardownTarget};
use crate::kernel::fs::DirRemover;
use log::debug;

/// Erase the runtime's data and run directories.
pub fn erase<R: DirRemover + ?Sized>(
    remover: &R,
    target: &TeardownTarget,
    data_dir_mounted: bool,
) -> Result<()> {
    let data_dir = &target.data_dir;
    if data_dir_mounted {
        debug!("removing the contents of mounted data-dir ({})", data_dir.display());
    } else {
        debug!("removing generated data-dir ({})", data_dir.display());
    }

    if let Err(source) = remover.remove_all(data_dir) {
        if !data_dir_mounted {
            return Err(TeardownError::Erase {
                target: EraseTarget::DataDir,
                path: data_dir.clone(),
                source,
            });
        }
        if !source.is_unlink_of(data_dir) {
            return Err(TeardownError::Erase {
                target: EraseTarget::MountedDataDir,
                path: data_dir.clone(),
                source,
            });
        }
        debug!("data-dir {} is a mount point, leaving it in place", data_dir.display());
    }

    let run_dir = &target.run_dir;
    debug!("deleting generated run-dir ({})", run_dir.display());
    remover
        .remove_all(run_dir)
        .map_err(|source| TeardownError::Erase {
            target: EraseTarget::RunDir,
            path: run_dir.clone(),
            source,
        })
}
