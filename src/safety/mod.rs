//! Safety and cleanup
//!
//! Decides which mounts belong to the runtime, releases them, and only then
//! erases the runtime's directories.

pub mod erase;
pub mod ownership;
pub mod unmount;

pub use erase::erase;
pub use ownership::{classify, is_under, OwnershipDecision};
pub use unmount::{unmount_all, UnmountSummary};
