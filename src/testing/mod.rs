//! Testing infrastructure
//!
//! In-memory stand-ins for the mount table and the filesystem, so the
//! teardown pipeline can be exercised without mount privileges.

pub mod fakes;

// Re-export commonly used items
pub use fakes::*;
