//! Mount table enumeration and unmount capability
//!
//! Provides the mount list in kernel order and normal/lazy unmount.

pub mod table;

// Re-export commonly used items
pub use table::*;
