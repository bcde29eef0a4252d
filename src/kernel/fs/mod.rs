//! Filesystem removal primitives
//!
//! Recursive deletion with structured `{op, path}` errors.

pub mod remove;

pub use remove::*;
