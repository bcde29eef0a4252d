//! node-teardown: node cleanup for a cluster-runtime installer
//! Releases the mounts the runtime created and erases its on-disk state,
//! without touching volumes that belong to the workload.
//!
//! # Architecture
//!
//! ## Kernel Primitives ([`kernel`])
//! - [`kernel::mount`]: Mount table enumeration, normal and lazy unmount
//! - [`kernel::fs`]: Recursive removal with structured `{op, path}` errors
//!
//! ## Safety & Cleanup ([`safety`])
//! - [`safety::ownership`]: Which mounts the runtime owns
//! - [`safety::unmount`]: Newest-first unmount with lazy fallback
//! - [`safety::erase`]: Data dir and run dir removal
//!
//! ## Cleanup Steps ([`cleanup`])
//! - [`cleanup::step`]: The step contract used by the orchestrator
//! - [`cleanup::directories`]: The directory teardown step
//!
//! ## Configuration ([`config`])
//! - [`config::types`]: Teardown target and error taxonomy
//! - [`config::loader`]: JSON configuration with CLI overrides
//! - [`config::validator`]: Fail-fast target validation
//!
//! ## Testing Infrastructure ([`testing`])
//! - [`testing::fakes`]: In-memory mount table and remover
//!
//! # Ordering
//!
//! Nothing is deleted until every owned mount is released. The mount list is
//! taken in kernel order and walked backwards; that order is assumed to match
//! mount chronology.

// Kernel Primitives
pub mod kernel;

// Safety & Cleanup
pub mod safety;

// Cleanup Steps
pub mod cleanup;

// Configuration
pub mod config;

// Testing Infrastructure
pub mod testing;

// CLI entrypoint wiring for the node-teardown binary.
pub mod cli;

// Re-export commonly used types for convenience
pub use cleanup::{RemoveDirectories, Step, TeardownReport};
pub use config::types::*;
