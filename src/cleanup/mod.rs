//! Cleanup steps
//!
//! The step contract and the directory teardown step.

pub mod directories;
pub mod step;

pub use directories::{RemoveDirectories, TeardownReport};
pub use step::Step;
