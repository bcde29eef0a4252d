//! Configuration
//!
//! Teardown target, loading and validation.

pub mod loader;
pub mod types;
pub mod validator;
