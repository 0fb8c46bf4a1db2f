//! The `utils` module provides shared definitions used across the `fabric-bridge`
//! crate.
//!
//! It centralizes the error taxonomy and the logging bootstrap so every module
//! reports failures and diagnostics the same way.

pub mod error;
pub mod logging;
