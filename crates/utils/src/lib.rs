//! Shared utilities for stashbox
//!
//! Path resolution for record files and tracing setup used across the
//! workspace.

pub mod directory;
pub mod logging;
pub mod xdg;

pub use directory::*;
pub use xdg::*;
