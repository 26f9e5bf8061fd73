//! Clipcast Common Utilities
//!
//! Shared infrastructure for all Clipcast crates:
//! - Error types and result aliases
//! - Recording clock for click timestamps
//! - Tracing/logging initialization
//! - Configuration loading (capture defaults, encoder presets)

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
