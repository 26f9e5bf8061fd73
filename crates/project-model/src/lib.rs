//! Clipcast Project Model
//!
//! Defines the core data contracts for Clipcast projects:
//! - **Timeline:** trim, crop, zoom regions and text overlays for one media item
//! - **Coordinates:** pointer/element space to normalized media space and back
//! - **Events:** clicks captured while recording
//! - **Export:** the requested output format, size tier and quality tier
//! - **Project:** on-disk metadata tying source media to its timeline
//!
//! All positions are percentages `[0, 100]` of the intrinsic media frame and
//! all times are seconds of source media.

pub mod coords;
pub mod event;
pub mod export;
pub mod project;
pub mod timeline;
pub mod validation;

pub use coords::*;
pub use event::*;
pub use export::*;
pub use project::*;
pub use timeline::*;
pub use validation::ValidationError;
