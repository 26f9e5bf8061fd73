//! Clipcast Processing Core: the live preview evaluator.
//!
//! Turns a timeline plus a playback position into what the player shows:
//! - **Transform:** the single zoom region in effect, as scale + recentring
//! - **Overlays:** every caption visible at that instant, in model order
//!
//! This crate is pure computation: no I/O, no platform dependencies.
//! All inputs are data; all outputs are data.

pub mod preview;

pub use preview::{
    active_zoom, evaluate, simulate_playback, ActiveOverlays, PreviewFrame, PreviewSample,
    PreviewTransform,
};
