//! Clipcast Render Engine
//!
//! Compiles an edited timeline into an ffmpeg filter-graph program and runs
//! it through a transcoding engine.
//!
//! # Pipeline Architecture
//!
//! ```text
//! source ──> Crop ──> Fit ──> Zoom (gated, one per region)
//!                                  │
//!                                  ├── DrawText (gated, one per overlay)
//!                                  │
//!                                  ├── Trim (source time ends here)
//!                                  ▼
//!                      Encode (H.264 / palette GIF)
//!                                  │
//!                                  ▼
//!                             output bytes
//! ```
//!
//! [`compositor`] reads the compiled gates back so a program can be checked
//! against the live preview without running the engine.

pub mod compiler;
pub mod compositor;
pub mod engine;
pub mod export;
pub mod program;

pub use compiler::{ffmpeg_color, FilterGraphCompiler, InvalidTimelineError};
pub use engine::{FfmpegEngine, MediaProbe, TranscodeEngine, TranscodeJob};
pub use export::*;
pub use program::{FilterGraphProgram, Pad, Stage, StageOperation};
