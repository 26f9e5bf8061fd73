//! Clipcast Input Tracker
//!
//! Turns clicks made while recording into zoom regions. A session moves
//! `Idle -> Recording -> Stopped`:
//!
//! - **Recording:** every click on the capture surface is normalized to
//!   percent of the media frame and stored as a timestamped
//!   [`ZoomEvent`](clipcast_project_model::event::ZoomEvent), optionally
//!   mirrored to an append-only JSONL log for crash safety.
//! - **Stopped:** each click becomes one fixed-length zoom region, inserted
//!   into the timeline in timestamp order.

pub mod capture;
pub mod writer;

pub use capture::{
    replay_clicks, zoom_params, CaptureError, CaptureState, PointerClick, ZoomCapture,
};
pub use writer::{CaptureLogHeader, EventWriter};
