//! Recording-time click events.
//!
//! A [`ZoomEvent`] is what a click during capture leaves behind: when it
//! happened and where, already normalized to percent of the captured
//! surface. Events are kept in an append-only JSONL log so a crashed
//! session can still be turned into zoom regions.

use serde::{Deserialize, Serialize};

use crate::coords::PercentPoint;
use crate::timeline::ZoomRegion;

/// Milliseconds since recording start.
pub type TimestampMs = u64;

/// A single recorded click.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomEvent {
    /// Milliseconds since recording start.
    pub timestamp: TimestampMs,
    /// Horizontal position, percent of the captured surface.
    pub x: f64,
    /// Vertical position, percent of the captured surface.
    pub y: f64,
}

/// How a click becomes a zoom region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomParams {
    pub duration_secs: f64,
    pub scale: f64,
}

impl Default for ZoomParams {
    fn default() -> Self {
        Self {
            duration_secs: 4.0,
            scale: 1.5,
        }
    }
}

impl ZoomEvent {
    pub fn new(timestamp: TimestampMs, x: f64, y: f64) -> Self {
        Self { timestamp, x, y }
    }

    /// Timestamp as fractional seconds since recording start.
    pub fn timestamp_secs(&self) -> f64 {
        self.timestamp as f64 / 1_000.0
    }

    pub fn position(&self) -> PercentPoint {
        PercentPoint::new(self.x, self.y)
    }

    /// Convert to a zoom region over media of the given length.
    ///
    /// The end is clamped to `media_duration` and the centre into the
    /// frame. Returns `None` when the click landed at or after the end of
    /// the media (the capture stream stopped before the click was flushed).
    pub fn to_region(&self, media_duration: f64, params: ZoomParams) -> Option<ZoomRegion> {
        let start = self.timestamp_secs();
        if start >= media_duration {
            return None;
        }
        Some(ZoomRegion {
            start_time: start,
            end_time: (start + params.duration_secs).min(media_duration),
            scale: params.scale,
            center: self.position().clamped(),
        })
    }
}

/// Parse events from JSONL content (one JSON object per line).
pub fn parse_events(jsonl: &str) -> Result<Vec<ZoomEvent>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Serialize events to JSONL format.
pub fn serialize_events(events: &[ZoomEvent]) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    for event in events {
        output.push_str(&serde_json::to_string(event)?);
        output.push('\n');
    }
    Ok(output)
}
