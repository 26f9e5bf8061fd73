//! Append-only click log for crash-safe capture.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clipcast_common::error::{ClipcastError, ClipcastResult};
use clipcast_project_model::event::ZoomEvent;
use serde::{Deserialize, Serialize};

/// First line of a click log, written as a `#` comment so event parsers
/// skip it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureLogHeader {
    /// Schema version for forward compatibility.
    pub schema_version: String,

    /// Wall-clock time at recording start (ISO 8601).
    pub epoch_wall: String,

    /// Zoom length applied when the log is turned into regions.
    pub zoom_duration_secs: f64,

    /// Zoom scale applied when the log is turned into regions.
    pub zoom_scale: f64,
}

/// Writes clicks to a JSONL file in append-only mode.
pub struct EventWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    events_written: u64,
}

impl EventWriter {
    /// Create a new event writer, writing the header as the first line.
    pub fn new(path: PathBuf, header: &CaptureLogHeader) -> ClipcastResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;

        let mut writer = BufWriter::new(file);
        let header_json = serde_json::to_string(header)?;
        writeln!(writer, "# {header_json}")
            .map_err(|e| ClipcastError::capture(format!("Failed to write header: {e}")))?;

        Ok(Self {
            writer,
            path,
            events_written: 0,
        })
    }

    /// Write a single click and flush it.
    ///
    /// Clicks are rare compared to pointer motion, so every line goes to
    /// disk immediately.
    pub fn write_event(&mut self, event: &ZoomEvent) -> ClipcastResult<()> {
        let json = serde_json::to_string(event)?;
        writeln!(self.writer, "{json}")
            .map_err(|e| ClipcastError::capture(format!("Failed to write event: {e}")))?;
        self.events_written += 1;
        self.flush()
    }

    /// Flush buffered writes to disk.
    pub fn flush(&mut self) -> ClipcastResult<()> {
        self.writer
            .flush()
            .map_err(|e| ClipcastError::capture(format!("Failed to flush events: {e}")))
    }

    /// Number of events written.
    pub fn events_written(&self) -> u64 {
        self.events_written
    }

    /// Path to the output file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl Drop for EventWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
