//! Export orchestration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use clipcast_common::config::EncoderPresets;
use clipcast_common::error::{ConcurrentExportError, TranscodeError};
use clipcast_project_model::{ExportFormat, ExportSettings, TimelineModel, ValidationError};
use tokio::sync::watch;

use crate::compiler::{FilterGraphCompiler, InvalidTimelineError};
use crate::engine::{TranscodeEngine, TranscodeJob};

/// Source media handed to an export.
#[derive(Debug, Clone)]
pub struct ExportSource {
    /// Encoded source bytes.
    pub data: Vec<u8>,
    pub mime_type: String,
    /// Whether the source carries an audio track.
    pub has_audio: bool,
}

impl ExportSource {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>, has_audio: bool) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
            has_audio,
        }
    }
}

/// Export progress report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportProgress {
    /// Percent complete, [0, 100]. Never decreases within one export.
    pub percent: f64,

    /// Current stage.
    pub stage: ExportStage,
}

/// Stages of the export process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Preparing,
    Encoding,
    Complete,
}

/// A finished export.
#[derive(Debug, Clone)]
pub struct ExportOutput {
    pub bytes: Vec<u8>,
    pub format: ExportFormat,
    pub width: u32,
    pub height: u32,
    /// Signature of the program that produced `bytes`.
    pub program_signature: u64,
}

impl ExportOutput {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Timeline failed validation: {0}")]
    Validation(#[from] ValidationError),

    #[error("Timeline cannot be compiled: {0}")]
    InvalidTimeline(#[from] InvalidTimelineError),

    #[error(transparent)]
    Transcode(#[from] TranscodeError),

    #[error(transparent)]
    ConcurrentExport(#[from] ConcurrentExportError),

    #[error("Source media is empty")]
    EmptySource,

    #[error("Export cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Runs exports for one timeline, at most one at a time.
///
/// Progress reaches the callback in non-decreasing order. Engine failures
/// are returned as-is; nothing is retried.
pub struct ExportOrchestrator<E: TranscodeEngine> {
    engine: E,
    compiler: FilterGraphCompiler,
    in_flight: AtomicBool,
    cancel: watch::Sender<u64>,
}

impl<E: TranscodeEngine> ExportOrchestrator<E> {
    pub fn new(engine: E, presets: EncoderPresets) -> Self {
        let (cancel, _) = watch::channel(0);
        Self {
            engine,
            compiler: FilterGraphCompiler::new(presets),
            in_flight: AtomicBool::new(false),
            cancel,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Whether an export is currently running.
    pub fn is_exporting(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Cancel the export in flight, if any. The engine work is abandoned and
    /// its staged files released; no further progress is reported.
    pub fn cancel(&self) {
        self.cancel.send_modify(|generation| *generation += 1);
    }

    /// Export `model` with `settings`, returning the encoded bytes.
    pub async fn export<F>(
        &self,
        model: &TimelineModel,
        settings: &ExportSettings,
        source: &ExportSource,
        on_progress: F,
    ) -> Result<ExportOutput, ExportError>
    where
        F: Fn(ExportProgress) + Send + Sync,
    {
        let _guard = InFlightGuard::acquire(&self.in_flight)?;
        let mut cancelled = self.cancel.subscribe();

        tracing::info!(
            format = %settings.format,
            resolution = %settings.resolution,
            quality = %settings.quality,
            engine = self.engine.name(),
            "Starting export"
        );

        model.validate()?;
        if source.data.is_empty() {
            return Err(ExportError::EmptySource);
        }
        let program = self
            .compiler
            .clone()
            .with_source_audio(source.has_audio)
            .compile(model, settings)?;
        tracing::debug!(filter_complex = %program.filter_complex(), "Export program");

        // Rejected timelines report no progress at all.
        let relay = ProgressRelay::new(on_progress);
        relay.report(0.0, ExportStage::Preparing);

        let job = TranscodeJob {
            input: &source.data,
            input_mime: &source.mime_type,
            program: &program,
        };
        let engine_progress = |percent: f64| relay.report(percent, ExportStage::Encoding);

        let bytes = tokio::select! {
            result = self.engine.transcode(job, &engine_progress) => result.map_err(|e| {
                tracing::error!(error = %e, "Export failed");
                ExportError::from(e)
            })?,
            _ = cancelled.changed() => {
                tracing::info!("Export cancelled");
                return Err(ExportError::Cancelled);
            }
        };

        relay.report(100.0, ExportStage::Complete);
        tracing::info!(bytes = bytes.len(), "Export complete");

        Ok(ExportOutput {
            bytes,
            format: settings.format,
            width: program.output.width,
            height: program.output.height,
            program_signature: program.signature(),
        })
    }
}

/// Marks the orchestrator busy for the lifetime of one export.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, ConcurrentExportError> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| Self(flag))
            .map_err(|_| ConcurrentExportError)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Clamps and forwards progress, dropping anything below the last value sent.
struct ProgressRelay<F> {
    callback: F,
    last: Mutex<Option<f64>>,
}

impl<F: Fn(ExportProgress)> ProgressRelay<F> {
    fn new(callback: F) -> Self {
        Self {
            callback,
            last: Mutex::new(None),
        }
    }

    fn report(&self, percent: f64, stage: ExportStage) {
        if percent.is_nan() {
            return;
        }
        let percent = percent.clamp(0.0, 100.0);
        {
            let Ok(mut last) = self.last.lock() else {
                return;
            };
            if last.is_some_and(|prev| percent < prev) {
                return;
            }
            *last = Some(percent);
        }
        (self.callback)(ExportProgress { percent, stage });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_progress_relay_is_monotonic() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let relay = ProgressRelay::new(move |p: ExportProgress| sink.lock().unwrap().push(p.percent));
        for value in [0.0, 10.0, 5.0, f64::NAN, 10.0, 150.0, 99.0] {
            relay.report(value, ExportStage::Encoding);
        }
        assert_eq!(*seen.lock().unwrap(), vec![0.0, 10.0, 10.0, 100.0]);
    }

    #[test]
    fn test_in_flight_guard_releases_on_drop() {
        let flag = AtomicBool::new(false);
        {
            let _guard = InFlightGuard::acquire(&flag).unwrap();
            assert!(InFlightGuard::acquire(&flag).is_err());
        }
        assert!(InFlightGuard::acquire(&flag).is_ok());
    }
}
