//! The zoom capture session.

use std::ops::Range;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clipcast_common::clock::{ManualClock, TimeSource};
use clipcast_common::config::CaptureDefaults;
use clipcast_common::error::ClipcastError;
use clipcast_project_model::coords::{DisplayGeometry, PercentPoint};
use clipcast_project_model::event::{TimestampMs, ZoomEvent, ZoomParams};
use clipcast_project_model::timeline::{TimelineModel, ZoomRegion};
use clipcast_project_model::validation::ValidationError;
use tokio::sync::mpsc;

use crate::writer::{CaptureLogHeader, EventWriter};

/// State of a zoom capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// Created, not yet recording.
    Idle,
    /// Clicks are being accepted.
    Recording,
    /// Recording ended; regions have been handed to the timeline.
    Stopped,
}

/// Errors raised by a capture session.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Cannot {action} while {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: CaptureState,
    },

    #[error("Click log error: {0}")]
    Log(#[from] ClipcastError),

    #[error("Captured zoom regions rejected by the timeline: {0}")]
    Timeline(#[from] ValidationError),
}

/// A click as delivered by the platform, in pointer units, together with
/// the geometry of the surface it landed on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerClick {
    pub x: f64,
    pub y: f64,
    pub surface: DisplayGeometry,
}

/// Zoom parameters configured for recording-time capture.
pub fn zoom_params(defaults: &CaptureDefaults) -> ZoomParams {
    ZoomParams {
        duration_secs: defaults.zoom_duration_secs,
        scale: defaults.zoom_scale,
    }
}

/// Collects clicks while recording and turns them into zoom regions when
/// recording stops.
///
/// Clicks are never merged or deduplicated; rapid clicks produce
/// overlapping regions and the renderers decide which one governs.
pub struct ZoomCapture<C: TimeSource> {
    clock: C,
    params: ZoomParams,
    state: CaptureState,
    started_at_ms: u64,
    events: Vec<ZoomEvent>,
    log: Option<EventWriter>,
    stop_flag: Arc<AtomicBool>,
}

impl<C: TimeSource> ZoomCapture<C> {
    pub fn new(clock: C, params: ZoomParams) -> Self {
        Self {
            clock,
            params,
            state: CaptureState::Idle,
            started_at_ms: 0,
            events: Vec::new(),
            log: None,
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Mirror every accepted click to a JSONL log at `path`.
    pub fn with_event_log(mut self, path: PathBuf, epoch_wall: &str) -> Result<Self, CaptureError> {
        let header = CaptureLogHeader {
            schema_version: "1.0".to_string(),
            epoch_wall: epoch_wall.to_string(),
            zoom_duration_secs: self.params.duration_secs,
            zoom_scale: self.params.scale,
        };
        self.log = Some(EventWriter::new(path, &header)?);
        Ok(self)
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn params(&self) -> ZoomParams {
        self.params
    }

    /// Replace the zoom parameters applied when recording stops.
    pub fn set_params(&mut self, params: ZoomParams) -> Result<(), CaptureError> {
        if self.state == CaptureState::Stopped {
            return Err(CaptureError::InvalidTransition {
                action: "change zoom parameters",
                state: self.state,
            });
        }
        self.params = params;
        Ok(())
    }

    /// Clicks accepted so far, in arrival order.
    pub fn events(&self) -> &[ZoomEvent] {
        &self.events
    }

    /// Flag that makes [`ZoomCapture::listen`] return.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// Begin accepting clicks. Timestamps count from this call.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.state != CaptureState::Idle {
            return Err(CaptureError::InvalidTransition {
                action: "start",
                state: self.state,
            });
        }
        self.started_at_ms = self.clock.elapsed_ms();
        self.state = CaptureState::Recording;
        tracing::info!("Zoom capture started");
        Ok(())
    }

    /// Record a click at the current time.
    ///
    /// Returns `None` when the click was not accepted: the session is not
    /// recording, or the surface has no area.
    pub fn record_click(
        &mut self,
        pointer_x: f64,
        pointer_y: f64,
        surface: &DisplayGeometry,
    ) -> Result<Option<ZoomEvent>, CaptureError> {
        if self.state != CaptureState::Recording {
            tracing::debug!(state = ?self.state, "Ignoring click outside recording");
            return Ok(None);
        }
        if surface.element.is_degenerate() {
            tracing::warn!("Ignoring click on a zero-sized capture surface");
            return Ok(None);
        }
        let elapsed = self.clock.elapsed_ms().saturating_sub(self.started_at_ms);
        let point = surface.to_normalized(pointer_x, pointer_y);
        self.accept(elapsed, point).map(Some)
    }

    /// Record a click with an explicit timestamp and an already normalized
    /// position. Used to replay click logs.
    pub fn record_click_at(
        &mut self,
        timestamp: TimestampMs,
        point: PercentPoint,
    ) -> Result<Option<ZoomEvent>, CaptureError> {
        if self.state != CaptureState::Recording {
            return Ok(None);
        }
        self.accept(timestamp, point.clamped()).map(Some)
    }

    fn accept(
        &mut self,
        timestamp: TimestampMs,
        point: PercentPoint,
    ) -> Result<ZoomEvent, CaptureError> {
        let event = ZoomEvent::new(timestamp, point.x, point.y);
        if let Some(log) = self.log.as_mut() {
            log.write_event(&event)?;
        }
        self.events.push(event);
        tracing::debug!(t_ms = timestamp, x = point.x, y = point.y, "Click captured");
        Ok(event)
    }

    /// Accept clicks from a channel until it closes or the stop flag is set.
    ///
    /// Returns the number of clicks accepted by this call.
    pub async fn listen(
        &mut self,
        clicks: &mut mpsc::Receiver<PointerClick>,
    ) -> Result<usize, CaptureError> {
        if self.state != CaptureState::Recording {
            return Err(CaptureError::InvalidTransition {
                action: "listen",
                state: self.state,
            });
        }

        let mut accepted = 0;
        while !self.stop_flag.load(Ordering::Relaxed) {
            let next = tokio::time::timeout(std::time::Duration::from_millis(50), clicks.recv());
            match next.await {
                Ok(Some(click)) => {
                    if self.record_click(click.x, click.y, &click.surface)?.is_some() {
                        accepted += 1;
                    }
                }
                Ok(None) => break,
                // Poll the stop flag again.
                Err(_) => {}
            }
        }
        Ok(accepted)
    }

    /// The regions the accepted clicks turn into over media of the given
    /// length, in timestamp order.
    pub fn regions(&self, media_duration: f64) -> Vec<ZoomRegion> {
        let mut ordered = self.events.clone();
        ordered.sort_by_key(|e| e.timestamp);
        ordered
            .iter()
            .filter_map(|event| {
                let region = event.to_region(media_duration, self.params);
                if region.is_none() {
                    tracing::warn!(
                        t_ms = event.timestamp,
                        media_duration,
                        "Dropping click past the end of the media"
                    );
                }
                region
            })
            .collect()
    }

    /// Stop recording and append one zoom region per click to `model`.
    ///
    /// Returns the indices of the inserted regions. The insertion is atomic:
    /// if any region is rejected none are added and the session keeps
    /// recording with its clicks, so `stop` can be retried after
    /// [`ZoomCapture::set_params`].
    pub fn stop(&mut self, model: &mut TimelineModel) -> Result<Range<usize>, CaptureError> {
        if self.state != CaptureState::Recording {
            return Err(CaptureError::InvalidTransition {
                action: "stop",
                state: self.state,
            });
        }
        if let Some(log) = self.log.as_mut() {
            log.flush()?;
        }

        let regions = self.regions(model.duration());
        let inserted = model.extend_zoom_regions(regions)?;
        self.state = CaptureState::Stopped;
        self.stop_flag.store(true, Ordering::SeqCst);
        tracing::info!(
            clicks = self.events.len(),
            regions = inserted.len(),
            "Zoom capture stopped"
        );
        Ok(inserted)
    }
}

/// Rebuild zoom regions from clicks captured in an earlier session, such as
/// a click log recovered after a crash.
pub fn replay_clicks(
    events: &[ZoomEvent],
    params: ZoomParams,
    model: &mut TimelineModel,
) -> Result<Range<usize>, CaptureError> {
    let mut capture = ZoomCapture::new(ManualClock::default(), params);
    capture.start()?;
    for event in events {
        capture.record_click_at(event.timestamp, event.position())?;
    }
    capture.stop(model)
}
