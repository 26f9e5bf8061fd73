//! Live preview evaluation.
//!
//! Turns a timeline and a playback position into the transform the player
//! surface should show and the captions to draw over it. Runs on every
//! time-update of the player, so nothing here allocates.
//!
//! The transform is exact for a surface scaled about its visual centre
//! (CSS `transform-origin: center`) with `scale()` applied before
//! `translate()`. In that composition a translation of `50 - c` percent
//! moves point `c` to the middle of the viewport at any magnification.

use std::fmt;
use std::iter::FusedIterator;

use clipcast_project_model::{TextOverlay, TimelineModel, ZoomRegion};

/// Magnification and recentring applied to the player surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewTransform {
    pub scale: f64,
    pub translate_x_pct: f64,
    pub translate_y_pct: f64,
}

impl PreviewTransform {
    pub const IDENTITY: PreviewTransform = PreviewTransform {
        scale: 1.0,
        translate_x_pct: 0.0,
        translate_y_pct: 0.0,
    };

    /// The transform that puts a zoom region's centre in the middle of the
    /// viewport at the region's scale.
    pub fn for_region(region: &ZoomRegion) -> Self {
        Self {
            scale: region.scale,
            translate_x_pct: 50.0 - region.center.x,
            translate_y_pct: 50.0 - region.center.y,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// CSS `transform` value. Pair with `transform-origin: center`.
    pub fn to_css(&self) -> String {
        self.to_string()
    }
}

impl Default for PreviewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl fmt::Display for PreviewTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scale({}) translate({}%, {}%)",
            self.scale, self.translate_x_pct, self.translate_y_pct
        )
    }
}

/// Text overlays visible at one instant, in model order (later entries are
/// drawn on top). Borrows the model; iterating does not allocate.
#[derive(Debug, Clone)]
pub struct ActiveOverlays<'a> {
    overlays: std::slice::Iter<'a, TextOverlay>,
    time: f64,
}

impl<'a> ActiveOverlays<'a> {
    fn new(overlays: &'a [TextOverlay], time: f64) -> Self {
        Self {
            overlays: overlays.iter(),
            time,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clone().next().is_none()
    }
}

impl<'a> Iterator for ActiveOverlays<'a> {
    type Item = &'a TextOverlay;

    fn next(&mut self) -> Option<Self::Item> {
        let t = self.time;
        self.overlays.find(|o| o.contains(t))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.overlays.size_hint().1)
    }
}

impl FusedIterator for ActiveOverlays<'_> {}

/// What the player shows at one instant.
#[derive(Debug, Clone)]
pub struct PreviewFrame<'a> {
    pub time: f64,
    pub transform: PreviewTransform,
    /// Index into `zoom_regions` of the region in effect, if any.
    pub active_zoom: Option<usize>,
    pub active_overlays: ActiveOverlays<'a>,
}

/// The zoom region governing instant `t`: the first one in array order whose
/// closed interval contains `t`.
pub fn active_zoom(regions: &[ZoomRegion], t: f64) -> Option<(usize, &ZoomRegion)> {
    regions.iter().enumerate().find(|(_, r)| r.contains(t))
}

/// Evaluate the preview at playback position `current_time` (seconds of
/// source media).
///
/// A non-finite time matches nothing and yields the identity transform.
pub fn evaluate(model: &TimelineModel, current_time: f64) -> PreviewFrame<'_> {
    let (active_zoom, transform) = match active_zoom(model.zoom_regions(), current_time) {
        Some((index, region)) => (Some(index), PreviewTransform::for_region(region)),
        None => (None, PreviewTransform::IDENTITY),
    };
    PreviewFrame {
        time: current_time,
        transform,
        active_zoom,
        active_overlays: ActiveOverlays::new(model.text_overlays(), current_time),
    }
}

/// One sample of a simulated playback.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewSample {
    pub time_secs: f64,
    pub transform: PreviewTransform,
    pub overlay_count: usize,
}

/// Sample the preview across the trimmed range at a fixed rate, the way the
/// player would see it during playback.
pub fn simulate_playback(model: &TimelineModel, sample_rate_fps: f64) -> Vec<PreviewSample> {
    let sample_rate_fps = if sample_rate_fps.is_finite() {
        sample_rate_fps.max(1.0)
    } else {
        1.0
    };
    let step = 1.0 / sample_rate_fps;
    let trim = model.trim_range();
    let count = (trim.len() / step + 1e-9).floor() as usize + 1;

    (0..count)
        .map(|i| {
            let t = (trim.start + i as f64 * step).min(trim.end);
            let frame = evaluate(model, t);
            PreviewSample {
                time_secs: t,
                transform: frame.transform,
                overlay_count: frame.active_overlays.count(),
            }
        })
        .collect()
}
