//! Coordinate normalization between the displayed element and media space.
//!
//! Three coordinate systems meet here:
//! - **Element space:** pointer pixels relative to the page/window, with the
//!   displayed element's bounding box in the same units.
//! - **Intrinsic space:** pixels of the decoded media.
//! - **Normalized space:** percentages `[0, 100]` of the intrinsic frame.
//!   Everything stored in the timeline uses this space.

use serde::{Deserialize, Serialize};

use crate::timeline::CropRegion;

/// A point in normalized media space, both axes in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentPoint {
    pub x: f64,
    pub y: f64,
}

impl PercentPoint {
    /// Centre of the frame.
    pub const CENTER: PercentPoint = PercentPoint { x: 50.0, y: 50.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Clamp both axes into `[0, 100]`; non-finite axes collapse to 0.
    pub fn clamped(self) -> Self {
        Self {
            x: clamp_percent(self.x),
            y: clamp_percent(self.y),
        }
    }
}

impl Default for PercentPoint {
    fn default() -> Self {
        Self::CENTER
    }
}

/// Bounding box of the displayed element, in the same units as pointer
/// coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Whether the box has no usable area (zero, negative or non-finite size).
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }
}

/// Intrinsic pixel dimensions of the media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaSize {
    pub width: u32,
    pub height: u32,
}

impl MediaSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height.max(1) as f64
    }
}

/// How the element lays the media out inside its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMode {
    /// Letterboxed, aspect preserved (what a video element does by default).
    #[default]
    Contain,
    /// Stretched to the full element box.
    Fill,
}

/// Everything needed to map between pointer and media coordinates for one
/// displayed element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayGeometry {
    pub element: ElementRect,
    pub intrinsic: MediaSize,
    pub fit: FitMode,
}

impl DisplayGeometry {
    pub fn new(element: ElementRect, intrinsic: MediaSize) -> Self {
        Self {
            element,
            intrinsic,
            fit: FitMode::Contain,
        }
    }

    pub fn with_fit(mut self, fit: FitMode) -> Self {
        self.fit = fit;
        self
    }

    /// The rectangle inside the element actually covered by media pixels.
    pub fn content_rect(&self) -> ElementRect {
        let el = self.element;
        if self.fit == FitMode::Fill || self.intrinsic.is_empty() || el.is_degenerate() {
            return el;
        }

        let scale = (el.width / self.intrinsic.width as f64)
            .min(el.height / self.intrinsic.height as f64);
        let width = self.intrinsic.width as f64 * scale;
        let height = self.intrinsic.height as f64 * scale;
        ElementRect {
            left: el.left + (el.width - width) / 2.0,
            top: el.top + (el.height - height) / 2.0,
            width,
            height,
        }
    }

    /// Pointer coordinates to normalized percentages.
    ///
    /// Points outside the content are clamped to the nearest edge. A zero-sized
    /// element yields `(0, 0)`.
    pub fn to_normalized(&self, pointer_x: f64, pointer_y: f64) -> PercentPoint {
        let content = self.content_rect();
        if content.is_degenerate() {
            return PercentPoint::new(0.0, 0.0);
        }
        PercentPoint {
            x: clamp_percent((pointer_x - content.left) / content.width * 100.0),
            y: clamp_percent((pointer_y - content.top) / content.height * 100.0),
        }
    }

    /// Normalized percentages back to pointer coordinates.
    pub fn to_element_space(&self, point: PercentPoint) -> (f64, f64) {
        let content = self.content_rect();
        if content.is_degenerate() {
            return (content.left, content.top);
        }
        let p = point.clamped();
        (
            content.left + p.x / 100.0 * content.width,
            content.top + p.y / 100.0 * content.height,
        )
    }
}

/// Normalize a pointer position against an element showing media of the
/// given intrinsic size with the default (contain) fit.
pub fn to_normalized(
    pointer_x: f64,
    pointer_y: f64,
    element: ElementRect,
    intrinsic: MediaSize,
) -> PercentPoint {
    DisplayGeometry::new(element, intrinsic).to_normalized(pointer_x, pointer_y)
}

/// Inverse of [`to_normalized`].
pub fn to_element_space(
    point: PercentPoint,
    element: ElementRect,
    intrinsic: MediaSize,
) -> (f64, f64) {
    DisplayGeometry::new(element, intrinsic).to_element_space(point)
}

/// Build a crop region from the two corners of a drag gesture.
///
/// Both corners are already normalized; the result is clamped into the
/// frame, so a drag that leaves the element still yields a usable region.
/// The region may have zero area while the drag is in progress.
pub fn crop_from_drag(anchor: PercentPoint, current: PercentPoint) -> CropRegion {
    let a = anchor.clamped();
    let b = current.clamped();
    let x = a.x.min(b.x);
    let y = a.y.min(b.y);
    CropRegion {
        x,
        y,
        width: (a.x - b.x).abs().min(100.0 - x),
        height: (a.y - b.y).abs().min(100.0 - y),
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}
