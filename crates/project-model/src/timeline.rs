//! The timeline model: every edit applied to one media item.
//!
//! All times are seconds of source media and all positions are percentages
//! of the intrinsic frame. The model is the single owner of edit state;
//! renderers only borrow it for the duration of one call.
//!
//! Fields are private. Every mutator checks the full invariant set for the
//! value it touches and either applies the edit or returns a
//! [`ValidationError`] with the model unchanged.

use serde::{Deserialize, Serialize};

use crate::coords::{MediaSize, PercentPoint};
use crate::validation::{self, Checked, ValidationError};

/// Length of a text overlay added at the playhead.
pub const DEFAULT_TEXT_DURATION_SECS: f64 = 5.0;

/// Exported sub-range of the source, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimRange {
    pub start: f64,
    pub end: f64,
}

impl TrimRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t <= self.end
    }
}

/// A crop rectangle in percent of the intrinsic frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRegion {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the region has any area (a drag still in progress may not).
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    fn check(&self) -> Checked {
        validation::percent("cropRegion.x", self.x)?;
        validation::percent("cropRegion.y", self.y)?;
        validation::positive("cropRegion.width", self.width)?;
        validation::positive("cropRegion.height", self.height)?;
        validation::extent("cropRegion.width", self.x, self.width)?;
        validation::extent("cropRegion.height", self.y, self.height)?;
        Ok(())
    }
}

/// A time-bound magnification around a centre point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomRegion {
    pub start_time: f64,
    pub end_time: f64,
    pub scale: f64,
    pub center: PercentPoint,
}

impl ZoomRegion {
    pub fn new(start_time: f64, end_time: f64, scale: f64, center: PercentPoint) -> Self {
        Self {
            start_time,
            end_time,
            scale,
            center,
        }
    }

    /// A region starting at the playhead, centred on the frame.
    ///
    /// The end is clamped to `duration`; a playhead at the very end of the
    /// media produces an empty region that the model will reject.
    pub fn at_playhead(t: f64, duration: f64, length_secs: f64, scale: f64) -> Self {
        Self {
            start_time: t,
            end_time: (t + length_secs).min(duration),
            scale,
            center: PercentPoint::CENTER,
        }
    }

    /// Inclusive on both ends, matching the `between(t, start, end)` gate.
    pub fn contains(&self, t: f64) -> bool {
        self.start_time <= t && t <= self.end_time
    }

    fn check(&self, index: usize, duration: f64) -> Checked {
        let prefix = format!("zoomRegions[{index}]");
        validation::time_span(&prefix, self.start_time, self.end_time, duration)?;
        validation::at_least(format!("{prefix}.scale"), self.scale, 1.0)?;
        validation::percent(format!("{prefix}.center.x"), self.center.x)?;
        validation::percent(format!("{prefix}.center.y"), self.center.y)?;
        Ok(())
    }
}

/// Partial update for a [`ZoomRegion`]; `None` fields are left as they are.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ZoomRegionPatch {
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub scale: Option<f64>,
    pub center: Option<PercentPoint>,
}

impl ZoomRegionPatch {
    fn apply(&self, region: &mut ZoomRegion) {
        if let Some(v) = self.start_time {
            region.start_time = v;
        }
        if let Some(v) = self.end_time {
            region.end_time = v;
        }
        if let Some(v) = self.scale {
            region.scale = v;
        }
        if let Some(v) = self.center {
            region.center = v;
        }
    }
}

/// Visual style of a text overlay. Colours and font names are passed to
/// both renderers verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub font_size: f64,
    pub color: String,
    pub background_color: String,
    pub font_weight: String,
    pub font_family: String,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 24.0,
            color: "#ffffff".to_string(),
            background_color: "rgba(0, 0, 0, 0.5)".to_string(),
            font_weight: "normal".to_string(),
            font_family: "Arial".to_string(),
        }
    }
}

impl TextStyle {
    /// Whether the weight asks for a bold face (`bold`, `bolder`, or 600+).
    pub fn is_bold(&self) -> bool {
        match self.font_weight.trim() {
            "bold" | "bolder" => true,
            other => other.parse::<u32>().map(|w| w >= 600).unwrap_or(false),
        }
    }
}

/// A time-bound caption drawn at a position in the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOverlay {
    pub text: String,
    pub position: PercentPoint,
    pub start_time: f64,
    pub end_time: f64,
    pub style: TextStyle,
}

impl TextOverlay {
    /// An overlay starting at the playhead with the default style.
    pub fn at_playhead(text: impl Into<String>, t: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            position: PercentPoint::CENTER,
            start_time: t,
            end_time: (t + DEFAULT_TEXT_DURATION_SECS).min(duration),
            style: TextStyle::default(),
        }
    }

    pub fn contains(&self, t: f64) -> bool {
        self.start_time <= t && t <= self.end_time
    }

    fn check(&self, index: usize, duration: f64) -> Checked {
        let prefix = format!("textOverlays[{index}]");
        if self.text.trim().is_empty() {
            return Err(ValidationError::EmptyText {
                field: format!("{prefix}.text"),
            });
        }
        validation::time_span(&prefix, self.start_time, self.end_time, duration)?;
        validation::percent(format!("{prefix}.position.x"), self.position.x)?;
        validation::percent(format!("{prefix}.position.y"), self.position.y)?;
        validation::positive(format!("{prefix}.style.fontSize"), self.style.font_size)?;
        Ok(())
    }
}

/// Partial update for a [`TextOverlay`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextOverlayPatch {
    pub text: Option<String>,
    pub position: Option<PercentPoint>,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub style: Option<TextStyle>,
}

impl TextOverlayPatch {
    fn apply(&self, overlay: &mut TextOverlay) {
        if let Some(v) = &self.text {
            overlay.text = v.clone();
        }
        if let Some(v) = self.position {
            overlay.position = v;
        }
        if let Some(v) = self.start_time {
            overlay.start_time = v;
        }
        if let Some(v) = self.end_time {
            overlay.end_time = v;
        }
        if let Some(v) = &self.style {
            overlay.style = v.clone();
        }
    }
}

/// All edit state for one media item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TimelineRecord", into = "TimelineRecord")]
pub struct TimelineModel {
    duration: f64,
    intrinsic_size: MediaSize,
    trim_range: TrimRange,
    crop_region: Option<CropRegion>,
    zoom_regions: Vec<ZoomRegion>,
    text_overlays: Vec<TextOverlay>,
}

impl TimelineModel {
    /// Bind a new, edit-free model to media of the given length and size.
    /// The trim range starts out covering the whole media.
    pub fn new(duration: f64, intrinsic_size: MediaSize) -> Result<Self, ValidationError> {
        validation::positive("duration", duration)?;
        Ok(Self {
            duration,
            intrinsic_size,
            trim_range: TrimRange::new(0.0, duration),
            crop_region: None,
            zoom_regions: Vec::new(),
            text_overlays: Vec::new(),
        })
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn intrinsic_size(&self) -> MediaSize {
        self.intrinsic_size
    }

    pub fn trim_range(&self) -> TrimRange {
        self.trim_range
    }

    pub fn crop_region(&self) -> Option<CropRegion> {
        self.crop_region
    }

    pub fn zoom_regions(&self) -> &[ZoomRegion] {
        &self.zoom_regions
    }

    pub fn text_overlays(&self) -> &[TextOverlay] {
        &self.text_overlays
    }

    // ---- trim ----

    pub fn set_trim_range(&mut self, start: f64, end: f64) -> Result<(), ValidationError> {
        let range = TrimRange::new(start, end);
        check_trim(range, self.duration)?;
        self.trim_range = range;
        Ok(())
    }

    /// Restore the trim range to the full media.
    pub fn reset_trim(&mut self) {
        self.trim_range = TrimRange::new(0.0, self.duration);
    }

    // ---- crop ----

    /// Apply or clear the crop. `None` always succeeds.
    pub fn set_crop_region(&mut self, region: Option<CropRegion>) -> Result<(), ValidationError> {
        if let Some(region) = &region {
            region.check()?;
        }
        self.crop_region = region;
        Ok(())
    }

    // ---- zoom ----

    /// Append a zoom region and return its index.
    pub fn add_zoom_region(&mut self, region: ZoomRegion) -> Result<usize, ValidationError> {
        let index = self.zoom_regions.len();
        region.check(index, self.duration)?;
        self.zoom_regions.push(region);
        Ok(index)
    }

    /// Append several zoom regions; either all are added or none.
    ///
    /// Returns the index range the new regions occupy.
    pub fn extend_zoom_regions<I>(&mut self, regions: I) -> Result<std::ops::Range<usize>, ValidationError>
    where
        I: IntoIterator<Item = ZoomRegion>,
    {
        let first = self.zoom_regions.len();
        let pending: Vec<ZoomRegion> = regions.into_iter().collect();
        for (offset, region) in pending.iter().enumerate() {
            region.check(first + offset, self.duration)?;
        }
        self.zoom_regions.extend(pending);
        Ok(first..self.zoom_regions.len())
    }

    pub fn update_zoom_region(
        &mut self,
        index: usize,
        patch: ZoomRegionPatch,
    ) -> Result<(), ValidationError> {
        let len = self.zoom_regions.len();
        let slot = self
            .zoom_regions
            .get_mut(index)
            .ok_or(ValidationError::IndexOutOfBounds {
                collection: "zoomRegions",
                index,
                len,
            })?;
        let mut updated = *slot;
        patch.apply(&mut updated);
        updated.check(index, self.duration)?;
        *slot = updated;
        Ok(())
    }

    pub fn remove_zoom_region(&mut self, index: usize) -> Result<ZoomRegion, ValidationError> {
        if index >= self.zoom_regions.len() {
            return Err(ValidationError::IndexOutOfBounds {
                collection: "zoomRegions",
                index,
                len: self.zoom_regions.len(),
            });
        }
        Ok(self.zoom_regions.remove(index))
    }

    // ---- text ----

    pub fn add_text_overlay(&mut self, overlay: TextOverlay) -> Result<usize, ValidationError> {
        let index = self.text_overlays.len();
        overlay.check(index, self.duration)?;
        self.text_overlays.push(overlay);
        Ok(index)
    }

    pub fn update_text_overlay(
        &mut self,
        index: usize,
        patch: TextOverlayPatch,
    ) -> Result<(), ValidationError> {
        let len = self.text_overlays.len();
        let slot = self
            .text_overlays
            .get_mut(index)
            .ok_or(ValidationError::IndexOutOfBounds {
                collection: "textOverlays",
                index,
                len,
            })?;
        let mut updated = slot.clone();
        patch.apply(&mut updated);
        updated.check(index, self.duration)?;
        *slot = updated;
        Ok(())
    }

    pub fn remove_text_overlay(&mut self, index: usize) -> Result<TextOverlay, ValidationError> {
        if index >= self.text_overlays.len() {
            return Err(ValidationError::IndexOutOfBounds {
                collection: "textOverlays",
                index,
                len: self.text_overlays.len(),
            });
        }
        Ok(self.text_overlays.remove(index))
    }

    /// Check every invariant of the model.
    ///
    /// Mutators keep these true already; this exists for state that came
    /// from outside (deserialization, hand-edited files).
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::positive("duration", self.duration)?;
        check_trim(self.trim_range, self.duration)?;
        if let Some(crop) = &self.crop_region {
            crop.check()?;
        }
        for (i, region) in self.zoom_regions.iter().enumerate() {
            region.check(i, self.duration)?;
        }
        for (i, overlay) in self.text_overlays.iter().enumerate() {
            overlay.check(i, self.duration)?;
        }
        Ok(())
    }
}

fn check_trim(range: TrimRange, duration: f64) -> Checked {
    validation::within("trimRange.start", range.start, 0.0, duration)?;
    validation::within("trimRange.end", range.end, 0.0, duration)?;
    if range.start >= range.end {
        return Err(ValidationError::EmptyRange {
            field: "trimRange".to_string(),
            start: range.start,
            end: range.end,
        });
    }
    Ok(())
}

/// On-disk shape of a timeline. Mirrors the model field for field; loading
/// goes through [`TimelineModel::validate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimelineRecord {
    duration: f64,
    intrinsic_size: MediaSize,
    trim_range: TrimRange,
    #[serde(default)]
    crop_region: Option<CropRegion>,
    #[serde(default)]
    zoom_regions: Vec<ZoomRegion>,
    #[serde(default)]
    text_overlays: Vec<TextOverlay>,
}

impl TryFrom<TimelineRecord> for TimelineModel {
    type Error = ValidationError;

    fn try_from(record: TimelineRecord) -> Result<Self, Self::Error> {
        let model = TimelineModel {
            duration: record.duration,
            intrinsic_size: record.intrinsic_size,
            trim_range: record.trim_range,
            crop_region: record.crop_region,
            zoom_regions: record.zoom_regions,
            text_overlays: record.text_overlays,
        };
        model.validate()?;
        Ok(model)
    }
}

impl From<TimelineModel> for TimelineRecord {
    fn from(model: TimelineModel) -> Self {
        Self {
            duration: model.duration,
            intrinsic_size: model.intrinsic_size,
            trim_range: model.trim_range,
            crop_region: model.crop_region,
            zoom_regions: model.zoom_regions,
            text_overlays: model.text_overlays,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> TimelineModel {
        TimelineModel::new(10.0, MediaSize::new(1920, 1080)).unwrap()
    }

    #[test]
    fn test_new_model_trims_full_duration() {
        let m = model();
        assert_eq!(m.trim_range(), TrimRange::new(0.0, 10.0));
        assert!(m.zoom_regions().is_empty());
        assert!(m.crop_region().is_none());
    }

    #[test]
    fn test_zero_duration_rejected() {
        let err = TimelineModel::new(0.0, MediaSize::new(1, 1)).unwrap_err();
        assert_eq!(err.field(), "duration");
    }

    #[test]
    fn test_trim_rejects_inverted_and_out_of_range() {
        let mut m = model();
        m.set_trim_range(2.0, 8.0).unwrap();

        let err = m.set_trim_range(8.0, 2.0).unwrap_err();
        assert!(matches!(err, ValidationError::EmptyRange { .. }));
        let err = m.set_trim_range(1.0, 11.0).unwrap_err();
        assert_eq!(err.field(), "trimRange.end");

        assert_eq!(m.trim_range(), TrimRange::new(2.0, 8.0));
        m.reset_trim();
        assert_eq!(m.trim_range(), TrimRange::new(0.0, 10.0));
    }

    #[test]
    fn test_crop_bounds() {
        let mut m = model();
        m.set_crop_region(Some(CropRegion::new(10.0, 10.0, 80.0, 50.0)))
            .unwrap();

        let err = m
            .set_crop_region(Some(CropRegion::new(50.0, 0.0, 60.0, 10.0)))
            .unwrap_err();
        assert!(matches!(err, ValidationError::RegionOverflow { .. }));
        let err = m
            .set_crop_region(Some(CropRegion::new(0.0, 0.0, 0.0, 10.0)))
            .unwrap_err();
        assert_eq!(err.field(), "cropRegion.width");

        assert_eq!(m.crop_region(), Some(CropRegion::new(10.0, 10.0, 80.0, 50.0)));
        m.set_crop_region(None).unwrap();
        assert!(m.crop_region().is_none());
    }

    #[test]
    fn test_zoom_scale_below_one_names_the_field() {
        let mut m = model();
        m.add_zoom_region(ZoomRegion::new(0.0, 1.0, 1.5, PercentPoint::CENTER))
            .unwrap();
        let err = m
            .add_zoom_region(ZoomRegion::new(1.0, 2.0, 0.5, PercentPoint::CENTER))
            .unwrap_err();
        assert_eq!(err.field(), "zoomRegions[1].scale");
        assert_eq!(m.zoom_regions().len(), 1);
    }

    #[test]
    fn test_update_zoom_region_is_atomic() {
        let mut m = model();
        m.add_zoom_region(ZoomRegion::new(1.0, 3.0, 2.0, PercentPoint::new(20.0, 30.0)))
            .unwrap();

        let bad = ZoomRegionPatch {
            scale: Some(3.0),
            end_time: Some(12.0),
            ..Default::default()
        };
        assert!(m.update_zoom_region(0, bad).is_err());
        assert_eq!(m.zoom_regions()[0].scale, 2.0);

        let good = ZoomRegionPatch {
            center: Some(PercentPoint::new(70.0, 70.0)),
            ..Default::default()
        };
        m.update_zoom_region(0, good).unwrap();
        assert_eq!(m.zoom_regions()[0].center, PercentPoint::new(70.0, 70.0));
        assert_eq!(m.zoom_regions()[0].start_time, 1.0);

        assert!(matches!(
            m.update_zoom_region(5, good),
            Err(ValidationError::IndexOutOfBounds { index: 5, len: 1, .. })
        ));
    }

    #[test]
    fn test_extend_zoom_regions_all_or_nothing() {
        let mut m = model();
        let batch = vec![
            ZoomRegion::new(1.0, 5.0, 1.5, PercentPoint::CENTER),
            ZoomRegion::new(9.0, 9.0, 1.5, PercentPoint::CENTER),
        ];
        let err = m.extend_zoom_regions(batch).unwrap_err();
        assert_eq!(err.field(), "zoomRegions[1]");
        assert!(m.zoom_regions().is_empty());

        let range = m
            .extend_zoom_regions(vec![
                ZoomRegion::new(1.0, 5.0, 1.5, PercentPoint::CENTER),
                ZoomRegion::new(1.2, 5.2, 1.5, PercentPoint::CENTER),
            ])
            .unwrap();
        assert_eq!(range, 0..2);
    }

    #[test]
    fn test_zoom_at_playhead_clamps_to_duration() {
        let region = ZoomRegion::at_playhead(9.0, 10.0, 2.0, 1.5);
        assert_eq!(region.end_time, 10.0);
        assert_eq!(region.center, PercentPoint::CENTER);
    }

    #[test]
    fn test_text_overlay_rules() {
        let mut m = model();
        let overlay = TextOverlay::at_playhead("Hello", 7.0, 10.0);
        assert_eq!(overlay.end_time, 10.0);
        m.add_text_overlay(overlay).unwrap();

        let err = m
            .update_text_overlay(
                0,
                TextOverlayPatch {
                    text: Some("   ".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.field(), "textOverlays[0].text");

        let mut style = TextStyle::default();
        style.font_size = 0.0;
        let err = m
            .update_text_overlay(
                0,
                TextOverlayPatch {
                    style: Some(style),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.field(), "textOverlays[0].style.fontSize");
        assert_eq!(m.text_overlays()[0].text, "Hello");

        let removed = m.remove_text_overlay(0).unwrap();
        assert_eq!(removed.text, "Hello");
        assert!(m.remove_text_overlay(0).is_err());
    }

    #[test]
    fn test_bold_weights() {
        let mut style = TextStyle::default();
        assert!(!style.is_bold());
        style.font_weight = "bold".into();
        assert!(style.is_bold());
        style.font_weight = "700".into();
        assert!(style.is_bold());
        style.font_weight = "400".into();
        assert!(!style.is_bold());
    }

    #[test]
    fn test_json_uses_camel_case() {
        let mut m = model();
        m.add_zoom_region(ZoomRegion::new(3.0, 5.0, 2.0, PercentPoint::CENTER))
            .unwrap();
        let value = serde_json::to_value(&m).unwrap();
        assert!(value.get("trimRange").is_some());
        assert!(value.get("intrinsicSize").is_some());
        assert_eq!(value["zoomRegions"][0]["startTime"], 3.0);
    }

    #[test]
    fn test_loading_revalidates() {
        let json = r#"{
            "duration": 10.0,
            "intrinsicSize": {"width": 1920, "height": 1080},
            "trimRange": {"start": 6.0, "end": 4.0}
        }"#;
        let err = serde_json::from_str::<TimelineModel>(json).unwrap_err();
        assert!(err.to_string().contains("trimRange"));
    }
}
