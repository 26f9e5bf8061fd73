//! Frame compositor: what a compiled program burns into each frame.
//!
//! Reads the stage gates of a [`FilterGraphProgram`] directly, so the result
//! can be compared with the live preview without running the engine.

use clipcast_project_model::PercentPoint;

use crate::program::{FilterGraphProgram, StageOperation};

/// The zoom a compiled program applies at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomEffect {
    /// Index of the zoom region the enabled stage was compiled from.
    pub region: usize,
    pub scale: f64,
    pub center: PercentPoint,
}

/// A single frame's composition.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameComposition {
    /// Frame number in the exported media.
    pub frame_index: u64,

    /// Source-media time the frame is taken from.
    pub source_time_secs: f64,

    /// Enabled zoom, if any.
    pub zoom: Option<ZoomEffect>,

    /// Overlay indices drawn on this frame, bottom to top.
    pub text_overlays: Vec<usize>,
}

/// Every zoom stage enabled at source time `t`, in stage order.
pub fn enabled_zooms(program: &FilterGraphProgram, t: f64) -> Vec<ZoomEffect> {
    program
        .stages
        .iter()
        .filter_map(|stage| match &stage.operation {
            StageOperation::Zoom {
                region,
                scale,
                center,
                gate,
                ..
            } if gate.is_open(t) => Some(ZoomEffect {
                region: *region,
                scale: *scale,
                center: *center,
            }),
            _ => None,
        })
        .collect()
}

/// The zoom the program applies at source time `t`.
///
/// Gates are mutually exclusive, so this is the only enabled zoom stage
/// when there is one.
pub fn zoom_in_effect(program: &FilterGraphProgram, t: f64) -> Option<ZoomEffect> {
    enabled_zooms(program, t).into_iter().next()
}

/// Overlay indices whose draw-text stage is enabled at source time `t`.
pub fn text_in_effect(program: &FilterGraphProgram, t: f64) -> Vec<usize> {
    program
        .stages
        .iter()
        .filter_map(|stage| match &stage.operation {
            StageOperation::DrawText { overlay, gate, .. } if gate.is_open(t) => Some(*overlay),
            _ => None,
        })
        .collect()
}

/// Source-media range the program keeps.
pub fn trimmed_range(program: &FilterGraphProgram) -> Option<(f64, f64)> {
    program.stages.iter().find_map(|stage| match stage.operation {
        StageOperation::Trim { start, end } => Some((start, end)),
        _ => None,
    })
}

/// Compute the composition for each exported frame at `fps`.
pub fn compute_compositions(program: &FilterGraphProgram, fps: u32) -> Vec<FrameComposition> {
    let Some((start, end)) = trimmed_range(program) else {
        return Vec::new();
    };
    let fps = fps.max(1);
    let total_frames = ((end - start) * fps as f64).ceil() as u64;

    (0..total_frames)
        .map(|frame_index| {
            let t = start + frame_index as f64 / fps as f64;
            FrameComposition {
                frame_index,
                source_time_secs: t,
                zoom: zoom_in_effect(program, t),
                text_overlays: text_in_effect(program, t),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use clipcast_common::config::EncoderPresets;
    use clipcast_project_model::{ExportSettings, MediaSize, TimelineModel, ZoomRegion};

    use super::*;
    use crate::compiler::FilterGraphCompiler;

    #[test]
    fn test_compositions_follow_trim() {
        let mut model = TimelineModel::new(10.0, MediaSize::new(1280, 720)).unwrap();
        model.set_trim_range(2.0, 4.0).unwrap();
        model
            .add_zoom_region(ZoomRegion::new(3.0, 5.0, 2.0, PercentPoint::new(20.0, 80.0)))
            .unwrap();
        let program = FilterGraphCompiler::new(EncoderPresets::default())
            .compile(&model, &ExportSettings::default())
            .unwrap();

        let frames = compute_compositions(&program, 10);
        assert_eq!(frames.len(), 20);
        assert_eq!(frames[0].source_time_secs, 2.0);
        assert!(frames[0].zoom.is_none());
        let zoomed = frames[15].zoom.unwrap();
        assert_eq!(zoomed.region, 0);
        assert_eq!(zoomed.center, PercentPoint::new(20.0, 80.0));
    }
}
