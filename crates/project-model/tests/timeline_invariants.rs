//! Property tests for timeline edits.

use clipcast_project_model::{
    crop_from_drag, to_normalized, CropRegion, ElementRect, MediaSize, PercentPoint, TextOverlay,
    TextOverlayPatch, TimelineModel, ZoomRegion, ZoomRegionPatch,
};
use proptest::prelude::*;

const DURATION: f64 = 20.0;

#[derive(Debug, Clone)]
enum Edit {
    Trim(f64, f64),
    Crop(f64, f64, f64, f64),
    ClearCrop,
    AddZoom(f64, f64, f64, f64, f64),
    PatchZoom(usize, Option<f64>, Option<f64>, Option<f64>),
    RemoveZoom(usize),
    AddText(f64, f64, f64),
    PatchText(usize, Option<f64>, Option<f64>),
}

fn time() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => -2.0f64..(DURATION + 2.0),
        1 => Just(f64::NAN),
        1 => Just(DURATION),
    ]
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (time(), time()).prop_map(|(s, e)| Edit::Trim(s, e)),
        (-5.0f64..105.0, -5.0f64..105.0, -5.0f64..105.0, -5.0f64..105.0)
            .prop_map(|(x, y, w, h)| Edit::Crop(x, y, w, h)),
        Just(Edit::ClearCrop),
        (time(), time(), 0.5f64..6.0, -5.0f64..105.0, -5.0f64..105.0)
            .prop_map(|(s, e, k, x, y)| Edit::AddZoom(s, e, k, x, y)),
        (
            0usize..6,
            proptest::option::of(time()),
            proptest::option::of(time()),
            proptest::option::of(0.5f64..6.0)
        )
            .prop_map(|(i, s, e, k)| Edit::PatchZoom(i, s, e, k)),
        (0usize..6).prop_map(Edit::RemoveZoom),
        (time(), time(), -5.0f64..105.0).prop_map(|(s, e, x)| Edit::AddText(s, e, x)),
        (
            0usize..6,
            proptest::option::of(time()),
            proptest::option::of(time())
        )
            .prop_map(|(i, s, e)| Edit::PatchText(i, s, e)),
    ]
}

/// Apply one edit, reporting whether it was accepted.
fn apply(model: &mut TimelineModel, edit: &Edit) -> bool {
    match *edit {
        Edit::Trim(s, e) => model.set_trim_range(s, e).is_ok(),
        Edit::Crop(x, y, w, h) => model
            .set_crop_region(Some(CropRegion::new(x, y, w, h)))
            .is_ok(),
        Edit::ClearCrop => model.set_crop_region(None).is_ok(),
        Edit::AddZoom(s, e, k, x, y) => model
            .add_zoom_region(ZoomRegion::new(s, e, k, PercentPoint::new(x, y)))
            .is_ok(),
        Edit::PatchZoom(i, s, e, k) => model
            .update_zoom_region(
                i,
                ZoomRegionPatch {
                    start_time: s,
                    end_time: e,
                    scale: k,
                    center: None,
                },
            )
            .is_ok(),
        Edit::RemoveZoom(i) => model.remove_zoom_region(i).is_ok(),
        Edit::AddText(s, e, x) => {
            let mut overlay = TextOverlay::at_playhead("caption", s, DURATION);
            overlay.end_time = e;
            overlay.position.x = x;
            model.add_text_overlay(overlay).is_ok()
        }
        Edit::PatchText(i, s, e) => model
            .update_text_overlay(
                i,
                TextOverlayPatch {
                    start_time: s,
                    end_time: e,
                    ..Default::default()
                },
            )
            .is_ok(),
    }
}

proptest! {
    #[test]
    fn trim_invariant_holds_after_any_edit_sequence(edits in proptest::collection::vec(edit(), 0..40)) {
        let mut model = TimelineModel::new(DURATION, MediaSize::new(1920, 1080)).unwrap();
        for edit in &edits {
            apply(&mut model, edit);
            let trim = model.trim_range();
            prop_assert!(0.0 <= trim.start);
            prop_assert!(trim.start < trim.end);
            prop_assert!(trim.end <= model.duration());
            prop_assert!(model.validate().is_ok());
        }
    }

    #[test]
    fn rejected_edits_leave_the_model_unchanged(edits in proptest::collection::vec(edit(), 1..40)) {
        let mut model = TimelineModel::new(DURATION, MediaSize::new(1280, 720)).unwrap();
        for edit in &edits {
            let before = model.clone();
            if !apply(&mut model, edit) {
                prop_assert_eq!(&model, &before);
            }
        }
    }

    #[test]
    fn serialization_round_trips(edits in proptest::collection::vec(edit(), 0..30)) {
        let mut model = TimelineModel::new(DURATION, MediaSize::new(854, 480)).unwrap();
        for edit in &edits {
            apply(&mut model, edit);
        }
        let json = serde_json::to_string(&model).unwrap();
        let reloaded: TimelineModel = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(reloaded, model);
    }

    #[test]
    fn normalized_points_stay_in_frame(
        px in -5_000.0f64..5_000.0,
        py in -5_000.0f64..5_000.0,
        w in 0.0f64..3_000.0,
        h in 0.0f64..3_000.0,
        mw in 0u32..4_000,
        mh in 0u32..4_000,
    ) {
        let p = to_normalized(px, py, ElementRect::new(10.0, 20.0, w, h), MediaSize::new(mw, mh));
        prop_assert!((0.0..=100.0).contains(&p.x));
        prop_assert!((0.0..=100.0).contains(&p.y));
    }

    #[test]
    fn crop_drag_is_always_inside_the_frame(
        ax in -50.0f64..150.0,
        ay in -50.0f64..150.0,
        bx in -50.0f64..150.0,
        by in -50.0f64..150.0,
    ) {
        let crop = crop_from_drag(PercentPoint::new(ax, ay), PercentPoint::new(bx, by));
        prop_assert!(crop.x >= 0.0 && crop.y >= 0.0);
        prop_assert!(crop.width >= 0.0 && crop.height >= 0.0);
        prop_assert!(crop.x + crop.width <= 100.0 + 1e-9);
        prop_assert!(crop.y + crop.height <= 100.0 + 1e-9);
    }
}
