use clipcast_processing_core::{evaluate, PreviewTransform};
use clipcast_project_model::{MediaSize, PercentPoint, TimelineModel, ZoomRegion};
use proptest::prelude::*;

fn transform(scale: f64, tx: f64, ty: f64) -> PreviewTransform {
    PreviewTransform {
        scale,
        translate_x_pct: tx,
        translate_y_pct: ty,
    }
}

#[test]
fn single_zoom_recentres_inside_its_window() {
    let mut model = TimelineModel::new(10.0, MediaSize::new(1920, 1080)).unwrap();
    model.set_trim_range(2.0, 8.0).unwrap();
    model
        .add_zoom_region(ZoomRegion::new(3.0, 5.0, 2.0, PercentPoint::new(50.0, 50.0)))
        .unwrap();

    let inside = evaluate(&model, 4.0);
    assert_eq!(inside.transform, transform(2.0, 0.0, 0.0));
    assert_eq!(inside.active_zoom, Some(0));

    let outside = evaluate(&model, 1.0);
    assert_eq!(outside.transform, PreviewTransform::IDENTITY);
    assert_eq!(outside.active_zoom, None);
}

#[test]
fn overlapping_zooms_first_in_array_order_wins() {
    let mut model = TimelineModel::new(10.0, MediaSize::new(1920, 1080)).unwrap();
    model
        .add_zoom_region(ZoomRegion::new(0.0, 4.0, 1.5, PercentPoint::new(20.0, 20.0)))
        .unwrap();
    model
        .add_zoom_region(ZoomRegion::new(2.0, 6.0, 2.0, PercentPoint::new(80.0, 80.0)))
        .unwrap();

    let contested = evaluate(&model, 3.0);
    assert_eq!(contested.transform, transform(1.5, 30.0, 30.0));
    assert_eq!(contested.active_zoom, Some(0));

    // Once the first region ends the second one governs.
    let later = evaluate(&model, 5.0);
    assert_eq!(later.transform, transform(2.0, -30.0, -30.0));
    assert_eq!(later.active_zoom, Some(1));
}

#[test]
fn region_boundaries_are_inclusive() {
    let mut model = TimelineModel::new(10.0, MediaSize::new(1280, 720)).unwrap();
    model
        .add_zoom_region(ZoomRegion::new(3.0, 5.0, 2.0, PercentPoint::CENTER))
        .unwrap();

    assert_eq!(evaluate(&model, 3.0).active_zoom, Some(0));
    assert_eq!(evaluate(&model, 5.0).active_zoom, Some(0));
    assert_eq!(evaluate(&model, 5.000_001).active_zoom, None);
}

proptest! {
    #[test]
    fn active_region_is_the_first_containing_one(
        spans in proptest::collection::vec((0.0f64..9.0, 0.1f64..5.0, 1.0f64..4.0), 0..8),
        t in 0.0f64..10.0,
    ) {
        let mut model = TimelineModel::new(10.0, MediaSize::new(1920, 1080)).unwrap();
        for (start, len, scale) in &spans {
            let end = (start + len).min(10.0);
            model
                .add_zoom_region(ZoomRegion::new(*start, end, *scale, PercentPoint::CENTER))
                .unwrap();
        }

        let frame = evaluate(&model, t);
        let expected = model
            .zoom_regions()
            .iter()
            .position(|r| r.start_time <= t && t <= r.end_time);
        prop_assert_eq!(frame.active_zoom, expected);
        match expected {
            Some(i) => prop_assert_eq!(frame.transform.scale, model.zoom_regions()[i].scale),
            None => prop_assert!(frame.transform.is_identity()),
        }
    }
}
