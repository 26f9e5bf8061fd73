//! Compiled programs: golden text, determinism, degenerate timelines, and
//! agreement with the live preview.

use std::collections::HashMap;

use clipcast_common::config::EncoderPresets;
use clipcast_processing_core::evaluate;
use clipcast_project_model::{
    ExportFormat, ExportQuality, ExportResolution, ExportSettings, MediaSize, PercentPoint,
    TextOverlay, TimelineModel, ZoomRegion,
};
use clipcast_render_engine::compositor::{enabled_zooms, text_in_effect, zoom_in_effect};
use clipcast_render_engine::{FilterGraphCompiler, InvalidTimelineError};
use proptest::prelude::*;

fn compiler() -> FilterGraphCompiler {
    FilterGraphCompiler::new(EncoderPresets::default())
}

fn medium_video() -> ExportSettings {
    ExportSettings::new(
        ExportFormat::Video,
        ExportResolution::Medium,
        ExportQuality::Medium,
    )
}

fn golden_model() -> TimelineModel {
    let mut model = TimelineModel::new(10.0, MediaSize::new(1920, 1080)).unwrap();
    model.set_trim_range(1.0, 9.0).unwrap();
    model
        .add_zoom_region(ZoomRegion::new(2.0, 4.0, 2.0, PercentPoint::new(25.0, 75.0)))
        .unwrap();
    let mut caption = TextOverlay::at_playhead("Hi", 0.0, 10.0);
    caption.position = PercentPoint::new(10.0, 10.0);
    model.add_text_overlay(caption).unwrap();
    model
}

#[test]
fn golden_filter_graph() {
    let program = compiler().compile(&golden_model(), &medium_video()).unwrap();
    let expected = [
        "[0:v]scale=1280:720:flags=lanczos,setsar=1[fit]",
        "[fit]split[zoom0_base][zoom0_src];\
         [zoom0_src]pad=1920:1080:320:180:color=black,crop=640:360:320:540,\
         scale=1280:720:flags=lanczos,setsar=1[zoom0_zoomed];\
         [zoom0_base][zoom0_zoomed]overlay=0:0:enable='between(t,2,4)'[zoom0]",
        "[zoom0]drawtext=text='Hi':expansion=none:font='Arial':fontsize=24:\
         fontcolor=0xffffff:box=1:boxcolor=0x000000@0.5:boxborderw=8:x=128:y=72:\
         enable='between(t,0,5)'[text0]",
        "[text0]trim=start=1.000000:end=9.000000,setpts=PTS-STARTPTS[trim]",
        "[trim]fps=30,format=yuv420p[vout]",
    ]
    .join(";");
    assert_eq!(program.filter_complex(), expected);
    assert_eq!(
        program.output_args().join(" "),
        "-map [vout] -c:v libx264 -preset medium -crf 23 -maxrate 8000k -bufsize 16000k \
         -pix_fmt yuv420p -an -movflags +faststart -f mp4"
    );
    assert_eq!(program.signature(), 0x25d341be5bc198e4);
}

#[test]
fn compile_is_deterministic_and_leaves_model_untouched() {
    let model = golden_model();
    let before = model.clone();
    let a = compiler().compile(&model, &medium_video()).unwrap();
    let b = compiler().compile(&model, &medium_video()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.signature(), b.signature());
    assert_eq!(model, before);
}

#[test]
fn settings_change_the_program() {
    let model = golden_model();
    let video = compiler().compile(&model, &medium_video()).unwrap();
    let gif = compiler()
        .compile(
            &model,
            &ExportSettings::new(
                ExportFormat::AnimatedImage,
                ExportResolution::Medium,
                ExportQuality::Medium,
            ),
        )
        .unwrap();
    assert_ne!(video.signature(), gif.signature());
    assert!(gif.output_args().ends_with(&["-f".to_string(), "gif".to_string()]));
}

#[test]
fn collapsed_zoom_window_is_rejected_before_any_engine_call() {
    let mut model = TimelineModel::new(10.0, MediaSize::new(640, 360)).unwrap();
    model
        .add_zoom_region(ZoomRegion::new(0.0, 1.0, 1.5, PercentPoint::CENTER))
        .unwrap();
    model
        .add_zoom_region(ZoomRegion::new(2.0, 3.0, 10_000.0, PercentPoint::CENTER))
        .unwrap();

    let err = compiler().compile(&model, &medium_video()).unwrap_err();
    match err {
        InvalidTimelineError::ZoomWindowCollapsed {
            index,
            width,
            height,
            ..
        } => {
            assert_eq!(index, 1);
            assert_eq!((width, height), (0, 0));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err_stage(&model), "zoom");
}

fn err_stage(model: &TimelineModel) -> &'static str {
    compiler()
        .compile(model, &medium_video())
        .map(|_| "none")
        .unwrap_or_else(|e| e.stage())
}

#[test]
fn scenario_overlapping_regions_match_preview() {
    let mut model = TimelineModel::new(10.0, MediaSize::new(1920, 1080)).unwrap();
    model
        .add_zoom_region(ZoomRegion::new(0.0, 4.0, 1.5, PercentPoint::new(50.0, 50.0)))
        .unwrap();
    model
        .add_zoom_region(ZoomRegion::new(3.0, 6.0, 2.0, PercentPoint::new(20.0, 80.0)))
        .unwrap();
    let program = compiler().compile(&model, &ExportSettings::default()).unwrap();

    // Both regions contain t = 3.5; the first one governs and nothing compounds.
    let zooms = enabled_zooms(&program, 3.5);
    assert_eq!(zooms.len(), 1);
    assert_eq!(zooms[0].region, 0);
    assert_eq!(zooms[0].scale, 1.5);

    assert_eq!(zoom_in_effect(&program, 5.0).map(|z| z.region), Some(1));
    assert_eq!(zoom_in_effect(&program, 4.0).map(|z| z.region), Some(0));
    assert!(zoom_in_effect(&program, 7.0).is_none());
}

/// `enable=` expressions of the rendered filter graph, keyed by output pad.
fn rendered_gates(filter_complex: &str) -> HashMap<String, String> {
    filter_complex
        .split(';')
        .filter_map(|segment| {
            let (_, rest) = segment.split_once(":enable='")?;
            let (expr, tail) = rest.split_once('\'')?;
            let label = tail.trim_start_matches('[').trim_end_matches(']');
            Some((label.to_string(), expr.to_string()))
        })
        .collect()
}

/// Evaluate a gate the way ffmpeg does: a product of `between(t,a,b)` and
/// `not(between(t,a,b))` factors with inclusive bounds.
fn gate_enabled(expr: &str, t: f64) -> bool {
    expr.split('*').all(|factor| {
        let (negated, inner) = match factor.strip_prefix("not(") {
            Some(inner) => (true, inner.strip_suffix(')').unwrap()),
            None => (false, factor),
        };
        let args = inner
            .strip_prefix("between(t,")
            .and_then(|a| a.strip_suffix(')'))
            .unwrap();
        let (a, b) = args.split_once(',').unwrap();
        let (a, b): (f64, f64) = (a.parse().unwrap(), b.parse().unwrap());
        (a <= t && t <= b) != negated
    })
}

#[test]
fn rendered_gates_select_one_zoom_at_shared_boundaries() {
    let start = 1.0 / 3.0;
    let end = 4.0 + 2.0 / 3.0;
    let just_after = |t: f64| f64::from_bits(t.to_bits() + 1);

    let mut model = TimelineModel::new(10.0, MediaSize::new(1920, 1080)).unwrap();
    model
        .add_zoom_region(ZoomRegion::new(start, 2.0, 1.5, PercentPoint::CENTER))
        .unwrap();
    model
        .add_zoom_region(ZoomRegion::new(2.0, end, 2.0, PercentPoint::CENTER))
        .unwrap();
    let program = compiler().compile(&model, &ExportSettings::default()).unwrap();
    let gates = rendered_gates(&program.filter_complex());

    assert!(gate_enabled(&gates["zoom0"], start));
    assert!(gate_enabled(&gates["zoom0"], 2.0));
    assert!(!gate_enabled(&gates["zoom1"], 2.0));
    assert!(gate_enabled(&gates["zoom1"], just_after(2.0)));
    assert!(gate_enabled(&gates["zoom1"], end));
    assert!(!gate_enabled(&gates["zoom1"], just_after(end)));
    assert_eq!(evaluate(&model, just_after(end)).active_zoom, None);
}

fn region() -> impl Strategy<Value = ZoomRegion> {
    (0.0f64..10.0, 0.1f64..4.0, 1.0f64..4.0, 0.0f64..100.0, 0.0f64..100.0).prop_map(
        |(start, len, scale, x, y)| {
            ZoomRegion::new(start, (start + len).min(10.0), scale, PercentPoint::new(x, y))
        },
    )
}

fn overlay() -> impl Strategy<Value = (f64, f64)> {
    (0.0f64..10.0, 0.1f64..4.0).prop_map(|(start, len)| (start, (start + len).min(10.0)))
}

proptest! {
    #[test]
    fn exported_effects_match_preview_at_every_instant(
        regions in proptest::collection::vec(region(), 0..6),
        overlays in proptest::collection::vec(overlay(), 0..4),
        samples in proptest::collection::vec(0.0f64..10.0, 1..30),
    ) {
        let mut model = TimelineModel::new(10.0, MediaSize::new(1280, 720)).unwrap();
        for r in &regions {
            model.add_zoom_region(*r).unwrap();
        }
        for (i, (start, end)) in overlays.iter().enumerate() {
            let mut o = TextOverlay::at_playhead(format!("caption {i}"), *start, 10.0);
            o.end_time = *end;
            model.add_text_overlay(o).unwrap();
        }
        let program = compiler().compile(&model, &ExportSettings::default()).unwrap();
        let gates = rendered_gates(&program.filter_complex());
        prop_assert_eq!(gates.len(), regions.len() + overlays.len());

        let boundaries = regions
            .iter()
            .flat_map(|r| [r.start_time, r.end_time])
            .chain(overlays.iter().flat_map(|(start, end)| [*start, *end]));
        for t in samples.into_iter().chain(boundaries) {
            let preview = evaluate(&model, t);
            prop_assert!(enabled_zooms(&program, t).len() <= 1);

            let exported = zoom_in_effect(&program, t);
            prop_assert_eq!(exported.map(|z| z.region), preview.active_zoom);
            if let Some(effect) = exported {
                prop_assert_eq!(effect.scale, preview.transform.scale);
                prop_assert_eq!(50.0 - effect.center.x, preview.transform.translate_x_pct);
                prop_assert_eq!(50.0 - effect.center.y, preview.transform.translate_y_pct);
            } else {
                prop_assert!(preview.transform.is_identity());
            }

            // What ffmpeg will evaluate, read back from the rendered text.
            let rendered_zooms: Vec<usize> = (0..regions.len())
                .filter(|i| gate_enabled(&gates[&format!("zoom{i}")], t))
                .collect();
            prop_assert_eq!(rendered_zooms, preview.active_zoom.into_iter().collect::<Vec<_>>());

            let drawn: Vec<String> = text_in_effect(&program, t)
                .into_iter()
                .map(|i| model.text_overlays()[i].text.clone())
                .collect();
            let rendered_text: Vec<String> = (0..overlays.len())
                .filter(|i| gate_enabled(&gates[&format!("text{i}")], t))
                .map(|i| model.text_overlays()[i].text.clone())
                .collect();
            let shown: Vec<String> = preview.active_overlays.map(|o| o.text.clone()).collect();
            prop_assert_eq!(&drawn, &shown);
            prop_assert_eq!(rendered_text, shown);
        }
    }
}
