//! Evaluate the live preview.

use std::path::PathBuf;

use clipcast_processing_core::{evaluate, simulate_playback};

use super::{fmt_secs, load};

pub fn run(path: PathBuf, at: Option<f64>, fps: Option<f64>) -> anyhow::Result<()> {
    let project = load(&path)?;
    let model = &project.timeline;

    if let Some(fps) = fps {
        let samples = simulate_playback(model, fps);
        println!("Preview over {} samples at {fps} fps:", samples.len());
        let mut previous = None;
        for sample in &samples {
            // Only print when what the viewer sees changes.
            let state = (sample.transform, sample.overlay_count);
            if previous != Some(state) {
                println!(
                    "  {:>8}  {}  captions: {}",
                    fmt_secs(sample.time_secs),
                    sample.transform,
                    sample.overlay_count
                );
                previous = Some(state);
            }
        }
        return Ok(());
    }

    let t = at.unwrap_or(model.trim_range().start);
    let frame = evaluate(model, t);
    println!("Preview at {}:", fmt_secs(t));
    match frame.active_zoom {
        Some(index) => println!("  Zoom region #{index}"),
        None => println!("  No zoom"),
    }
    println!("  transform: {}", frame.transform.to_css());
    println!("  transform-origin: center");
    for overlay in frame.active_overlays {
        println!(
            "  Caption {:?} at ({}%, {}%)",
            overlay.text, overlay.position.x, overlay.position.y
        );
    }
    Ok(())
}
