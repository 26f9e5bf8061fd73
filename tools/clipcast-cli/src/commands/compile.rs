//! Print the compiled filter graph.

use std::path::PathBuf;

use clipcast_common::config::AppConfig;
use clipcast_render_engine::compositor::{text_in_effect, zoom_in_effect};
use clipcast_render_engine::FilterGraphCompiler;

use super::{fmt_secs, load, resolve_settings};
use crate::SettingsArgs;

pub fn run(
    path: PathBuf,
    args: SettingsArgs,
    at: Option<f64>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let project = load(&path)?;
    let settings = resolve_settings(&project, args);
    let program = FilterGraphCompiler::new(config.export.clone())
        .with_source_audio(project.project.source.has_audio)
        .compile(&project.timeline, &settings)?;

    println!(
        "Program for {} / {} / {} -> {}x{} ({}), signature {:016x}",
        settings.format,
        settings.resolution,
        settings.quality,
        program.output.width,
        program.output.height,
        fmt_secs(program.duration_secs),
        program.signature()
    );
    println!("{program}");

    if let Some(t) = at {
        println!();
        match zoom_in_effect(&program, t) {
            Some(zoom) => println!(
                "At {}: zoom region #{} ({}x at {}%, {}%)",
                fmt_secs(t),
                zoom.region,
                zoom.scale,
                zoom.center.x,
                zoom.center.y
            ),
            None => println!("At {}: no zoom", fmt_secs(t)),
        }
        println!("  captions drawn: {:?}", text_in_effect(&program, t));
    }
    Ok(())
}
