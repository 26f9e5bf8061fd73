//! Create a project around a recorded media file.

use std::path::PathBuf;

use anyhow::Context;
use clipcast_common::config::AppConfig;
use clipcast_input_tracker::{replay_clicks, zoom_params};
use clipcast_project_model::{parse_events, LoadedProject, MediaSize, SourceRef, TimelineModel};
use clipcast_render_engine::engine::{mime_for_path, probe_media, MediaProbe};

pub struct InitArgs {
    pub source: PathBuf,
    pub name: Option<String>,
    pub output: PathBuf,
    pub duration: Option<f64>,
    pub size: Option<(u32, u32)>,
    pub audio: bool,
    pub clicks: Option<PathBuf>,
}

pub fn run(config: &AppConfig, args: InitArgs) -> anyhow::Result<()> {
    if !args.source.is_file() {
        anyhow::bail!("Source media not found: {}", args.source.display());
    }
    let file_name = args
        .source
        .file_name()
        .and_then(|n| n.to_str())
        .context("Source path has no file name")?
        .to_string();
    let name = args.name.clone().unwrap_or_else(|| {
        args.source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("recording")
            .to_string()
    });

    let media = describe_media(config, &args)?;
    let mut timeline = TimelineModel::new(
        media.duration_secs,
        MediaSize::new(media.width, media.height),
    )?;

    let project_dir = args.output.join(&name);
    println!("Creating project '{}' at {}", name, project_dir.display());

    if let Some(log) = &args.clicks {
        let content = std::fs::read_to_string(log)
            .with_context(|| format!("Failed to read click log {}", log.display()))?;
        let events = parse_events(&content)?;
        let inserted = replay_clicks(&events, zoom_params(&config.capture), &mut timeline)?;
        println!(
            "  Clicks: {} captured, {} zoom region(s) created",
            events.len(),
            inserted.len()
        );
        std::fs::create_dir_all(project_dir.join("meta"))?;
        std::fs::write(project_dir.join("meta").join("zoom-events.jsonl"), content)?;
    }

    let source = SourceRef::new(
        format!("sources/{file_name}"),
        mime_for_path(&args.source),
        media.has_audio,
    );
    let project = LoadedProject::create(&project_dir, &name, source, timeline)
        .map_err(|e| anyhow::anyhow!("Failed to create project: {e}"))?;
    std::fs::copy(&args.source, project.source_path())
        .with_context(|| format!("Failed to copy {}", args.source.display()))?;

    println!("Project created successfully:");
    println!("  Directory: {}", project.root.display());
    println!(
        "  Media: {}x{}, {:.2}s, audio: {}",
        media.width,
        media.height,
        media.duration_secs,
        if media.has_audio { "yes" } else { "no" }
    );
    println!();
    println!("Directory structure:");
    println!("  {}/", name);
    println!("  ├── sources/     (recorded media)");
    println!("  ├── meta/        (project.json, timeline.json, zoom-events.jsonl)");
    println!("  └── exports/     (rendered output)");

    Ok(())
}

/// Media facts from the command line, probing for whatever is missing.
fn describe_media(config: &AppConfig, args: &InitArgs) -> anyhow::Result<MediaProbe> {
    if let (Some(duration_secs), Some((width, height))) = (args.duration, args.size) {
        return Ok(MediaProbe {
            width,
            height,
            duration_secs,
            has_audio: args.audio,
        });
    }

    let probed = probe_media(&config.engine.ffprobe_path, &args.source).with_context(|| {
        format!(
            "Could not probe {} with {}; pass --duration, --width and --height",
            args.source.display(),
            config.engine.ffprobe_path
        )
    })?;
    let (width, height) = args.size.unwrap_or((probed.width, probed.height));
    Ok(MediaProbe {
        width,
        height,
        duration_secs: args.duration.unwrap_or(probed.duration_secs),
        has_audio: args.audio || probed.has_audio,
    })
}
