//! Export the edited recording.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clipcast_common::config::AppConfig;
use clipcast_render_engine::{
    ExportError, ExportOrchestrator, ExportProgress, ExportSource, ExportStage, FfmpegEngine,
};

use super::{load, resolve_settings};
use crate::SettingsArgs;

pub async fn run(
    path: PathBuf,
    output: Option<PathBuf>,
    args: SettingsArgs,
    config: &AppConfig,
) -> anyhow::Result<()> {
    println!("Exporting project at: {}", path.display());

    let mut project = load(&path)?;
    let settings = resolve_settings(&project, args);

    let engine = FfmpegEngine::new(config.engine.clone());
    engine.ensure_available()?;

    let source_path = project.source_path();
    let data = tokio::fs::read(&source_path)
        .await
        .with_context(|| format!("Failed to read source {}", source_path.display()))?;
    let source = ExportSource::new(
        data,
        project.project.source.mime_type.clone(),
        project.project.source.has_audio,
    );

    let output_path = output.unwrap_or_else(|| {
        project
            .exports_dir()
            .join(format!("{}.{}", project.project.name, settings.format.extension()))
    });
    println!("  Output: {}", output_path.display());
    println!(
        "  Settings: {} / {} / {}",
        settings.format, settings.resolution, settings.quality
    );

    let orchestrator = ExportOrchestrator::new(engine, config.export.clone());
    let on_progress = |p: ExportProgress| {
        let label = match p.stage {
            ExportStage::Preparing => "preparing",
            ExportStage::Encoding => "encoding",
            ExportStage::Complete => "done",
        };
        print!("\r  Progress: {:>5.1}% ({label})   ", p.percent);
        std::io::stdout().flush().ok();
    };

    let export = orchestrator.export(&project.timeline, &settings, &source, on_progress);
    let result = tokio::select! {
        result = export => result,
        _ = tokio::signal::ctrl_c() => {
            orchestrator.cancel();
            Err(ExportError::Cancelled)
        }
    };
    println!();

    let exported = match result {
        Ok(exported) => exported,
        Err(ExportError::Transcode(e)) => {
            eprintln!("ffmpeg output:\n{}", e.diagnostic);
            anyhow::bail!("Export failed: ffmpeg exited with status {:?}", e.status);
        }
        Err(e) => anyhow::bail!("Export failed: {e}"),
    };

    if let Some(parent) = output_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&output_path, &exported.bytes).await?;

    project.project.export = settings;
    project.project.touch();
    project
        .save()
        .map_err(|e| anyhow::anyhow!("Failed to save project: {e}"))?;

    println!(
        "Export complete: {} ({}x{}, {} bytes)",
        output_path.display(),
        exported.width,
        exported.height,
        exported.bytes.len()
    );
    Ok(())
}
