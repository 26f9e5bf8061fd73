//! Check system capabilities.

use clipcast_common::config::AppConfig;
use clipcast_render_engine::engine::command_exists;
use clipcast_render_engine::FfmpegEngine;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Clipcast System Check");
    println!("{}", "=".repeat(50));

    let engine = FfmpegEngine::new(config.engine.clone());
    let availability = engine.ensure_available();
    let ffmpeg_ok = availability.is_ok();
    report(ffmpeg_ok, &format!("Transcoding engine: {}", config.engine.ffmpeg_path));

    let ffprobe_ok = command_exists(&config.engine.ffprobe_path);
    report(ffprobe_ok, &format!("Media probe: {}", config.engine.ffprobe_path));

    match config.validate() {
        Ok(()) => report(true, "Configuration"),
        Err(e) => report(false, &format!("Configuration: {e}")),
    }
    println!("     Projects directory: {}", config.projects_dir.display());

    println!();
    match availability {
        Ok(()) => println!("Export is available."),
        Err(e) => println!("{e}. Install ffmpeg or set engine.ffmpeg_path in the config."),
    }
    if !ffprobe_ok {
        println!("Without ffprobe, `clipcast init` needs --duration, --width and --height.");
    }

    Ok(())
}

fn report(ok: bool, what: &str) {
    if ok {
        println!("[OK] {what}");
    } else {
        println!("[MISSING] {what}");
    }
}
