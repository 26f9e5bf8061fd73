//! Validate a project directory.

use std::path::PathBuf;

use clipcast_common::config::AppConfig;
use clipcast_render_engine::FilterGraphCompiler;

use super::load;

pub fn run(path: PathBuf, config: &AppConfig) -> anyhow::Result<()> {
    println!("Validating project at: {}", path.display());

    // Loading re-checks every timeline invariant.
    let project = load(&path)?;
    println!("  Name: {}", project.project.name);
    println!("  Version: {}", project.project.version);
    println!("  Zoom regions: {}", project.timeline.zoom_regions().len());
    println!("  Text overlays: {}", project.timeline.text_overlays().len());

    let mut issues = project.validate_sources();
    let compiler = FilterGraphCompiler::new(config.export.clone());
    if let Err(e) = compiler.compile(&project.timeline, &project.project.export) {
        issues.push(format!("Timeline cannot be exported: {e}"));
    }

    if issues.is_empty() {
        println!("  Sources: All present");
        println!("\nProject is valid.");
    } else {
        println!("\nValidation issues:");
        for issue in &issues {
            println!("  - {issue}");
        }
        println!(
            "\n{} issue(s) found. Project may not be fully usable.",
            issues.len()
        );
    }

    Ok(())
}
