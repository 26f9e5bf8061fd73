pub mod capture;
pub mod check;
pub mod compile;
pub mod crop;
pub mod export;
pub mod info;
pub mod init;
pub mod preview;
pub mod text;
pub mod trim;
pub mod validate;
pub mod zoom;

use std::path::Path;

use clipcast_project_model::{ExportSettings, LoadedProject, ValidationError};

use crate::SettingsArgs;

pub(crate) fn load(path: &Path) -> anyhow::Result<LoadedProject> {
    LoadedProject::load(path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))
}

/// Apply one timeline edit and persist it. Rejected edits leave the files
/// untouched.
pub(crate) fn edit<T>(
    path: &Path,
    apply: impl FnOnce(&mut LoadedProject) -> Result<T, ValidationError>,
) -> anyhow::Result<(LoadedProject, T)> {
    let mut project = load(path)?;
    let value = apply(&mut project).map_err(|e| anyhow::anyhow!("Edit rejected: {e}"))?;
    project.project.touch();
    project
        .save()
        .map_err(|e| anyhow::anyhow!("Failed to save project: {e}"))?;
    Ok((project, value))
}

/// Resolve command-line export options against the project's last settings.
pub(crate) fn resolve_settings(project: &LoadedProject, args: SettingsArgs) -> ExportSettings {
    let last = project.project.export;
    ExportSettings::new(
        args.format.unwrap_or(last.format),
        args.resolution.unwrap_or(last.resolution),
        args.quality.unwrap_or(last.quality),
    )
}

pub(crate) fn fmt_secs(secs: f64) -> String {
    format!("{secs:.2}s")
}
