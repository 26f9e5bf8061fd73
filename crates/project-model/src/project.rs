//! Project metadata and on-disk layout.
//!
//! A project directory ties the recorded source media to its timeline:
//!
//! ```text
//! <root>/
//!   sources/               recorded media
//!   meta/project.json      Project
//!   meta/timeline.json     TimelineModel
//!   meta/zoom-events.jsonl clicks captured while recording (optional)
//!   exports/               rendered output
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::event::{parse_events, ZoomEvent};
use crate::export::ExportSettings;
use crate::timeline::TimelineModel;

/// Top-level project file (`project.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Schema version.
    pub version: String,

    /// Human-readable project name.
    pub name: String,

    /// Unique project identifier (UUID).
    pub id: String,

    /// Creation timestamp (ISO 8601).
    pub created_at: String,

    /// Last modified timestamp (ISO 8601).
    pub modified_at: String,

    /// The recorded media this project edits.
    pub source: SourceRef,

    /// Last export settings used, so repeated exports default to them.
    #[serde(default)]
    pub export: ExportSettings,
}

/// Reference to the source media file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Path relative to the project root.
    pub path: String,

    /// Container type as negotiated by the capture API (e.g. `video/webm`).
    pub mime_type: String,

    /// Whether the container carries an audio track.
    #[serde(default)]
    pub has_audio: bool,
}

impl SourceRef {
    pub fn new(path: impl Into<String>, mime_type: impl Into<String>, has_audio: bool) -> Self {
        Self {
            path: path.into(),
            mime_type: mime_type.into(),
            has_audio,
        }
    }
}

/// The complete in-memory representation of a loaded project.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedProject {
    /// Filesystem path to the project directory.
    pub root: PathBuf,

    /// Project metadata.
    pub project: Project,

    /// Edit state.
    pub timeline: TimelineModel,
}

impl Project {
    pub fn new(name: impl Into<String>, source: SourceRef) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            version: "1.0".to_string(),
            name: name.into(),
            id: uuid_v4(),
            created_at: now.clone(),
            modified_at: now,
            source,
            export: ExportSettings::default(),
        }
    }

    /// Bump the modification timestamp.
    pub fn touch(&mut self) {
        self.modified_at = chrono::Utc::now().to_rfc3339();
    }
}

impl LoadedProject {
    /// Load a project from a directory.
    ///
    /// The timeline file is revalidated on load; a file that violates the
    /// model invariants is a parse error naming the offending field.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let root = root.as_ref().to_path_buf();
        let project: Project = read_json(&root.join("meta").join("project.json"))?;
        let timeline: TimelineModel = read_json(&root.join("meta").join("timeline.json"))?;
        Ok(Self {
            root,
            project,
            timeline,
        })
    }

    /// Save project and timeline to disk.
    pub fn save(&self) -> Result<(), ProjectError> {
        let meta_dir = self.root.join("meta");
        std::fs::create_dir_all(&meta_dir).map_err(|e| ProjectError::IoError {
            path: meta_dir.clone(),
            source: e,
        })?;
        write_json(&meta_dir.join("project.json"), &self.project)?;
        write_json(&meta_dir.join("timeline.json"), &self.timeline)?;
        Ok(())
    }

    /// Create a new project on disk with the standard directory structure.
    pub fn create(
        root: impl AsRef<Path>,
        name: impl Into<String>,
        source: SourceRef,
        timeline: TimelineModel,
    ) -> Result<Self, ProjectError> {
        let root = root.as_ref().to_path_buf();

        for subdir in &["sources", "meta", "exports"] {
            std::fs::create_dir_all(root.join(subdir)).map_err(|e| ProjectError::IoError {
                path: root.join(subdir),
                source: e,
            })?;
        }

        let loaded = Self {
            root,
            project: Project::new(name, source),
            timeline,
        };
        loaded.save()?;
        Ok(loaded)
    }

    /// Absolute path of the source media.
    pub fn source_path(&self) -> PathBuf {
        self.root.join(&self.project.source.path)
    }

    pub fn zoom_events_path(&self) -> PathBuf {
        self.root.join("meta").join("zoom-events.jsonl")
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.root.join("exports")
    }

    /// Clicks captured while recording. A project without an event log has
    /// no clicks.
    pub fn read_zoom_events(&self) -> Result<Vec<ZoomEvent>, ProjectError> {
        let path = self.zoom_events_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&path).map_err(|e| ProjectError::IoError {
            path: path.clone(),
            source: e,
        })?;
        parse_events(&content).map_err(|e| ProjectError::ParseError { path, source: e })
    }

    /// Validate that all referenced source files exist.
    pub fn validate_sources(&self) -> Vec<String> {
        let mut errors = vec![];
        if !self.source_path().exists() {
            errors.push(format!("Source media missing: {}", self.project.source.path));
        }
        if self.project.source.mime_type.trim().is_empty() {
            errors.push("Source media has no container type".to_string());
        }
        errors
    }
}

/// Errors that can occur when working with projects.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ProjectError> {
    let content = std::fs::read_to_string(path).map_err(|e| ProjectError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| ProjectError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ProjectError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| ProjectError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    std::fs::write(path, json).map_err(|e| ProjectError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Generate a simple UUID v4 without external dependency.
fn uuid_v4() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!(
        "{:08x}-{:04x}-4{:03x}-{:04x}-{:012x}",
        (seed & 0xFFFFFFFF) as u32,
        ((seed >> 32) & 0xFFFF) as u16,
        ((seed >> 48) & 0x0FFF) as u16,
        (((seed >> 60) & 0x3F) | 0x80) as u16 | (((seed >> 66) & 0x3FF) as u16) << 6,
        (seed >> 76) & 0xFFFFFFFFFFFF,
    )
}
