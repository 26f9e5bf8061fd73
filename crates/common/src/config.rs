//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ClipcastError, ClipcastResult};

/// Global application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory where editor projects are stored.
    pub projects_dir: PathBuf,

    /// Recording-time zoom capture defaults.
    pub capture: CaptureDefaults,

    /// Encoder preset table used by the filter-graph compiler.
    pub export: EncoderPresets,

    /// Transcoding engine binaries.
    pub engine: EngineConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Parameters for zoom regions created from pointer input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureDefaults {
    /// Length of a zoom region created by a click while recording.
    pub zoom_duration_secs: f64,

    /// Magnification of a zoom region created by a click while recording.
    pub zoom_scale: f64,

    /// Length of a zoom region added at the playhead in the editor.
    pub manual_zoom_duration_secs: f64,
}

/// Pixel dimensions of one output resolution preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionPreset {
    pub width: u32,
    pub height: u32,
}

/// Rate-control numbers for one quality preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityPreset {
    /// Constant rate factor (lower is better quality).
    pub crf: u32,

    /// Peak video bitrate in kbps.
    pub max_bitrate_kbps: u32,

    /// Palette size for animated-image output.
    pub gif_colors: u32,
}

/// A preset keyed by the three export tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tiered<T> {
    pub high: T,
    pub medium: T,
    pub low: T,
}

/// Numeric encoder configuration. None of these values are derived; the
/// compiler looks them up by `{format, quality, resolution}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderPresets {
    pub resolution: Tiered<ResolutionPreset>,
    pub quality: Tiered<QualityPreset>,

    /// Output frame rate for video exports.
    pub video_fps: u32,

    /// Output frame rate for animated-image exports.
    pub gif_fps: u32,

    /// Widest animated-image output; larger presets are scaled down to it.
    pub gif_max_width: u32,

    /// Audio bitrate for video exports in kbps.
    pub audio_bitrate_kbps: u32,

    /// x264 speed preset.
    pub x264_preset: String,
}

/// Locations of the external transcoding engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "clipcast=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            projects_dir: dirs_default_projects(),
            capture: CaptureDefaults::default(),
            export: EncoderPresets::default(),
            engine: EngineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for CaptureDefaults {
    fn default() -> Self {
        Self {
            zoom_duration_secs: 4.0,
            zoom_scale: 1.5,
            manual_zoom_duration_secs: 2.0,
        }
    }
}

impl Default for EncoderPresets {
    fn default() -> Self {
        Self {
            resolution: Tiered {
                high: ResolutionPreset {
                    width: 1920,
                    height: 1080,
                },
                medium: ResolutionPreset {
                    width: 1280,
                    height: 720,
                },
                low: ResolutionPreset {
                    width: 854,
                    height: 480,
                },
            },
            quality: Tiered {
                high: QualityPreset {
                    crf: 18,
                    max_bitrate_kbps: 20_000,
                    gif_colors: 256,
                },
                medium: QualityPreset {
                    crf: 23,
                    max_bitrate_kbps: 8_000,
                    gif_colors: 128,
                },
                low: QualityPreset {
                    crf: 28,
                    max_bitrate_kbps: 3_000,
                    gif_colors: 64,
                },
            },
            video_fps: 30,
            gif_fps: 10,
            gif_max_width: 640,
            audio_bitrate_kbps: 192,
            x264_preset: "medium".to_string(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl EncoderPresets {
    /// Reject tables the compiler cannot produce a valid program from.
    pub fn validate(&self) -> ClipcastResult<()> {
        for (name, res) in [
            ("high", self.resolution.high),
            ("medium", self.resolution.medium),
            ("low", self.resolution.low),
        ] {
            if res.width < 2 || res.height < 2 {
                return Err(ClipcastError::config(format!(
                    "resolution preset '{name}' must be at least 2x2, got {}x{}",
                    res.width, res.height
                )));
            }
        }
        if self.video_fps == 0 || self.gif_fps == 0 {
            return Err(ClipcastError::config("frame rates must be positive"));
        }
        if self.gif_max_width < 2 {
            return Err(ClipcastError::config("gif_max_width must be at least 2"));
        }
        Ok(())
    }
}

impl CaptureDefaults {
    /// Reject parameters that would produce zoom regions the timeline refuses.
    pub fn validate(&self) -> ClipcastResult<()> {
        for (name, secs) in [
            ("zoom_duration_secs", self.zoom_duration_secs),
            ("manual_zoom_duration_secs", self.manual_zoom_duration_secs),
        ] {
            if !(secs.is_finite() && secs > 0.0) {
                return Err(ClipcastError::config(format!(
                    "{name} must be a positive number of seconds, got {secs}"
                )));
            }
        }
        if !(self.zoom_scale.is_finite() && self.zoom_scale >= 1.0) {
            return Err(ClipcastError::config(format!(
                "zoom_scale must be at least 1, got {}",
                self.zoom_scale
            )));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Check every section that feeds the timeline or the compiler.
    pub fn validate(&self) -> ClipcastResult<()> {
        self.capture.validate()?;
        self.export.validate()
    }

    /// Parse and validate a config file's contents.
    pub fn from_json(content: &str) -> ClipcastResult<Self> {
        let config: AppConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match Self::from_json(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Ignoring config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> ClipcastResult<()> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, json)?;
        Ok(())
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("clipcast").join("config.json")
}

/// Default projects directory.
fn dirs_default_projects() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("clipcast").join("projects")
}
