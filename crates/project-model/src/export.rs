//! Export settings: which container, which size tier, which quality tier.
//!
//! The tiers are symbolic. Pixel dimensions and rate-control numbers come
//! from the encoder preset table the compiler is given.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Output container family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    /// H.264 in MP4.
    #[default]
    Video,
    /// Palette GIF.
    AnimatedImage,
}

/// Output size tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportResolution {
    #[default]
    High,
    Medium,
    Low,
}

/// Output quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportQuality {
    #[default]
    High,
    Medium,
    Low,
}

/// Everything the compiler needs to know about the requested output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ExportSettings {
    pub format: ExportFormat,
    pub resolution: ExportResolution,
    pub quality: ExportQuality,
}

impl ExportSettings {
    pub fn new(format: ExportFormat, resolution: ExportResolution, quality: ExportQuality) -> Self {
        Self {
            format,
            resolution,
            quality,
        }
    }
}

impl ExportFormat {
    /// File extension of the produced container.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Video => "mp4",
            Self::AnimatedImage => "gif",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Video => "video/mp4",
            Self::AnimatedImage => "image/gif",
        }
    }

    pub fn carries_audio(&self) -> bool {
        matches!(self, Self::Video)
    }
}

/// An export option string that names no known tier or format.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct ParseSettingError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl FromStr for ExportFormat {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" | "mp4" => Ok(Self::Video),
            "animated-image" | "gif" => Ok(Self::AnimatedImage),
            other => Err(ParseSettingError {
                kind: "format",
                value: other.to_string(),
                expected: "video, mp4, animated-image, gif",
            }),
        }
    }
}

impl FromStr for ExportResolution {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "1080p" => Ok(Self::High),
            "medium" | "720p" => Ok(Self::Medium),
            "low" | "480p" => Ok(Self::Low),
            other => Err(ParseSettingError {
                kind: "resolution",
                value: other.to_string(),
                expected: "high, medium, low, 1080p, 720p, 480p",
            }),
        }
    }
}

impl FromStr for ExportQuality {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(ParseSettingError {
                kind: "quality",
                value: other.to_string(),
                expected: "high, medium, low",
            }),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Video => "video",
            Self::AnimatedImage => "animated-image",
        })
    }
}

impl fmt::Display for ExportResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        })
    }
}

impl fmt::Display for ExportQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        })
    }
}
