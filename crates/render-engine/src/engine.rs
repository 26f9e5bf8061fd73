//! Transcoding engines.
//!
//! The orchestrator talks to an engine through [`TranscodeEngine`]; the
//! production implementation drives an `ffmpeg` child process.

use std::path::Path;
use std::process::{Command, Stdio};

use async_trait::async_trait;
use clipcast_common::config::EngineConfig;
use clipcast_common::error::{ClipcastError, ClipcastResult, TranscodeError};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};

use crate::program::FilterGraphProgram;

/// Engine progress callback, in percent of the program's duration.
pub type EngineProgress<'a> = &'a (dyn Fn(f64) + Send + Sync);

/// One transcoding request.
#[derive(Debug, Clone, Copy)]
pub struct TranscodeJob<'a> {
    /// Encoded source media.
    pub input: &'a [u8],
    /// MIME type of `input`.
    pub input_mime: &'a str,
    pub program: &'a FilterGraphProgram,
}

/// An external transcoding engine.
///
/// Dropping the future returned by [`TranscodeEngine::transcode`] must stop
/// the work and release any staged files.
#[async_trait]
pub trait TranscodeEngine: Send + Sync {
    /// Run `job`, returning the encoded output bytes.
    async fn transcode(
        &self,
        job: TranscodeJob<'_>,
        progress: EngineProgress<'_>,
    ) -> Result<Vec<u8>, TranscodeError>;

    /// Check if this engine can run on the system.
    fn is_available(&self) -> bool;

    /// Engine name.
    fn name(&self) -> &str;
}

/// Runs programs through the `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    config: EngineConfig,
}

impl FfmpegEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Fail with [`ClipcastError::Unsupported`] when ffmpeg cannot be run.
    pub fn ensure_available(&self) -> ClipcastResult<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(ClipcastError::unsupported(format!(
                "transcoding engine '{}' is not installed or not executable",
                self.config.ffmpeg_path
            )))
        }
    }

    /// Full argument list for a staged job.
    pub fn command_args(
        program: &FilterGraphProgram,
        input: &Path,
        output: &Path,
    ) -> Vec<String> {
        let mut args: Vec<String> = ["-hide_banner", "-nostdin", "-y", "-i"]
            .map(String::from)
            .to_vec();
        args.push(input.display().to_string());
        args.push("-filter_complex".to_string());
        args.push(program.filter_complex());
        args.extend(program.output_args());
        args.extend(["-progress", "pipe:1", "-nostats"].map(String::from));
        args.push(output.display().to_string());
        args
    }
}

impl Default for FfmpegEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[async_trait]
impl TranscodeEngine for FfmpegEngine {
    async fn transcode(
        &self,
        job: TranscodeJob<'_>,
        progress: EngineProgress<'_>,
    ) -> Result<Vec<u8>, TranscodeError> {
        // Removed on drop, which covers success, failure and cancellation.
        let staging = tempfile::Builder::new()
            .prefix("clipcast-export-")
            .tempdir()
            .map_err(|e| TranscodeError::new(format!("Failed to create staging directory: {e}")))?;
        let input_path = staging
            .path()
            .join(format!("input.{}", extension_for_mime(job.input_mime)));
        let output_path = staging
            .path()
            .join(format!("output.{}", job.program.output.format.extension()));

        tokio::fs::write(&input_path, job.input)
            .await
            .map_err(|e| TranscodeError::new(format!("Failed to stage input: {e}")))?;

        let args = Self::command_args(job.program, &input_path, &output_path);
        tracing::debug!(args = ?args, "Running ffmpeg");

        let mut child = tokio::process::Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                TranscodeError::new(format!("Failed to start {}: {e}", self.config.ffmpeg_path))
            })?;

        tracing::info!(pid = child.id(), "ffmpeg process started");

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TranscodeError::new("Failed to capture ffmpeg stdout"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| TranscodeError::new("Failed to capture ffmpeg stderr"))?;

        // Drain stderr concurrently so ffmpeg never blocks on a full pipe.
        let stderr_task = tokio::spawn(async move {
            let mut output = String::new();
            match stderr.read_to_string(&mut output).await {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let mut lines = BufReader::new(stdout).lines();
        let mut state = ProgressState::default();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| TranscodeError::new(format!("Failed reading ffmpeg progress: {e}")))?
        {
            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            state.update(key, value);
            if key == "progress" {
                progress(state.percent(job.program.duration_secs));
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| TranscodeError::new(format!("Failed to wait on ffmpeg: {e}")))?;
        let diagnostic = stderr_task
            .await
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            return Err(TranscodeError::with_status(diagnostic.trim(), status.code()));
        }

        let bytes = tokio::fs::read(&output_path)
            .await
            .map_err(|e| TranscodeError::new(format!("Failed to read encoded output: {e}")))?;
        tracing::info!(bytes = bytes.len(), "ffmpeg finished");
        Ok(bytes)
    }

    fn is_available(&self) -> bool {
        command_exists(&self.config.ffmpeg_path)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// File extension ffmpeg should see for a source of the given MIME type.
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime.split(';').next().unwrap_or_default().trim() {
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        "video/x-matroska" => "mkv",
        "image/gif" => "gif",
        _ => "bin",
    }
}

/// MIME type for a source file, from its extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("mp4" | "m4v") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("mkv") => "video/x-matroska",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

/// Whether `binary` can be started and answers `-version`.
///
/// The path is passed to the OS verbatim, never through a shell.
pub fn command_exists(binary: &str) -> bool {
    Command::new(binary)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Stream facts about a media file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaProbe {
    pub width: u32,
    pub height: u32,
    pub duration_secs: f64,
    pub has_audio: bool,
}

/// Probe a media file with ffprobe.
pub fn probe_media(ffprobe: &str, path: &Path) -> Option<MediaProbe> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-show_entries",
            "stream=codec_type,width,height:format=duration",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }
    parse_probe(&String::from_utf8(output.stdout).ok()?)
}

fn parse_probe(json: &str) -> Option<MediaProbe> {
    let value: serde_json::Value = serde_json::from_str(json).ok()?;
    let streams = value.get("streams")?.as_array()?;
    let video = streams
        .iter()
        .find(|s| s.get("codec_type").and_then(|t| t.as_str()) == Some("video"))?;
    let width = video.get("width")?.as_u64()? as u32;
    let height = video.get("height")?.as_u64()? as u32;
    if width == 0 || height == 0 {
        return None;
    }
    // ffprobe prints durations as strings.
    let duration_secs = value
        .get("format")?
        .get("duration")?
        .as_str()?
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d > 0.0)?;
    let has_audio = streams
        .iter()
        .any(|s| s.get("codec_type").and_then(|t| t.as_str()) == Some("audio"));

    Some(MediaProbe {
        width,
        height,
        duration_secs,
        has_audio,
    })
}

#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            // Despite the name, ffmpeg reports microseconds here too.
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value == "end";
            }
            _ => {}
        }
    }

    fn percent(&self, expected_duration_secs: f64) -> f64 {
        if self.complete {
            return 100.0;
        }
        if expected_duration_secs <= 0.0 {
            return 0.0;
        }
        (self.out_time_secs / expected_duration_secs * 100.0).clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_state_parses_out_time() {
        let mut state = ProgressState::default();
        state.update("out_time_us", "2500000");
        assert!((state.percent(10.0) - 25.0).abs() < 1e-9);
        state.update("out_time_ms", "20000000");
        assert_eq!(state.percent(10.0), 100.0);
        state.update("out_time_us", "N/A");
        assert_eq!(state.percent(10.0), 100.0);
    }

    #[test]
    fn test_progress_end_is_complete() {
        let mut state = ProgressState::default();
        state.update("progress", "continue");
        assert_eq!(state.percent(4.0), 0.0);
        state.update("progress", "end");
        assert_eq!(state.percent(4.0), 100.0);
    }

    #[test]
    fn test_parse_probe() {
        let json = r#"{
            "streams": [
                {"codec_type": "video", "width": 1920, "height": 1080},
                {"codec_type": "audio"}
            ],
            "format": {"duration": "12.480000"}
        }"#;
        let probe = parse_probe(json).unwrap();
        assert_eq!((probe.width, probe.height), (1920, 1080));
        assert!((probe.duration_secs - 12.48).abs() < 1e-9);
        assert!(probe.has_audio);
    }

    #[test]
    fn test_parse_probe_without_video() {
        let json = r#"{"streams":[{"codec_type":"audio"}],"format":{"duration":"3.0"}}"#;
        assert!(parse_probe(json).is_none());
    }

    #[test]
    fn test_mime_mapping() {
        assert_eq!(extension_for_mime("video/webm; codecs=vp9"), "webm");
        assert_eq!(extension_for_mime("application/x-unknown"), "bin");
        assert_eq!(mime_for_path(Path::new("clip.MP4")), "video/mp4");
    }

    #[test]
    fn test_command_exists_never_uses_a_shell() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        let hostile = format!("true; touch {}", marker.display());
        assert!(!command_exists(&hostile));
        assert!(!marker.exists());
        assert!(!command_exists("/nonexistent dir/ffmpeg"));
    }

    #[test]
    fn test_missing_engine_is_unsupported() {
        let engine = FfmpegEngine::new(EngineConfig {
            ffmpeg_path: "/nonexistent/clipcast-ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
        });
        assert!(!engine.is_available());
        assert!(matches!(
            engine.ensure_available(),
            Err(ClipcastError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_command_args_layout() {
        use clipcast_common::config::EncoderPresets;
        use clipcast_project_model::{ExportSettings, MediaSize, TimelineModel};

        let model = TimelineModel::new(5.0, MediaSize::new(640, 360)).unwrap();
        let program = crate::compiler::FilterGraphCompiler::new(EncoderPresets::default())
            .compile(&model, &ExportSettings::default())
            .unwrap();
        let args = FfmpegEngine::command_args(
            &program,
            Path::new("/tmp/in.mp4"),
            Path::new("/tmp/out.mp4"),
        );
        assert_eq!(args[4], "/tmp/in.mp4");
        assert_eq!(args[5], "-filter_complex");
        assert_eq!(args.last().map(String::as_str), Some("/tmp/out.mp4"));
        assert!(args.windows(2).any(|w| w == ["-progress", "pipe:1"]));
    }
}
