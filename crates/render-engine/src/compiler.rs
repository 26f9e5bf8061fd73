//! Filter-graph compiler.
//!
//! Lowers a [`TimelineModel`] plus [`ExportSettings`] into a
//! [`FilterGraphProgram`]. Stage order is fixed:
//!
//! 1. `Crop`: the crop region in source pixels, when set.
//! 2. `Fit`: scale to the preset resolution, preserving aspect ratio.
//! 3. `Zoom`: one per zoom region, in model order.
//! 4. `DrawText`: one per text overlay, in model order.
//! 5. `Trim`: cut to the trim range and rebase timestamps.
//! 6. `Encode`: frame rate and pixel format (or palette) for the container.
//!
//! Every gate is evaluated against source time because trimming happens
//! after all timed stages. Overlapping zoom regions are resolved here: a
//! region's gate is closed wherever an earlier region is active, so at any
//! instant at most one zoom stage is enabled and it is the one the live
//! preview picks.

use clipcast_common::config::{EncoderPresets, QualityPreset, ResolutionPreset};
use clipcast_project_model::{
    CropRegion, ExportFormat, ExportQuality, ExportResolution, ExportSettings, MediaSize,
    TextOverlay, TimelineModel, ZoomRegion,
};

use crate::program::{
    EncodeSpec, FilterGraphProgram, Gate, GifEncode, OutputSpec, Pad, PixelRect, Stage,
    StageOperation, TimeSpan, VideoEncode,
};

/// A timeline whose values are individually valid but that would compile to
/// a degenerate program.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidTimelineError {
    #[error("Source media has no pixels ({width}x{height})")]
    EmptyMedia { width: u32, height: u32 },

    #[error("Crop stage collapses to {width}x{height} pixels")]
    CropCollapsed { width: i64, height: i64 },

    #[error(
        "Zoom stage for region {index} (scale {scale}) collapses to a {width}x{height} pixel window"
    )]
    ZoomWindowCollapsed {
        index: usize,
        scale: f64,
        width: i64,
        height: i64,
    },
}

impl InvalidTimelineError {
    /// Name of the stage that could not be built.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::EmptyMedia { .. } => "source",
            Self::CropCollapsed { .. } => "crop",
            Self::ZoomWindowCollapsed { .. } => "zoom",
        }
    }
}

/// Compiles timelines against an encoder preset table.
#[derive(Debug, Clone)]
pub struct FilterGraphCompiler {
    presets: EncoderPresets,
    source_audio: bool,
}

impl FilterGraphCompiler {
    pub fn new(presets: EncoderPresets) -> Self {
        Self {
            presets,
            source_audio: false,
        }
    }

    /// Whether the source carries an audio track to keep in sync.
    pub fn with_source_audio(mut self, has_audio: bool) -> Self {
        self.source_audio = has_audio;
        self
    }

    pub fn presets(&self) -> &EncoderPresets {
        &self.presets
    }

    /// Compile `model` for `settings`.
    ///
    /// Pure: the same inputs always produce the same program.
    pub fn compile(
        &self,
        model: &TimelineModel,
        settings: &ExportSettings,
    ) -> Result<FilterGraphProgram, InvalidTimelineError> {
        let media = model.intrinsic_size();
        if media.is_empty() {
            return Err(InvalidTimelineError::EmptyMedia {
                width: media.width,
                height: media.height,
            });
        }

        let mut stages = Vec::new();
        let mut pad = Pad::source_video();

        let cropped = match model.crop_region() {
            Some(crop) => {
                let rect = crop_rect(&crop, media)?;
                pad = push(
                    &mut stages,
                    pad,
                    Pad::new("crop"),
                    StageOperation::Crop { rect },
                );
                (rect.width, rect.height)
            }
            None => (media.width, media.height),
        };

        let (frame_width, frame_height) = fit_within(cropped, self.resolution(settings.resolution));
        pad = push(
            &mut stages,
            pad,
            Pad::new("fit"),
            StageOperation::Fit {
                width: frame_width,
                height: frame_height,
            },
        );

        let regions = model.zoom_regions();
        for (index, region) in regions.iter().enumerate() {
            let operation = zoom_stage(index, region, &regions[..index], frame_width, frame_height)?;
            pad = push(&mut stages, pad, Pad::new(format!("zoom{index}")), operation);
        }

        for (index, overlay) in model.text_overlays().iter().enumerate() {
            let operation = text_stage(index, overlay, frame_width, frame_height);
            pad = push(&mut stages, pad, Pad::new(format!("text{index}")), operation);
        }

        let trim = model.trim_range();
        pad = push(
            &mut stages,
            pad,
            Pad::new("trim"),
            StageOperation::Trim {
                start: trim.start,
                end: trim.end,
            },
        );

        let quality = self.quality(settings.quality);
        let (encode, output) = match settings.format {
            ExportFormat::Video => (
                EncodeSpec::Video(VideoEncode {
                    fps: self.presets.video_fps,
                    crf: quality.crf,
                    max_bitrate_kbps: quality.max_bitrate_kbps,
                    preset: self.presets.x264_preset.clone(),
                    audio_bitrate_kbps: self.presets.audio_bitrate_kbps,
                }),
                (frame_width, frame_height),
            ),
            ExportFormat::AnimatedImage => {
                let (width, height) =
                    cap_width((frame_width, frame_height), self.presets.gif_max_width);
                (
                    EncodeSpec::AnimatedImage(GifEncode {
                        fps: self.presets.gif_fps,
                        width,
                        height,
                        colors: quality.gif_colors,
                    }),
                    (width, height),
                )
            }
        };
        push(&mut stages, pad, Pad::new("vout"), StageOperation::Encode(encode));

        if self.source_audio && settings.format.carries_audio() {
            push(
                &mut stages,
                Pad::source_audio(),
                Pad::new("aout"),
                StageOperation::AudioTrim {
                    start: trim.start,
                    end: trim.end,
                },
            );
        }

        let program = FilterGraphProgram {
            stages,
            output: OutputSpec {
                format: settings.format,
                width: output.0,
                height: output.1,
            },
            duration_secs: trim.len(),
        };
        tracing::debug!(
            stages = program.stages.len(),
            width = program.output.width,
            height = program.output.height,
            signature = %format!("{:016x}", program.signature()),
            "Compiled filter graph"
        );
        Ok(program)
    }

    fn resolution(&self, tier: ExportResolution) -> ResolutionPreset {
        match tier {
            ExportResolution::High => self.presets.resolution.high,
            ExportResolution::Medium => self.presets.resolution.medium,
            ExportResolution::Low => self.presets.resolution.low,
        }
    }

    fn quality(&self, tier: ExportQuality) -> QualityPreset {
        match tier {
            ExportQuality::High => self.presets.quality.high,
            ExportQuality::Medium => self.presets.quality.medium,
            ExportQuality::Low => self.presets.quality.low,
        }
    }
}

/// Append a stage and return its output pad.
fn push(stages: &mut Vec<Stage>, input: Pad, output: Pad, operation: StageOperation) -> Pad {
    stages.push(Stage {
        input_pad: input,
        output_pad: output.clone(),
        operation,
    });
    output
}

fn crop_rect(crop: &CropRegion, media: MediaSize) -> Result<PixelRect, InvalidTimelineError> {
    let (mw, mh) = (media.width as i64, media.height as i64);
    let x = ((crop.x / 100.0 * mw as f64).round() as i64).clamp(0, mw);
    let y = ((crop.y / 100.0 * mh as f64).round() as i64).clamp(0, mh);
    let width = ((crop.width / 100.0 * mw as f64).round() as i64).min(mw - x);
    let height = ((crop.height / 100.0 * mh as f64).round() as i64).min(mh - y);
    if width < 1 || height < 1 {
        return Err(InvalidTimelineError::CropCollapsed { width, height });
    }
    Ok(PixelRect {
        x: x as u32,
        y: y as u32,
        width: width as u32,
        height: height as u32,
    })
}

/// Largest even-sized frame with the source aspect ratio inside the preset.
fn fit_within(source: (u32, u32), preset: ResolutionPreset) -> (u32, u32) {
    let (sw, sh) = (source.0 as f64, source.1 as f64);
    let factor = (preset.width as f64 / sw).min(preset.height as f64 / sh);
    (
        even(sw * factor).min(even_floor(preset.width)),
        even(sh * factor).min(even_floor(preset.height)),
    )
}

fn cap_width(frame: (u32, u32), max_width: u32) -> (u32, u32) {
    if frame.0 <= max_width {
        return frame;
    }
    let width = even_floor(max_width);
    let height = even(frame.1 as f64 * width as f64 / frame.0 as f64);
    (width, height)
}

/// Round to the nearest even pixel count, never below 2.
fn even(value: f64) -> u32 {
    ((value / 2.0).round() as u32 * 2).max(2)
}

fn even_floor(value: u32) -> u32 {
    (value & !1).max(2)
}

fn zoom_stage(
    index: usize,
    region: &ZoomRegion,
    earlier: &[ZoomRegion],
    frame_width: u32,
    frame_height: u32,
) -> Result<StageOperation, InvalidTimelineError> {
    let width = (frame_width as f64 / region.scale).round() as i64;
    let height = (frame_height as f64 / region.scale).round() as i64;
    if width < 1 || height < 1 {
        return Err(InvalidTimelineError::ZoomWindowCollapsed {
            index,
            scale: region.scale,
            width,
            height,
        });
    }

    let pad_x = (width + 1) / 2;
    let pad_y = (height + 1) / 2;
    let center_x = region.center.x / 100.0 * frame_width as f64;
    let center_y = region.center.y / 100.0 * frame_height as f64;
    let max_x = frame_width as i64 + 2 * pad_x - width;
    let max_y = frame_height as i64 + 2 * pad_y - height;
    let x = ((center_x - width as f64 / 2.0).round() as i64 + pad_x).clamp(0, max_x);
    let y = ((center_y - height as f64 / 2.0).round() as i64 + pad_y).clamp(0, max_y);

    let open = TimeSpan::new(region.start_time, region.end_time);
    let mut gate = Gate::new(open);
    gate.shadowed_by = earlier
        .iter()
        .map(|r| TimeSpan::new(r.start_time, r.end_time))
        .filter(|span| span.overlaps(&open))
        .collect();

    Ok(StageOperation::Zoom {
        region: index,
        scale: region.scale,
        center: region.center,
        frame_width,
        frame_height,
        pad_x: pad_x as u32,
        pad_y: pad_y as u32,
        window: PixelRect {
            x: x as u32,
            y: y as u32,
            width: width as u32,
            height: height as u32,
        },
        gate,
    })
}

fn text_stage(
    index: usize,
    overlay: &TextOverlay,
    frame_width: u32,
    frame_height: u32,
) -> StageOperation {
    let style = &overlay.style;
    let font = if style.is_bold() {
        format!("{}:style=Bold", style.font_family)
    } else {
        style.font_family.clone()
    };
    StageOperation::DrawText {
        overlay: index,
        text: overlay.text.clone(),
        x: (overlay.position.x / 100.0 * frame_width as f64).round() as u32,
        y: (overlay.position.y / 100.0 * frame_height as f64).round() as u32,
        font_size: style.font_size,
        font_color: ffmpeg_color(&style.color),
        box_color: ffmpeg_color(&style.background_color),
        font,
        gate: Gate::new(TimeSpan::new(overlay.start_time, overlay.end_time)),
    }
}

/// Translate a CSS color into ffmpeg's color syntax.
///
/// `#rgb`/`#rrggbb`/`#rrggbbaa` and `rgb()`/`rgba()` are converted; anything
/// else (named colors) is passed through.
pub fn ffmpeg_color(css: &str) -> String {
    let value = css.trim();
    if let Some(hex) = value.strip_prefix('#') {
        if hex.len() == 3 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            let expanded: String = hex.chars().flat_map(|c| [c, c]).collect();
            return format!("0x{expanded}");
        }
        if (hex.len() == 6 || hex.len() == 8) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return format!("0x{hex}");
        }
        return value.to_string();
    }

    let lower = value.to_ascii_lowercase();
    if lower == "transparent" {
        return "black@0".to_string();
    }
    let args = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'));
    let Some(args) = args else {
        return value.to_string();
    };

    let parts: Vec<&str> = args.split([',', '/']).map(str::trim).collect();
    let channel = |s: &str| s.parse::<f64>().ok().map(|v| v.clamp(0.0, 255.0).round() as u8);
    let rgb = match parts.as_slice() {
        [r, g, b] | [r, g, b, _] => channel(*r).zip(channel(*g)).zip(channel(*b)),
        _ => None,
    };
    let Some((((r, g), b), alpha)) = rgb.map(|c| (c, parts.get(3).copied())) else {
        return value.to_string();
    };
    let mut color = format!("0x{r:02x}{g:02x}{b:02x}");
    if let Some(alpha) = alpha.and_then(|a| a.parse::<f64>().ok()) {
        color.push_str(&format!("@{}", alpha.clamp(0.0, 1.0)));
    }
    color
}

#[cfg(test)]
mod tests {
    use clipcast_project_model::PercentPoint;

    use super::*;

    fn compiler() -> FilterGraphCompiler {
        FilterGraphCompiler::new(EncoderPresets::default())
    }

    fn model() -> TimelineModel {
        TimelineModel::new(10.0, MediaSize::new(1920, 1080)).unwrap()
    }

    #[test]
    fn test_minimal_program_stage_order() {
        let program = compiler().compile(&model(), &ExportSettings::default()).unwrap();
        let labels: Vec<&str> = program.stages.iter().map(|s| s.output_pad.label()).collect();
        assert_eq!(labels, vec!["fit", "trim", "vout"]);
        assert_eq!(program.stages[0].input_pad, Pad::source_video());
        assert_eq!((program.output.width, program.output.height), (1920, 1080));
        assert!((program.duration_secs - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_crop_converted_to_source_pixels() {
        let mut m = model();
        m.set_crop_region(Some(CropRegion::new(25.0, 25.0, 50.0, 50.0)))
            .unwrap();
        let program = compiler().compile(&m, &ExportSettings::default()).unwrap();
        assert_eq!(
            program.stages[0].operation,
            StageOperation::Crop {
                rect: PixelRect {
                    x: 480,
                    y: 270,
                    width: 960,
                    height: 540
                }
            }
        );
        assert_eq!(
            program.stages[1].operation,
            StageOperation::Fit {
                width: 1920,
                height: 1080
            }
        );
    }

    #[test]
    fn test_tiny_crop_collapses() {
        let mut m = TimelineModel::new(10.0, MediaSize::new(100, 100)).unwrap();
        m.set_crop_region(Some(CropRegion::new(10.0, 10.0, 0.2, 50.0)))
            .unwrap();
        let err = compiler().compile(&m, &ExportSettings::default()).unwrap_err();
        assert_eq!(err.stage(), "crop");
    }

    #[test]
    fn test_fit_preserves_aspect_and_even_size() {
        let preset = ResolutionPreset {
            width: 1280,
            height: 720,
        };
        assert_eq!(fit_within((1920, 1080), preset), (1280, 720));
        assert_eq!(fit_within((1000, 1000), preset), (720, 720));
        assert_eq!(fit_within((1081, 1920), preset), (406, 720));
    }

    #[test]
    fn test_zoom_window_centered_in_padded_frame() {
        let op = zoom_stage(
            0,
            &ZoomRegion::new(1.0, 3.0, 2.0, PercentPoint::CENTER),
            &[],
            1920,
            1080,
        )
        .unwrap();
        let StageOperation::Zoom {
            window,
            pad_x,
            pad_y,
            ..
        } = op
        else {
            panic!("expected zoom stage");
        };
        assert_eq!((window.width, window.height), (960, 540));
        assert_eq!((pad_x, pad_y), (480, 270));
        // Centre of the padded frame minus half the window.
        assert_eq!((window.x, window.y), (960, 540));
    }

    #[test]
    fn test_zoom_at_corner_reveals_padding() {
        let op = zoom_stage(
            0,
            &ZoomRegion::new(1.0, 3.0, 2.0, PercentPoint::new(0.0, 0.0)),
            &[],
            1920,
            1080,
        )
        .unwrap();
        let StageOperation::Zoom { window, .. } = op else {
            panic!("expected zoom stage");
        };
        assert_eq!((window.x, window.y), (0, 0));
    }

    #[test]
    fn test_later_zoom_gate_excludes_earlier_overlaps() {
        let earlier = [
            ZoomRegion::new(0.0, 4.0, 1.5, PercentPoint::CENTER),
            ZoomRegion::new(8.0, 9.0, 1.5, PercentPoint::CENTER),
        ];
        let op = zoom_stage(
            2,
            &ZoomRegion::new(3.0, 6.0, 2.0, PercentPoint::CENTER),
            &earlier,
            1920,
            1080,
        )
        .unwrap();
        let StageOperation::Zoom { gate, .. } = op else {
            panic!("expected zoom stage");
        };
        assert_eq!(gate.shadowed_by, vec![TimeSpan::new(0.0, 4.0)]);
    }

    #[test]
    fn test_huge_scale_collapses_window() {
        let mut m = model();
        m.add_zoom_region(ZoomRegion::new(1.0, 2.0, 5_000.0, PercentPoint::CENTER))
            .unwrap();
        let err = compiler().compile(&m, &ExportSettings::default()).unwrap_err();
        assert!(matches!(
            err,
            InvalidTimelineError::ZoomWindowCollapsed { index: 0, .. }
        ));
    }

    #[test]
    fn test_gif_capped_and_audio_dropped() {
        let settings = ExportSettings::new(
            ExportFormat::AnimatedImage,
            ExportResolution::High,
            ExportQuality::Low,
        );
        let program = compiler()
            .with_source_audio(true)
            .compile(&model(), &settings)
            .unwrap();
        assert_eq!((program.output.width, program.output.height), (640, 360));
        assert!(program.audio_out().is_none());
        assert!(program.filter_complex().contains("palettegen=max_colors=64"));
    }

    #[test]
    fn test_video_keeps_audio_in_sync() {
        let mut m = model();
        m.set_trim_range(2.0, 8.0).unwrap();
        let program = compiler()
            .with_source_audio(true)
            .compile(&m, &ExportSettings::default())
            .unwrap();
        assert!(program
            .filter_complex()
            .ends_with("[0:a]atrim=start=2.000000:end=8.000000,asetpts=PTS-STARTPTS[aout]"));
        let args = program.output_args();
        assert!(args.windows(2).any(|w| w == ["-map", "[aout]"]));
        assert!(args.windows(2).any(|w| w == ["-c:a", "aac"]));
    }

    #[test]
    fn test_css_colors() {
        assert_eq!(ffmpeg_color("#ffffff"), "0xffffff");
        assert_eq!(ffmpeg_color("#f0a"), "0xff00aa");
        assert_eq!(ffmpeg_color("rgba(0, 0, 0, 0.5)"), "0x000000@0.5");
        assert_eq!(ffmpeg_color("rgb(255,128,0)"), "0xff8000");
        assert_eq!(ffmpeg_color("white"), "white");
        assert_eq!(ffmpeg_color("transparent"), "black@0");
    }
}
