//! Filter-graph programs: an ordered list of labeled stages plus the encoder
//! arguments, rendered to the textual form ffmpeg takes.

use std::fmt;

use clipcast_project_model::{ExportFormat, PercentPoint};

/// Label of a stream between two stages. Renders as `[label]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pad(String);

impl Pad {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// First video stream of the first input.
    pub fn source_video() -> Self {
        Self::new("0:v")
    }

    /// First audio stream of the first input.
    pub fn source_audio() -> Self {
        Self::new("0:a")
    }

    pub fn label(&self) -> &str {
        &self.0
    }

    /// A label derived from this one for a stage's internal branches.
    fn branch(&self, suffix: &str) -> Pad {
        Pad(format!("{}_{suffix}", self.0))
    }
}

impl fmt::Display for Pad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0)
    }
}

/// A closed time interval in seconds of source media.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSpan {
    pub start: f64,
    pub end: f64,
}

impl TimeSpan {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t <= self.end
    }

    pub fn overlaps(&self, other: &TimeSpan) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    fn expr(&self) -> String {
        format!("between(t,{},{})", format_bound(self.start), format_bound(self.end))
    }
}

/// When a stage is enabled: inside `open`, and outside every span in
/// `shadowed_by`.
#[derive(Debug, Clone, PartialEq)]
pub struct Gate {
    pub open: TimeSpan,
    pub shadowed_by: Vec<TimeSpan>,
}

impl Gate {
    pub fn new(open: TimeSpan) -> Self {
        Self {
            open,
            shadowed_by: Vec::new(),
        }
    }

    pub fn is_open(&self, t: f64) -> bool {
        self.open.contains(t) && !self.shadowed_by.iter().any(|s| s.contains(t))
    }

    /// The ffmpeg timeline expression for this gate.
    pub fn expr(&self) -> String {
        let mut expr = self.open.expr();
        for span in &self.shadowed_by {
            expr.push_str(&format!("*not({})", span.expr()));
        }
        expr
    }
}

/// A pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Video encoder settings resolved from the preset table.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoEncode {
    pub fps: u32,
    pub crf: u32,
    pub max_bitrate_kbps: u32,
    pub preset: String,
    pub audio_bitrate_kbps: u32,
}

/// Palette GIF settings resolved from the preset table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GifEncode {
    pub fps: u32,
    pub width: u32,
    pub height: u32,
    pub colors: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EncodeSpec {
    Video(VideoEncode),
    AnimatedImage(GifEncode),
}

/// What one stage does to its input stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOperation {
    /// Cut a fixed rectangle out of the source frame.
    Crop { rect: PixelRect },

    /// Scale to the output frame size.
    Fit { width: u32, height: u32 },

    /// Magnify `window` (in padded-frame pixels) back to the full frame
    /// while `gate` is open. The frame is padded by `pad_x`/`pad_y` on each
    /// side first so windows near an edge show background instead of
    /// sliding inward.
    Zoom {
        region: usize,
        scale: f64,
        center: PercentPoint,
        frame_width: u32,
        frame_height: u32,
        pad_x: u32,
        pad_y: u32,
        window: PixelRect,
        gate: Gate,
    },

    /// Draw a caption while `gate` is open.
    DrawText {
        overlay: usize,
        text: String,
        x: u32,
        y: u32,
        font_size: f64,
        font_color: String,
        box_color: String,
        font: String,
        gate: Gate,
    },

    /// Keep `[start, end]` of the source and restart timestamps at zero.
    Trim { start: f64, end: f64 },

    /// Same cut on the audio stream.
    AudioTrim { start: f64, end: f64 },

    /// Final pixel format / frame rate conversion for the encoder.
    Encode(EncodeSpec),
}

/// One step of the program: reads `input_pad`, writes `output_pad`.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub input_pad: Pad,
    pub output_pad: Pad,
    pub operation: StageOperation,
}

impl Stage {
    /// Render this stage as a filter-graph segment.
    pub fn render(&self) -> String {
        let (input, output) = (&self.input_pad, &self.output_pad);
        match &self.operation {
            StageOperation::Crop { rect } => format!(
                "{input}crop={}:{}:{}:{}{output}",
                rect.width, rect.height, rect.x, rect.y
            ),
            StageOperation::Fit { width, height } => {
                format!("{input}scale={width}:{height}:flags=lanczos,setsar=1{output}")
            }
            StageOperation::Zoom {
                frame_width,
                frame_height,
                pad_x,
                pad_y,
                window,
                gate,
                ..
            } => {
                let base = output.branch("base");
                let src = output.branch("src");
                let zoomed = output.branch("zoomed");
                format!(
                    "{input}split{base}{src};\
                     {src}pad={pw}:{ph}:{pad_x}:{pad_y}:color=black,\
                     crop={w}:{h}:{x}:{y},\
                     scale={frame_width}:{frame_height}:flags=lanczos,setsar=1{zoomed};\
                     {base}{zoomed}overlay=0:0:enable='{gate}'{output}",
                    pw = frame_width + 2 * pad_x,
                    ph = frame_height + 2 * pad_y,
                    w = window.width,
                    h = window.height,
                    x = window.x,
                    y = window.y,
                    gate = gate.expr(),
                )
            }
            StageOperation::DrawText {
                text,
                x,
                y,
                font_size,
                font_color,
                box_color,
                font,
                gate,
                ..
            } => format!(
                "{input}drawtext=text={text}:expansion=none:font={font}:\
                 fontsize={font_size}:fontcolor={font_color}:\
                 box=1:boxcolor={box_color}:boxborderw=8:\
                 x={x}:y={y}:enable='{gate}'{output}",
                text = quote_filter_value(text),
                font = quote_filter_value(font),
                gate = gate.expr(),
            ),
            StageOperation::Trim { start, end } => format!(
                "{input}trim=start={}:end={},setpts=PTS-STARTPTS{output}",
                format_time(*start),
                format_time(*end)
            ),
            StageOperation::AudioTrim { start, end } => format!(
                "{input}atrim=start={}:end={},asetpts=PTS-STARTPTS{output}",
                format_time(*start),
                format_time(*end)
            ),
            StageOperation::Encode(EncodeSpec::Video(video)) => {
                format!("{input}fps={},format=yuv420p{output}", video.fps)
            }
            StageOperation::Encode(EncodeSpec::AnimatedImage(gif)) => {
                let a = output.branch("a");
                let b = output.branch("b");
                let palette = output.branch("palette");
                format!(
                    "{input}fps={fps},scale={w}:{h}:flags=lanczos,split{a}{b};\
                     {a}palettegen=max_colors={colors}{palette};\
                     {b}{palette}paletteuse{output}",
                    fps = gif.fps,
                    w = gif.width,
                    h = gif.height,
                    colors = gif.colors,
                )
            }
        }
    }
}

/// Geometry and container of the produced media.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSpec {
    pub format: ExportFormat,
    pub width: u32,
    pub height: u32,
}

/// A compiled program, ready for the transcoding engine.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterGraphProgram {
    pub stages: Vec<Stage>,
    pub output: OutputSpec,
    /// Length of the exported range in seconds.
    pub duration_secs: f64,
}

impl FilterGraphProgram {
    /// The pad carrying the finished video.
    pub fn video_out(&self) -> Option<&Pad> {
        self.stages
            .iter()
            .rev()
            .find(|s| matches!(s.operation, StageOperation::Encode(_)))
            .map(|s| &s.output_pad)
    }

    /// The pad carrying trimmed audio, when the program keeps audio.
    pub fn audio_out(&self) -> Option<&Pad> {
        self.stages
            .iter()
            .find(|s| matches!(s.operation, StageOperation::AudioTrim { .. }))
            .map(|s| &s.output_pad)
    }

    fn encode_spec(&self) -> Option<&EncodeSpec> {
        self.stages.iter().rev().find_map(|s| match &s.operation {
            StageOperation::Encode(encode) => Some(encode),
            _ => None,
        })
    }

    /// The `-filter_complex` argument.
    pub fn filter_complex(&self) -> String {
        self.stages
            .iter()
            .map(Stage::render)
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Stream mapping and encoder arguments that follow the filter graph.
    pub fn output_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(pad) = self.video_out() {
            args.extend(["-map".to_string(), pad.to_string()]);
        }
        let audio = self.audio_out();
        if let Some(pad) = audio {
            args.extend(["-map".to_string(), pad.to_string()]);
        }

        match self.encode_spec() {
            Some(EncodeSpec::Video(video)) => {
                args.extend(
                    [
                        "-c:v",
                        "libx264",
                        "-preset",
                        video.preset.as_str(),
                        "-crf",
                        &video.crf.to_string(),
                        "-maxrate",
                        &format!("{}k", video.max_bitrate_kbps),
                        "-bufsize",
                        &format!("{}k", video.max_bitrate_kbps * 2),
                        "-pix_fmt",
                        "yuv420p",
                    ]
                    .map(String::from),
                );
                if audio.is_some() {
                    args.extend(
                        ["-c:a", "aac", "-b:a", &format!("{}k", video.audio_bitrate_kbps)]
                            .map(String::from),
                    );
                } else {
                    args.push("-an".to_string());
                }
                args.extend(["-movflags", "+faststart", "-f", "mp4"].map(String::from));
            }
            Some(EncodeSpec::AnimatedImage(_)) => {
                args.extend(["-loop", "0", "-f", "gif"].map(String::from));
            }
            None => {}
        }
        args
    }

    /// Stable 64-bit fingerprint of the rendered program.
    pub fn signature(&self) -> u64 {
        let mut text = self.filter_complex();
        for arg in self.output_args() {
            text.push(' ');
            text.push_str(&arg);
        }
        fnv1a_64(&text)
    }
}

impl fmt::Display for FilterGraphProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages.iter().enumerate() {
            writeln!(f, "{i:>2}: {}", stage.render())?;
        }
        write!(f, "    {}", self.output_args().join(" "))
    }
}

pub fn format_time(value: f64) -> String {
    format!("{value:.6}")
}

/// Shortest decimal that parses back to exactly `value`, so ffmpeg compares
/// `t` against the same bound the preview uses.
pub fn format_bound(value: f64) -> String {
    format!("{value}")
}

/// Quote an arbitrary string as a filter option value.
///
/// Two levels apply: the option parser unescapes `\\`, `'` and `:`, and
/// the graph parser strips the outer single quotes first.
pub fn quote_filter_value(value: &str) -> String {
    let option_level = value
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace(':', "\\:");
    format!("'{}'", option_level.replace('\'', "'\\''"))
}

pub(crate) fn fnv1a_64(input: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in input.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}
