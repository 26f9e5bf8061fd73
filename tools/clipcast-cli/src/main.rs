//! Clipcast CLI: edit a recording's timeline, preview effects, and export.
//!
//! Usage:
//!   clipcast init <SOURCE>          Create a project around a recording
//!   clipcast info <PATH>            Show project information
//!   clipcast validate <PATH>        Validate a project directory
//!   clipcast capture <PATH>         Turn clicks read from stdin into zoom regions
//!   clipcast trim <PATH> ...        Set or reset the trim range
//!   clipcast crop <PATH> ...        Set or clear the crop region
//!   clipcast zoom <PATH> ...        Add, update, remove or list zoom regions
//!   clipcast text <PATH> ...        Add, update, remove or list text overlays
//!   clipcast preview <PATH>         Evaluate the live preview
//!   clipcast compile <PATH>         Print the compiled filter graph
//!   clipcast export <PATH>          Export the edited recording
//!   clipcast check                  Check system capabilities

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clipcast_common::config::AppConfig;
use clipcast_project_model::{ExportFormat, ExportQuality, ExportResolution};

mod commands;

#[derive(Parser)]
#[command(
    name = "clipcast",
    about = "Timeline editing and export for screen recordings",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Export options shared by `compile` and `export`. Unset options fall back
/// to the project's last export settings.
#[derive(clap::Args, Debug, Clone, Copy)]
pub struct SettingsArgs {
    /// Output format: video (mp4) or animated-image (gif)
    #[arg(long)]
    pub format: Option<ExportFormat>,

    /// Resolution tier: high, medium, low (or 1080p, 720p, 480p)
    #[arg(long)]
    pub resolution: Option<ExportResolution>,

    /// Quality tier: high, medium, low
    #[arg(long)]
    pub quality: Option<ExportQuality>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a project around a recorded media file
    Init {
        /// Recorded media file
        source: PathBuf,

        /// Project name (defaults to the file stem)
        #[arg(short, long)]
        name: Option<String>,

        /// Directory the project is created in
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Media duration in seconds (probed with ffprobe when omitted)
        #[arg(long)]
        duration: Option<f64>,

        /// Media width in pixels (probed when omitted)
        #[arg(long, requires = "height")]
        width: Option<u32>,

        /// Media height in pixels (probed when omitted)
        #[arg(long, requires = "width")]
        height: Option<u32>,

        /// The source has an audio track (probed when omitted)
        #[arg(long)]
        audio: bool,

        /// Click log captured while recording; each click becomes a zoom region
        #[arg(long)]
        clicks: Option<PathBuf>,
    },

    /// Show project information
    Info {
        /// Path to the project directory
        path: PathBuf,
    },

    /// Validate a project directory
    Validate {
        /// Path to the project directory
        path: PathBuf,
    },

    /// Turn clicks made while recording into zoom regions
    ///
    /// Reads one `x y` pair of surface pixels per line from stdin until EOF
    /// or Ctrl-C, and mirrors every click to meta/zoom-events.jsonl.
    Capture {
        /// Path to the project directory
        path: PathBuf,

        /// Width of the captured surface in pixels (defaults to the media width)
        #[arg(long, requires = "surface_height")]
        surface_width: Option<f64>,

        /// Height of the captured surface in pixels (defaults to the media height)
        #[arg(long, requires = "surface_width")]
        surface_height: Option<f64>,
    },

    /// Set or reset the trim range
    Trim {
        /// Path to the project directory
        path: PathBuf,

        /// Start of the kept range in seconds
        #[arg(required_unless_present = "reset")]
        start: Option<f64>,

        /// End of the kept range in seconds
        #[arg(required_unless_present = "reset")]
        end: Option<f64>,

        /// Keep the whole recording
        #[arg(long, conflicts_with_all = ["start", "end"])]
        reset: bool,
    },

    /// Set or clear the crop region (percentages of the frame)
    Crop {
        /// Path to the project directory
        path: PathBuf,

        #[arg(long, allow_hyphen_values = true, required_unless_present = "clear")]
        x: Option<f64>,

        #[arg(long, allow_hyphen_values = true, required_unless_present = "clear")]
        y: Option<f64>,

        #[arg(long, required_unless_present = "clear")]
        width: Option<f64>,

        #[arg(long, required_unless_present = "clear")]
        height: Option<f64>,

        /// Remove the crop region
        #[arg(long, conflicts_with_all = ["x", "y", "width", "height"])]
        clear: bool,
    },

    /// Edit zoom regions
    Zoom {
        /// Path to the project directory
        path: PathBuf,

        #[command(subcommand)]
        action: commands::zoom::ZoomAction,
    },

    /// Edit text overlays
    Text {
        /// Path to the project directory
        path: PathBuf,

        #[command(subcommand)]
        action: commands::text::TextAction,
    },

    /// Evaluate the live preview at one instant, or sample it over the trim range
    Preview {
        /// Path to the project directory
        path: PathBuf,

        /// Playback position in seconds
        #[arg(long, conflicts_with = "fps")]
        at: Option<f64>,

        /// Sample the whole trimmed range at this rate
        #[arg(long)]
        fps: Option<f64>,
    },

    /// Print the filter-graph program an export would run
    Compile {
        /// Path to the project directory
        path: PathBuf,

        #[command(flatten)]
        settings: SettingsArgs,

        /// Also show which zoom and captions are burned in at this time
        #[arg(long)]
        at: Option<f64>,
    },

    /// Export the edited recording
    Export {
        /// Path to the project directory
        path: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        settings: SettingsArgs,
    },

    /// Check system capabilities
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    clipcast_common::logging::init_logging(&logging)?;

    match cli.command {
        Commands::Init {
            source,
            name,
            output,
            duration,
            width,
            height,
            audio,
            clicks,
        } => commands::init::run(
            &config,
            commands::init::InitArgs {
                source,
                name,
                output,
                duration,
                size: width.zip(height),
                audio,
                clicks,
            },
        ),
        Commands::Info { path } => commands::info::run(path),
        Commands::Validate { path } => commands::validate::run(path, &config),
        Commands::Capture {
            path,
            surface_width,
            surface_height,
        } => {
            commands::capture::run(path, surface_width.zip(surface_height), &config).await
        }
        Commands::Trim {
            path,
            start,
            end,
            reset,
        } => commands::trim::run(path, start.zip(end).filter(|_| !reset)),
        Commands::Crop {
            path,
            x,
            y,
            width,
            height,
            clear,
        } => {
            let region = match (x, y, width, height) {
                (Some(x), Some(y), Some(w), Some(h)) if !clear => Some((x, y, w, h)),
                _ => None,
            };
            commands::crop::run(path, region)
        }
        Commands::Zoom { path, action } => commands::zoom::run(path, action, &config),
        Commands::Text { path, action } => commands::text::run(path, action),
        Commands::Preview { path, at, fps } => commands::preview::run(path, at, fps),
        Commands::Compile { path, settings, at } => {
            commands::compile::run(path, settings, at, &config)
        }
        Commands::Export {
            path,
            output,
            settings,
        } => commands::export::run(path, output, settings, &config).await,
        Commands::Check => commands::check::run(&config),
    }
}
