//! Edit text overlays.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use clipcast_project_model::{PercentPoint, TextOverlay, TextOverlayPatch, TextStyle};

use super::{edit, fmt_secs, load};

/// Style overrides; unset fields keep their current (or default) value.
#[derive(Args, Debug, Clone, Default)]
pub struct StyleArgs {
    /// Font size in pixels
    #[arg(long)]
    size: Option<f64>,

    /// Text colour (CSS syntax)
    #[arg(long)]
    color: Option<String>,

    /// Box colour behind the text (CSS syntax)
    #[arg(long)]
    background: Option<String>,

    /// Font weight (normal, bold, 100-900)
    #[arg(long)]
    weight: Option<String>,

    /// Font family
    #[arg(long)]
    font: Option<String>,
}

impl StyleArgs {
    fn is_empty(&self) -> bool {
        self.size.is_none()
            && self.color.is_none()
            && self.background.is_none()
            && self.weight.is_none()
            && self.font.is_none()
    }

    fn apply_to(self, mut style: TextStyle) -> TextStyle {
        if let Some(v) = self.size {
            style.font_size = v;
        }
        if let Some(v) = self.color {
            style.color = v;
        }
        if let Some(v) = self.background {
            style.background_color = v;
        }
        if let Some(v) = self.weight {
            style.font_weight = v;
        }
        if let Some(v) = self.font {
            style.font_family = v;
        }
        style
    }
}

#[derive(Subcommand, Debug)]
pub enum TextAction {
    /// Add a caption starting at a playhead position
    Add {
        text: String,

        /// Playhead position in seconds
        #[arg(long)]
        at: f64,

        /// End time in seconds (defaults to five seconds later)
        #[arg(long)]
        end: Option<f64>,

        /// Left edge, percent of the frame
        #[arg(long, default_value = "50")]
        x: f64,

        /// Top edge, percent of the frame
        #[arg(long, default_value = "50")]
        y: f64,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Change fields of an existing caption
    Set {
        index: usize,

        #[arg(long)]
        text: Option<String>,

        #[arg(long)]
        start: Option<f64>,

        #[arg(long)]
        end: Option<f64>,

        #[arg(long, requires = "y")]
        x: Option<f64>,

        #[arg(long, requires = "x")]
        y: Option<f64>,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Remove a caption
    Remove { index: usize },

    /// List captions
    List,
}

pub fn run(path: PathBuf, action: TextAction) -> anyhow::Result<()> {
    match action {
        TextAction::Add {
            text,
            at,
            end,
            x,
            y,
            style,
        } => {
            let (project, index) = edit(&path, |p| {
                let mut overlay = TextOverlay::at_playhead(text, at, p.timeline.duration());
                if let Some(end) = end {
                    overlay.end_time = end;
                }
                overlay.position = PercentPoint::new(x, y);
                overlay.style = style.apply_to(overlay.style);
                p.timeline.add_text_overlay(overlay)
            })?;
            let overlay = &project.timeline.text_overlays()[index];
            println!("Added text overlay #{index}: {}", describe(overlay));
        }
        TextAction::Set {
            index,
            text,
            start,
            end,
            x,
            y,
            style,
        } => {
            let (project, ()) = edit(&path, |p| {
                let current = p
                    .timeline
                    .text_overlays()
                    .get(index)
                    .map(|o| o.style.clone())
                    .unwrap_or_default();
                let patch = TextOverlayPatch {
                    text,
                    position: x.zip(y).map(|(x, y)| PercentPoint::new(x, y)),
                    start_time: start,
                    end_time: end,
                    style: (!style.is_empty()).then(|| style.apply_to(current)),
                };
                p.timeline.update_text_overlay(index, patch)
            })?;
            let overlay = &project.timeline.text_overlays()[index];
            println!("Updated text overlay #{index}: {}", describe(overlay));
        }
        TextAction::Remove { index } => {
            let (_, removed) = edit(&path, |p| p.timeline.remove_text_overlay(index))?;
            println!("Removed text overlay #{index}: {}", describe(&removed));
        }
        TextAction::List => {
            let project = load(&path)?;
            let overlays = project.timeline.text_overlays();
            if overlays.is_empty() {
                println!("No text overlays.");
            }
            for (i, overlay) in overlays.iter().enumerate() {
                println!("  #{i}: {}", describe(overlay));
            }
        }
    }
    Ok(())
}

fn describe(overlay: &TextOverlay) -> String {
    format!(
        "{:?} {} - {} at ({}%, {}%), {}px {} {}",
        overlay.text,
        fmt_secs(overlay.start_time),
        fmt_secs(overlay.end_time),
        overlay.position.x,
        overlay.position.y,
        overlay.style.font_size,
        overlay.style.font_weight,
        overlay.style.color
    )
}
