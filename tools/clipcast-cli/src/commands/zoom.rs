//! Edit zoom regions.

use std::path::PathBuf;

use clap::Subcommand;
use clipcast_common::config::AppConfig;
use clipcast_project_model::{PercentPoint, ZoomRegion, ZoomRegionPatch};

use super::{edit, fmt_secs, load};

#[derive(Subcommand, Debug)]
pub enum ZoomAction {
    /// Add a zoom region
    Add {
        /// Start time in seconds
        #[arg(long)]
        start: f64,

        /// End time in seconds
        #[arg(long)]
        end: f64,

        /// Magnification (at least 1)
        #[arg(long, default_value = "1.5")]
        scale: f64,

        /// Centre x, percent of the frame
        #[arg(long, default_value = "50")]
        x: f64,

        /// Centre y, percent of the frame
        #[arg(long, default_value = "50")]
        y: f64,
    },

    /// Add a centred zoom region starting at a playhead position
    At {
        /// Playhead position in seconds
        time: f64,
    },

    /// Change fields of an existing region
    Set {
        index: usize,

        #[arg(long)]
        start: Option<f64>,

        #[arg(long)]
        end: Option<f64>,

        #[arg(long)]
        scale: Option<f64>,

        #[arg(long, requires = "y")]
        x: Option<f64>,

        #[arg(long, requires = "x")]
        y: Option<f64>,
    },

    /// Remove a region
    Remove { index: usize },

    /// List regions in evaluation order
    List,
}

pub fn run(path: PathBuf, action: ZoomAction, config: &AppConfig) -> anyhow::Result<()> {
    match action {
        ZoomAction::Add {
            start,
            end,
            scale,
            x,
            y,
        } => {
            let region = ZoomRegion::new(start, end, scale, PercentPoint::new(x, y));
            let (_, index) = edit(&path, |p| p.timeline.add_zoom_region(region))?;
            println!("Added zoom region #{index}: {}", describe(&region));
        }
        ZoomAction::At { time } => {
            let defaults = config.capture;
            let (project, index) = edit(&path, |p| {
                let region = ZoomRegion::at_playhead(
                    time,
                    p.timeline.duration(),
                    defaults.manual_zoom_duration_secs,
                    defaults.zoom_scale,
                );
                p.timeline.add_zoom_region(region)
            })?;
            let region = &project.timeline.zoom_regions()[index];
            println!("Added zoom region #{index}: {}", describe(region));
        }
        ZoomAction::Set {
            index,
            start,
            end,
            scale,
            x,
            y,
        } => {
            let patch = ZoomRegionPatch {
                start_time: start,
                end_time: end,
                scale,
                center: x.zip(y).map(|(x, y)| PercentPoint::new(x, y)),
            };
            let (project, ()) = edit(&path, |p| p.timeline.update_zoom_region(index, patch))?;
            let region = &project.timeline.zoom_regions()[index];
            println!("Updated zoom region #{index}: {}", describe(region));
        }
        ZoomAction::Remove { index } => {
            let (_, removed) = edit(&path, |p| p.timeline.remove_zoom_region(index))?;
            println!("Removed zoom region #{index}: {}", describe(&removed));
        }
        ZoomAction::List => {
            let project = load(&path)?;
            let regions = project.timeline.zoom_regions();
            if regions.is_empty() {
                println!("No zoom regions.");
            }
            for (i, region) in regions.iter().enumerate() {
                println!("  #{i}: {}", describe(region));
            }
        }
    }
    Ok(())
}

fn describe(region: &ZoomRegion) -> String {
    format!(
        "{} - {} at {}x, centre ({}%, {}%)",
        fmt_secs(region.start_time),
        fmt_secs(region.end_time),
        region.scale,
        region.center.x,
        region.center.y
    )
}
