//! Set or reset the trim range.

use std::path::PathBuf;

use super::{edit, fmt_secs};

pub fn run(path: PathBuf, range: Option<(f64, f64)>) -> anyhow::Result<()> {
    let (project, ()) = edit(&path, |p| match range {
        Some((start, end)) => p.timeline.set_trim_range(start, end),
        None => {
            p.timeline.reset_trim();
            Ok(())
        }
    })?;

    let trim = project.timeline.trim_range();
    println!(
        "Trim range: {} - {} ({} kept)",
        fmt_secs(trim.start),
        fmt_secs(trim.end),
        fmt_secs(trim.len())
    );
    Ok(())
}
