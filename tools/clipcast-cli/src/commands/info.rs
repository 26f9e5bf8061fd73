//! Show project information.

use std::path::PathBuf;

use super::{fmt_secs, load};

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let project = load(&path)?;
    let p = &project.project;
    let t = &project.timeline;

    println!("Project: {}", p.name);
    println!("  ID: {}", p.id);
    println!("  Created: {}", p.created_at);
    println!("  Modified: {}", p.modified_at);
    println!();

    println!("Source:");
    println!("  File: {} ({})", p.source.path, p.source.mime_type);
    println!(
        "  Media: {}x{}, {}",
        t.intrinsic_size().width,
        t.intrinsic_size().height,
        fmt_secs(t.duration())
    );
    println!("  Audio: {}", if p.source.has_audio { "yes" } else { "no" });
    println!();

    let trim = t.trim_range();
    println!("Timeline:");
    println!(
        "  Trim: {} - {} ({})",
        fmt_secs(trim.start),
        fmt_secs(trim.end),
        fmt_secs(trim.len())
    );
    match t.crop_region() {
        Some(c) => println!(
            "  Crop: x={}% y={}% {}% x {}%",
            c.x, c.y, c.width, c.height
        ),
        None => println!("  Crop: none"),
    }
    println!("  Zoom regions: {}", t.zoom_regions().len());
    println!("  Text overlays: {}", t.text_overlays().len());
    println!();

    println!("Export settings:");
    println!(
        "  {} / {} / {}",
        p.export.format, p.export.resolution, p.export.quality
    );

    Ok(())
}
