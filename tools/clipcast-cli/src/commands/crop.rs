//! Set or clear the crop region.

use std::path::PathBuf;

use clipcast_project_model::CropRegion;

use super::edit;

pub fn run(path: PathBuf, region: Option<(f64, f64, f64, f64)>) -> anyhow::Result<()> {
    let crop = region.map(|(x, y, w, h)| CropRegion::new(x, y, w, h));
    edit(&path, |p| p.timeline.set_crop_region(crop))?;

    match crop {
        Some(c) => println!(
            "Crop region: x={}% y={}% {}% x {}%",
            c.x, c.y, c.width, c.height
        ),
        None => println!("Crop region cleared"),
    }
    Ok(())
}
