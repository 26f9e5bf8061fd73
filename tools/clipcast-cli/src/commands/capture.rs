//! Record clicks against a live surface and turn them into zoom regions.
//!
//! Clicks arrive on stdin, one `x y` pair of surface pixels per line, from
//! whatever is watching the pointer. Timestamps count from the start of the
//! command. Capture ends at end of input or Ctrl-C.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use clipcast_common::clock::RecordingClock;
use clipcast_common::config::AppConfig;
use clipcast_input_tracker::{zoom_params, PointerClick, ZoomCapture};
use clipcast_project_model::{DisplayGeometry, ElementRect};
use tokio::sync::mpsc;

use super::{fmt_secs, load};

pub async fn run(
    path: PathBuf,
    surface: Option<(f64, f64)>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let mut project = load(&path)?;
    let media = project.timeline.intrinsic_size();
    let (width, height) = surface.unwrap_or((f64::from(media.width), f64::from(media.height)));
    let geometry = DisplayGeometry::new(ElementRect::new(0.0, 0.0, width, height), media);

    let clock = RecordingClock::start();
    let epoch_wall = clock.epoch_wall().to_string();
    let mut capture = ZoomCapture::new(clock, zoom_params(&config.capture))
        .with_event_log(project.zoom_events_path(), &epoch_wall)?;
    capture.start()?;

    println!("Capturing clicks for: {}", path.display());
    println!("  Surface: {width}x{height} px, one `x y` per line; Ctrl-C or EOF to stop");

    let (tx, mut rx) = mpsc::channel(64);
    // Blocking stdin on its own thread; a pending read never holds up exit.
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match parse_click(&line) {
                Some((x, y)) => {
                    let click = PointerClick {
                        x,
                        y,
                        surface: geometry,
                    };
                    if tx.blocking_send(click).is_err() {
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => tracing::warn!(line = %line, "Ignoring malformed click"),
            }
        }
    });

    let stop_flag = capture.stop_flag();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop_flag.store(true, Ordering::SeqCst);
        }
    });

    let accepted = capture.listen(&mut rx).await?;
    interrupt.abort();

    for event in capture.events() {
        println!(
            "  click at {} -> ({:.1}%, {:.1}%)",
            fmt_secs(RecordingClock::ms_to_secs(event.timestamp)),
            event.x,
            event.y
        );
    }
    let inserted = capture.stop(&mut project.timeline)?;

    project.project.touch();
    project
        .save()
        .map_err(|e| anyhow::anyhow!("Failed to save project: {e}"))?;

    println!(
        "Captured {accepted} click(s); {} zoom region(s) added",
        inserted.len()
    );
    println!("  Click log: {}", project.zoom_events_path().display());
    Ok(())
}

/// Parse one `x y` (or `x,y`) pair of surface pixels.
pub(crate) fn parse_click(line: &str) -> Option<(f64, f64)> {
    let mut parts = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty());
    let x = parts.next()?.parse::<f64>().ok()?;
    let y = parts.next()?.parse::<f64>().ok()?;
    if parts.next().is_some() || !x.is_finite() || !y.is_finite() {
        return None;
    }
    Some((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_click_accepts_space_or_comma() {
        assert_eq!(parse_click("640 360"), Some((640.0, 360.0)));
        assert_eq!(parse_click(" 12.5, -3 "), Some((12.5, -3.0)));
    }

    #[test]
    fn test_parse_click_rejects_malformed_lines() {
        assert_eq!(parse_click(""), None);
        assert_eq!(parse_click("640"), None);
        assert_eq!(parse_click("1 2 3"), None);
        assert_eq!(parse_click("x y"), None);
        assert_eq!(parse_click("NaN 4"), None);
    }
}
