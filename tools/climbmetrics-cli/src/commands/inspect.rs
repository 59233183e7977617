//! Summarize a landmark file.

use std::path::PathBuf;

use climbmetrics_pose_model::store::LandmarkFile;

const MAX_LISTED_GAPS: usize = 10;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let file = LandmarkFile::load(&path)?;
    let header = file.header.clone();
    let store = file.into_store()?;
    let coverage = store.coverage();

    println!("Landmarks: {}", path.display());
    if let Some(header) = &header {
        println!("  Schema: {}", header.schema_version);
        if let (Some(w), Some(h)) = (header.width, header.height) {
            println!("  Source size: {w}x{h}");
        }
        if let Some(source) = &header.source {
            println!("  Source: {source}");
        }
    }
    println!("  Frames: {}", coverage.frame_count);
    println!(
        "  Image detections: {} ({:.1}%)",
        coverage.image_detected,
        coverage.image_ratio() * 100.0
    );
    println!("  World detections: {}", coverage.world_detected);
    println!();

    let gaps = store.gap_runs();
    if gaps.is_empty() {
        println!("No detection gaps.");
        return Ok(());
    }

    println!(
        "Detection gaps: {} (longest {} frames)",
        coverage.gap_count, coverage.longest_gap
    );
    for gap in gaps.iter().take(MAX_LISTED_GAPS) {
        println!("  - frames {}..{} ({} frames)", gap.start, gap.end, gap.len());
    }
    if gaps.len() > MAX_LISTED_GAPS {
        println!("  ... {} more", gaps.len() - MAX_LISTED_GAPS);
    }

    Ok(())
}
