//! Generate a report from a climbing video.

use std::path::{Path, PathBuf};

use climbmetrics_common::config::AppConfig;
use climbmetrics_common::error::ClimbError;
use climbmetrics_pose_model::report::ReportOptions;
use climbmetrics_render_engine::{
    generate_report, FfmpegBackend, RecordedPoseEstimator, ReportJob, VideoCodec, VideoDecoder,
};

pub struct ReportArgs {
    pub video: PathBuf,
    pub name: String,
    pub draw: bool,
    pub limbex: bool,
    pub velocity: bool,
    pub cog: bool,
    pub smooth: Option<usize>,
    pub landmarks: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub codec: Option<String>,
}

pub fn run(args: ReportArgs, config: &AppConfig) -> anyhow::Result<()> {
    let options = ReportOptions {
        name: args.name,
        draw: args.draw,
        limbex: args.limbex,
        velocity: args.velocity,
        cog: args.cog,
        smooth: args.smooth.unwrap_or(config.analysis.smoothing_window),
    };
    options.validate()?;

    let output_root = args.output.unwrap_or_else(|| config.output_root.clone());
    let codec: VideoCodec = args
        .codec
        .as_deref()
        .unwrap_or(config.analysis.video_codec.as_str())
        .parse()?;
    let landmarks_path = args
        .landmarks
        .unwrap_or_else(|| default_landmarks_path(&args.video));

    println!("Generating report for: {}", args.video.display());
    println!("  Name: {}", options.name);
    println!("  Landmarks: {}", landmarks_path.display());
    println!("  Smoothing window: {}", options.smooth);
    println!("  Codec: {}", codec.as_str());

    if !landmarks_path.is_file() {
        return Err(anyhow::anyhow!(
            "Landmark file not found: {}. Pass --landmarks <PATH>.",
            landmarks_path.display()
        ));
    }

    let mut decoder = FfmpegBackend::new(codec);
    let mut encoder = FfmpegBackend::new(codec);
    if !decoder.is_available() {
        return Err(ClimbError::unsupported(
            "ffmpeg and ffprobe must be on PATH (see `climbmetrics check`)",
        )
        .into());
    }

    let job = ReportJob::new(args.video, output_root, options, &config.analysis);
    tracing::debug!(?job, "Report job prepared");
    let estimator = RecordedPoseEstimator::from_file(&landmarks_path)?
        .with_projection_size(job.chart_width, job.chart_height);

    let summary = generate_report(&job, &estimator, &mut decoder, &mut encoder)?;

    println!("\nReport complete: {}", summary.report_dir.display());
    println!(
        "  Frames: {} ({}x{}, {:.2} fps source)",
        summary.manifest.frame_count,
        summary.manifest.width,
        summary.manifest.height,
        summary.manifest.source_fps
    );
    println!(
        "  Detection coverage: {:.1}%",
        summary.manifest.coverage.image_ratio() * 100.0
    );
    for path in &summary.written {
        println!("  - {}", path.display());
    }

    Ok(())
}

/// `<dir>/<stem>.landmarks.jsonl` next to the video.
fn default_landmarks_path(video: &Path) -> PathBuf {
    video.with_extension("landmarks.jsonl")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_landmarks_path_sits_next_to_video() {
        assert_eq!(
            default_landmarks_path(Path::new("clips/climb.mp4")),
            PathBuf::from("clips/climb.landmarks.jsonl")
        );
        assert_eq!(
            default_landmarks_path(Path::new("climb")),
            PathBuf::from("climb.landmarks.jsonl")
        );
    }
}
