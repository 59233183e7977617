//! End-to-end report generation.
//!
//! ```text
//! source.mp4 ── decode ──┬── pose estimator ── LandmarkStore ──┬── families ── charts
//!                        │                                      └── COG track
//!                        ├── skeleton overlay
//!                        └── pose projection (plot)
//!                                     │
//!                                     ▼
//!                      StreamComposer ── <output_root>/<name>/*.mp4
//!                                     │
//!                                     ▼
//!                        report.json + landmarks.jsonl
//! ```

use std::path::PathBuf;

use chrono::Utc;
use image::RgbImage;

use climbmetrics_analysis::{analyze_families, gravity_track, SmoothingWindow};
use climbmetrics_common::config::AnalysisDefaults;
use climbmetrics_common::error::{ClimbError, ClimbResult};
use climbmetrics_pose_model::report::{
    OutputKind, ReportManifest, ReportOptions, LANDMARKS_FILE, MANIFEST_VERSION,
};
use climbmetrics_pose_model::store::{LandmarkFileHeader, LandmarkStore, LandmarkStoreBuilder};

use crate::chart::{render_chart_frames, ChartStyle};
use crate::overlay::draw_center_of_gravity;
use crate::pose::{PoseEstimator, SourceFrame};
use crate::projection::empty_projection;
use crate::stream::{StreamComposer, VideoStream};
use crate::video::{VideoDecoder, VideoEncoder};

/// A report run ready to be generated.
#[derive(Debug, Clone)]
pub struct ReportJob {
    /// Source video.
    pub video: PathBuf,

    /// Directory that will contain the report directory.
    pub output_root: PathBuf,

    /// Run parameters.
    pub options: ReportOptions,

    /// Frame rate of every written video.
    pub output_fps: u32,

    /// Frame rate used for velocities when the source does not report one.
    pub fallback_source_fps: f64,

    /// Chart surface size.
    pub chart_width: u32,
    pub chart_height: u32,
}

impl ReportJob {
    /// A job using the configured analysis defaults.
    pub fn new(
        video: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
        options: ReportOptions,
        defaults: &AnalysisDefaults,
    ) -> Self {
        Self {
            video: video.into(),
            output_root: output_root.into(),
            options,
            output_fps: defaults.output_fps,
            fallback_source_fps: defaults.fallback_source_fps,
            chart_width: defaults.chart_width,
            chart_height: defaults.chart_height,
        }
    }

    pub fn report_dir(&self) -> PathBuf {
        self.options.report_dir(&self.output_root)
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct ReportSummary {
    pub report_dir: PathBuf,
    pub written: Vec<PathBuf>,
    pub manifest: ReportManifest,
}

/// Decode, analyse, render, and write a full report.
pub fn generate_report(
    job: &ReportJob,
    estimator: &dyn PoseEstimator,
    decoder: &mut dyn VideoDecoder,
    encoder: &mut dyn VideoEncoder,
) -> ClimbResult<ReportSummary> {
    job.options.validate()?;
    let window = SmoothingWindow::new(job.options.smooth)?;
    let report_dir = job.report_dir();
    let composer = StreamComposer::new(&report_dir, job.output_fps)?;

    let decoded = decoder.decode(&job.video)?;
    if decoded.frames.is_empty() {
        return Err(ClimbError::EmptySource {
            path: job.video.clone(),
        });
    }
    let source_fps = decoded.info.fps_or(job.fallback_source_fps);
    let frames = decoded.frames;
    tracing::info!(
        frames = frames.len(),
        width = decoded.info.width,
        height = decoded.info.height,
        source_fps,
        "Source decoded"
    );

    let store = populate_store(estimator, &frames);
    let coverage = store.coverage();
    tracing::info!(
        detected = coverage.image_detected,
        frames = coverage.frame_count,
        gaps = coverage.gap_count,
        "Landmarks collected"
    );

    let outputs = job.options.outputs();
    let families = analyze_families(&store, &job.options.families(), window, source_fps)?;

    let mut streams = Vec::with_capacity(outputs.len());
    let mut raw_slot = None;
    for kind in outputs {
        let rendered = match kind {
            OutputKind::Plot => render_projection_stream(estimator, &frames, job)?,
            // Filled with the source frames once nothing else borrows them.
            OutputKind::RawVideo => {
                raw_slot = Some(streams.len());
                Vec::new()
            }
            OutputKind::PoseVideo => frames
                .iter()
                .enumerate()
                .map(|(index, image)| {
                    estimator.render_skeleton_overlay(SourceFrame { index, image })
                })
                .collect::<ClimbResult<Vec<_>>>()?,
            OutputKind::CenterGravity => {
                let track = gravity_track(store.image())?;
                frames
                    .iter()
                    .zip(track)
                    .map(|(frame, cog)| draw_center_of_gravity(frame, cog))
                    .collect()
            }
            chart => {
                let metrics = chart
                    .family()
                    .and_then(|family| families.iter().find(|m| m.family == family))
                    .ok_or_else(|| {
                        ClimbError::config(format!("no metrics computed for {}", chart.stem()))
                    })?;
                let style =
                    ChartStyle::for_family(metrics.family, job.chart_width, job.chart_height);
                let charts = render_chart_frames(&metrics.smoothed, &style)?;
                tracing::debug!(
                    family = metrics.family.title(),
                    frames = charts.len(),
                    "Charts rendered"
                );
                charts
            }
        };
        streams.push(VideoStream::new(kind, rendered));
    }

    let (width, height) = frames[0].dimensions();
    let frame_count = frames.len();
    if let Some(slot) = raw_slot {
        streams[slot] = VideoStream::new(OutputKind::RawVideo, frames);
    }

    let written = composer.compose(&streams, encoder)?;

    let header = LandmarkFileHeader {
        source: Some(job.video.display().to_string()),
        ..LandmarkFileHeader::new(frame_count, width, height)
    };
    std::fs::write(report_dir.join(LANDMARKS_FILE), store.to_jsonl(&header)?)?;

    let manifest = ReportManifest {
        version: MANIFEST_VERSION.to_string(),
        name: job.options.name.clone(),
        source: job.video.clone(),
        frame_count,
        width,
        height,
        source_fps,
        output_fps: job.output_fps,
        smoothing_window: window.get(),
        coverage,
        outputs: written
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect(),
        generated_at: Utc::now(),
    };
    manifest.save(&report_dir)?;

    tracing::info!(
        report = %report_dir.display(),
        outputs = written.len(),
        "Report complete"
    );

    Ok(ReportSummary {
        report_dir,
        written,
        manifest,
    })
}

/// Run the estimator over every frame, in order.
fn populate_store(estimator: &dyn PoseEstimator, frames: &[RgbImage]) -> LandmarkStore {
    let mut builder = LandmarkStoreBuilder::with_capacity(frames.len());
    for (index, image) in frames.iter().enumerate() {
        let frame = SourceFrame { index, image };
        builder.push(
            estimator.detect_world_landmarks(frame),
            estimator.detect_image_landmarks(frame),
        );
    }
    builder.finish()
}

/// One projection per source frame; frames without a detection get a blank
/// canvas sized like the first real projection (or the chart surface).
fn render_projection_stream(
    estimator: &dyn PoseEstimator,
    frames: &[RgbImage],
    job: &ReportJob,
) -> ClimbResult<Vec<RgbImage>> {
    let projections = frames
        .iter()
        .enumerate()
        .map(|(index, image)| estimator.render_pose_projection(SourceFrame { index, image }))
        .collect::<ClimbResult<Vec<_>>>()?;

    let (width, height) = projections
        .iter()
        .flatten()
        .next()
        .map(|p| p.dimensions())
        .unwrap_or((job.chart_width, job.chart_height));

    Ok(projections
        .into_iter()
        .map(|p| p.unwrap_or_else(|| empty_projection(width, height)))
        .collect())
}
