//! Raw metric extraction from landmark frames.
//!
//! Every extractor produces exactly one value per source frame. Frames where
//! a value cannot be measured (no detection, or no previous detection for
//! velocities) carry the previous value forward; frame 0 falls back to `0.0`.

use climbmetrics_common::error::{ClimbError, ClimbResult};
use climbmetrics_pose_model::landmark::{LandmarkFrame, LandmarkPair, PoseLandmark};
use climbmetrics_pose_model::report::MetricSource;
use climbmetrics_pose_model::series::MetricSeries;
use climbmetrics_pose_model::store::LandmarkStore;

/// Extract the series described by `source` from a store.
///
/// Distances read world landmarks; velocities read image landmarks and are
/// scaled by `fps` into units per second.
pub fn extract(store: &LandmarkStore, source: MetricSource, fps: f64) -> ClimbResult<MetricSeries> {
    match source {
        MetricSource::Distance(pair) => distance_series(store.world(), pair),
        MetricSource::Velocity(landmark) => velocity_series(store.image(), landmark, fps),
    }
}

/// 3D distance between two landmarks in every frame.
pub fn distance_series(frames: &[LandmarkFrame], pair: LandmarkPair) -> ClimbResult<MetricSeries> {
    carry_forward(frames.len(), |i| {
        let frame = &frames[i];
        if frame.is_empty() {
            return Ok(None);
        }
        let from = frame.require(pair.from)?;
        let to = frame.require(pair.to)?;
        Ok(Some(from.distance_3d(to)))
    })
}

/// Pixel speed of one landmark between consecutive frames, times `fps`.
pub fn velocity_series(
    frames: &[LandmarkFrame],
    landmark: PoseLandmark,
    fps: f64,
) -> ClimbResult<MetricSeries> {
    if !fps.is_finite() || fps <= 0.0 {
        return Err(ClimbError::config(format!(
            "frame rate must be a positive number, got {fps}"
        )));
    }

    carry_forward(frames.len(), |i| {
        if i == 0 {
            return Ok(None);
        }
        let (previous, current) = (&frames[i - 1], &frames[i]);
        if previous.is_empty() || current.is_empty() {
            return Ok(None);
        }
        let displacement = current
            .require(landmark)?
            .distance_2d(previous.require(landmark)?);
        Ok(Some(displacement * fps))
    })
}

/// Apply the gap policy over `len` frames.
///
/// `sample` returns `None` for a frame with nothing to measure.
fn carry_forward<F>(len: usize, mut sample: F) -> ClimbResult<MetricSeries>
where
    F: FnMut(usize) -> ClimbResult<Option<f64>>,
{
    let mut values = Vec::with_capacity(len);
    let mut last = 0.0;
    for i in 0..len {
        if let Some(value) = sample(i)? {
            last = value;
        }
        values.push(last);
    }
    Ok(MetricSeries::new(values))
}
