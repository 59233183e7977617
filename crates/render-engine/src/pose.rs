//! Pose estimation boundary.
//!
//! The pipeline asks an estimator for landmarks and pose renderings one
//! source frame at a time. A frame without a detection yields an empty
//! [`LandmarkFrame`]; that is never an error.

use std::collections::BTreeMap;
use std::path::Path;

use image::RgbImage;

use climbmetrics_common::error::ClimbResult;
use climbmetrics_pose_model::landmark::LandmarkFrame;
use climbmetrics_pose_model::store::{LandmarkFile, LandmarkRecord};

use crate::overlay::draw_skeleton;
use crate::projection::render_projection;

/// One decoded source frame.
#[derive(Debug, Clone, Copy)]
pub struct SourceFrame<'a> {
    pub index: usize,
    pub image: &'a RgbImage,
}

/// A per-frame pose detector.
pub trait PoseEstimator {
    /// Body-centred 3D landmarks with visibility.
    fn detect_world_landmarks(&self, frame: SourceFrame<'_>) -> LandmarkFrame;

    /// Pixel-space landmarks.
    fn detect_image_landmarks(&self, frame: SourceFrame<'_>) -> LandmarkFrame;

    /// A copy of the frame with the detected skeleton drawn on it.
    fn render_skeleton_overlay(&self, frame: SourceFrame<'_>) -> ClimbResult<RgbImage>;

    /// A 3D view of the detected pose, or `None` when nothing was detected.
    fn render_pose_projection(&self, frame: SourceFrame<'_>) -> ClimbResult<Option<RgbImage>>;
}

/// Replays landmarks recorded by an external detector.
#[derive(Debug, Clone)]
pub struct RecordedPoseEstimator {
    records: BTreeMap<usize, LandmarkRecord>,
    projection_size: (u32, u32),
}

impl RecordedPoseEstimator {
    /// Default projection surface size.
    pub const DEFAULT_PROJECTION_SIZE: (u32, u32) = (640, 480);

    /// Load a landmark JSONL file.
    pub fn from_file(path: impl AsRef<Path>) -> ClimbResult<Self> {
        let path = path.as_ref();
        let file = LandmarkFile::load(path)?;
        tracing::info!(
            path = %path.display(),
            records = file.records.len(),
            "Loaded recorded landmarks"
        );
        Ok(Self::from_landmark_file(&file))
    }

    pub fn from_landmark_file(file: &LandmarkFile) -> Self {
        Self {
            records: file.by_frame(),
            projection_size: Self::DEFAULT_PROJECTION_SIZE,
        }
    }

    /// Set the size of pose projection frames.
    pub fn with_projection_size(mut self, width: u32, height: u32) -> Self {
        self.projection_size = (width, height);
        self
    }

    /// Number of frames with a record.
    pub fn recorded_frames(&self) -> usize {
        self.records.len()
    }

    fn record(&self, index: usize) -> Option<&LandmarkRecord> {
        self.records.get(&index)
    }
}

impl PoseEstimator for RecordedPoseEstimator {
    fn detect_world_landmarks(&self, frame: SourceFrame<'_>) -> LandmarkFrame {
        self.record(frame.index)
            .map(|r| r.world.clone())
            .unwrap_or_default()
    }

    fn detect_image_landmarks(&self, frame: SourceFrame<'_>) -> LandmarkFrame {
        self.record(frame.index)
            .map(|r| r.image.clone())
            .unwrap_or_default()
    }

    fn render_skeleton_overlay(&self, frame: SourceFrame<'_>) -> ClimbResult<RgbImage> {
        let landmarks = self.detect_image_landmarks(frame);
        Ok(draw_skeleton(frame.image, &landmarks))
    }

    fn render_pose_projection(&self, frame: SourceFrame<'_>) -> ClimbResult<Option<RgbImage>> {
        let (width, height) = self.projection_size;
        render_projection(&self.detect_world_landmarks(frame), width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSONL: &str = concat!(
        "# {\"schema_version\":\"1.0\",\"frame_count\":3}\n",
        "{\"frame\":1,",
        "\"world\":[{\"id\":0,\"x\":0.0,\"y\":0.0,\"z\":0.0,\"visibility\":0.9}],",
        "\"image\":[{\"id\":0,\"x\":4.0,\"y\":4.0,\"z\":0.0}]}\n",
    );

    fn estimator() -> RecordedPoseEstimator {
        let file = LandmarkFile::parse(JSONL).unwrap();
        RecordedPoseEstimator::from_landmark_file(&file)
            .with_projection_size(64, 48)
    }

    #[test]
    fn test_missing_records_are_missing_detections() {
        let image = RgbImage::new(8, 8);
        let est = estimator();
        let at = |index| SourceFrame { index, image: &image };

        assert!(est.detect_world_landmarks(at(0)).is_empty());
        assert_eq!(est.detect_image_landmarks(at(1)).len(), 1);
        assert!(est.detect_image_landmarks(at(99)).is_empty());
        assert_eq!(est.recorded_frames(), 1);
    }

    #[test]
    fn test_projection_follows_detection() {
        let image = RgbImage::new(8, 8);
        let est = estimator();
        assert!(est
            .render_pose_projection(SourceFrame { index: 0, image: &image })
            .unwrap()
            .is_none());
        let projection = est
            .render_pose_projection(SourceFrame { index: 1, image: &image })
            .unwrap()
            .unwrap();
        assert_eq!(projection.dimensions(), (64, 48));
    }

    #[test]
    fn test_overlay_is_a_same_size_copy() {
        let image = RgbImage::new(8, 8);
        let est = estimator();
        let overlay = est
            .render_skeleton_overlay(SourceFrame { index: 1, image: &image })
            .unwrap();
        assert_eq!(overlay.dimensions(), image.dimensions());
        assert_ne!(overlay, image);
    }
}
