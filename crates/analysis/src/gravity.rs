//! Center-of-gravity estimation.

use climbmetrics_common::error::ClimbResult;
use climbmetrics_pose_model::geometry::{PixelPoint, Point2D};
use climbmetrics_pose_model::landmark::{LandmarkFrame, PoseLandmark};

/// Approximate center of gravity from image landmarks.
///
/// The point lies halfway between the shoulder midpoint and the hip midpoint,
/// truncated to integer pixels. Returns `None` when the frame has no detection.
pub fn center_of_gravity(frame: &LandmarkFrame) -> ClimbResult<Option<PixelPoint>> {
    if frame.is_empty() {
        return Ok(None);
    }

    let point = |landmark| frame.require(landmark).map(|lm| lm.point());
    let shoulders = Point2D::midpoint(
        &point(PoseLandmark::LeftShoulder)?,
        &point(PoseLandmark::RightShoulder)?,
    );
    let hips = Point2D::midpoint(
        &point(PoseLandmark::LeftHip)?,
        &point(PoseLandmark::RightHip)?,
    );

    Ok(Some(Point2D::midpoint(&shoulders, &hips).to_pixel()))
}

/// Center of gravity for every frame.
pub fn gravity_track(frames: &[LandmarkFrame]) -> ClimbResult<Vec<Option<PixelPoint>>> {
    frames.iter().map(center_of_gravity).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use climbmetrics_common::error::ClimbError;
    use climbmetrics_pose_model::landmark::Landmark;

    fn torso(ls: (f64, f64), rs: (f64, f64), lh: (f64, f64), rh: (f64, f64)) -> LandmarkFrame {
        LandmarkFrame::new(vec![
            Landmark::image(11, ls.0, ls.1, 0.0),
            Landmark::image(12, rs.0, rs.1, 0.0),
            Landmark::image(23, lh.0, lh.1, 0.0),
            Landmark::image(24, rh.0, rh.1, 0.0),
        ])
    }

    #[test]
    fn test_square_torso() {
        let frame = torso((0.0, 0.0), (10.0, 0.0), (0.0, 20.0), (10.0, 20.0));
        assert_eq!(
            center_of_gravity(&frame).unwrap(),
            Some(PixelPoint::new(5, 10))
        );
    }

    #[test]
    fn test_fractional_point_truncates() {
        let frame = torso((0.0, 0.0), (11.0, 0.0), (0.0, 21.0), (11.0, 21.0));
        assert_eq!(
            center_of_gravity(&frame).unwrap(),
            Some(PixelPoint::new(5, 10))
        );
    }

    #[test]
    fn test_empty_frame_has_no_point() {
        assert_eq!(center_of_gravity(&LandmarkFrame::empty()).unwrap(), None);
    }

    #[test]
    fn test_partial_torso_is_config_error() {
        let frame = LandmarkFrame::new(vec![Landmark::image(11, 0.0, 0.0, 0.0)]);
        assert!(matches!(
            center_of_gravity(&frame),
            Err(ClimbError::Config { .. })
        ));
    }

    #[test]
    fn test_track_is_frame_aligned() {
        let frames = vec![
            LandmarkFrame::empty(),
            torso((0.0, 0.0), (10.0, 0.0), (0.0, 20.0), (10.0, 20.0)),
        ];
        let track = gravity_track(&frames).unwrap();
        assert_eq!(track, vec![None, Some(PixelPoint::new(5, 10))]);
    }
}
