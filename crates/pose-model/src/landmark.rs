//! Body landmark types.
//!
//! Landmarks follow the 33-point full-body topology emitted by common pose
//! estimators. Two coordinate spaces exist per frame:
//! - **World-relative:** metres in a body-centred 3D space, with a
//!   per-landmark `visibility` confidence.
//! - **Image-relative:** pixel `x`/`y` in the source frame, plus a depth-like `z`.

use serde::{Deserialize, Serialize};

use climbmetrics_common::error::{ClimbError, ClimbResult};

use crate::geometry::Point2D;

/// Number of landmarks in a complete detection.
pub const LANDMARK_COUNT: usize = 33;

/// One body keypoint for one video frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Position in the landmark catalogue (see [`PoseLandmark`]).
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Detection confidence; present on world-relative landmarks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
}

impl Landmark {
    /// Create a world-relative landmark.
    pub fn world(id: u32, x: f64, y: f64, z: f64, visibility: f64) -> Self {
        Self {
            id,
            x,
            y,
            z,
            visibility: Some(visibility),
        }
    }

    /// Create an image-relative landmark in pixel coordinates.
    pub fn image(id: u32, x: f64, y: f64, z: f64) -> Self {
        Self {
            id,
            x,
            y,
            z,
            visibility: None,
        }
    }

    /// Euclidean distance over all three axes.
    pub fn distance_3d(&self, other: &Landmark) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2) + (self.z - other.z).powi(2))
            .sqrt()
    }

    /// Euclidean distance in the `x`/`y` plane only.
    pub fn distance_2d(&self, other: &Landmark) -> f64 {
        self.point().distance_to(&other.point())
    }

    /// The `x`/`y` projection of this landmark.
    pub fn point(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

/// All landmarks detected in one source frame.
///
/// The empty frame means "no detection" and is a normal, recoverable state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkFrame {
    landmarks: Vec<Landmark>,
}

impl LandmarkFrame {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    /// A frame with no detection.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    /// Look up a landmark by catalogue entry.
    ///
    /// Landmarks are normally stored in id order, so the positional slot is
    /// tried first before scanning.
    pub fn get(&self, landmark: PoseLandmark) -> Option<&Landmark> {
        let id = landmark.index() as u32;
        self.landmarks
            .get(landmark.index())
            .filter(|lm| lm.id == id)
            .or_else(|| self.landmarks.iter().find(|lm| lm.id == id))
    }

    /// Like [`get`](Self::get), but a missing landmark in a non-empty frame is
    /// reported as a configuration error.
    pub fn require(&self, landmark: PoseLandmark) -> ClimbResult<&Landmark> {
        self.get(landmark).ok_or_else(|| {
            ClimbError::config(format!(
                "landmark {} ({}) is not present in a frame with {} landmarks",
                landmark.index(),
                landmark.name(),
                self.landmarks.len()
            ))
        })
    }
}

impl LandmarkFrame {
    /// Check that every landmark id names a catalogue entry.
    pub fn validate_ids(&self) -> ClimbResult<()> {
        for landmark in &self.landmarks {
            PoseLandmark::resolve(landmark.id as usize)?;
        }
        Ok(())
    }
}

impl From<Vec<Landmark>> for LandmarkFrame {
    fn from(landmarks: Vec<Landmark>) -> Self {
        Self::new(landmarks)
    }
}

macro_rules! pose_landmarks {
    ($($variant:ident = $index:literal => $name:literal),+ $(,)?) => {
        /// The 33-point body landmark catalogue.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum PoseLandmark {
            $($variant = $index),+
        }

        impl PoseLandmark {
            /// Every catalogue entry in index order.
            pub const ALL: [PoseLandmark; LANDMARK_COUNT] = [$(PoseLandmark::$variant),+];

            /// Human-readable name.
            pub fn name(self) -> &'static str {
                match self {
                    $(PoseLandmark::$variant => $name),+
                }
            }
        }
    };
}

pose_landmarks! {
    Nose = 0 => "nose",
    LeftEyeInner = 1 => "left eye inner",
    LeftEye = 2 => "left eye",
    LeftEyeOuter = 3 => "left eye outer",
    RightEyeInner = 4 => "right eye inner",
    RightEye = 5 => "right eye",
    RightEyeOuter = 6 => "right eye outer",
    LeftEar = 7 => "left ear",
    RightEar = 8 => "right ear",
    MouthLeft = 9 => "mouth left",
    MouthRight = 10 => "mouth right",
    LeftShoulder = 11 => "left shoulder",
    RightShoulder = 12 => "right shoulder",
    LeftElbow = 13 => "left elbow",
    RightElbow = 14 => "right elbow",
    LeftWrist = 15 => "left wrist",
    RightWrist = 16 => "right wrist",
    LeftPinky = 17 => "left pinky",
    RightPinky = 18 => "right pinky",
    LeftIndex = 19 => "left index",
    RightIndex = 20 => "right index",
    LeftThumb = 21 => "left thumb",
    RightThumb = 22 => "right thumb",
    LeftHip = 23 => "left hip",
    RightHip = 24 => "right hip",
    LeftKnee = 25 => "left knee",
    RightKnee = 26 => "right knee",
    LeftAnkle = 27 => "left ankle",
    RightAnkle = 28 => "right ankle",
    LeftHeel = 29 => "left heel",
    RightHeel = 30 => "right heel",
    LeftFootIndex = 31 => "left foot index",
    RightFootIndex = 32 => "right foot index",
}

impl PoseLandmark {
    /// Position in the catalogue.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Resolve a raw landmark index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Like [`from_index`](Self::from_index), but an index outside the
    /// catalogue is a configuration error.
    pub fn resolve(index: usize) -> ClimbResult<Self> {
        Self::from_index(index).ok_or_else(|| {
            ClimbError::config(format!(
                "landmark index {index} is outside the catalogue (0..{LANDMARK_COUNT})"
            ))
        })
    }
}

/// A validated pair of landmarks used by distance metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LandmarkPair {
    pub from: PoseLandmark,
    pub to: PoseLandmark,
}

impl LandmarkPair {
    pub const fn new(from: PoseLandmark, to: PoseLandmark) -> Self {
        Self { from, to }
    }

}

/// Skeleton edges drawn by overlays and projections.
pub const POSE_CONNECTIONS: [(PoseLandmark, PoseLandmark); 35] = {
    use PoseLandmark::*;
    [
        (Nose, RightEyeInner),
        (RightEyeInner, RightEye),
        (RightEye, RightEyeOuter),
        (RightEyeOuter, RightEar),
        (Nose, LeftEyeInner),
        (LeftEyeInner, LeftEye),
        (LeftEye, LeftEyeOuter),
        (LeftEyeOuter, LeftEar),
        (MouthRight, MouthLeft),
        (RightShoulder, LeftShoulder),
        (RightShoulder, RightElbow),
        (RightElbow, RightWrist),
        (RightWrist, RightPinky),
        (RightWrist, RightIndex),
        (RightWrist, RightThumb),
        (RightPinky, RightIndex),
        (LeftShoulder, LeftElbow),
        (LeftElbow, LeftWrist),
        (LeftWrist, LeftPinky),
        (LeftWrist, LeftIndex),
        (LeftWrist, LeftThumb),
        (LeftPinky, LeftIndex),
        (RightShoulder, RightHip),
        (LeftShoulder, LeftHip),
        (RightHip, LeftHip),
        (RightHip, RightKnee),
        (LeftHip, LeftKnee),
        (RightKnee, RightAnkle),
        (LeftKnee, LeftAnkle),
        (RightAnkle, RightHeel),
        (LeftAnkle, LeftHeel),
        (RightHeel, RightFootIndex),
        (LeftHeel, LeftFootIndex),
        (RightAnkle, RightFootIndex),
        (LeftAnkle, LeftFootIndex),
    ]
};

#[cfg(test)]
mod tests {
    use super::*;

    fn full_frame() -> LandmarkFrame {
        (0..LANDMARK_COUNT as u32)
            .map(|id| Landmark::image(id, id as f64, 2.0 * id as f64, 0.0))
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn test_catalogue_indices_are_positional() {
        for (i, lm) in PoseLandmark::ALL.iter().enumerate() {
            assert_eq!(lm.index(), i);
            assert_eq!(PoseLandmark::from_index(i), Some(*lm));
        }
        assert_eq!(PoseLandmark::from_index(LANDMARK_COUNT), None);
        assert_eq!(PoseLandmark::RightShoulder.index(), 12);
        assert_eq!(PoseLandmark::LeftFootIndex.index(), 31);
    }

    #[test]
    fn test_get_uses_id_not_only_position() {
        let frame = LandmarkFrame::new(vec![
            Landmark::image(24, 1.0, 1.0, 0.0),
            Landmark::image(12, 5.0, 5.0, 0.0),
        ]);
        assert_eq!(frame.get(PoseLandmark::RightShoulder).unwrap().x, 5.0);
        assert_eq!(frame.get(PoseLandmark::RightHip).unwrap().x, 1.0);
        assert!(frame.get(PoseLandmark::Nose).is_none());
    }

    #[test]
    fn test_require_reports_config_error() {
        let frame = LandmarkFrame::new(vec![Landmark::image(0, 0.0, 0.0, 0.0)]);
        let err = frame.require(PoseLandmark::LeftHip).unwrap_err();
        assert!(matches!(err, ClimbError::Config { .. }));
    }

    #[test]
    fn test_resolve_rejects_indices_outside_catalogue() {
        assert_eq!(PoseLandmark::resolve(16).unwrap(), PoseLandmark::RightWrist);
        assert_eq!(PoseLandmark::resolve(32).unwrap(), PoseLandmark::RightFootIndex);
        let err = PoseLandmark::resolve(LANDMARK_COUNT).unwrap_err();
        assert!(matches!(err, ClimbError::Config { .. }));
    }

    #[test]
    fn test_validate_ids() {
        assert!(full_frame().validate_ids().is_ok());
        assert!(LandmarkFrame::empty().validate_ids().is_ok());
        let frame = LandmarkFrame::new(vec![Landmark::image(40, 0.0, 0.0, 0.0)]);
        assert!(matches!(
            frame.validate_ids().unwrap_err(),
            ClimbError::Config { .. }
        ));
    }

    #[test]
    fn test_distances() {
        let a = Landmark::world(0, 0.0, 0.0, 0.0, 1.0);
        let b = Landmark::world(1, 1.0, 2.0, 2.0, 1.0);
        assert!((a.distance_3d(&b) - 3.0).abs() < 1e-12);
        assert!((a.distance_2d(&b) - 5.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_full_frame_positional_lookup() {
        let frame = full_frame();
        assert_eq!(frame.len(), LANDMARK_COUNT);
        assert_eq!(frame.get(PoseLandmark::RightIndex).unwrap().y, 40.0);
    }

    #[test]
    fn test_world_landmark_serializes_visibility_only_when_present() {
        let world = serde_json::to_string(&Landmark::world(3, 0.1, 0.2, 0.3, 0.9)).unwrap();
        assert!(world.contains("\"visibility\":0.9"));
        let image = serde_json::to_string(&Landmark::image(3, 10.0, 20.0, 0.3)).unwrap();
        assert!(!image.contains("visibility"));
    }
}
