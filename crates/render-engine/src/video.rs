//! Video decode and encode boundaries.
//!
//! The pipeline only ever sees whole, in-memory frame sequences. Backends are
//! blocking: a call returns once the source is fully read or the output file
//! is fully written and closed.

use std::path::Path;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use climbmetrics_common::error::ClimbResult;

/// Basic properties of a source video.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    /// Frame rate reported by the container, if any.
    pub fps: Option<f64>,
}

impl VideoInfo {
    /// Reported frame rate, or `fallback` when it is missing or unusable.
    pub fn fps_or(&self, fallback: f64) -> f64 {
        self.fps
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .unwrap_or(fallback)
    }
}

/// A fully decoded source video.
#[derive(Debug, Clone)]
pub struct DecodedVideo {
    pub info: VideoInfo,
    pub frames: Vec<RgbImage>,
}

/// Reads every frame of a video file.
pub trait VideoDecoder {
    /// Decode all frames in presentation order.
    fn decode(&mut self, path: &Path) -> ClimbResult<DecodedVideo>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Writes a frame sequence as one video file.
pub trait VideoEncoder {
    /// Encode `frames` at `fps` into `path`. All frames share one size.
    fn encode(&mut self, path: &Path, frames: &[RgbImage], fps: u32) -> ClimbResult<()>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps_fallback() {
        let info = |fps| VideoInfo {
            width: 4,
            height: 4,
            fps,
        };
        assert_eq!(info(Some(29.97)).fps_or(30.0), 29.97);
        assert_eq!(info(None).fps_or(30.0), 30.0);
        assert_eq!(info(Some(0.0)).fps_or(30.0), 30.0);
        assert_eq!(info(Some(f64::NAN)).fps_or(25.0), 25.0);
    }
}
