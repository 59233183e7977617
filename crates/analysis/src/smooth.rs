//! Trailing moving-average smoothing.
//!
//! For a window `W`, the first `W` samples pass through unchanged. Every later
//! sample `i` becomes the mean of the `W` raw samples *before* it, `[i-W, i)`;
//! sample `i` itself is not part of its own average.

use serde::{Deserialize, Serialize};

use climbmetrics_common::error::{ClimbError, ClimbResult};
use climbmetrics_pose_model::series::{MetricSeries, SmoothedSeries};

/// A moving-average window of at least one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct SmoothingWindow(usize);

impl SmoothingWindow {
    pub const DEFAULT: SmoothingWindow = SmoothingWindow(3);

    pub fn new(window: usize) -> ClimbResult<Self> {
        if window == 0 {
            return Err(ClimbError::config("smoothing window must be at least 1"));
        }
        Ok(Self(window))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for SmoothingWindow {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<usize> for SmoothingWindow {
    type Error = ClimbError;

    fn try_from(window: usize) -> ClimbResult<Self> {
        Self::new(window)
    }
}

impl From<SmoothingWindow> for usize {
    fn from(window: SmoothingWindow) -> usize {
        window.0
    }
}

/// Smooth one series.
pub fn smooth(raw: &MetricSeries, window: SmoothingWindow) -> SmoothedSeries {
    let w = window.get();
    let values = raw.values();
    let smoothed = (0..values.len())
        .map(|i| {
            if i < w {
                values[i]
            } else {
                values[i - w..i].iter().sum::<f64>() / w as f64
            }
        })
        .collect();
    SmoothedSeries::new(smoothed, w)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(w: usize) -> SmoothingWindow {
        SmoothingWindow::new(w).unwrap()
    }

    #[test]
    fn test_reference_sequence() {
        let raw = MetricSeries::new(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let smoothed = smooth(&raw, window(3));
        assert_eq!(smoothed.values(), &[1.0, 2.0, 3.0, 2.0, 3.0]);
        assert_eq!(smoothed.window(), 3);
    }

    #[test]
    fn test_boundary_sample_excludes_itself() {
        // At i == W the average covers indices 0..W only.
        let raw = MetricSeries::new(vec![0.0, 0.0, 0.0, 90.0]);
        let smoothed = smooth(&raw, window(3));
        assert_eq!(smoothed.values()[3], 0.0);
    }

    #[test]
    fn test_window_of_one_is_a_one_frame_lag() {
        let raw = MetricSeries::new(vec![4.0, 8.0, 15.0, 16.0]);
        let smoothed = smooth(&raw, window(1));
        assert_eq!(smoothed.values(), &[4.0, 4.0, 8.0, 15.0]);
    }

    #[test]
    fn test_window_longer_than_series_is_passthrough() {
        let raw = MetricSeries::new(vec![1.0, 7.0]);
        assert_eq!(smooth(&raw, window(5)).values(), raw.values());
    }

    #[test]
    fn test_zero_window_rejected() {
        assert!(matches!(
            SmoothingWindow::new(0),
            Err(ClimbError::Config { .. })
        ));
        assert!(serde_json::from_str::<SmoothingWindow>("0").is_err());
        assert_eq!(serde_json::from_str::<SmoothingWindow>("4").unwrap().get(), 4);
    }

    #[test]
    fn test_empty_series() {
        assert!(smooth(&MetricSeries::default(), window(3)).is_empty());
    }
}
