//! Per-frame scalar series.
//!
//! Every series is aligned to the source video: it carries exactly one value
//! per source frame, including frames where detection failed.

use serde::{Deserialize, Serialize};

/// Raw scalar metric, one value per source frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricSeries {
    values: Vec<f64>,
}

impl MetricSeries {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// Largest value, or `None` for an empty series.
    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }
}

impl From<Vec<f64>> for MetricSeries {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

/// A [`MetricSeries`] after moving-average smoothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothedSeries {
    values: Vec<f64>,
    window: usize,
}

impl SmoothedSeries {
    /// Wrap already-smoothed values produced with `window`.
    pub fn new(values: Vec<f64>, window: usize) -> Self {
        Self { values, window }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Window size the series was smoothed with.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Values for frames `0..=index`, clamped to the series length.
    pub fn prefix(&self, index: usize) -> &[f64] {
        let end = (index + 1).min(self.values.len());
        &self.values[..end]
    }
}

/// The right/left pair of smoothed series drawn on one chart.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPair {
    pub right: SmoothedSeries,
    pub left: SmoothedSeries,
}

impl SeriesPair {
    pub fn new(right: SmoothedSeries, left: SmoothedSeries) -> Self {
        Self { right, left }
    }

    /// Frame count shared by both series; the shorter one wins if they differ.
    pub fn len(&self) -> usize {
        self.right.len().min(self.left.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_of_series() {
        assert_eq!(MetricSeries::new(vec![0.2, 0.9, 0.4]).max(), Some(0.9));
        assert_eq!(MetricSeries::default().max(), None);
    }

    #[test]
    fn test_prefix_is_inclusive_and_clamped() {
        let smoothed = SmoothedSeries::new(vec![1.0, 2.0, 3.0], 3);
        assert_eq!(smoothed.prefix(0), &[1.0]);
        assert_eq!(smoothed.prefix(1), &[1.0, 2.0]);
        assert_eq!(smoothed.prefix(10), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_metric_series_serializes_as_plain_array() {
        let json = serde_json::to_string(&MetricSeries::new(vec![0.5, 1.5])).unwrap();
        assert_eq!(json, "[0.5,1.5]");
    }
}
