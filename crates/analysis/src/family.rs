//! Per-family metric computation: extract both lines, then smooth them.

use climbmetrics_common::error::ClimbResult;
use climbmetrics_pose_model::report::MetricFamily;
use climbmetrics_pose_model::series::{MetricSeries, SeriesPair};
use climbmetrics_pose_model::store::LandmarkStore;

use crate::extract::extract;
use crate::smooth::{smooth, SmoothingWindow};

/// Raw and smoothed series for one metric family.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyMetrics {
    pub family: MetricFamily,
    /// Right and left raw series.
    pub raw: [MetricSeries; 2],
    pub smoothed: SeriesPair,
}

/// Compute one family's series from a populated store.
pub fn analyze_family(
    store: &LandmarkStore,
    family: MetricFamily,
    window: SmoothingWindow,
    fps: f64,
) -> ClimbResult<FamilyMetrics> {
    let [right_line, left_line] = family.lines();
    let right = extract(store, right_line.source, fps)?;
    let left = extract(store, left_line.source, fps)?;

    tracing::debug!(
        family = family.title(),
        frames = right.len(),
        right_max = right.max().unwrap_or(0.0),
        left_max = left.max().unwrap_or(0.0),
        "Extracted metric family"
    );

    let smoothed = SeriesPair::new(smooth(&right, window), smooth(&left, window));
    Ok(FamilyMetrics {
        family,
        raw: [right, left],
        smoothed,
    })
}

/// Compute several families in order.
pub fn analyze_families(
    store: &LandmarkStore,
    families: &[MetricFamily],
    window: SmoothingWindow,
    fps: f64,
) -> ClimbResult<Vec<FamilyMetrics>> {
    families
        .iter()
        .map(|family| analyze_family(store, *family, window, fps))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use climbmetrics_pose_model::landmark::{Landmark, LandmarkFrame};

    #[test]
    fn test_hand_velocity_family() {
        let image = vec![
            LandmarkFrame::new(vec![
                Landmark::image(19, 0.0, 0.0, 0.0),
                Landmark::image(20, 0.0, 0.0, 0.0),
            ]),
            LandmarkFrame::new(vec![
                Landmark::image(19, 1.0, 0.0, 0.0),
                Landmark::image(20, 0.0, 2.0, 0.0),
            ]),
        ];
        let world = vec![LandmarkFrame::empty(); 2];
        let store = LandmarkStore::new(world, image).unwrap();

        let metrics = analyze_family(
            &store,
            MetricFamily::HandVelocity,
            SmoothingWindow::DEFAULT,
            30.0,
        )
        .unwrap();
        assert_eq!(metrics.raw[0].values(), &[0.0, 60.0]);
        assert_eq!(metrics.raw[1].values(), &[0.0, 30.0]);
        // Both samples are in the warm-up region.
        assert_eq!(metrics.smoothed.right.values(), &[0.0, 60.0]);
    }

    #[test]
    fn test_families_keep_requested_order() {
        let store = LandmarkStore::undetected(3);
        let families = [MetricFamily::FootVelocity, MetricFamily::ArmExtension];
        let metrics =
            analyze_families(&store, &families, SmoothingWindow::DEFAULT, 30.0).unwrap();
        assert_eq!(metrics[0].family, MetricFamily::FootVelocity);
        assert_eq!(metrics[1].family, MetricFamily::ArmExtension);
    }
}
