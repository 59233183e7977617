//! 3D pose projection frames built from world landmarks.

use image::{Rgb, RgbImage};
use plotters::prelude::*;

use climbmetrics_common::error::{ClimbError, ClimbResult};
use climbmetrics_pose_model::landmark::{Landmark, LandmarkFrame, POSE_CONNECTIONS};

use crate::backend::{ensure_fonts, TextTolerantBackend};

/// Landmarks below this visibility are left out of the projection.
pub const MIN_VISIBILITY: f64 = 0.5;

const AXIS_LIMIT: f64 = 1.0;
const EDGE_COLOR: RGBColor = RGBColor(0, 0, 0);
const JOINT_COLOR: RGBColor = RGBColor(255, 0, 0);

/// A white canvas used for frames without a detection.
pub fn empty_projection(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([255, 255, 255]))
}

/// Render world landmarks as a 3D skeleton, or `None` when nothing was detected.
pub fn render_projection(
    landmarks: &LandmarkFrame,
    width: u32,
    height: u32,
) -> ClimbResult<Option<RgbImage>> {
    if landmarks.is_empty() {
        return Ok(None);
    }
    if width == 0 || height == 0 {
        return Err(ClimbError::render("projection surface must not be empty"));
    }
    ensure_fonts()?;

    let mut image = empty_projection(width, height);
    {
        let buffer: &mut [u8] = &mut image;
        let root =
            TextTolerantBackend::new(BitMapBackend::with_buffer(buffer, (width, height)))
                .into_drawing_area();
        draw_projection(&root, landmarks)
            .map_err(|e| ClimbError::render(format!("pose projection: {e:#}")))?;
        root.present()
            .map_err(|e| ClimbError::render(format!("pose projection: {e}")))?;
    }
    Ok(Some(image))
}

/// Plot coordinates: the world y axis points down, the plot's up.
fn plot_point(landmark: &Landmark) -> (f64, f64, f64) {
    let clamp = |v: f64| v.clamp(-AXIS_LIMIT, AXIS_LIMIT);
    (clamp(landmark.x), clamp(-landmark.y), clamp(landmark.z))
}

fn is_visible(landmark: &Landmark) -> bool {
    landmark.visibility.map_or(true, |v| v >= MIN_VISIBILITY)
}

fn draw_projection<DB>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    landmarks: &LandmarkFrame,
) -> anyhow::Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let range = -AXIS_LIMIT..AXIS_LIMIT;
    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .build_cartesian_3d(range.clone(), range.clone(), range)?;
    chart.with_projection(|mut pb| {
        pb.pitch = 0.25;
        pb.yaw = 0.6;
        pb.scale = 0.85;
        pb.into_matrix()
    });
    chart
        .configure_axes()
        .light_grid_style(BLACK.mix(0.1))
        .max_light_lines(3)
        .draw()?;

    for (from, to) in POSE_CONNECTIONS {
        let (Some(a), Some(b)) = (landmarks.get(from), landmarks.get(to)) else {
            continue;
        };
        if !is_visible(a) || !is_visible(b) {
            continue;
        }
        chart.draw_series(LineSeries::new(
            [plot_point(a), plot_point(b)],
            ShapeStyle::from(EDGE_COLOR).stroke_width(2),
        ))?;
    }

    chart.draw_series(
        landmarks
            .landmarks()
            .iter()
            .filter(|lm| is_visible(lm))
            .map(|lm| Circle::new(plot_point(lm), 3, JOINT_COLOR.filled())),
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standing_pose() -> LandmarkFrame {
        (0..33u32)
            .map(|id| {
                let t = id as f64 / 33.0;
                Landmark::world(id, 0.2 * (t - 0.5), 1.4 * (t - 0.5), 0.05, 0.95)
            })
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn test_no_detection_gives_none() {
        assert!(render_projection(&LandmarkFrame::empty(), 64, 48)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_projection_has_requested_size_and_content() {
        let image = render_projection(&standing_pose(), 120, 90).unwrap().unwrap();
        assert_eq!(image.dimensions(), (120, 90));
        assert!(image.pixels().any(|p| *p == Rgb([255, 0, 0])));
        assert_ne!(image, empty_projection(120, 90));
    }

    #[test]
    fn test_low_visibility_landmarks_are_hidden() {
        let hidden: LandmarkFrame = (0..33u32)
            .map(|id| Landmark::world(id, 0.0, 0.0, 0.0, 0.1))
            .collect::<Vec<_>>()
            .into();
        let image = render_projection(&hidden, 120, 90).unwrap().unwrap();
        assert!(!image.pixels().any(|p| *p == Rgb([255, 0, 0])));
    }

    #[test]
    fn test_empty_canvas_is_white() {
        let canvas = empty_projection(8, 6);
        assert!(canvas.pixels().all(|p| *p == Rgb([255, 255, 255])));
    }
}
