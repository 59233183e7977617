//! Cumulative line-chart frames.
//!
//! Chart frame `i` shows both series of a family over frames `0..=i`. The
//! x-axis spans `[0, i + 1]` with the `i + 1` samples spread evenly across it,
//! and the y-axis range is fixed per family, so a frame depends only on the
//! series prefix it covers.

use image::{Rgb, RgbImage};
use plotters::prelude::*;

use climbmetrics_common::error::{ClimbError, ClimbResult};
use climbmetrics_pose_model::report::MetricFamily;
use climbmetrics_pose_model::series::SeriesPair;

use crate::backend::{ensure_fonts, TextTolerantBackend, FONT_FAMILY};

/// Right-side line colour.
pub const RIGHT_COLOR: RGBColor = RGBColor(31, 119, 180);
/// Left-side line colour.
pub const LEFT_COLOR: RGBColor = RGBColor(255, 127, 14);

/// Fixed appearance of every chart in a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStyle {
    pub title: String,
    pub labels: [String; 2],
    pub y_range: (f64, f64),
    pub width: u32,
    pub height: u32,
}

impl ChartStyle {
    /// Style for a metric family at the given surface size.
    pub fn for_family(family: MetricFamily, width: u32, height: u32) -> Self {
        let [right, left] = family.lines();
        Self {
            title: family.title().to_string(),
            labels: [right.label.to_string(), left.label.to_string()],
            y_range: family.y_range(),
            width,
            height,
        }
    }
}

/// `n` evenly spaced values from `start` to `stop` inclusive.
///
/// A single sample sits at `start`.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n).map(|k| start + step * k as f64).collect()
        }
    }
}

/// Render chart frames for every index of `series`.
pub fn render_chart_frames(series: &SeriesPair, style: &ChartStyle) -> ClimbResult<Vec<RgbImage>> {
    (0..series.len())
        .map(|index| render_chart_frame(series, style, index))
        .collect()
}

/// Render the chart for frame `index`.
pub fn render_chart_frame(
    series: &SeriesPair,
    style: &ChartStyle,
    index: usize,
) -> ClimbResult<RgbImage> {
    if style.width == 0 || style.height == 0 {
        return Err(ClimbError::render("chart surface must not be empty"));
    }
    ensure_fonts()?;

    let right = series.right.prefix(index);
    let left = series.left.prefix(index);

    let mut image = RgbImage::from_pixel(style.width, style.height, Rgb([255, 255, 255]));
    {
        let buffer: &mut [u8] = &mut image;
        let backend = TextTolerantBackend::new(BitMapBackend::with_buffer(
            buffer,
            (style.width, style.height),
        ));
        let root = backend.into_drawing_area();
        let failed = |e: &dyn std::fmt::Display| {
            ClimbError::render(format!("{} chart frame {index}: {e:#}", style.title))
        };
        draw_chart(&root, style, index, right, left).map_err(|e| failed(&e))?;
        root.present().map_err(|e| failed(&e))?;
    }
    Ok(image)
}

fn draw_chart<DB>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    style: &ChartStyle,
    index: usize,
    right: &[f64],
    left: &[f64],
) -> anyhow::Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let (y_min, y_max) = style.y_range;
    let x_max = (index + 1) as f64;

    let mut chart = ChartBuilder::on(root)
        .caption(&style.title, (FONT_FAMILY, 20))
        .margin(10)
        .set_label_area_size(LabelAreaPosition::Left, 45)
        .set_label_area_size(LabelAreaPosition::Bottom, 30)
        .build_cartesian_2d(0.0..x_max, y_min..y_max)?;

    chart.configure_mesh().disable_mesh().draw()?;

    let clamp = |v: f64| v.clamp(y_min, y_max);
    for (values, label, color) in [
        (right, &style.labels[0], RIGHT_COLOR),
        (left, &style.labels[1], LEFT_COLOR),
    ] {
        let line = ShapeStyle::from(color).stroke_width(2);
        let xs = linspace(0.0, x_max, values.len());
        chart
            .draw_series(LineSeries::new(
                xs.into_iter().zip(values.iter().copied().map(clamp)),
                line,
            ))?
            .label(label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line));
    }

    chart
        .configure_series_labels()
        .label_font((FONT_FAMILY, 14))
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use climbmetrics_pose_model::series::SmoothedSeries;

    fn pair(right: Vec<f64>, left: Vec<f64>) -> SeriesPair {
        SeriesPair::new(SmoothedSeries::new(right, 3), SmoothedSeries::new(left, 3))
    }

    fn small_style() -> ChartStyle {
        ChartStyle::for_family(MetricFamily::ArmExtension, 160, 120)
    }

    #[test]
    fn test_linspace() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(0.0, 1.0, 1), vec![0.0]);
        assert_eq!(linspace(0.0, 3.0, 3), vec![0.0, 1.5, 3.0]);
    }

    #[test]
    fn test_one_frame_per_index_with_constant_size() {
        let series = pair(vec![0.1, 0.5, 0.9, 0.4], vec![0.2, 0.2, 0.3, 0.8]);
        let frames = render_chart_frames(&series, &small_style()).unwrap();
        assert_eq!(frames.len(), 4);
        assert!(frames.iter().all(|f| f.dimensions() == (160, 120)));
    }

    #[test]
    fn test_frame_ignores_later_values() {
        let style = small_style();
        let a = pair(vec![0.1, 0.6, 0.3, 0.9], vec![0.5, 0.4, 0.2, 0.1]);
        let b = pair(vec![0.1, 0.6, 0.0, 0.0], vec![0.5, 0.4, 1.0, 1.0]);
        assert_eq!(
            render_chart_frame(&a, &style, 1).unwrap(),
            render_chart_frame(&b, &style, 1).unwrap()
        );
    }

    #[test]
    fn test_out_of_range_values_are_not_errors() {
        let style = ChartStyle::for_family(MetricFamily::HandVelocity, 160, 120);
        let series = pair(vec![-50.0, 5000.0], vec![f64::MAX, 0.0]);
        let frames = render_chart_frames(&series, &style).unwrap();
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn test_lines_are_drawn() {
        let series = pair(vec![0.8, 0.8], vec![0.2, 0.2]);
        let frame = render_chart_frame(&series, &small_style(), 1).unwrap();
        let right = Rgb([RIGHT_COLOR.0, RIGHT_COLOR.1, RIGHT_COLOR.2]);
        let left = Rgb([LEFT_COLOR.0, LEFT_COLOR.1, LEFT_COLOR.2]);
        assert!(frame.pixels().any(|p| *p == right));
        assert!(frame.pixels().any(|p| *p == left));
    }

    fn is_dark(p: &Rgb<u8>) -> bool {
        p.0.iter().all(|c| *c < 100)
    }

    #[test]
    fn test_title_and_labels_are_drawn() {
        let series = pair(vec![0.5, 0.5], vec![0.5, 0.5]);
        let titled = ChartStyle::for_family(MetricFamily::ArmExtension, 320, 240);
        let blank = ChartStyle {
            title: String::new(),
            labels: [String::new(), String::new()],
            ..titled.clone()
        };
        let with_text = render_chart_frame(&series, &titled, 1).unwrap();
        let without_text = render_chart_frame(&series, &blank, 1).unwrap();

        // The caption sits centred above the plot area.
        let caption_ink = (80..240)
            .flat_map(|x| (0..24).map(move |y| (x, y)))
            .filter(|&(x, y)| is_dark(with_text.get_pixel(x, y)))
            .count();
        assert!(caption_ink > 20, "caption pixels: {caption_ink}");

        let ink = |img: &RgbImage| img.pixels().filter(|p| is_dark(p)).count();
        assert!(ink(&with_text) > ink(&without_text) + 100);
    }

    #[test]
    fn test_empty_surface_rejected() {
        let series = pair(vec![0.5], vec![0.5]);
        let style = ChartStyle {
            width: 0,
            ..small_style()
        };
        assert!(render_chart_frame(&series, &style, 0).is_err());
    }

    #[test]
    fn test_style_for_family() {
        let style = ChartStyle::for_family(MetricFamily::FootVelocity, 640, 480);
        assert_eq!(style.title, "Foot Velocity");
        assert_eq!(style.labels, ["Right Foot".to_string(), "Left Foot".to_string()]);
        assert_eq!(style.y_range, (0.0, 1000.0));
    }
}
