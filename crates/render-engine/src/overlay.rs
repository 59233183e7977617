//! Drawing on copies of source frames: center-of-gravity marker and skeleton.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use climbmetrics_pose_model::geometry::PixelPoint;
use climbmetrics_pose_model::landmark::{LandmarkFrame, POSE_CONNECTIONS};

pub const COG_DOWN_COLOR: Rgb<u8> = Rgb([12, 199, 6]);
pub const COG_DOWN_THICKNESS: u32 = 10;
pub const COG_UP_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
pub const COG_UP_THICKNESS: u32 = 3;
pub const COG_MARKER_COLOR: Rgb<u8> = Rgb([199, 6, 6]);
pub const COG_MARKER_RADIUS: i32 = 10;

const SKELETON_EDGE_COLOR: Rgb<u8> = Rgb([224, 224, 224]);
const SKELETON_JOINT_COLOR: Rgb<u8> = Rgb([230, 40, 40]);
const SKELETON_JOINT_RADIUS: i32 = 3;

/// Copy `frame` and mark the center of gravity on it.
///
/// `None` yields an unmodified copy. The marker is a thick green line down
/// to the bottom edge, a thin white line up to the top edge, and a red dot.
/// Points outside the frame are clipped, never rejected.
pub fn draw_center_of_gravity(frame: &RgbImage, cog: Option<PixelPoint>) -> RgbImage {
    let mut canvas = frame.clone();
    let Some(cog) = cog else {
        return canvas;
    };
    let cog = pull_in(cog, &canvas, COG_MARKER_RADIUS.max(COG_DOWN_THICKNESS as i32) + 1);

    let height = canvas.height() as i32;
    if cog.y < height {
        let top = cog.y.max(0);
        draw_vertical_band(
            &mut canvas,
            cog.x,
            top,
            height - 1,
            COG_DOWN_THICKNESS,
            COG_DOWN_COLOR,
        );
    }
    if cog.y >= 0 {
        let bottom = cog.y.min(height - 1);
        draw_vertical_band(&mut canvas, cog.x, 0, bottom, COG_UP_THICKNESS, COG_UP_COLOR);
    }
    draw_filled_circle_mut(&mut canvas, (cog.x, cog.y), COG_MARKER_RADIUS, COG_MARKER_COLOR);
    canvas
}

/// Fill a `thickness`-wide column centred on `x` covering rows `top..=bottom`.
fn draw_vertical_band(
    canvas: &mut RgbImage,
    x: i32,
    top: i32,
    bottom: i32,
    thickness: u32,
    color: Rgb<u8>,
) {
    if bottom < top || thickness == 0 {
        return;
    }
    let left = x.saturating_sub((thickness as i32) / 2);
    let rows = (bottom - top + 1) as u32;
    draw_filled_rect_mut(canvas, Rect::at(left, top).of_size(thickness, rows), color);
}

/// Clamp a point to within `margin` pixels of the canvas.
///
/// Anything drawn with a reach below `margin` lands in the same visible
/// pixels as it would at the original point, and the drawing arithmetic
/// stays far from `i32` limits.
fn pull_in(point: PixelPoint, canvas: &RgbImage, margin: i32) -> PixelPoint {
    let clamp = |v: i32, extent: u32| v.clamp(-margin, extent as i32 + margin);
    PixelPoint::new(clamp(point.x, canvas.width()), clamp(point.y, canvas.height()))
}

/// Clip a segment to the canvas rectangle (Liang-Barsky).
///
/// `None` when the segment misses the canvas or has a non-finite endpoint.
fn clip_segment(
    a: (f64, f64),
    b: (f64, f64),
    width: u32,
    height: u32,
) -> Option<((f32, f32), (f32, f32))> {
    if ![a.0, a.1, b.0, b.1].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    for (p, q) in [
        (-dx, a.0),
        (dx, f64::from(width) - a.0),
        (-dy, a.1),
        (dy, f64::from(height) - a.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else if p < 0.0 {
            t0 = t0.max(q / p);
        } else {
            t1 = t1.min(q / p);
        }
    }
    if t0 > t1 {
        return None;
    }
    let at = |t: f64| ((a.0 + t * dx) as f32, (a.1 + t * dy) as f32);
    Some((at(t0), at(t1)))
}

/// Copy `frame` and draw the detected skeleton from image landmarks.
pub fn draw_skeleton(frame: &RgbImage, landmarks: &LandmarkFrame) -> RgbImage {
    let mut canvas = frame.clone();
    if landmarks.is_empty() {
        return canvas;
    }

    for (from, to) in POSE_CONNECTIONS {
        let (Some(a), Some(b)) = (landmarks.get(from), landmarks.get(to)) else {
            continue;
        };
        let clipped = clip_segment((a.x, a.y), (b.x, b.y), canvas.width(), canvas.height());
        if let Some((start, end)) = clipped {
            draw_line_segment_mut(&mut canvas, start, end, SKELETON_EDGE_COLOR);
        }
    }
    for landmark in landmarks.landmarks() {
        let p = pull_in(landmark.point().to_pixel(), &canvas, SKELETON_JOINT_RADIUS + 1);
        draw_filled_circle_mut(
            &mut canvas,
            (p.x, p.y),
            SKELETON_JOINT_RADIUS,
            SKELETON_JOINT_COLOR,
        );
    }
    canvas
}
