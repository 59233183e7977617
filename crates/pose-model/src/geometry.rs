//! 2D point geometry in image pixel space.

use serde::{Deserialize, Serialize};

/// A 2D point in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Point halfway between `a` and `b`.
    pub fn midpoint(a: &Point2D, b: &Point2D) -> Point2D {
        Point2D {
            x: (a.x + b.x) / 2.0,
            y: (a.y + b.y) / 2.0,
        }
    }

    /// Truncate toward zero to integer pixel coordinates.
    pub fn to_pixel(&self) -> PixelPoint {
        PixelPoint {
            x: self.x as i32,
            y: self.y as i32,
        }
    }
}

/// An integer pixel location. May lie outside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}
