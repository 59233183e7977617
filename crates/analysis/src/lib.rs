//! ClimbMetrics Analysis
//!
//! Turns per-frame landmark sets into frame-aligned metrics:
//! - **Extraction:** Limb distances and landmark velocities, with carry-forward
//!   over missing detections
//! - **Smoothing:** Trailing moving average that excludes the current sample
//! - **Gravity:** Center-of-gravity point from shoulders and hips
//!
//! This crate is pure computation with no I/O and no rendering.
//! All inputs are data; all outputs are data.

pub mod extract;
pub mod family;
pub mod gravity;
pub mod smooth;

pub use extract::{distance_series, extract, velocity_series};
pub use family::{analyze_families, analyze_family, FamilyMetrics};
pub use gravity::{center_of_gravity, gravity_track};
pub use smooth::{smooth, SmoothingWindow};
