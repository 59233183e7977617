//! ClimbMetrics Pose Model
//!
//! Defines the core data contracts for climbing analysis reports:
//! - **Landmarks:** 33-point body keypoints in world and image space
//! - **Store:** Per-frame landmark sets for a whole video, plus the JSONL file format
//! - **Series:** Frame-aligned raw and smoothed scalar metrics
//! - **Report:** Metric families, output layout, run options, and the manifest
//!
//! Every per-frame collection is aligned to the source video's frame count.
//! A frame without a detection is represented by an empty [`LandmarkFrame`].

pub mod geometry;
pub mod landmark;
pub mod report;
pub mod series;
pub mod store;

pub use geometry::*;
pub use landmark::*;
pub use report::*;
pub use series::*;
pub use store::*;
