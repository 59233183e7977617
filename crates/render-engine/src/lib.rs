//! ClimbMetrics Render Engine
//!
//! Offline pipeline that turns a decoded climbing video and its landmarks
//! into a directory of synchronized report videos.
//!
//! # Pipeline Architecture
//!
//! ```text
//! source.mp4 ──┐
//!              ├── Pose estimator (world + image landmarks)
//! landmarks ───┘         │
//!                        ├── Pose projection ──────────── plot.mp4
//!                        ├── Skeleton overlay ─────────── pose_video.mp4
//!                        ├── Extract + smooth ── Charts ─ armextension.mp4 ...
//!                        └── Center of gravity ────────── center_gravity.mp4
//!                                                              │
//!                                                              ▼
//!                                                   Stream composer (30 fps)
//! ```

pub mod backend;
pub mod chart;
pub mod ffmpeg;
pub mod overlay;
pub mod pose;
pub mod projection;
pub mod report;
pub mod stream;
pub mod video;

pub use ffmpeg::{FfmpegBackend, VideoCodec};
pub use pose::{PoseEstimator, RecordedPoseEstimator, SourceFrame};
pub use report::{generate_report, ReportJob, ReportSummary};
pub use stream::{StreamComposer, VideoStream};
pub use video::{DecodedVideo, VideoDecoder, VideoEncoder, VideoInfo};
