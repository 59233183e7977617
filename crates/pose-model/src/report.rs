//! Report layout: metric families, output files, run options, and the
//! `report.json` manifest.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use climbmetrics_common::error::{ClimbError, ClimbResult};

use crate::landmark::{LandmarkPair, PoseLandmark};
use crate::store::DetectionCoverage;

/// Current manifest schema version.
pub const MANIFEST_VERSION: &str = "1.0";

/// Manifest file name inside a report directory.
pub const MANIFEST_FILE: &str = "report.json";

/// Landmark dump file name inside a report directory.
pub const LANDMARKS_FILE: &str = "landmarks.jsonl";

/// How one chart line is derived from landmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricSource {
    /// 3D world distance between two landmarks.
    Distance(LandmarkPair),
    /// Pixel speed of one image landmark between consecutive frames.
    Velocity(PoseLandmark),
}

/// One line on a family chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricLine {
    pub label: &'static str,
    pub source: MetricSource,
}

/// A group of two metrics (right and left side) rendered onto one chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricFamily {
    ArmExtension,
    LegExtension,
    HandVelocity,
    FootVelocity,
}

impl MetricFamily {
    pub const ALL: [MetricFamily; 4] = [
        MetricFamily::ArmExtension,
        MetricFamily::LegExtension,
        MetricFamily::HandVelocity,
        MetricFamily::FootVelocity,
    ];

    pub fn title(self) -> &'static str {
        match self {
            MetricFamily::ArmExtension => "Arm Extension",
            MetricFamily::LegExtension => "Leg Extension",
            MetricFamily::HandVelocity => "Hand Velocity",
            MetricFamily::FootVelocity => "Foot Velocity",
        }
    }

    /// Fixed y-axis range of the family chart.
    pub fn y_range(self) -> (f64, f64) {
        if self.is_velocity() {
            (0.0, 1000.0)
        } else {
            (0.0, 1.0)
        }
    }

    pub fn is_velocity(self) -> bool {
        matches!(self, MetricFamily::HandVelocity | MetricFamily::FootVelocity)
    }

    /// Right and left lines, in that order.
    pub fn lines(self) -> [MetricLine; 2] {
        use PoseLandmark::*;
        let distance = |label, from, to| MetricLine {
            label,
            source: MetricSource::Distance(LandmarkPair::new(from, to)),
        };
        let velocity = |label, landmark| MetricLine {
            label,
            source: MetricSource::Velocity(landmark),
        };
        match self {
            MetricFamily::ArmExtension => [
                distance("Right Arm", RightShoulder, RightWrist),
                distance("Left Arm", LeftShoulder, LeftWrist),
            ],
            MetricFamily::LegExtension => [
                distance("Right Leg", RightHip, RightAnkle),
                distance("Left Leg", LeftHip, LeftAnkle),
            ],
            MetricFamily::HandVelocity => [
                velocity("Right Hand", RightIndex),
                velocity("Left Hand", LeftIndex),
            ],
            MetricFamily::FootVelocity => [
                velocity("Right Foot", RightFootIndex),
                velocity("Left Foot", LeftFootIndex),
            ],
        }
    }

    pub fn output(self) -> OutputKind {
        match self {
            MetricFamily::ArmExtension => OutputKind::ArmExtension,
            MetricFamily::LegExtension => OutputKind::LegExtension,
            MetricFamily::HandVelocity => OutputKind::HandVelocity,
            MetricFamily::FootVelocity => OutputKind::FootVelocity,
        }
    }
}

/// One video file in a report directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    Plot,
    RawVideo,
    PoseVideo,
    ArmExtension,
    LegExtension,
    HandVelocity,
    FootVelocity,
    CenterGravity,
}

impl OutputKind {
    /// Every output in write order.
    pub const WRITE_ORDER: [OutputKind; 8] = [
        OutputKind::Plot,
        OutputKind::RawVideo,
        OutputKind::PoseVideo,
        OutputKind::ArmExtension,
        OutputKind::LegExtension,
        OutputKind::HandVelocity,
        OutputKind::FootVelocity,
        OutputKind::CenterGravity,
    ];

    /// Stream name, which is also the file stem.
    pub fn stem(self) -> &'static str {
        match self {
            OutputKind::Plot => "plot",
            OutputKind::RawVideo => "raw_video",
            OutputKind::PoseVideo => "pose_video",
            OutputKind::ArmExtension => "armextension",
            OutputKind::LegExtension => "legextension",
            OutputKind::HandVelocity => "handvelocity",
            OutputKind::FootVelocity => "footvelocity",
            OutputKind::CenterGravity => "center_gravity",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.mp4", self.stem())
    }

    /// The metric family charted by this output, if it is a chart.
    pub fn family(self) -> Option<MetricFamily> {
        MetricFamily::ALL
            .into_iter()
            .find(|family| family.output() == self)
    }
}

/// Parameters of one report run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportOptions {
    /// Report directory name.
    pub name: String,
    /// Write the skeleton overlay video.
    pub draw: bool,
    /// Write the arm and leg extension charts.
    pub limbex: bool,
    /// Write the hand and foot velocity charts.
    pub velocity: bool,
    /// Write the center-of-gravity video.
    pub cog: bool,
    /// Moving-average window.
    pub smooth: usize,
}

impl ReportOptions {
    /// Options with every output enabled and a window of 3.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            draw: true,
            limbex: true,
            velocity: true,
            cog: true,
            smooth: 3,
        }
    }

    /// Check the options before any work starts.
    pub fn validate(&self) -> ClimbResult<()> {
        if self.smooth == 0 {
            return Err(ClimbError::config("smoothing window must be at least 1"));
        }
        if self.name.trim().is_empty() {
            return Err(ClimbError::config("report name must not be empty"));
        }
        if self.name.contains(['/', '\\']) || self.name == "." || self.name == ".." {
            return Err(ClimbError::config(format!(
                "report name {:?} must be a single directory name",
                self.name
            )));
        }
        Ok(())
    }

    /// Metric families enabled by these options.
    pub fn families(&self) -> Vec<MetricFamily> {
        self.outputs()
            .into_iter()
            .filter_map(OutputKind::family)
            .collect()
    }

    /// Output files these options produce, in write order.
    pub fn outputs(&self) -> Vec<OutputKind> {
        OutputKind::WRITE_ORDER
            .into_iter()
            .filter(|kind| match kind {
                OutputKind::Plot | OutputKind::RawVideo => true,
                OutputKind::PoseVideo => self.draw,
                OutputKind::ArmExtension | OutputKind::LegExtension => self.limbex,
                OutputKind::HandVelocity | OutputKind::FootVelocity => self.velocity,
                OutputKind::CenterGravity => self.cog,
            })
            .collect()
    }

    /// Report directory under `output_root`.
    pub fn report_dir(&self, output_root: &Path) -> PathBuf {
        output_root.join(&self.name)
    }
}

/// Summary written as `report.json` after a successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportManifest {
    pub version: String,
    pub name: String,
    pub source: PathBuf,
    pub frame_count: usize,
    pub width: u32,
    pub height: u32,
    pub source_fps: f64,
    pub output_fps: u32,
    pub smoothing_window: usize,
    pub coverage: DetectionCoverage,
    /// File names written, in write order.
    pub outputs: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl ReportManifest {
    /// Load a manifest from a report directory.
    pub fn load(report_dir: &Path) -> ClimbResult<Self> {
        let content = std::fs::read_to_string(report_dir.join(MANIFEST_FILE))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save to `report.json` in a report directory.
    pub fn save(&self, report_dir: &Path) -> ClimbResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(report_dir.join(MANIFEST_FILE), json)?;
        Ok(())
    }
}
