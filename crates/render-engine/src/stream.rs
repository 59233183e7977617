//! Stream composer: validates frame sequences and writes each one as an
//! independent video inside a fresh report directory.

use std::path::{Path, PathBuf};

use image::RgbImage;

use climbmetrics_common::error::{ClimbError, ClimbResult};
use climbmetrics_pose_model::report::OutputKind;

use crate::video::VideoEncoder;

/// Ordered, equally sized frames destined for one output file.
#[derive(Debug, Clone)]
pub struct VideoStream {
    pub kind: OutputKind,
    pub frames: Vec<RgbImage>,
}

impl VideoStream {
    pub fn new(kind: OutputKind, frames: Vec<RgbImage>) -> Self {
        Self { kind, frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Size of the first frame.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.frames.first().map(|f| f.dimensions())
    }

    /// Check that the stream is non-empty and every frame matches the first.
    pub fn validate(&self, path: &Path) -> ClimbResult<()> {
        let (expected_width, expected_height) = self
            .dimensions()
            .ok_or_else(|| ClimbError::EmptySource {
                path: path.to_path_buf(),
            })?;

        for (frame_index, frame) in self.frames.iter().enumerate() {
            let (found_width, found_height) = frame.dimensions();
            if (found_width, found_height) != (expected_width, expected_height) {
                return Err(ClimbError::DimensionMismatch {
                    stream: self.kind.stem().to_string(),
                    frame_index,
                    expected_width,
                    expected_height,
                    found_width,
                    found_height,
                });
            }
        }
        Ok(())
    }
}

/// Writes a report's streams into `<output_root>/<name>`.
#[derive(Debug, Clone)]
pub struct StreamComposer {
    report_dir: PathBuf,
    fps: u32,
}

impl StreamComposer {
    /// Prepare a composer for a report directory that must not exist yet.
    pub fn new(report_dir: impl Into<PathBuf>, fps: u32) -> ClimbResult<Self> {
        let report_dir = report_dir.into();
        if fps == 0 {
            return Err(ClimbError::config("output frame rate must be positive"));
        }
        ensure_vacant(&report_dir)?;
        Ok(Self { report_dir, fps })
    }

    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn output_path(&self, kind: OutputKind) -> PathBuf {
        self.report_dir.join(kind.file_name())
    }

    /// Validate every stream, create the report directory, then write the
    /// streams in order, each finished before the next starts.
    ///
    /// Nothing touches the filesystem unless all streams validate.
    pub fn compose(
        &self,
        streams: &[VideoStream],
        encoder: &mut dyn VideoEncoder,
    ) -> ClimbResult<Vec<PathBuf>> {
        for stream in streams {
            stream.validate(&self.output_path(stream.kind))?;
        }

        if let Some(parent) = self.report_dir.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::create_dir(&self.report_dir).map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => ClimbError::OutputCollision {
                path: self.report_dir.clone(),
            },
            _ => ClimbError::Io(e),
        })?;

        let mut written = Vec::with_capacity(streams.len());
        for stream in streams {
            let path = self.output_path(stream.kind);
            tracing::info!(
                stream = stream.kind.stem(),
                frames = stream.len(),
                encoder = encoder.name(),
                "Writing stream"
            );
            encoder.encode(&path, &stream.frames, self.fps)?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Fail with `OutputCollision` if `report_dir` already exists.
pub fn ensure_vacant(report_dir: &Path) -> ClimbResult<()> {
    if report_dir.exists() {
        return Err(ClimbError::OutputCollision {
            path: report_dir.to_path_buf(),
        });
    }
    Ok(())
}
