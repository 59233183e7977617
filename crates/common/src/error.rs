//! Error types shared across ClimbMetrics crates.

use std::path::PathBuf;

/// Top-level error type for ClimbMetrics operations.
///
/// A missing landmark detection is never an error; it is absorbed by the
/// gap policy of whichever stage sees it.
#[derive(Debug, thiserror::Error)]
pub enum ClimbError {
    #[error("Source video {path} could not be read: {message}")]
    SourceUnreadable { path: PathBuf, message: String },

    #[error("Source video {path} contains no decodable frames")]
    EmptySource { path: PathBuf },

    #[error("Output directory already exists: {path}")]
    OutputCollision { path: PathBuf },

    #[error(
        "Stream {stream}: frame {frame_index} is {found_width}x{found_height}, expected {expected_width}x{expected_height}"
    )]
    DimensionMismatch {
        stream: String,
        frame_index: usize,
        expected_width: u32,
        expected_height: u32,
        found_width: u32,
        found_height: u32,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Pose data error: {message}")]
    Pose { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Encode error: {message}")]
    Encode { message: String },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ClimbError.
pub type ClimbResult<T> = Result<T, ClimbError>;

impl ClimbError {
    pub fn source_unreadable(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::SourceUnreadable {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn pose(msg: impl Into<String>) -> Self {
        Self::Pose {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Whether this error is a dimension mismatch inside one stream.
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(self, Self::DimensionMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_message_names_both_sizes() {
        let err = ClimbError::DimensionMismatch {
            stream: "raw_video".to_string(),
            frame_index: 1,
            expected_width: 640,
            expected_height: 480,
            found_width: 641,
            found_height: 480,
        };
        let msg = err.to_string();
        assert!(msg.contains("641x480"));
        assert!(msg.contains("640x480"));
        assert!(err.is_dimension_mismatch());
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ClimbError = io.into();
        assert!(matches!(err, ClimbError::Io(_)));
    }
}
