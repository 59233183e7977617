//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory under which one report directory per run is created.
    pub output_root: PathBuf,

    /// Default analysis and rendering settings.
    pub analysis: AnalysisDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default analysis parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisDefaults {
    /// Moving-average window size.
    pub smoothing_window: usize,

    /// Frame rate of every written video.
    pub output_fps: u32,

    /// Frame rate assumed for velocity scaling when the source does not report one.
    pub fallback_source_fps: f64,

    /// Chart surface width in pixels.
    pub chart_width: u32,

    /// Chart surface height in pixels.
    pub chart_height: u32,

    /// Output video codec ("h264" or "mpeg4").
    pub video_codec: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "climbmetrics=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("video_output"),
            analysis: AnalysisDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for AnalysisDefaults {
    fn default() -> Self {
        Self {
            smoothing_window: 3,
            output_fps: 30,
            fallback_source_fps: 30.0,
            chart_width: 640,
            chart_height: 480,
            video_codec: "h264".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("climbmetrics").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_report_conventions() {
        let config = AppConfig::default();
        assert_eq!(config.analysis.smoothing_window, 3);
        assert_eq!(config.analysis.output_fps, 30);
        assert_eq!(config.output_root, PathBuf::from("video_output"));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.analysis.chart_width, 640);
        assert_eq!(parsed.analysis.video_codec, "h264");
    }
}
