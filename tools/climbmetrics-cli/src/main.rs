//! ClimbMetrics CLI: command-line interface for climbing video analysis.
//!
//! Usage:
//!   climbmetrics report [OPTIONS]    Generate a report from a climbing video
//!   climbmetrics inspect <PATH>      Summarize a landmark file
//!   climbmetrics check               Check system capabilities

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use climbmetrics_common::config::{AppConfig, LoggingConfig};

mod commands;

#[derive(Parser)]
#[command(
    name = "climbmetrics",
    about = "Biomechanical analysis reports from climbing videos",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a report directory from a climbing video
    Report {
        /// Source video
        #[arg(long)]
        video: PathBuf,

        /// Report name (becomes the output directory name)
        #[arg(short, long)]
        name: String,

        /// Write the skeleton overlay video
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        draw: bool,

        /// Write the arm and leg extension charts
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        limbex: bool,

        /// Write the hand and foot velocity charts
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        velocity: bool,

        /// Write the center-of-gravity video
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        cog: bool,

        /// Moving-average window (defaults to the configured value)
        #[arg(long)]
        smooth: Option<usize>,

        /// Landmark JSONL file (defaults to <video>.landmarks.jsonl)
        #[arg(long)]
        landmarks: Option<PathBuf>,

        /// Output root directory (defaults to the configured value)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output codec: h264|mpeg4 (defaults to the configured value)
        #[arg(long)]
        codec: Option<String>,
    },

    /// Summarize a landmark file
    Inspect {
        /// Path to the landmark JSONL file
        path: PathBuf,
    },

    /// Check system capabilities
    Check,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    // Initialize logging
    let logging = if cli.verbose {
        LoggingConfig {
            level: "debug".to_string(),
            ..config.logging.clone()
        }
    } else {
        config.logging.clone()
    };
    climbmetrics_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Report {
            video,
            name,
            draw,
            limbex,
            velocity,
            cog,
            smooth,
            landmarks,
            output,
            codec,
        } => commands::report::run(
            commands::report::ReportArgs {
                video,
                name,
                draw,
                limbex,
                velocity,
                cog,
                smooth,
                landmarks,
                output,
                codec,
            },
            &config,
        ),
        Commands::Inspect { path } => commands::inspect::run(path),
        Commands::Check => commands::check::run(&config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_report_flags_default_to_enabled() {
        let cli = Cli::try_parse_from([
            "climbmetrics",
            "report",
            "--video",
            "climb.mp4",
            "--name",
            "session",
            "--limbex",
            "false",
        ])
        .unwrap();
        match cli.command {
            Commands::Report {
                draw,
                limbex,
                velocity,
                cog,
                smooth,
                ..
            } => {
                assert!(draw && velocity && cog);
                assert!(!limbex);
                assert_eq!(smooth, None);
            }
            _ => panic!("expected report command"),
        }
    }

    #[test]
    fn test_report_requires_video_and_name() {
        assert!(Cli::try_parse_from(["climbmetrics", "report", "--name", "x"]).is_err());
        assert!(Cli::try_parse_from(["climbmetrics", "report", "--video", "a.mp4"]).is_err());
    }
}
