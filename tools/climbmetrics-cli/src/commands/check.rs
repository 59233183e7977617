//! Check system capabilities.

use climbmetrics_common::config::AppConfig;
use climbmetrics_render_engine::ffmpeg::command_exists;
use climbmetrics_render_engine::VideoCodec;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("ClimbMetrics System Check");
    println!("{}", "=".repeat(50));

    let mut all_ok = true;
    for binary in ["ffmpeg", "ffprobe"] {
        if command_exists(binary) {
            println!("[OK] {binary} found on PATH");
        } else {
            println!("[MISSING] {binary} not found on PATH");
            all_ok = false;
        }
    }

    match config.analysis.video_codec.parse::<VideoCodec>() {
        Ok(codec) => println!("[OK] Output codec: {}", codec.as_str()),
        Err(e) => {
            println!("[WARN] {e}");
            all_ok = false;
        }
    }

    println!();
    println!("Output root: {}", config.output_root.display());
    println!(
        "Defaults: window {}, {} fps output, charts {}x{}",
        config.analysis.smoothing_window,
        config.analysis.output_fps,
        config.analysis.chart_width,
        config.analysis.chart_height
    );

    println!();
    if all_ok {
        println!("All required tools are available. ClimbMetrics is ready.");
    } else {
        println!("Some required tools are missing. See above for fixes.");
    }

    Ok(())
}
