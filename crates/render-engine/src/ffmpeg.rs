//! FFmpeg-backed video decoding and encoding.
//!
//! Frames travel through `rawvideo` `rgb24` pipes: `ffmpeg` decodes the source
//! to stdout, and each output stream is piped into a separate `ffmpeg` encoder
//! on stdin. `ffprobe` provides the source geometry and frame rate.

use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::str::FromStr;
use std::thread::JoinHandle;

use image::RgbImage;
use serde::Deserialize;

use climbmetrics_common::error::{ClimbError, ClimbResult};

use crate::video::{DecodedVideo, VideoDecoder, VideoEncoder, VideoInfo};

/// Output video codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoCodec {
    /// H.264 via libx264.
    #[default]
    H264,
    /// MPEG-4 Part 2, for hosts without libx264.
    Mpeg4,
}

impl VideoCodec {
    pub fn as_str(self) -> &'static str {
        match self {
            VideoCodec::H264 => "h264",
            VideoCodec::Mpeg4 => "mpeg4",
        }
    }
}

impl FromStr for VideoCodec {
    type Err = ClimbError;

    fn from_str(s: &str) -> ClimbResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "h264" | "libx264" | "avc" => Ok(VideoCodec::H264),
            "mpeg4" | "mp4v" => Ok(VideoCodec::Mpeg4),
            other => Err(ClimbError::config(format!(
                "unknown video codec {other:?} (expected \"h264\" or \"mpeg4\")"
            ))),
        }
    }
}

/// Decoder and encoder driven through the `ffmpeg`/`ffprobe` binaries.
#[derive(Debug, Clone, Default)]
pub struct FfmpegBackend {
    codec: VideoCodec,
}

impl FfmpegBackend {
    pub fn new(codec: VideoCodec) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> VideoCodec {
        self.codec
    }
}

impl VideoDecoder for FfmpegBackend {
    fn decode(&mut self, path: &Path) -> ClimbResult<DecodedVideo> {
        if !path.is_file() {
            return Err(ClimbError::source_unreadable(path, "file does not exist"));
        }

        let info = read_video_info(path)?;
        let frame_len = info.width as usize * info.height as usize * 3;

        tracing::debug!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            fps = ?info.fps,
            "Decoding source video"
        );

        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-nostdin", "-noautorotate", "-i"])
            .arg(path)
            .args(["-map", "0:v:0", "-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ClimbError::source_unreadable(path, format!("failed to start ffmpeg: {e}"))
            })?;

        let stderr_task = drain_stderr(&mut child);
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ClimbError::source_unreadable(path, "failed to capture ffmpeg stdout"))?;

        let mut reader = BufReader::new(stdout);
        let mut frames = Vec::new();
        loop {
            let mut buffer = vec![0u8; frame_len];
            match read_frame(&mut reader, &mut buffer) {
                Ok(true) => {
                    let frame = RgbImage::from_raw(info.width, info.height, buffer).ok_or_else(
                        || ClimbError::source_unreadable(path, "decoded frame has the wrong size"),
                    )?;
                    frames.push(frame);
                }
                Ok(false) => break,
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    tracing::warn!(
                        frames = frames.len(),
                        "Source ended mid-frame; dropping the partial frame"
                    );
                    break;
                }
                Err(e) => {
                    return Err(ClimbError::source_unreadable(
                        path,
                        format!("failed reading decoded frames: {e}"),
                    ))
                }
            }
        }

        let status = child
            .wait()
            .map_err(|e| {
                ClimbError::source_unreadable(path, format!("failed to wait on ffmpeg: {e}"))
            })?;
        let stderr_output = join_stderr(stderr_task);

        if !status.success() {
            return Err(ClimbError::source_unreadable(
                path,
                format!("ffmpeg decode failed (status {status}): {}", stderr_output.trim()),
            ));
        }

        tracing::info!(frames = frames.len(), "Decoded source video");
        Ok(DecodedVideo { info, frames })
    }

    fn is_available(&self) -> bool {
        command_exists("ffmpeg") && command_exists("ffprobe")
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

impl VideoEncoder for FfmpegBackend {
    fn encode(&mut self, path: &Path, frames: &[RgbImage], fps: u32) -> ClimbResult<()> {
        let first = frames
            .first()
            .ok_or_else(|| {
                ClimbError::encode(format!("no frames to encode for {}", path.display()))
            })?;
        let (width, height) = first.dimensions();
        let args = encode_args(width, height, fps, self.codec);

        tracing::debug!(args = ?args, output = %path.display(), "Running ffmpeg encoder");
        let mut child = Command::new("ffmpeg")
            .args(&args)
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ClimbError::encode(format!("Failed to start ffmpeg: {e}")))?;

        let stderr_task = drain_stderr(&mut child);
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ClimbError::encode("Failed to capture ffmpeg stdin"))?;

        let write_result = {
            let mut writer = BufWriter::new(stdin);
            frames
                .iter()
                .try_for_each(|frame| writer.write_all(frame.as_raw()))
                .and_then(|()| writer.flush())
        };

        let status = child
            .wait()
            .map_err(|e| ClimbError::encode(format!("Failed to wait on ffmpeg: {e}")))?;
        let stderr_output = join_stderr(stderr_task);

        if !status.success() {
            return Err(ClimbError::encode(format!(
                "ffmpeg encode of {} failed (status {}): {}",
                path.display(),
                status,
                stderr_output.trim()
            )));
        }
        write_result.map_err(|e| {
            ClimbError::encode(format!("Failed writing frames to ffmpeg: {e}"))
        })?;

        Ok(())
    }

    fn is_available(&self) -> bool {
        command_exists("ffmpeg")
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Drain stderr on a helper thread so ffmpeg never blocks on a full pipe.
fn drain_stderr(child: &mut Child) -> Option<JoinHandle<String>> {
    let stderr = child.stderr.take()?;
    Some(std::thread::spawn(move || -> String {
        let mut reader = BufReader::new(stderr);
        let mut output = String::new();
        match reader.read_to_string(&mut output) {
            Ok(_) => output,
            Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
        }
    }))
}

fn join_stderr(task: Option<JoinHandle<String>>) -> String {
    task.map(|t| {
        t.join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string())
    })
    .unwrap_or_default()
}

/// Fill `buffer` with exactly one frame.
///
/// Returns `Ok(false)` on a clean end of stream and `UnexpectedEof` when the
/// stream stops partway through a frame.
fn read_frame(reader: &mut impl Read, buffer: &mut [u8]) -> std::io::Result<bool> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    match filled {
        0 => Ok(false),
        n if n == buffer.len() => Ok(true),
        _ => Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof)),
    }
}

/// Encoder arguments up to (not including) the output path.
fn encode_args(width: u32, height: u32, fps: u32, codec: VideoCodec) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-v".into(),
        "error".into(),
        "-n".into(),
        "-f".into(),
        "rawvideo".into(),
        "-pix_fmt".into(),
        "rgb24".into(),
        "-s".into(),
        format!("{width}x{height}"),
        "-r".into(),
        fps.to_string(),
        "-i".into(),
        "-".into(),
    ];

    // yuv420p needs even dimensions.
    if width % 2 != 0 || height % 2 != 0 {
        args.push("-vf".into());
        args.push("pad=ceil(iw/2)*2:ceil(ih/2)*2".into());
    }

    match codec {
        VideoCodec::H264 => args.extend(
            ["-c:v", "libx264", "-preset", "medium", "-crf", "20"]
                .into_iter()
                .map(String::from),
        ),
        VideoCodec::Mpeg4 => args.extend(
            ["-c:v", "mpeg4", "-q:v", "3"]
                .into_iter()
                .map(String::from),
        ),
    }
    args.extend(
        ["-pix_fmt", "yuv420p", "-movflags", "+faststart"]
            .into_iter()
            .map(String::from),
    );
    args
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    #[serde(default)]
    codec_type: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    avg_frame_rate: Option<String>,
    #[serde(default)]
    r_frame_rate: Option<String>,
}

/// Read width, height and frame rate of the first video stream.
pub fn read_video_info(path: &Path) -> ClimbResult<VideoInfo> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=codec_type,width,height,avg_frame_rate,r_frame_rate",
            "-print_format",
            "json",
        ])
        .arg(path)
        .output()
        .map_err(|e| ClimbError::source_unreadable(path, format!("failed to run ffprobe: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ClimbError::source_unreadable(
            path,
            format!("ffprobe failed: {}", stderr.trim()),
        ));
    }

    parse_stream_info(&String::from_utf8_lossy(&output.stdout))
        .map_err(|message| ClimbError::source_unreadable(path, message))
}

fn parse_stream_info(json: &str) -> Result<VideoInfo, String> {
    let parsed: FfprobeOutput =
        serde_json::from_str(json).map_err(|e| format!("invalid ffprobe output: {e}"))?;
    let stream = parsed
        .streams
        .into_iter()
        .find(|s| s.codec_type.as_deref().map_or(true, |t| t == "video"))
        .ok_or_else(|| "no video stream".to_string())?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err("video stream has no dimensions".to_string()),
    };

    let fps = [stream.avg_frame_rate, stream.r_frame_rate]
        .into_iter()
        .flatten()
        .map(|rate| parse_frame_rate(&rate))
        .find(|fps| fps.is_finite() && *fps > 0.0);

    Ok(VideoInfo { width, height, fps })
}

/// Parse an ffprobe rate such as `"30000/1001"` or `"25"`; 0 when unparseable.
fn parse_frame_rate(fps_str: &str) -> f64 {
    if let Some((num, den)) = fps_str.split_once('/') {
        let num: f64 = num.trim().parse().unwrap_or(0.0);
        let den: f64 = den.trim().parse().unwrap_or(0.0);
        return if den > 0.0 { num / den } else { 0.0 };
    }
    fps_str.trim().parse().unwrap_or(0.0)
}

/// Whether `binary` resolves on `PATH`.
pub fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
