use std::fmt;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use serde::{Deserialize, Serialize};

static PROGRESS_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"time=(\d+):(\d+):(\d+(?:\.\d+)?)").expect("valid regex"));
static PROGRESS_SPEED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"speed=\s*([\d.]+x)").expect("valid regex"));

/// x264 speed/quality trade-off for burning the overlay in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodeMode {
    /// Balanced quality, re-encodes audio as AAC
    #[default]
    Fast,
    /// Fastest preset, slightly lower quality, audio copied as-is
    Ultrafast,
}

impl EncodeMode {
    fn codec_args(self) -> &'static [&'static str] {
        match self {
            EncodeMode::Fast => &[
                "-c:a",
                "aac",
                "-b:a",
                "128k",
                "-c:v",
                "libx264",
                "-preset",
                "veryfast",
                "-crf",
                "23",
                "-threads",
                "0",
                "-movflags",
                "+faststart",
                "-x264-params",
                "keyint=60:min-keyint=30:scenecut=40",
            ],
            EncodeMode::Ultrafast => &[
                "-c:a",
                "copy",
                "-c:v",
                "libx264",
                "-preset",
                "ultrafast",
                "-crf",
                "25",
                "-threads",
                "0",
                "-x264-params",
                "keyint=30:min-keyint=30:scenecut=0",
            ],
        }
    }
}

impl fmt::Display for EncodeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeMode::Fast => write!(f, "fast"),
            EncodeMode::Ultrafast => write!(f, "ultrafast"),
        }
    }
}

/// Escape a path for use as an option value inside an ffmpeg filtergraph.
fn escape_filter_path(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | ':' | '\'' | ',' | '[' | ']' | ';') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// ffmpeg arguments that burn `subtitles` into `video`, writing `output`.
pub fn build_burn_args(
    video: &Path,
    subtitles: &Path,
    output: &Path,
    mode: EncodeMode,
) -> Vec<String> {
    let mut args = vec![
        "-y".to_string(),
        "-i".to_string(),
        video.to_string_lossy().into_owned(),
        "-vf".to_string(),
        format!("ass={}", escape_filter_path(subtitles)),
    ];
    args.extend(mode.codec_args().iter().map(|s| s.to_string()));
    args.push(output.to_string_lossy().into_owned());
    args
}

pub fn ensure_tool(name: &str) -> Result<()> {
    which::which(name)
        .map(|_| ())
        .with_context(|| format!("{name} was not found in PATH; install ffmpeg to burn overlays"))
}

pub fn probe_duration_seconds(path: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .with_context(|| format!("Failed to run ffprobe for {}", path.display()))?;

    if !output.status.success() {
        bail!(
            "ffprobe failed for {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let duration_str = String::from_utf8_lossy(&output.stdout);
    let duration: f64 = duration_str
        .trim()
        .parse()
        .context("Failed to parse ffprobe duration as f64")?;

    Ok(duration)
}

/// Width and height of the first video stream.
pub fn probe_video_dimensions(path: &Path) -> Result<(u32, u32)> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-of",
            "csv=s=x:p=0",
        ])
        .arg(path)
        .output()
        .with_context(|| format!("Failed to probe video dimensions for {}", path.display()))?;

    if !output.status.success() {
        bail!(
            "ffprobe exited with status {:?} while probing {}",
            output.status.code(),
            path.display()
        );
    }

    let stdout = String::from_utf8(output.stdout)
        .context("ffprobe returned non-UTF8 output for video dimensions")?;
    parse_dimensions(stdout.trim())
        .with_context(|| format!("Unexpected ffprobe dimensions for {}", path.display()))
}

fn parse_dimensions(value: &str) -> Result<(u32, u32)> {
    let (width, height) = value
        .split_once('x')
        .with_context(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let width: u32 = width
        .trim()
        .parse()
        .with_context(|| format!("Unable to parse width '{width}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .with_context(|| format!("Unable to parse height '{height}'"))?;
    if width == 0 || height == 0 {
        bail!("video reports zero size ({value})");
    }
    Ok((width, height))
}

pub trait FfmpegRunner {
    fn run(&self, args: &[String], options: FfmpegRunOptions) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemFfmpegRunner;

#[derive(Debug, Clone, Default)]
pub struct FfmpegRunOptions {
    pub total_duration: Option<f64>,
    pub verbose: bool,
}

impl FfmpegRunOptions {
    pub fn new(total_duration: Option<f64>, verbose: bool) -> Self {
        Self {
            total_duration,
            verbose,
        }
    }
}

impl FfmpegRunner for SystemFfmpegRunner {
    fn run(&self, args: &[String], options: FfmpegRunOptions) -> Result<()> {
        let mut child = Command::new("ffmpeg")
            .args(args)
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| "Failed to spawn ffmpeg")?;

        let stderr = child
            .stderr
            .take()
            .context("ffmpeg stderr was not captured")?;

        let pb = options
            .total_duration
            .filter(|d| *d > 0.0)
            .map(progress_bar);

        let mut capture = StderrCapture::default();
        let result = read_ffmpeg_stderr(stderr, options.verbose, pb.as_ref(), &mut capture);

        let status = child.wait().context("Failed to wait for ffmpeg")?;
        result?;

        if let Some(pb) = pb {
            pb.finish_with_message("done");
        }

        if !status.success() {
            let error_msg = if capture.error_lines.is_empty() {
                capture.last_line
            } else {
                capture.error_lines.join("\n")
            };
            bail!(
                "ffmpeg exited with status {:?}: {}",
                status.code(),
                error_msg.trim()
            );
        }

        Ok(())
    }
}

fn progress_bar(duration: f64) -> ProgressBar {
    let pb = ProgressBar::new((duration * 1000.0) as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent:>3}% ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏ "),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.set_message("burning");
    pb
}

#[derive(Debug, Default)]
struct StderrCapture {
    last_line: String,
    error_lines: Vec<String>,
}

fn read_ffmpeg_stderr<R: Read>(
    mut stderr: R,
    verbose: bool,
    pb: Option<&ProgressBar>,
    capture: &mut StderrCapture,
) -> Result<()> {
    let mut buffer = [0u8; 4096];
    let mut accumulated = String::new();

    loop {
        let bytes_read = stderr
            .read(&mut buffer)
            .context("Failed to read ffmpeg stderr")?;
        if bytes_read == 0 {
            break;
        }

        accumulated.push_str(&String::from_utf8_lossy(&buffer[..bytes_read]));

        // ffmpeg rewrites its status line with \r, so split on both
        while let Some(pos) = accumulated.find(['\r', '\n']) {
            let line = accumulated[..pos].to_string();
            accumulated.drain(..=pos);

            if line.is_empty() {
                continue;
            }

            if verbose {
                eprintln!("{line}");
            }

            if is_error_line(&line) {
                capture.error_lines.push(line.clone());
            }

            if let Some(pb) = pb {
                if let Some(seconds) = parse_ffmpeg_progress(&line) {
                    pb.set_position((seconds * 1000.0) as u64);
                    if let Some(speed) = parse_ffmpeg_speed(&line) {
                        pb.set_message(speed);
                    }
                }
            }

            capture.last_line = line;
        }
    }

    Ok(())
}

/// Lines worth surfacing on failure. Missing-font and memory chatter from
/// libass is noisy and rarely the cause.
fn is_error_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    (lower.contains("error") || lower.contains("fail"))
        && !lower.contains("font")
        && !lower.contains("memory")
}

fn parse_ffmpeg_progress(line: &str) -> Option<f64> {
    let caps = PROGRESS_TIME.captures(line)?;
    let hours: f64 = caps[1].parse().ok()?;
    let minutes: f64 = caps[2].parse().ok()?;
    let seconds: f64 = caps[3].parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

fn parse_ffmpeg_speed(line: &str) -> Option<String> {
    PROGRESS_SPEED.captures(line).map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn fast_mode_args() {
        let args = build_burn_args(
            Path::new("in.ts"),
            Path::new("track.ass"),
            Path::new("out.mp4"),
            EncodeMode::Fast,
        );
        assert_eq!(&args[..5], &["-y", "-i", "in.ts", "-vf", "ass=track.ass"]);
        assert!(args.windows(2).any(|w| w == ["-preset", "veryfast"]));
        assert!(args.windows(2).any(|w| w == ["-c:a", "aac"]));
        assert!(args.windows(2).any(|w| w == ["-movflags", "+faststart"]));
        assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
    }

    #[test]
    fn ultrafast_mode_copies_audio() {
        let args = build_burn_args(
            Path::new("in.ts"),
            Path::new("track.ass"),
            Path::new("out.mp4"),
            EncodeMode::Ultrafast,
        );
        assert!(args.windows(2).any(|w| w == ["-c:a", "copy"]));
        assert!(args.windows(2).any(|w| w == ["-crf", "25"]));
        assert!(
            args.windows(2)
                .any(|w| w == ["-x264-params", "keyint=30:min-keyint=30:scenecut=0"])
        );
    }

    #[test]
    fn filter_path_is_escaped() {
        let path = PathBuf::from("/tmp/it's:here/track.ass");
        assert_eq!(escape_filter_path(&path), r"/tmp/it\'s\:here/track.ass");
    }

    #[test]
    fn parses_progress_lines() {
        let line = "frame= 1234 fps=120 q=28.0 size=   10240kB time=00:01:05.50 bitrate=1280.0kbits/s speed=4.21x";
        assert_eq!(parse_ffmpeg_progress(line), Some(65.5));
        assert_eq!(parse_ffmpeg_speed(line), Some("4.21x".to_string()));
        assert_eq!(parse_ffmpeg_progress("Input #0, mpegts, from 'in.ts':"), None);
    }

    #[test]
    fn collects_error_lines_and_skips_font_noise() {
        let stderr = b"Stream mapping:\r\n[Parsed_ass_0] fontselect: failed to find font\nError opening output file out.mp4\rtime=00:00:01.00 speed=1x\n";
        let mut capture = StderrCapture::default();
        read_ffmpeg_stderr(&stderr[..], false, None, &mut capture).unwrap();
        assert_eq!(capture.error_lines, vec!["Error opening output file out.mp4"]);
        assert_eq!(capture.last_line, "time=00:00:01.00 speed=1x");
    }

    #[test]
    fn parses_probe_dimensions() {
        assert_eq!(parse_dimensions("1080x1920").unwrap(), (1080, 1920));
        assert!(parse_dimensions("1080").is_err());
        assert!(parse_dimensions("0x720").is_err());
        assert!(parse_dimensions("wide x tall").is_err());
    }

    #[test]
    fn mode_names() {
        assert_eq!(EncodeMode::default(), EncodeMode::Fast);
        assert_eq!(EncodeMode::Ultrafast.to_string(), "ultrafast");
    }
}
