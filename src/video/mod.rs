//! Burning overlay tracks into video files with ffmpeg.

pub mod ffmpeg;

pub use ffmpeg::{
    EncodeMode, FfmpegRunOptions, FfmpegRunner, SystemFfmpegRunner, build_burn_args,
    ensure_tool, probe_duration_seconds, probe_video_dimensions,
};
