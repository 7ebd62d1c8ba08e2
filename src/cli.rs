use clap::{Args, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

use crate::ui::OutputFormat;
use crate::video::EncodeMode;

/// Lay out live-stream comments as a scrolling subtitle overlay
#[derive(Parser, Debug)]
#[command(name = "barrage", author, version, about, long_about = None)]
pub struct Cli {
    /// Show per-window density details and other debug output
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Output format for messages
    #[arg(long = "output", value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Read settings from this file instead of the default location
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Convert a comment XML file into an ASS overlay track
    Convert(ConvertArgs),
    /// Convert comments and burn them into a video with ffmpeg
    Burn(BurnArgs),
    /// Write a short test track for checking overlay placement
    Sample(SampleArgs),
    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Subtitle canvas size; defaults to the configured frame size.
#[derive(Args, Debug, Clone, Default)]
pub struct FrameArgs {
    /// Canvas width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Canvas height in pixels
    #[arg(long)]
    pub height: Option<u32>,
}

#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    /// Comment XML file
    #[arg(value_hint = ValueHint::FilePath)]
    pub comments: PathBuf,

    /// Output file; defaults to <comments stem>.ass next to the input
    #[arg(short = 'o', long = "out-file", value_hint = ValueHint::FilePath)]
    pub out_file: Option<PathBuf>,

    #[command(flatten)]
    pub frame: FrameArgs,

    /// Overwrite an existing output file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug, Clone)]
pub struct BurnArgs {
    /// Comment XML file
    #[arg(value_hint = ValueHint::FilePath)]
    pub comments: PathBuf,

    /// Video to burn the overlay into
    #[arg(value_hint = ValueHint::FilePath)]
    pub video: PathBuf,

    /// Output video; defaults to <video stem>_danmaku.mp4 next to the video
    #[arg(short = 'o', long = "out-file", value_hint = ValueHint::FilePath)]
    pub out_file: Option<PathBuf>,

    /// Encoder preset; prompts when omitted on a terminal
    #[arg(long, value_enum)]
    pub mode: Option<EncodeMode>,

    /// Canvas size; defaults to the video's own size
    #[command(flatten)]
    pub frame: FrameArgs,

    /// Keep the generated .ass file next to the output video
    #[arg(long)]
    pub keep_ass: bool,

    /// Print the ffmpeg command instead of running it
    #[arg(long)]
    pub dry_run: bool,

    /// Stream ffmpeg's own output
    #[arg(short, long)]
    pub verbose: bool,

    /// Overwrite an existing output video
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SampleArgs {
    /// Output file
    #[arg(
        short = 'o',
        long = "out-file",
        default_value = "test_distribution.ass",
        value_hint = ValueHint::FilePath
    )]
    pub out_file: PathBuf,

    #[command(flatten)]
    pub frame: FrameArgs,

    /// Overwrite an existing output file
    #[arg(long)]
    pub force: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Print the config file location
    Path,
    /// Print the effective configuration
    Show,
    /// Write a documented default configuration
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}
