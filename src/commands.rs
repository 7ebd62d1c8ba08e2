use anyhow::{Context, Result, bail};
use serde_json::json;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tempfile::{Builder as TempFileBuilder, NamedTempFile};

use crate::cli::{BurnArgs, Commands, ConfigCommands, ConvertArgs, FrameArgs, SampleArgs};
use crate::common::config::DocumentedConfig;
use crate::common::paths::sibling_with_suffix;
use crate::common::progress::create_spinner;
use crate::config::BarrageConfig;
use crate::danmaku::{LayoutConfig, LayoutEngine, load_comment_file};
use crate::report::emit_run_report;
use crate::subtitles::{OverlayStyles, distribution_sample, generate_ass_file, write_ass_file};
use crate::ui::prelude::*;
use crate::video::{
    EncodeMode, FfmpegRunOptions, FfmpegRunner, SystemFfmpegRunner, build_burn_args, ensure_tool,
    probe_duration_seconds, probe_video_dimensions,
};

pub fn handle_command(command: Commands, config_path: Option<&PathBuf>) -> Result<()> {
    match command {
        Commands::Convert(args) => handle_convert(args, &BarrageConfig::load_from(config_path)?),
        Commands::Burn(args) => handle_burn(args, &BarrageConfig::load_from(config_path)?),
        Commands::Sample(args) => handle_sample(args, &BarrageConfig::load_from(config_path)?),
        Commands::Config { command } => handle_config(command, config_path),
    }
}

fn ensure_can_write(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    Ok(())
}

fn ensure_input(path: &Path, what: &str) -> Result<()> {
    if !path.is_file() {
        bail!("{what} {} not found", path.display());
    }
    Ok(())
}

/// Read a comment file and lay it out into ASS content.
///
/// Returns the subtitle text and the number of events written.
fn convert_comments(comments: &Path, layout: LayoutConfig) -> Result<(String, usize)> {
    ensure_input(comments, "Comment file")?;

    let engine = LayoutEngine::new(layout).context("Invalid layout settings")?;

    let spinner = create_spinner(format!("Reading {}", comments.display()));
    let records = load_comment_file(comments);
    spinner.finish_and_clear();
    let records =
        records.with_context(|| format!("Failed to read comments from {}", comments.display()))?;

    let run = engine.run(&records);
    emit_run_report(&run.report);

    let config = engine.config();
    let content = generate_ass_file(
        &run.events,
        &OverlayStyles::from_config(config),
        (config.frame_width, config.frame_height),
    );
    Ok((content, run.events.len()))
}

fn handle_convert(args: ConvertArgs, config: &BarrageConfig) -> Result<()> {
    let output = args
        .out_file
        .clone()
        .unwrap_or_else(|| sibling_with_suffix(&args.comments, "", "ass"));
    ensure_can_write(&output, args.force)?;

    let layout = config.layout_for(args.frame.width, args.frame.height);
    let (content, events) = convert_comments(&args.comments, layout)?;
    write_ass_file(&output, &content)?;

    emit(
        Level::Success,
        "barrage.convert.written",
        &format!("Wrote {events} overlay events to {}", output.display()),
        Some(json!({ "path": output.display().to_string(), "events": events })),
    );
    Ok(())
}

/// Where the overlay track lives while ffmpeg runs.
enum SubtitleFile {
    Kept(PathBuf),
    /// Removed when dropped
    Temporary(NamedTempFile),
}

impl SubtitleFile {
    fn temporary() -> Result<Self> {
        let file = TempFileBuilder::new()
            .prefix("barrage-")
            .suffix(".ass")
            .tempfile()
            .context("Failed to create temporary subtitle file")?;
        Ok(SubtitleFile::Temporary(file))
    }

    fn path(&self) -> &Path {
        match self {
            SubtitleFile::Kept(path) => path,
            SubtitleFile::Temporary(file) => file.path(),
        }
    }
}

/// Frame size precedence: flags, then the probed video, then the config file.
fn resolve_frame(
    frame: &FrameArgs,
    probed: Option<(u32, u32)>,
    config: &BarrageConfig,
) -> LayoutConfig {
    let (probed_width, probed_height) = match probed {
        Some((w, h)) => (Some(w), Some(h)),
        None => (None, None),
    };
    config.layout_for(
        frame.width.or(probed_width),
        frame.height.or(probed_height),
    )
}

fn prompt_encode_mode() -> Result<EncodeMode> {
    let modes = [EncodeMode::Fast, EncodeMode::Ultrafast];
    let labels = [
        "fast       balanced quality, re-encodes audio",
        "ultrafast  quickest encode, copies audio",
    ];
    let selection = dialoguer::Select::new()
        .with_prompt("Encoding mode")
        .items(&labels)
        .default(0)
        .interact_opt()
        .context("Failed to show selection dialog")?;

    match selection {
        Some(idx) => Ok(modes[idx]),
        None => bail!("Cancelled"),
    }
}

fn resolve_mode(flag: Option<EncodeMode>, config: &BarrageConfig) -> Result<EncodeMode> {
    if let Some(mode) = flag {
        return Ok(mode);
    }
    let interactive =
        std::io::stdin().is_terminal() && matches!(get_output_format(), OutputFormat::Text);
    if interactive {
        prompt_encode_mode()
    } else {
        Ok(config.encode_mode)
    }
}

fn handle_burn(args: BurnArgs, config: &BarrageConfig) -> Result<()> {
    ensure_input(&args.comments, "Comment file")?;
    ensure_input(&args.video, "Video")?;

    let output = args
        .out_file
        .clone()
        .unwrap_or_else(|| sibling_with_suffix(&args.video, "_danmaku", "mp4"));
    let keep = args.keep_ass || config.keep_subtitles;
    // A dry run keeps the track so the printed command works as-is
    let kept_subtitles =
        (keep || args.dry_run).then(|| sibling_with_suffix(&output, "", "ass"));
    if let Some(path) = &kept_subtitles {
        ensure_can_write(path, args.force)?;
    }
    if !args.dry_run {
        ensure_can_write(&output, args.force)?;
        ensure_tool("ffmpeg")?;
    }

    let has_ffprobe = which::which("ffprobe").is_ok();
    if !has_ffprobe {
        emit(
            Level::Warn,
            "barrage.burn.no_ffprobe",
            "ffprobe not found; using configured frame size and no progress bar",
            None,
        );
    }

    let probed = if has_ffprobe && (args.frame.width.is_none() || args.frame.height.is_none()) {
        match probe_video_dimensions(&args.video) {
            Ok(dimensions) => Some(dimensions),
            Err(err) => {
                emit(
                    Level::Warn,
                    "barrage.burn.probe_failed",
                    &format!("Could not read video size, using configured frame size: {err:#}"),
                    None,
                );
                None
            }
        }
    } else {
        None
    };
    let layout = resolve_frame(&args.frame, probed, config);
    emit(
        Level::Debug,
        "barrage.burn.frame",
        &format!("Overlay canvas {}x{}", layout.frame_width, layout.frame_height),
        None,
    );

    let mode = resolve_mode(args.mode, config)?;
    let subtitles = match kept_subtitles {
        Some(path) => SubtitleFile::Kept(path),
        None => SubtitleFile::temporary()?,
    };

    if args.dry_run {
        let (content, events) = convert_comments(&args.comments, layout)?;
        write_ass_file(subtitles.path(), &content)?;
        emit(
            Level::Info,
            "barrage.burn.subtitles",
            &format!("Wrote {events} overlay events to {}", subtitles.path().display()),
            None,
        );
        let ffmpeg_args = build_burn_args(&args.video, subtitles.path(), &output, mode);
        let command = shell_words::join(
            std::iter::once("ffmpeg").chain(ffmpeg_args.iter().map(String::as_str)),
        );
        match get_output_format() {
            OutputFormat::Json => emit(
                Level::Info,
                "barrage.burn.command",
                &command,
                Some(json!({ "program": "ffmpeg", "args": ffmpeg_args })),
            ),
            OutputFormat::Text => print_block(&command),
        }
        return Ok(());
    }

    let total_duration = if has_ffprobe {
        match probe_duration_seconds(&args.video) {
            Ok(duration) => Some(duration),
            Err(err) => {
                emit(
                    Level::Debug,
                    "barrage.burn.duration_unknown",
                    &format!("No progress bar: {err:#}"),
                    None,
                );
                None
            }
        }
    } else {
        None
    };
    let options = FfmpegRunOptions::new(total_duration, args.verbose);

    burn_video(
        &SystemFfmpegRunner,
        &args.comments,
        &args.video,
        &output,
        &subtitles,
        layout,
        mode,
        options,
    )?;

    if let SubtitleFile::Kept(path) = &subtitles {
        emit(
            Level::Info,
            "barrage.burn.subtitles",
            &format!("Kept overlay track at {}", path.display()),
            None,
        );
    }
    emit(
        Level::Success,
        "barrage.burn.written",
        &format!("Burned comments into {} ({mode})", output.display()),
        Some(json!({ "path": output.display().to_string(), "mode": mode.to_string() })),
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn burn_video(
    runner: &impl FfmpegRunner,
    comments: &Path,
    video: &Path,
    output: &Path,
    subtitles: &SubtitleFile,
    layout: LayoutConfig,
    mode: EncodeMode,
    options: FfmpegRunOptions,
) -> Result<()> {
    let (content, events) = convert_comments(comments, layout)?;
    write_ass_file(subtitles.path(), &content)?;
    if events == 0 {
        emit(
            Level::Warn,
            "barrage.burn.empty",
            "No comments to overlay; the video will be re-encoded unchanged",
            None,
        );
    }

    emit(
        Level::Info,
        "barrage.burn.start",
        &format!("Encoding {} with mode {mode}", video.display()),
        None,
    );
    let args = build_burn_args(video, subtitles.path(), output, mode);
    runner
        .run(&args, options)
        .with_context(|| format!("Failed to burn comments into {}", video.display()))
}

fn handle_sample(args: SampleArgs, config: &BarrageConfig) -> Result<()> {
    ensure_can_write(&args.out_file, args.force)?;
    let layout = config.layout_for(args.frame.width, args.frame.height);
    layout.validate().context("Invalid layout settings")?;

    write_ass_file(&args.out_file, &distribution_sample(&layout))?;
    emit(
        Level::Success,
        "barrage.sample.written",
        &format!("Wrote test track to {}", args.out_file.display()),
        Some(json!({ "path": args.out_file.display().to_string() })),
    );
    Ok(())
}

fn handle_config(command: ConfigCommands, config_path: Option<&PathBuf>) -> Result<()> {
    let path = match config_path {
        Some(path) => path.clone(),
        None => BarrageConfig::config_path()?,
    };

    match command {
        ConfigCommands::Path => {
            emit(
                Level::Info,
                "barrage.config.path",
                &path.display().to_string(),
                Some(json!({ "path": path.display().to_string(), "exists": path.exists() })),
            );
        }
        ConfigCommands::Show => {
            let config = BarrageConfig::load_from(config_path)?;
            match get_output_format() {
                OutputFormat::Json => emit(
                    Level::Info,
                    "barrage.config.show",
                    "Effective configuration",
                    Some(serde_json::to_value(&config).context("Failed to serialize config")?),
                ),
                OutputFormat::Text => print_block(config.to_documented_toml().trim_end()),
            }
        }
        ConfigCommands::Init { force } => {
            ensure_can_write(&path, force)?;
            BarrageConfig::default().save_with_documentation(&path)?;
            emit(
                Level::Success,
                "barrage.config.written",
                &format!("Wrote default configuration to {}", path.display()),
                Some(json!({ "path": path.display().to_string() })),
            );
        }
    }
    Ok(())
}
