use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::common::config::DocumentedConfig;
use crate::common::paths;
use crate::danmaku::LayoutConfig;
use crate::documented_config;
use crate::video::EncodeMode;

/// Settings read from `barrage.toml`. Command line flags take precedence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BarrageConfig {
    #[serde(flatten)]
    pub layout: LayoutConfig,
    /// Encoder preset used when `burn` runs without `--mode` and cannot prompt
    pub encode_mode: EncodeMode,
    /// Keep the generated subtitle file next to the burned video
    pub keep_subtitles: bool,
}

documented_config!(BarrageConfig,
    "frame_width" => layout.frame_width, "Subtitle canvas width in pixels (match the video)";
    "frame_height" => layout.frame_height, "Subtitle canvas height in pixels (match the video)";
    "track_count" => layout.track_count, "Number of horizontal tracks comments rotate over";
    "track_spacing_px" => layout.track_spacing_px, "Vertical distance between tracks in pixels";
    "base_font_size_px" => layout.base_font_size_px, "Font size for author and comment text";
    "window_length_seconds" => layout.window_length_seconds, "Length of the density smoothing window";
    "base_display_duration" => layout.base_display_duration, "Seconds on screen before length adjustment";
    "duration_extension_constant" => layout.duration_extension_constant, "Seconds added to every comment after clamping";
    "min_display_duration" => layout.min_display_duration, "Lower clamp for the length-adjusted duration";
    "max_display_duration" => layout.max_display_duration, "Upper clamp for the length-adjusted duration";
    "length_factor" => layout.length_factor, "Seconds added per character of author and text";
    "base_offset_ratio" => layout.base_offset_ratio, "First track position as a fraction of frame height";
    "max_offset_ratio" => layout.max_offset_ratio, "Lowest allowed track position as a fraction of frame height";
    "entry_margin_px" => layout.entry_margin_px, "Pixels past the right edge where comments enter";
    "exit_x_px" => layout.exit_x_px, "Horizontal position where comments leave";
    "author_style" => layout.author_style, "Style name used for comment authors";
    "body_style" => layout.body_style, "Style name used for comment text";
    "default_author" => layout.default_author, "Author shown for comments without one";
    "encode_mode" => encode_mode, "Encoder preset for burn: fast or ultrafast";
    "keep_subtitles" => keep_subtitles, "Keep the generated .ass file after burning";
    => paths::default_config_path()
);

impl BarrageConfig {
    /// Load from an explicit path, or the default location when `None`.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("config file {} does not exist", path.display());
                }
                Self::load_from_path(path)
            }
            None => Self::load(),
        }
    }

    /// Layout settings with the frame size overridden where given.
    pub fn layout_for(&self, width: Option<u32>, height: Option<u32>) -> LayoutConfig {
        let mut layout = self.layout.clone();
        if let Some(width) = width {
            layout.frame_width = width;
        }
        if let Some(height) = height {
            layout.frame_height = height;
        }
        layout
    }
}
