use serde::{Deserialize, Serialize};

use super::error::{LayoutError, Result};

/// Tunables for one layout run.
///
/// The defaults are tuned for a 720x1280 portrait frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub frame_width: u32,
    pub frame_height: u32,
    pub track_count: usize,
    pub track_spacing_px: u32,
    pub base_font_size_px: u32,
    pub window_length_seconds: f64,
    pub base_display_duration: f64,
    pub duration_extension_constant: f64,
    pub min_display_duration: f64,
    pub max_display_duration: f64,
    /// Seconds of display time added per character of author and body.
    pub length_factor: f64,
    /// First track sits at `frame_height * base_offset_ratio`.
    pub base_offset_ratio: f64,
    /// Tracks below `frame_height * max_offset_ratio` are folded back up.
    pub max_offset_ratio: f64,
    /// Comments enter this many pixels past the right edge of the frame.
    pub entry_margin_px: i64,
    pub exit_x_px: i64,
    pub author_style: String,
    pub body_style: String,
    pub default_author: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            frame_width: 720,
            frame_height: 1280,
            track_count: 20,
            track_spacing_px: 32,
            base_font_size_px: 28,
            window_length_seconds: 2.0,
            base_display_duration: 8.0,
            duration_extension_constant: 12.0,
            min_display_duration: 6.0,
            max_display_duration: 15.0,
            length_factor: 0.1,
            base_offset_ratio: 0.7,
            max_offset_ratio: 1.0,
            entry_margin_px: 200,
            exit_x_px: -1000,
            author_style: "Username".to_string(),
            body_style: "Default".to_string(),
            default_author: "user".to_string(),
        }
    }
}

impl LayoutConfig {
    #[cfg(test)]
    pub fn with_frame(mut self, width: u32, height: u32) -> Self {
        self.frame_width = width;
        self.frame_height = height;
        self
    }

    /// Reject configurations the pipeline cannot run with. Called before any record is read.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(LayoutError::InvalidConfiguration(msg));

        if self.track_count == 0 {
            return invalid("track_count must be at least 1".to_string());
        }
        if self.track_spacing_px == 0 {
            return invalid("track_spacing_px must be greater than 0".to_string());
        }
        if !self.window_length_seconds.is_finite() || self.window_length_seconds <= 0.0 {
            return invalid(format!(
                "window_length_seconds must be a positive number, got {}",
                self.window_length_seconds
            ));
        }
        if self.frame_width == 0 || self.frame_height == 0 {
            return invalid(format!(
                "frame size must be non-zero, got {}x{}",
                self.frame_width, self.frame_height
            ));
        }

        for (name, value) in [
            ("base_display_duration", self.base_display_duration),
            ("duration_extension_constant", self.duration_extension_constant),
            ("min_display_duration", self.min_display_duration),
            ("max_display_duration", self.max_display_duration),
            ("length_factor", self.length_factor),
            ("base_offset_ratio", self.base_offset_ratio),
            ("max_offset_ratio", self.max_offset_ratio),
        ] {
            if !value.is_finite() || value < 0.0 {
                return invalid(format!("{name} must be a non-negative number, got {value}"));
            }
        }

        if self.min_display_duration > self.max_display_duration {
            return invalid(format!(
                "min_display_duration ({}) exceeds max_display_duration ({})",
                self.min_display_duration, self.max_display_duration
            ));
        }
        if self.min_display_duration + self.duration_extension_constant <= 0.0 {
            return invalid("display duration must be positive".to_string());
        }
        if self.base_offset_ratio > self.max_offset_ratio {
            return invalid(format!(
                "base_offset_ratio ({}) exceeds max_offset_ratio ({})",
                self.base_offset_ratio, self.max_offset_ratio
            ));
        }

        Ok(())
    }

    /// Comments per second above which a window gets its start times spread out.
    pub fn density_threshold(&self) -> f64 {
        self.track_count as f64 / 2.0
    }

    pub fn base_offset(&self) -> f64 {
        self.frame_height as f64 * self.base_offset_ratio
    }

    pub fn max_offset(&self) -> f64 {
        self.frame_height as f64 * self.max_offset_ratio
    }

    pub fn entry_x(&self) -> i64 {
        self.frame_width as i64 + self.entry_margin_px
    }
}
