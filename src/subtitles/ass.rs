//! ASS (Advanced SubStation Alpha) file format generation.
//!
//! Writes overlay events as a subtitle track that ffmpeg's `ass` filter can
//! burn into a video.

use std::fmt::Write;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::danmaku::emitter::MovePath;
use crate::danmaku::{LayoutConfig, OverlayEvent, format_timestamp};

/// Style configuration for ASS subtitles.
#[derive(Debug, Clone, PartialEq)]
pub struct AssStyle {
    /// Style name, referenced by `\r<name>` overrides
    pub name: String,
    pub font_name: String,
    /// Font size in pixels
    pub font_size: u32,
    /// Primary color in ABGR format (e.g., &H00FFFFFF for white)
    pub primary_color: String,
    pub secondary_color: String,
    pub outline_color: String,
    /// Background/shadow color in ABGR format
    pub back_color: String,
    pub bold: bool,
    /// Outline width in pixels
    pub outline: u32,
    /// Shadow depth in pixels
    pub shadow: u32,
    /// Alignment (numpad layout: 1-3=bottom, 4-6=mid, 7-9=top)
    pub alignment: u8,
    pub margin_l: u32,
    pub margin_r: u32,
    pub margin_v: u32,
}

impl AssStyle {
    fn overlay(name: &str, font_size: u32, primary_color: &str) -> Self {
        Self {
            name: name.to_string(),
            font_name: "Arial".to_string(),
            font_size,
            primary_color: primary_color.to_string(),
            secondary_color: "&H000000FF".to_string(),
            outline_color: "&H00000000".to_string(),
            back_color: "&H00000000".to_string(),
            bold: false,
            // Thin black border keeps white text readable on bright frames
            outline: 1,
            shadow: 0,
            alignment: 2,
            margin_l: 10,
            margin_r: 10,
            margin_v: 10,
        }
    }

    /// White body text.
    pub fn body(name: &str, font_size: u32) -> Self {
        Self::overlay(name, font_size, "&H00FFFFFF")
    }

    /// Pink (#FF8FA3) author name.
    pub fn author(name: &str, font_size: u32) -> Self {
        Self::overlay(name, font_size, "&H00A38FFF")
    }

    /// Format the style line for the ASS file.
    fn to_style_line(&self) -> String {
        let bold_val = if self.bold { -1 } else { 0 };
        format!(
            "Style: {name},{font},{size},{primary},{secondary},{outline},{back},{bold},0,0,0,100,100,0,0,1,{outline_w},{shadow},{align},{ml},{mr},{mv},1",
            name = self.name,
            font = self.font_name,
            size = self.font_size,
            primary = self.primary_color,
            secondary = self.secondary_color,
            outline = self.outline_color,
            back = self.back_color,
            bold = bold_val,
            outline_w = self.outline,
            shadow = self.shadow,
            align = self.alignment,
            ml = self.margin_l,
            mr = self.margin_r,
            mv = self.margin_v,
        )
    }
}

/// The two styles an overlay track switches between.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayStyles {
    pub body: AssStyle,
    pub author: AssStyle,
}

impl OverlayStyles {
    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            body: AssStyle::body(&config.body_style, config.base_font_size_px),
            author: AssStyle::author(&config.author_style, config.base_font_size_px),
        }
    }
}

fn write_header(output: &mut String, styles: &OverlayStyles, play_res: (u32, u32)) {
    // Script Info section
    writeln!(output, "[Script Info]").unwrap();
    writeln!(output, "ScriptType: v4.00+").unwrap();
    writeln!(output, "PlayResX: {}", play_res.0).unwrap();
    writeln!(output, "PlayResY: {}", play_res.1).unwrap();
    writeln!(output, "ScaledBorderAndShadow: yes").unwrap();
    writeln!(output).unwrap();

    // V4+ Styles section
    writeln!(output, "[V4+ Styles]").unwrap();
    writeln!(
        output,
        "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding"
    )
    .unwrap();
    writeln!(output, "{}", styles.body.to_style_line()).unwrap();
    writeln!(output, "{}", styles.author.to_style_line()).unwrap();
    writeln!(output).unwrap();

    // Events section
    writeln!(output, "[Events]").unwrap();
    writeln!(
        output,
        "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text"
    )
    .unwrap();
}

fn write_dialogue(output: &mut String, start: &str, end: &str, style: &str, text: &str) {
    writeln!(
        output,
        "Dialogue: 0,{start},{end},{style},,0,0,0,,{text}"
    )
    .unwrap();
}

/// Generate the complete ASS file content for an overlay track.
///
/// Events are written in the order given.
pub fn generate_ass_file(
    events: &[OverlayEvent],
    styles: &OverlayStyles,
    play_res: (u32, u32),
) -> String {
    let mut output = String::new();
    write_header(&mut output, styles, play_res);

    for event in events {
        write_dialogue(
            &mut output,
            &event.start_code(),
            &event.end_code(),
            &styles.body.name,
            &event.markup,
        );
    }

    output
}

/// Write ASS content as UTF-8 with a byte order mark.
pub fn write_ass_file(path: &Path, content: &str) -> Result<()> {
    let mut bytes = Vec::with_capacity(content.len() + 3);
    bytes.extend_from_slice("\u{feff}".as_bytes());
    bytes.extend_from_slice(content.as_bytes());
    fs::write(path, bytes)
        .with_context(|| format!("Failed to write subtitle file to {}", path.display()))
}

/// A fixed nine-comment track for checking overlay placement on a real video.
///
/// Comments start every half second from 1s, each visible for nine seconds,
/// rotating over three heights. The sample always uses a 36px font and puts
/// the separator after the style switch.
pub fn distribution_sample(config: &LayoutConfig) -> String {
    const HEIGHTS: [i64; 3] = [800, 850, 900];
    const FONT_SIZE: u32 = 36;

    let styles = OverlayStyles {
        body: AssStyle::body(&config.body_style, FONT_SIZE),
        author: AssStyle::author(&config.author_style, FONT_SIZE),
    };
    let mut output = String::new();
    write_header(
        &mut output,
        &styles,
        (config.frame_width, config.frame_height),
    );

    for i in 0..9 {
        let start = 1.0 + i as f64 * 0.5;
        let path = MovePath {
            from_x: config.entry_x(),
            to_x: config.exit_x_px,
            y: HEIGHTS[i % HEIGHTS.len()],
        };
        let n = i + 1;
        let text = format!(
            "{}{{\\r{}}}Test user {n}{{\\r{}}}: Sample comment {n}",
            path.to_override(),
            config.author_style,
            config.body_style,
        );
        write_dialogue(
            &mut output,
            &format_timestamp(start),
            &format_timestamp(start + 9.0),
            &styles.body.name,
            &text,
        );
    }

    output
}
