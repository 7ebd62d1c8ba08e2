//! Overlay event construction: duration, movement path, styled text and time codes.

use serde::Serialize;

use super::config::LayoutConfig;
use super::tracks::{PlacedComment, TrackIndex};

/// Horizontal traversal at a fixed height. Endpoints never depend on text length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MovePath {
    pub from_x: i64,
    pub to_x: i64,
    pub y: i64,
}

impl MovePath {
    pub fn to_override(self) -> String {
        format!(
            "{{\\move({},{},{},{})}}",
            self.from_x, self.y, self.to_x, self.y
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayEvent {
    pub start_time: f64,
    pub end_time: f64,
    #[serde(serialize_with = "serialize_track")]
    pub track: TrackIndex,
    pub vertical_offset: i64,
    pub path: MovePath,
    pub author: String,
    pub body: String,
    /// Override blocks plus text, ready for the Text field of a Dialogue line.
    pub markup: String,
}

fn serialize_track<S: serde::Serializer>(track: &TrackIndex, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(track.get() as u64)
}

impl OverlayEvent {
    #[cfg(test)]
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn start_code(&self) -> String {
        format_timestamp(self.start_time)
    }

    pub fn end_code(&self) -> String {
        format_timestamp(self.end_time)
    }
}

/// Seconds a comment with `text_len` characters stays on screen.
///
/// Longer text scrolls slower, within `[min, max]`, and every comment then gets
/// the same fixed extension on top.
pub fn display_duration(text_len: usize, config: &LayoutConfig) -> f64 {
    let raw = config.base_display_duration + text_len as f64 * config.length_factor;
    raw.max(config.min_display_duration)
        .min(config.max_display_duration)
        + config.duration_extension_constant
}

/// Author and body in their own styles, author first.
pub fn styled_text(author: &str, body: &str, author_style: &str, body_style: &str) -> String {
    format!("{{\\r{author_style}}}{author}: {{\\r{body_style}}}{body}")
}

/// Format seconds as an ASS time code `H:MM:SS.CC`.
///
/// The hour field grows as needed. Centiseconds are truncated after rounding to
/// whole microseconds, so float noise such as `0.29 * 100 = 28.999…` still yields
/// `.29`. Negative input is clamped to zero since ASS has no negative times.
pub fn format_timestamp(seconds: f64) -> String {
    let micros = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1_000_000.0).round() as u64
    } else {
        0
    };
    let total_secs = micros / 1_000_000;
    let centis = (micros % 1_000_000) / 10_000;

    format!(
        "{}:{:02}:{:02}.{:02}",
        total_secs / 3600,
        (total_secs % 3600) / 60,
        total_secs % 60,
        centis
    )
}

pub fn emit_event(placed: PlacedComment, config: &LayoutConfig) -> OverlayEvent {
    let PlacedComment {
        smoothed,
        track,
        vertical_offset,
    } = placed;
    let comment = smoothed.comment;

    let start_time = smoothed.adjusted_timestamp;
    let end_time = start_time + display_duration(comment.text_len(), config);
    let path = MovePath {
        from_x: config.entry_x(),
        to_x: config.exit_x_px,
        y: vertical_offset,
    };

    let mut markup = path.to_override();
    markup.push_str(&styled_text(
        &comment.author,
        &comment.body,
        &config.author_style,
        &config.body_style,
    ));

    OverlayEvent {
        start_time,
        end_time,
        track,
        vertical_offset,
        path,
        author: comment.author,
        body: comment.body,
        markup,
    }
}

/// One event per placed comment, in input order.
pub fn emit_events(placed: Vec<PlacedComment>, config: &LayoutConfig) -> Vec<OverlayEvent> {
    placed
        .into_iter()
        .map(|p| emit_event(p, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::danmaku::comment::Comment;
    use crate::danmaku::smoothing::SmoothedComment;
    use crate::danmaku::tracks::TrackCount;

    fn placed(t: f64, author: &str, body: &str, track: usize, y: i64) -> PlacedComment {
        PlacedComment {
            smoothed: SmoothedComment {
                comment: Comment {
                    timestamp: t,
                    author: author.to_string(),
                    body: body.to_string(),
                },
                window_index: 0,
                adjusted_timestamp: t,
            },
            track: TrackCount::new(20).unwrap().index(track).unwrap(),
            vertical_offset: y,
        }
    }

    #[test]
    fn duration_stays_within_bounds() {
        let config = LayoutConfig::default();
        assert_eq!(display_duration(0, &config), 20.0);
        assert_eq!(display_duration(10, &config), 21.0);
        assert_eq!(display_duration(70, &config), 27.0);
        assert_eq!(display_duration(10_000, &config), 27.0);
        for len in 0..200 {
            let d = display_duration(len, &config);
            assert!((18.0..=27.0).contains(&d), "len {len} -> {d}");
        }
    }

    #[test]
    fn lower_clamp_applies_when_base_is_short() {
        let config = LayoutConfig {
            base_display_duration: 2.0,
            ..LayoutConfig::default()
        };
        assert_eq!(display_duration(0, &config), 18.0);
    }

    #[test]
    fn formats_time_codes() {
        assert_eq!(format_timestamp(0.0), "0:00:00.00");
        assert_eq!(format_timestamp(1.5), "0:00:01.50");
        assert_eq!(format_timestamp(61.0), "0:01:01.00");
        assert_eq!(format_timestamp(3661.0), "1:01:01.00");
        assert_eq!(format_timestamp(0.29), "0:00:00.29");
        assert_eq!(format_timestamp(0.16), "0:00:00.16");
    }

    #[test]
    fn truncates_centiseconds() {
        assert_eq!(format_timestamp(0.125), "0:00:00.12");
        assert_eq!(format_timestamp(59.999), "0:00:59.99");
    }

    #[test]
    fn long_and_negative_times() {
        assert_eq!(format_timestamp(10.0 * 3600.0 + 5.0), "10:00:05.00");
        assert_eq!(format_timestamp(30.0 * 3600.0), "30:00:00.00");
        assert_eq!(format_timestamp(-3.0), "0:00:00.00");
    }

    #[test]
    fn builds_move_and_styles() {
        let config = LayoutConfig::default();
        let event = emit_event(placed(1.5, "alice", "hi there", 3, 992), &config);

        assert_eq!(event.start_time, 1.5);
        assert!((event.duration() - 21.3).abs() < 1e-9);
        assert_eq!(event.track.get(), 3);
        assert_eq!(
            event.markup,
            r"{\move(920,992,-1000,992)}{\rUsername}alice: {\rDefault}hi there"
        );
        assert_eq!(event.start_code(), "0:00:01.50");
        assert_eq!(event.end_code(), "0:00:22.80");
    }

    #[test]
    fn path_ignores_text_length() {
        let config = LayoutConfig::default().with_frame(1920, 1080);
        let short = emit_event(placed(0.0, "a", "b", 0, 756), &config);
        let long = emit_event(placed(0.0, "a", &"b".repeat(300), 0, 756), &config);
        assert_eq!(short.path, long.path);
        assert_eq!(short.path.from_x, 2120);
        assert!(short.duration() < long.duration());
    }

    #[test]
    fn preserves_input_order() {
        let config = LayoutConfig::default();
        let events = emit_events(
            vec![
                placed(0.0, "a", "1", 0, 896),
                placed(0.0, "b", "2", 1, 928),
                placed(4.0, "c", "3", 2, 960),
            ],
            &config,
        );
        let authors: Vec<_> = events.iter().map(|e| e.author.as_str()).collect();
        assert_eq!(authors, vec!["a", "b", "c"]);
    }
}
