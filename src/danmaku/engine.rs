use serde::Serialize;

use super::comment::{Comment, RawRecord, normalize_record};
use super::config::LayoutConfig;
use super::emitter::{OverlayEvent, emit_events};
use super::error::{LayoutError, Result};
use super::smoothing::{WindowSummary, smooth};
use super::tracks::{TrackCount, TrackState, VerticalLayout, allocate};

/// Counts and summaries for one run, for the caller to report however it likes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub records_total: usize,
    pub records_accepted: usize,
    pub skipped_malformed: usize,
    pub skipped_empty: usize,
    pub first_timestamp: Option<f64>,
    pub last_timestamp: Option<f64>,
    /// Accepted comments per second over the whole span (span floored at one second).
    pub overall_density: f64,
    pub windows: Vec<WindowSummary>,
    pub track_usage: Vec<usize>,
    /// Events whose start time was below zero and will be written as `0:00:00.00`.
    pub clamped_starts: usize,
}

impl RunReport {
    pub fn skipped(&self) -> usize {
        self.skipped_malformed + self.skipped_empty
    }

    pub fn span(&self) -> f64 {
        match (self.first_timestamp, self.last_timestamp) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }

    pub fn overloaded_windows(&self) -> impl Iterator<Item = &WindowSummary> {
        self.windows.iter().filter(|w| w.overloaded)
    }
}

#[derive(Debug, Clone)]
pub struct LayoutRun {
    pub events: Vec<OverlayEvent>,
    pub report: RunReport,
}

/// Comment-to-overlay layout pipeline with a validated configuration.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    config: LayoutConfig,
    track_count: TrackCount,
    layout: VerticalLayout,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Result<Self> {
        config.validate()?;
        let track_count = TrackCount::new(config.track_count)?;
        let layout = VerticalLayout {
            base_offset: config.base_offset(),
            spacing: config.track_spacing_px as f64,
            max_offset: config.max_offset(),
        };
        Ok(Self {
            config,
            track_count,
            layout,
        })
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Normalize, smooth, allocate and emit. Deterministic for a given input and config.
    pub fn run(&self, records: &[RawRecord]) -> LayoutRun {
        let mut report = RunReport {
            records_total: records.len(),
            ..RunReport::default()
        };

        let comments = self.normalize(records, &mut report);
        report.records_accepted = comments.len();

        let (smoothed, windows) = smooth(
            comments,
            self.config.window_length_seconds,
            self.config.density_threshold(),
        );
        report.windows = windows;

        let mut state = TrackState::new(self.track_count);
        let placed = allocate(smoothed, &mut state, &self.layout);
        report.track_usage = state.into_usage();

        let events = emit_events(placed, &self.config);
        report.clamped_starts = events.iter().filter(|e| e.start_time < 0.0).count();

        LayoutRun { events, report }
    }

    fn normalize(&self, records: &[RawRecord], report: &mut RunReport) -> Vec<Comment> {
        let mut comments = Vec::with_capacity(records.len());
        for record in records {
            match normalize_record(record, &self.config.default_author) {
                Ok(comment) => comments.push(comment),
                Err(err) => {
                    debug_assert!(
                        err.is_recoverable(),
                        "unexpected run-level error for a record: {err}"
                    );
                    if err == LayoutError::EmptyContent {
                        report.skipped_empty += 1;
                    } else {
                        report.skipped_malformed += 1;
                    }
                }
            }
        }

        let first = comments.iter().map(|c| c.timestamp).min_by(f64::total_cmp);
        let last = comments.iter().map(|c| c.timestamp).max_by(f64::total_cmp);
        report.first_timestamp = first;
        report.last_timestamp = last;
        if let (Some(first), Some(last)) = (first, last) {
            report.overall_density = comments.len() as f64 / (last - first).max(1.0);
        }

        comments
    }
}
