//! Windowed density smoothing.
//!
//! Comments are bucketed into fixed-length windows. A window holding more
//! comments per second than the tracks can absorb gets its start times spread
//! evenly over the whole window; quieter windows keep their original times.
//! Windows never borrow time from their neighbours.

use std::collections::BTreeMap;

use serde::Serialize;

use super::comment::Comment;

/// A comment with the start time the rest of the pipeline uses.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedComment {
    pub comment: Comment,
    pub window_index: i64,
    pub adjusted_timestamp: f64,
}

/// Comments sharing `floor(timestamp / window_length)`, ordered by original timestamp.
#[derive(Debug, Clone)]
pub struct TemporalWindow {
    pub index: i64,
    pub comments: Vec<Comment>,
}

impl TemporalWindow {
    pub fn start(&self, window_length: f64) -> f64 {
        self.index as f64 * window_length
    }

    pub fn density(&self, window_length: f64) -> f64 {
        self.comments.len() as f64 / window_length
    }

    fn redistribute(
        self,
        window_length: f64,
        threshold: f64,
    ) -> (WindowSummary, Vec<SmoothedComment>) {
        let count = self.comments.len();
        let density = self.density(window_length);
        let overloaded = density > threshold;
        let start = self.start(window_length);
        let step = window_length / count as f64;
        let index = self.index;

        let smoothed = self
            .comments
            .into_iter()
            .enumerate()
            .map(|(i, comment)| {
                let adjusted_timestamp = if overloaded {
                    start + i as f64 * step
                } else {
                    comment.timestamp
                };
                SmoothedComment {
                    comment,
                    window_index: index,
                    adjusted_timestamp,
                }
            })
            .collect();

        let summary = WindowSummary {
            index,
            count,
            density,
            overloaded,
        };
        (summary, smoothed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSummary {
    pub index: i64,
    pub count: usize,
    pub density: f64,
    pub overloaded: bool,
}

pub fn window_index(timestamp: f64, window_length: f64) -> i64 {
    (timestamp / window_length).floor() as i64
}

/// Group comments into windows in ascending index order.
pub fn partition(mut comments: Vec<Comment>, window_length: f64) -> Vec<TemporalWindow> {
    comments.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

    let mut buckets: BTreeMap<i64, Vec<Comment>> = BTreeMap::new();
    for comment in comments {
        buckets
            .entry(window_index(comment.timestamp, window_length))
            .or_default()
            .push(comment);
    }

    buckets
        .into_iter()
        .map(|(index, comments)| TemporalWindow { index, comments })
        .collect()
}

/// Assign adjusted start times and return the comments sorted by them.
///
/// `threshold` is in comments per second; windows strictly above it are spread out.
pub fn smooth(
    comments: Vec<Comment>,
    window_length: f64,
    threshold: f64,
) -> (Vec<SmoothedComment>, Vec<WindowSummary>) {
    let mut summaries = Vec::new();
    let mut processed = Vec::with_capacity(comments.len());

    for window in partition(comments, window_length) {
        if window.comments.is_empty() {
            continue;
        }
        let (summary, smoothed) = window.redistribute(window_length, threshold);
        summaries.push(summary);
        processed.extend(smoothed);
    }

    processed.sort_by(|a, b| a.adjusted_timestamp.total_cmp(&b.adjusted_timestamp));
    (processed, summaries)
}
