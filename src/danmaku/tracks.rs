//! Round-robin track allocation.
//!
//! Tracks are horizontal bands stacked downward from a base offset. Each
//! comment takes the next track in rotation regardless of how long it stays
//! on screen, so two comments on one track can still overlap; the smoother is
//! what keeps that rare.

use std::fmt;
use std::num::NonZeroUsize;

use super::error::{LayoutError, Result};
use super::smoothing::SmoothedComment;

/// Number of tracks in a run. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackCount(NonZeroUsize);

impl TrackCount {
    pub fn new(count: usize) -> Result<Self> {
        NonZeroUsize::new(count).map(Self).ok_or_else(|| {
            LayoutError::InvalidConfiguration("track_count must be at least 1".to_string())
        })
    }

    pub fn get(self) -> usize {
        self.0.get()
    }

    #[cfg(test)]
    pub fn index(self, value: usize) -> Option<TrackIndex> {
        (value < self.get()).then_some(TrackIndex(value))
    }

    /// Width of the band that overflowing tracks are folded into.
    fn fold_width(self) -> usize {
        (self.get() / 2).max(1)
    }
}

/// A track number that is known to be below its run's [`TrackCount`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackIndex(usize);

impl TrackIndex {
    pub const FIRST: TrackIndex = TrackIndex(0);

    pub fn get(self) -> usize {
        self.0
    }

    /// The following track, wrapping back to the first after the last one.
    pub fn advance(self, count: TrackCount) -> TrackIndex {
        TrackIndex((self.0 + 1) % count.get())
    }
}

impl fmt::Display for TrackIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rotation cursor and usage counters for one run.
#[derive(Debug, Clone)]
pub struct TrackState {
    count: TrackCount,
    cursor: TrackIndex,
    usage: Vec<usize>,
}

impl TrackState {
    pub fn new(count: TrackCount) -> Self {
        Self {
            count,
            cursor: TrackIndex::FIRST,
            usage: vec![0; count.get()],
        }
    }

    pub fn count(&self) -> TrackCount {
        self.count
    }

    #[cfg(test)]
    pub fn cursor(&self) -> TrackIndex {
        self.cursor
    }

    /// Hand out the track under the cursor and rotate.
    pub fn assign(&mut self) -> TrackIndex {
        let track = self.cursor;
        self.usage[track.get()] += 1;
        self.cursor = track.advance(self.count);
        track
    }

    #[cfg(test)]
    pub fn usage(&self) -> &[usize] {
        &self.usage
    }

    pub fn into_usage(self) -> Vec<usize> {
        self.usage
    }
}

/// Pixel geometry of the track stack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalLayout {
    pub base_offset: f64,
    pub spacing: f64,
    pub max_offset: f64,
}

impl VerticalLayout {
    /// Vertical pixel offset of `track`.
    ///
    /// Tracks that would land below `max_offset` are folded onto the upper
    /// half of the stack. Distinct tracks may fold onto the same offset.
    pub fn offset_for(&self, track: TrackIndex, count: TrackCount) -> f64 {
        let offset = self.base_offset + track.get() as f64 * self.spacing;
        if offset > self.max_offset {
            let folded = track.get() % count.fold_width();
            self.base_offset + folded as f64 * self.spacing
        } else {
            offset
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedComment {
    pub smoothed: SmoothedComment,
    pub track: TrackIndex,
    /// Whole pixels; fractional offsets are truncated.
    pub vertical_offset: i64,
}

/// Place every comment on a track, in the order given.
pub fn allocate(
    comments: Vec<SmoothedComment>,
    state: &mut TrackState,
    layout: &VerticalLayout,
) -> Vec<PlacedComment> {
    comments
        .into_iter()
        .map(|smoothed| {
            let track = state.assign();
            let offset = layout.offset_for(track, state.count());
            PlacedComment {
                smoothed,
                track,
                vertical_offset: offset.trunc() as i64,
            }
        })
        .collect()
}
