//! Viewport culling, point hit-testing and rectangle selection.
//!
//! Every query runs against a track's `slices`, which are sorted by start
//! time (longer first on ties). A slice overlapping `[ws, we]` must start at
//! or before `we`, and since no slice on the track is longer than
//! `max_item_duration`, it must start at or after `ws - max_item_duration`.
//! Two binary searches bound that start range and a linear pass drops the
//! candidates that ended before `ws`.
//!
//! Cost is `O(log n + m)` where `m` counts the candidates between the two
//! bounds, not the slices returned. When one slice is far longer than the
//! window (a trace-long root span, say) the lower bound reaches back over
//! many short slices that all get scanned and rejected, so the bound is only
//! amortized for such tracks.

use std::ops::Range;

use tracepick_protocol::{Dataset, Slice, Track, TrackId};

use crate::layout::TrackLayout;
use crate::visibility::TrackVisibility;

/// Index range of the slices on `track` that may overlap `[window_start, window_end]`.
pub fn candidate_range(track: &Track, window_start: f64, window_end: f64) -> Range<usize> {
    let slices = &track.slices;
    let lower = window_start - track.max_item_duration;
    let lo = slices.partition_point(|s| s.start < lower);
    let hi = lo + slices[lo..].partition_point(|s| s.start <= window_end);
    lo..hi
}

/// Slices with `end > window_start && start <= window_end`, in track order.
pub fn overlapping(
    track: &Track,
    window_start: f64,
    window_end: f64,
) -> impl Iterator<Item = &Slice> {
    track.slices[candidate_range(track, window_start, window_end)]
        .iter()
        .filter(move |s| s.end > window_start)
}

/// Every slice on `track` that can be visible in `[window_start, window_end]`.
/// Exact: equal to filtering every slice by the same predicate.
pub fn find_overlapping(track: &Track, window_start: f64, window_end: f64) -> Vec<&Slice> {
    overlapping(track, window_start, window_end).collect()
}

/// The topmost slice containing `time` (`start <= time <= end`).
///
/// With `lane = Some(d)` only slices at depth `d` qualify. Among candidates
/// the greatest depth wins; on equal depth the later-starting slice wins,
/// matching paint order.
///
/// The backward scan stops once slices start more than `max_item_duration`
/// before `time`, since none of them can reach it.
pub fn hit_test(track: &Track, time: f64, lane: Option<u32>) -> Option<&Slice> {
    let slices = &track.slices;
    let upper = slices.partition_point(|s| s.start <= time);
    let earliest_start = time - track.max_item_duration;

    let mut best: Option<&Slice> = None;
    for slice in slices[..upper].iter().rev() {
        if slice.start < earliest_start {
            break;
        }
        if slice.end < time {
            continue;
        }
        match lane {
            Some(depth) if slice.depth == depth => return Some(slice),
            Some(_) => continue,
            None => {
                if best.is_none_or(|b| slice.depth > b.depth) {
                    best = Some(slice);
                }
            }
        }
    }
    best
}

/// A drag rectangle in normalized time (x) and layout pixels (y).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRect {
    pub time_start: f64,
    pub time_end: f64,
    pub y_start: f64,
    pub y_end: f64,
}

impl SelectionRect {
    /// Build a rectangle from two drag corners in any order.
    pub fn from_corners(t0: f64, y0: f64, t1: f64, y1: f64) -> Self {
        Self {
            time_start: t0.min(t1),
            time_end: t0.max(t1),
            y_start: y0.min(y1),
            y_end: y0.max(y1),
        }
    }
}

/// Dataset-level queries that honour track visibility and vertical layout.
#[derive(Debug, Clone, Copy)]
pub struct ViewportQuery<'a> {
    dataset: &'a Dataset,
    visibility: &'a TrackVisibility,
    layout: &'a TrackLayout,
}

impl<'a> ViewportQuery<'a> {
    pub fn new(
        dataset: &'a Dataset,
        visibility: &'a TrackVisibility,
        layout: &'a TrackLayout,
    ) -> Self {
        Self {
            dataset,
            visibility,
            layout,
        }
    }

    fn visible_track(&self, track_id: TrackId) -> Option<&'a Track> {
        if self.visibility.is_hidden(track_id) {
            return None;
        }
        self.dataset.track(track_id)
    }

    /// Range cull on one track. Hidden or unknown tracks yield nothing.
    pub fn find_overlapping(
        &self,
        track_id: TrackId,
        window_start: f64,
        window_end: f64,
    ) -> Vec<&'a Slice> {
        self.visible_track(track_id)
            .map(|t| find_overlapping(t, window_start, window_end))
            .unwrap_or_default()
    }

    /// Point hit-test on one track.
    pub fn hit_test(&self, track_id: TrackId, time: f64, lane: Option<u32>) -> Option<&'a Slice> {
        hit_test(self.visible_track(track_id)?, time, lane)
    }

    /// Resolve a pointer position: `y` picks the track and lane through the
    /// layout, `time` picks the slice.
    pub fn slice_at(&self, time: f64, y: f64) -> Option<&'a Slice> {
        let (track_id, lane) = self.layout.lane_at(y)?;
        self.hit_test(track_id, time, Some(lane))
    }

    /// Slices whose lane row intersects the rectangle vertically and whose
    /// interval overlaps it with non-zero width.
    pub fn select_in_rect(&self, rect: &SelectionRect) -> Vec<&'a Slice> {
        let row_height = self.layout.row_height();
        let mut selected = Vec::new();
        for extent in self.layout.intersecting(rect.y_start, rect.y_end) {
            let Some(track) = self.visible_track(extent.track_id) else {
                continue;
            };
            for slice in overlapping(track, rect.time_start, rect.time_end) {
                let (lane_top, lane_bottom) = extent.lane_span(slice.depth, row_height);
                if lane_top >= rect.y_end || lane_bottom <= rect.y_start {
                    continue;
                }
                if rect.time_start.max(slice.start) < rect.time_end.min(slice.end) {
                    selected.push(slice);
                }
            }
        }
        selected
    }

    /// Every slice on every visible track overlapping the window.
    pub fn visible_in_window(&self, window_start: f64, window_end: f64) -> Vec<&'a Slice> {
        self.visibility
            .visible_tracks(self.dataset)
            .flat_map(|t| overlapping(t, window_start, window_end))
            .collect()
    }
}
