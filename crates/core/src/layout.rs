use tracepick_protocol::{Dataset, TrackId};

use crate::config::ViewConfig;
use crate::visibility::TrackVisibility;

/// Vertical placement of one visible track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackExtent {
    pub track_id: TrackId,
    /// Top of the header strip.
    pub top: f64,
    /// Top of lane 0.
    pub lanes_top: f64,
    /// Bottom of the deepest lane.
    pub bottom: f64,
    pub max_depth: u32,
}

impl TrackExtent {
    /// Lane occupying `y`, if `y` falls inside the lane area.
    pub fn lane_at(&self, y: f64, row_height: f64) -> Option<u32> {
        if !y.is_finite() || y < self.lanes_top || y >= self.bottom {
            return None;
        }
        let lane = ((y - self.lanes_top) / row_height).floor() as u32;
        (lane < self.max_depth).then_some(lane)
    }

    /// `[top, bottom)` of one lane.
    pub fn lane_span(&self, depth: u32, row_height: f64) -> (f64, f64) {
        let top = self.lanes_top + f64::from(depth) * row_height;
        (top, top + row_height)
    }
}

/// Stacked vertical layout of the visible tracks, top to bottom.
///
/// Hidden tracks take no space, so nothing positional can ever resolve to
/// them.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackLayout {
    extents: Vec<TrackExtent>,
    row_height: f64,
}

impl TrackLayout {
    pub fn compute(dataset: &Dataset, visibility: &TrackVisibility, config: &ViewConfig) -> Self {
        let mut extents = Vec::with_capacity(dataset.tracks.len());
        let mut y = 0.0;
        for track in visibility.visible_tracks(dataset) {
            let lanes_top = y + config.track_header_height;
            let bottom = lanes_top + f64::from(track.max_depth) * config.row_height;
            extents.push(TrackExtent {
                track_id: track.id,
                top: y,
                lanes_top,
                bottom,
                max_depth: track.max_depth,
            });
            y = bottom + config.track_gap;
        }
        Self {
            extents,
            row_height: config.row_height,
        }
    }

    pub fn extents(&self) -> &[TrackExtent] {
        &self.extents
    }

    pub fn row_height(&self) -> f64 {
        self.row_height
    }

    pub fn total_height(&self) -> f64 {
        self.extents.last().map_or(0.0, |e| e.bottom)
    }

    pub fn extent(&self, track_id: TrackId) -> Option<&TrackExtent> {
        self.extents
            .binary_search_by_key(&track_id, |e| e.track_id)
            .ok()
            .map(|i| &self.extents[i])
    }

    /// The track and lane under `y`, if any.
    pub fn lane_at(&self, y: f64) -> Option<(TrackId, u32)> {
        if !y.is_finite() {
            return None;
        }
        let idx = self.extents.partition_point(|e| e.bottom <= y);
        let extent = self.extents.get(idx)?;
        extent
            .lane_at(y, self.row_height)
            .map(|lane| (extent.track_id, lane))
    }

    /// Tracks whose vertical extent intersects `[y0, y1]`.
    pub fn intersecting(&self, y0: f64, y1: f64) -> &[TrackExtent] {
        let (y0, y1) = if y0 <= y1 { (y0, y1) } else { (y1, y0) };
        let lo = self.extents.partition_point(|e| e.bottom <= y0);
        let hi = lo + self.extents[lo..].partition_point(|e| e.top <= y1);
        &self.extents[lo..hi]
    }
}
