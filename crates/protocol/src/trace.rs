use std::cmp::Ordering;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Dataset-unique slice identifier. Stable for the dataset's lifetime.
pub type SliceId = u64;

/// Track identifier. Equals the track's position in `Dataset::tracks`.
pub type TrackId = u32;

/// Auxiliary key/value metadata attached by the producing event, in producer order.
pub type Args = serde_json::Map<String, serde_json::Value>;

/// A closed time interval in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// The input syntax a dataset was decoded from. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceFormat {
    /// Chrome trace event JSON (array or `traceEvents` object).
    ChromeJson,
    /// ftrace/systrace text with `tracing_mark_write` markers.
    Systrace,
    /// Generated demonstration data.
    Synthetic,
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ChromeJson => write!(f, "Chrome JSON"),
            Self::Systrace => write!(f, "Systrace"),
            Self::Synthetic => write!(f, "Synthetic"),
        }
    }
}

/// One timed execution interval on a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slice {
    pub id: SliceId,
    /// Owning track; resolve with `Dataset::track`.
    pub track_id: TrackId,
    pub name: String,
    pub category: Option<String>,
    /// Start time in microseconds.
    pub start: f64,
    /// End time in microseconds, `>= start`.
    pub end: f64,
    /// Lane index among overlapping slices on the same track.
    pub depth: u32,
    /// Display grouping derived from the category (or name). Not semantic.
    pub color_class: u32,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub args: Args,
}

impl Slice {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Half-open overlap: slices that merely touch do not overlap.
    pub fn overlaps(&self, other: &Slice) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether `time` falls within `[start, end]`.
    pub fn contains_time(&self, time: f64) -> bool {
        self.start <= time && time <= self.end
    }

    /// The key used for color grouping: category if present, else name.
    pub fn grouping_key(&self) -> &str {
        self.category.as_deref().unwrap_or(&self.name)
    }

    /// Track order: start ascending, then longer slices first so a parent
    /// sharing its child's start sorts ahead of the child.
    pub fn timeline_cmp(&self, other: &Slice) -> Ordering {
        self.start
            .total_cmp(&other.start)
            .then_with(|| other.duration().total_cmp(&self.duration()))
    }
}

/// One timeline lane grouping, typically one thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    /// Thread name ("Thread {tid}" when the trace does not name it).
    pub name: String,
    /// Grouping label ("Process {pid}" when the trace does not name it).
    pub process_name: String,
    pub pid: u64,
    pub tid: u64,
    /// Explicit ordering hint from the trace (`thread_sort_index`).
    #[serde(default)]
    pub sort_index: i64,
    /// Id of `slices[0]`; slice ids on a track are contiguous.
    #[serde(default)]
    pub first_slice_id: SliceId,
    /// Sorted by `Slice::timeline_cmp`.
    pub slices: Vec<Slice>,
    /// One more than the deepest lane used; at least 1.
    pub max_depth: u32,
    /// Longest slice duration on the track; bounds viewport culling.
    pub max_item_duration: f64,
}

impl Track {
    pub fn new(id: TrackId, pid: u64, tid: u64, name: String, process_name: String) -> Self {
        Self {
            id,
            name,
            process_name,
            pid,
            tid,
            sort_index: 0,
            first_slice_id: 0,
            slices: Vec::new(),
            max_depth: 1,
            max_item_duration: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// The id range covered by this track's slices.
    pub fn slice_ids(&self) -> Range<SliceId> {
        self.first_slice_id..self.first_slice_id + self.slices.len() as u64
    }

    /// Recompute `max_depth` and `max_item_duration` from the current slices.
    /// Must run after any slice is added, removed, or mutated.
    pub fn refresh_stats(&mut self) {
        self.max_item_duration = self
            .slices
            .iter()
            .map(Slice::duration)
            .fold(0.0, f64::max);
        self.max_depth = self
            .slices
            .iter()
            .map(|s| s.depth + 1)
            .max()
            .unwrap_or(1)
            .max(1);
    }

    /// Whether `slices` honours the start-ascending, duration-descending order.
    pub fn is_sorted(&self) -> bool {
        self.slices
            .windows(2)
            .all(|w| w[0].timeline_cmp(&w[1]) != Ordering::Greater)
    }

    /// Human-readable label, e.g. "RenderThread (Process 12)".
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.process_name)
    }
}

/// All tracks of one loaded trace plus its global time bounds.
///
/// The dataset owns every slice and track. Queries and selection refer back
/// into it by id only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Indexed by `TrackId`.
    pub tracks: Vec<Track>,
    /// Spans every slice's `[start, end]`.
    pub time_range: TimeRange,
    /// Absolute timestamp (µs, source clock) that became time zero.
    #[serde(default)]
    pub time_origin: f64,
    /// Free-form metadata captured from non-slice events.
    #[serde(default)]
    pub metadata: Args,
    pub source_format: SourceFormat,
}

impl Dataset {
    pub fn empty(source_format: SourceFormat) -> Self {
        Self {
            tracks: Vec::new(),
            time_range: TimeRange::default(),
            time_origin: 0.0,
            metadata: Args::new(),
            source_format,
        }
    }

    pub fn duration(&self) -> f64 {
        self.time_range.duration()
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(id as usize).filter(|t| t.id == id)
    }

    /// Resolve a slice id. Ids are contiguous per track and tracks are laid
    /// out in id order, so this is a binary search over tracks.
    pub fn slice(&self, id: SliceId) -> Option<&Slice> {
        let idx = self.tracks.partition_point(|t| t.slice_ids().end <= id);
        let track = self.tracks.get(idx)?;
        let offset = id.checked_sub(track.first_slice_id)?;
        track.slices.get(usize::try_from(offset).ok()?)
    }

    pub fn all_slices(&self) -> impl Iterator<Item = &Slice> {
        self.tracks.iter().flat_map(|t| &t.slices)
    }

    pub fn slice_count(&self) -> usize {
        self.tracks.iter().map(Track::len).sum()
    }

    /// Recompute `time_range` from the slices. Empty datasets get `{0, 0}`.
    pub fn recompute_time_range(&mut self) {
        let start = self.all_slices().map(|s| s.start).fold(f64::INFINITY, f64::min);
        let end = self
            .all_slices()
            .map(|s| s.end)
            .fold(f64::NEG_INFINITY, f64::max);
        self.time_range = if start.is_finite() && end.is_finite() {
            TimeRange::new(start, end)
        } else {
            TimeRange::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slice(id: SliceId, track_id: TrackId, start: f64, end: f64) -> Slice {
        Slice {
            id,
            track_id,
            name: format!("s{id}"),
            category: None,
            start,
            end,
            depth: 0,
            color_class: 0,
            args: Args::new(),
        }
    }

    fn sample_dataset() -> Dataset {
        let mut main = Track::new(0, 1, 1, "Main".into(), "Browser".into());
        main.slices = vec![slice(0, 0, 0.0, 100.0), slice(1, 0, 10.0, 70.0)];
        let empty = Track {
            first_slice_id: 2,
            ..Track::new(1, 1, 2, "Idle".into(), "Browser".into())
        };
        let mut worker = Track::new(2, 1, 3, "Worker".into(), "Browser".into());
        worker.first_slice_id = 2;
        worker.slices = vec![slice(2, 2, 20.0, 50.0)];

        let mut dataset = Dataset::empty(SourceFormat::ChromeJson);
        dataset.tracks = vec![main, empty, worker];
        dataset.recompute_time_range();
        dataset
    }

    #[test]
    fn slice_lookup_by_id() {
        let d = sample_dataset();
        assert_eq!(d.slice(0).map(|s| s.name.as_str()), Some("s0"));
        assert_eq!(d.slice(1).map(|s| s.name.as_str()), Some("s1"));
        assert_eq!(d.slice(2).map(|s| s.track_id), Some(2));
        assert!(d.slice(3).is_none());
    }

    #[test]
    fn track_lookup_by_id() {
        let d = sample_dataset();
        assert_eq!(d.track(1).map(|t| t.name.as_str()), Some("Idle"));
        assert!(d.track(7).is_none());
    }

    #[test]
    fn time_range_spans_all_slices() {
        let d = sample_dataset();
        assert_eq!(d.time_range, TimeRange::new(0.0, 100.0));
        assert_eq!(d.slice_count(), 3);
        assert!(Dataset::empty(SourceFormat::Synthetic).time_range == TimeRange::default());
    }

    #[test]
    fn refresh_stats_on_empty_track() {
        let mut t = Track::new(0, 0, 0, "t".into(), "p".into());
        t.max_depth = 0;
        t.refresh_stats();
        assert_eq!(t.max_depth, 1);
        assert_eq!(t.max_item_duration, 0.0);
    }

    #[test]
    fn timeline_order_puts_longer_first_on_ties() {
        let parent = slice(0, 0, 5.0, 50.0);
        let child = slice(1, 0, 5.0, 10.0);
        assert_eq!(parent.timeline_cmp(&child), Ordering::Less);
        assert_eq!(child.timeline_cmp(&parent), Ordering::Greater);
    }

    #[test]
    fn touching_slices_do_not_overlap() {
        let a = slice(0, 0, 0.0, 10.0);
        let b = slice(1, 0, 10.0, 20.0);
        assert!(!a.overlaps(&b));
        assert!(a.contains_time(10.0) && b.contains_time(10.0));
    }

    #[test]
    fn serialization_keeps_args_order() {
        let mut s = slice(0, 0, 0.0, 1.0);
        s.args.insert("zeta".into(), serde_json::json!(1));
        s.args.insert("alpha".into(), serde_json::json!("x"));
        let json = serde_json::to_string(&s).unwrap_or_default();
        let zeta = json.find("zeta").unwrap_or(usize::MAX);
        let alpha = json.find("alpha").unwrap_or(0);
        assert!(zeta < alpha);
    }
}
