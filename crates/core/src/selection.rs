//! Selection state: which slices the user has chosen.
//!
//! The selection stores slice ids, never references, so it is independent of
//! any particular slice array. Full slices are resolved on demand through the
//! dataset.

use std::collections::BTreeSet;

use serde::Serialize;
use tracepick_protocol::{Dataset, Slice, SliceId, TimeRange};

use crate::query::ViewportQuery;
use crate::visibility::TrackVisibility;

/// The set of selected slice ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<SliceId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the id was not already selected.
    pub fn add(&mut self, id: SliceId) -> bool {
        self.ids.insert(id)
    }

    /// Returns `true` if the id was selected.
    pub fn remove(&mut self, id: SliceId) -> bool {
        self.ids.remove(&id)
    }

    /// Flip membership. Returns `true` if the id is now selected.
    pub fn toggle(&mut self, id: SliceId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Replace the whole selection, as rectangle drags and "select all
    /// visible" do.
    pub fn replace(&mut self, ids: impl IntoIterator<Item = SliceId>) {
        self.ids = ids.into_iter().collect();
    }

    pub fn extend(&mut self, ids: impl IntoIterator<Item = SliceId>) {
        self.ids.extend(ids);
    }

    pub fn contains(&self, id: SliceId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = SliceId> + '_ {
        self.ids.iter().copied()
    }

    /// The selected slices, in id order. Ids the dataset cannot resolve are
    /// skipped.
    pub fn slices<'a>(&self, dataset: &'a Dataset) -> Vec<&'a Slice> {
        self.ids.iter().filter_map(|&id| dataset.slice(id)).collect()
    }

    /// The selected slices minus those on hidden tracks.
    ///
    /// Hiding a track does not deselect its slices: they stay in the set and
    /// reappear here once the track is shown again.
    pub fn for_export<'a>(
        &self,
        dataset: &'a Dataset,
        visibility: &TrackVisibility,
    ) -> Vec<&'a Slice> {
        self.ids
            .iter()
            .filter_map(|&id| dataset.slice(id))
            .filter(|s| !visibility.is_hidden(s.track_id))
            .collect()
    }

    pub fn stats(&self, dataset: &Dataset) -> SelectionStats {
        SelectionStats::from_slices(&self.slices(dataset))
    }

    /// Select every slice on a visible track that overlaps `window`,
    /// discarding the previous selection. Returns the new selection size.
    pub fn select_all_visible(&mut self, query: &ViewportQuery<'_>, window: TimeRange) -> usize {
        self.replace(
            query
                .visible_in_window(window.start, window.end)
                .into_iter()
                .map(|s| s.id),
        );
        self.len()
    }
}

/// Aggregates over a slice list. Every field is zero for an empty list.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SelectionStats {
    pub count: usize,
    /// Sum of slice durations. Nested slices count in full.
    pub total_duration: f64,
    /// From the earliest start to the latest end.
    pub span: TimeRange,
}

impl SelectionStats {
    pub fn from_slices(slices: &[&Slice]) -> Self {
        let Some(first) = slices.first() else {
            return Self::default();
        };
        let mut span = TimeRange::new(first.start, first.end);
        let mut total_duration = 0.0;
        for slice in slices {
            total_duration += slice.duration();
            span.start = span.start.min(slice.start);
            span.end = span.end.max(slice.end);
        }
        Self {
            count: slices.len(),
            total_duration,
            span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RawEvent, RawTrace, ThreadKey, build_dataset};
    use tracepick_protocol::{Args, SourceFormat};

    fn complete(tid: u64, ts: f64, dur: f64, name: &str) -> RawEvent {
        RawEvent::Complete {
            thread: ThreadKey::new(1, tid),
            ts,
            dur,
            name: name.into(),
            category: None,
            args: Args::new(),
        }
    }

    fn dataset() -> Dataset {
        let mut trace = RawTrace::new(SourceFormat::ChromeJson);
        trace.events = vec![
            complete(1, 0.0, 10.0, "a"),
            complete(1, 20.0, 5.0, "b"),
            complete(2, 4.0, 30.0, "c"),
        ];
        build_dataset(trace)
    }

    #[test]
    fn add_remove_toggle() {
        let mut s = Selection::new();
        assert!(s.add(1));
        assert!(!s.add(1));
        assert!(s.contains(1));
        assert!(!s.toggle(1));
        assert!(s.is_empty());
        assert!(s.toggle(2));
        assert!(s.remove(2));
        assert!(!s.remove(2));
    }

    #[test]
    fn replace_discards_previous() {
        let mut s = Selection::new();
        s.extend([1, 2, 3]);
        s.replace([7]);
        assert_eq!(s.ids().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn hidden_track_slices_stay_selected_but_leave_export() {
        let d = dataset();
        let worker_slice = d.tracks[1].slices[0].id;
        let mut s = Selection::new();
        s.extend([0, worker_slice]);

        let mut visibility = TrackVisibility::new();
        visibility.hide(1);
        assert_eq!(s.slices(&d).len(), 2);
        let exported: Vec<_> = s.for_export(&d, &visibility).iter().map(|x| x.id).collect();
        assert_eq!(exported, vec![0]);

        visibility.show(1);
        assert_eq!(s.for_export(&d, &visibility).len(), 2);
    }

    #[test]
    fn stale_ids_are_skipped() {
        let d = dataset();
        let mut s = Selection::new();
        s.extend([0, 999]);
        assert_eq!(s.slices(&d).len(), 1);
    }

    #[test]
    fn stats_over_selection() {
        let d = dataset();
        let mut s = Selection::new();
        s.extend(d.all_slices().map(|x| x.id));
        let stats = s.stats(&d);
        assert_eq!(stats.count, 3);
        assert_eq!(stats.total_duration, 45.0);
        assert_eq!(stats.span, TimeRange::new(0.0, 34.0));
    }

    #[test]
    fn empty_stats_are_zero() {
        let stats = SelectionStats::from_slices(&[]);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.total_duration, 0.0);
        assert_eq!(stats.span, TimeRange::new(0.0, 0.0));
        assert!(!stats.span.duration().is_nan());
    }
}
