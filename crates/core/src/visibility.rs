use std::collections::BTreeSet;

use tracepick_protocol::{Dataset, Track, TrackId};

/// Which tracks the user has hidden.
///
/// Hidden tracks are skipped by every viewport query and by the export view
/// of the selection, but their slices stay selectable state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackVisibility {
    hidden: BTreeSet<TrackId>,
}

impl TrackVisibility {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_hidden(&self, id: TrackId) -> bool {
        self.hidden.contains(&id)
    }

    pub fn hide(&mut self, id: TrackId) -> bool {
        self.hidden.insert(id)
    }

    pub fn show(&mut self, id: TrackId) -> bool {
        self.hidden.remove(&id)
    }

    /// Flip a track's state. Returns `true` if the track is now hidden.
    pub fn toggle(&mut self, id: TrackId) -> bool {
        if self.hidden.remove(&id) {
            false
        } else {
            self.hidden.insert(id);
            true
        }
    }

    pub fn show_all(&mut self) {
        self.hidden.clear();
    }

    pub fn hidden(&self) -> impl Iterator<Item = TrackId> + '_ {
        self.hidden.iter().copied()
    }

    /// Tracks not hidden, in dataset order.
    pub fn visible_tracks<'a>(&'a self, dataset: &'a Dataset) -> impl Iterator<Item = &'a Track> + 'a {
        dataset.tracks.iter().filter(|t| !self.is_hidden(t.id))
    }
}
