//! Lane assignment for overlapping slices.
//!
//! Greedy interval coloring: slices are visited in track order (start
//! ascending, longer first on ties). Before placing a slice, every active
//! slice ending at or before its start is retired and its lane freed; the
//! slice then takes the smallest free lane. Visiting in start order makes the
//! lane count minimal (it equals the maximum number of simultaneously open
//! slices), and the duration tie-break keeps an enclosing slice above a child
//! that starts at the same instant.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeSet, BinaryHeap};

use tracepick_protocol::{Dataset, Track};

/// An active slice keyed by end time for the retirement heap.
#[derive(Debug, Clone, Copy)]
struct Active {
    end: f64,
    depth: u32,
}

impl PartialEq for Active {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Active {}

impl PartialOrd for Active {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Active {
    fn cmp(&self, other: &Self) -> Ordering {
        self.end
            .total_cmp(&other.end)
            .then(self.depth.cmp(&other.depth))
    }
}

/// Assign `depth` to every slice on `track` and refresh `max_depth` and
/// `max_item_duration`. The slices must already be in track order.
pub fn assign_track_depths(track: &mut Track) {
    debug_assert!(track.is_sorted(), "track {} is not in timeline order", track.id);

    let mut active: BinaryHeap<Reverse<Active>> = BinaryHeap::new();
    let mut free: BTreeSet<u32> = BTreeSet::new();
    let mut next_depth = 0u32;
    let mut max_item_duration = 0.0f64;

    for slice in &mut track.slices {
        // Half-open intervals: a slice ending exactly at `start` is done.
        while let Some(Reverse(top)) = active.peek() {
            if top.end > slice.start {
                break;
            }
            free.insert(top.depth);
            active.pop();
        }

        let depth = free.pop_first().unwrap_or_else(|| {
            next_depth += 1;
            next_depth - 1
        });
        slice.depth = depth;
        active.push(Reverse(Active {
            end: slice.end,
            depth,
        }));
        max_item_duration = max_item_duration.max(slice.duration());
    }

    track.max_depth = next_depth.max(1);
    track.max_item_duration = max_item_duration;
}

/// Run lane assignment over every track of the dataset.
pub fn assign_depths(dataset: &mut Dataset) {
    for track in &mut dataset.tracks {
        assign_track_depths(track);
    }
}
