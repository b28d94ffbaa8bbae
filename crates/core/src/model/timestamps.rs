use tracepick_protocol::{Dataset, TimeRange};

/// Shift every timestamp so the dataset's earliest event is time zero.
///
/// The absolute offset is accumulated in `Dataset::time_origin`. Running it
/// again is a no-op since the range already starts at zero.
pub fn normalize_timestamps(dataset: &mut Dataset) {
    let offset = dataset.time_range.start;
    if offset == 0.0 {
        return;
    }

    for track in &mut dataset.tracks {
        for slice in &mut track.slices {
            slice.start -= offset;
            slice.end -= offset;
        }
        // Rounding can move durations by an ulp; culling needs the exact bound.
        track.refresh_stats();
    }
    dataset.time_range = TimeRange::new(0.0, dataset.time_range.end - offset);
    dataset.time_origin += offset;
}
