//! Randomized checks of the dataset invariants and of every query against a
//! brute-force reference. Seeds are fixed so failures reproduce.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracepick_core::model::{RawEvent, RawTrace, ThreadKey};
use tracepick_core::{
    Selection, SelectionRect, TrackLayout, TrackVisibility, ViewConfig, ViewportQuery,
    find_overlapping, hit_test, pipeline,
};
use tracepick_protocol::{Args, Dataset, Slice, SourceFormat, Track};

const CASES: u64 = 64;

/// Random complete and begin/end events on a few threads, shuffled.
fn random_dataset(rng: &mut StdRng, min_duration: u32) -> Dataset {
    let mut trace = RawTrace::new(SourceFormat::Synthetic);
    let offset = f64::from(rng.random_range(0u32..10_000));
    for tid in 0..rng.random_range(1u64..5) {
        let thread = ThreadKey::new(1, tid);
        for i in 0..rng.random_range(0u32..60) {
            // Coarse integer times so equal starts and touching ends happen.
            let ts = offset + f64::from(rng.random_range(0u32..200));
            let dur = f64::from(rng.random_range(min_duration..50));
            trace.events.push(RawEvent::Complete {
                thread,
                ts,
                dur,
                name: format!("s{i}"),
                category: Some(format!("cat{}", i % 5)),
                args: Args::new(),
            });
        }
    }
    trace.events.shuffle(rng);
    pipeline::build(trace)
}

fn overlap(a: &Slice, b: &Slice) -> bool {
    a.start < b.end && b.start < a.end
}

/// Size of the largest set of mutually overlapping slices. For intervals
/// this is the most slices covering any single start point.
fn max_clique(track: &Track) -> u32 {
    track
        .slices
        .iter()
        .map(|p| {
            track
                .slices
                .iter()
                .filter(|s| s.start <= p.start && p.start < s.end)
                .count() as u32
        })
        .max()
        .unwrap_or(0)
}

#[test]
fn tracks_stay_sorted() {
    for case in 0..CASES {
        let mut rng = StdRng::seed_from_u64(case);
        let dataset = random_dataset(&mut rng, 0);
        for track in &dataset.tracks {
            for pair in track.slices.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                assert!(
                    a.start < b.start || (a.start == b.start && a.duration() >= b.duration()),
                    "case {case}: {a:?} before {b:?}"
                );
            }
        }
    }
}

#[test]
fn overlapping_slices_never_share_a_depth() {
    for case in 0..CASES {
        let mut rng = StdRng::seed_from_u64(1_000 + case);
        let dataset = random_dataset(&mut rng, 0);
        for track in &dataset.tracks {
            for (i, a) in track.slices.iter().enumerate() {
                assert!(a.depth < track.max_depth);
                for b in &track.slices[i + 1..] {
                    if a.depth == b.depth {
                        assert!(!overlap(a, b), "case {case}: {a:?} overlaps {b:?}");
                    }
                }
            }
        }
    }
}

#[test]
fn depth_count_is_minimal() {
    for case in 0..CASES {
        let mut rng = StdRng::seed_from_u64(2_000 + case);
        let dataset = random_dataset(&mut rng, 1);
        for track in &dataset.tracks {
            assert_eq!(
                track.max_depth,
                max_clique(track).max(1),
                "case {case}, track {}",
                track.id
            );
        }
    }
}

#[test]
fn track_stats_match_slices() {
    for case in 0..CASES {
        let mut rng = StdRng::seed_from_u64(3_000 + case);
        let dataset = random_dataset(&mut rng, 0);
        for track in &dataset.tracks {
            let longest = track.slices.iter().map(Slice::duration).fold(0.0, f64::max);
            assert_eq!(track.max_item_duration, longest);
            assert!(track.max_depth >= 1);
        }
    }
}

#[test]
fn timestamps_start_at_zero() {
    for case in 0..CASES {
        let mut rng = StdRng::seed_from_u64(4_000 + case);
        let dataset = random_dataset(&mut rng, 0);
        if dataset.slice_count() == 0 {
            assert_eq!(dataset.time_range.start, 0.0);
            continue;
        }
        let min_start = dataset.all_slices().map(|s| s.start).fold(f64::INFINITY, f64::min);
        let max_end = dataset.all_slices().map(|s| s.end).fold(0.0, f64::max);
        assert_eq!(min_start, 0.0, "case {case}");
        assert_eq!(dataset.time_range.start, 0.0);
        assert_eq!(dataset.time_range.end, max_end);
    }
}

#[test]
fn cull_matches_brute_force() {
    for case in 0..CASES {
        let mut rng = StdRng::seed_from_u64(5_000 + case);
        let dataset = random_dataset(&mut rng, 0);
        for track in &dataset.tracks {
            for _ in 0..20 {
                let ws = f64::from(rng.random_range(0u32..260)) - 10.0;
                let we = ws + f64::from(rng.random_range(0u32..80));
                let fast: Vec<_> = find_overlapping(track, ws, we).iter().map(|s| s.id).collect();
                let slow: Vec<_> = track
                    .slices
                    .iter()
                    .filter(|s| s.end > ws && s.start <= we)
                    .map(|s| s.id)
                    .collect();
                assert_eq!(fast, slow, "case {case}, window [{ws}, {we}]");
            }
        }
    }
}

#[test]
fn hit_test_matches_brute_force() {
    for case in 0..CASES {
        let mut rng = StdRng::seed_from_u64(6_000 + case);
        let dataset = random_dataset(&mut rng, 0);
        for track in &dataset.tracks {
            for _ in 0..20 {
                let time = f64::from(rng.random_range(0u32..260));
                let lane = rng
                    .random_bool(0.5)
                    .then(|| rng.random_range(0..track.max_depth + 1));
                let slow = track
                    .slices
                    .iter()
                    .filter(|s| s.contains_time(time))
                    .filter(|s| lane.is_none_or(|l| s.depth == l))
                    .fold(None::<&Slice>, |best, s| match best {
                        Some(b) if b.depth > s.depth => Some(b),
                        _ => Some(s),
                    });
                let fast = hit_test(track, time, lane);
                assert_eq!(
                    fast.map(|s| s.id),
                    slow.map(|s| s.id),
                    "case {case}, time {time}, lane {lane:?}"
                );
            }
        }
    }
}

#[test]
fn rect_selection_matches_brute_force() {
    let config = ViewConfig {
        row_height: 10.0,
        track_header_height: 4.0,
        track_gap: 2.0,
        min_slice_width: 0.0,
    };
    for case in 0..CASES {
        let mut rng = StdRng::seed_from_u64(7_000 + case);
        let dataset = random_dataset(&mut rng, 0);
        let mut visibility = TrackVisibility::new();
        for track in &dataset.tracks {
            if rng.random_bool(0.25) {
                visibility.hide(track.id);
            }
        }
        let layout = TrackLayout::compute(&dataset, &visibility, &config);
        let query = ViewportQuery::new(&dataset, &visibility, &layout);

        for _ in 0..20 {
            let t0 = f64::from(rng.random_range(0u32..260));
            let t1 = f64::from(rng.random_range(0u32..260));
            let y0 = f64::from(rng.random_range(0u32..400));
            let y1 = f64::from(rng.random_range(0u32..400));
            let rect = SelectionRect::from_corners(t0, y0, t1, y1);

            let fast: Vec<_> = query.select_in_rect(&rect).iter().map(|s| s.id).collect();
            let mut slow = Vec::new();
            for extent in layout.extents() {
                let Some(track) = dataset.track(extent.track_id) else {
                    continue;
                };
                for s in &track.slices {
                    let (top, bottom) = extent.lane_span(s.depth, config.row_height);
                    let rows = top < rect.y_end && bottom > rect.y_start;
                    let times = rect.time_start.max(s.start) < rect.time_end.min(s.end);
                    if rows && times {
                        slow.push(s.id);
                    }
                }
            }
            assert_eq!(fast, slow, "case {case}, rect {rect:?}");
            assert!(fast.iter().all(|&id| {
                dataset
                    .slice(id)
                    .is_some_and(|s| !visibility.is_hidden(s.track_id))
            }));
        }
    }
}

#[test]
fn hidden_selection_is_kept_but_not_exported() {
    for case in 0..CASES {
        let mut rng = StdRng::seed_from_u64(8_000 + case);
        let dataset = random_dataset(&mut rng, 0);
        let Some(victim) = dataset.tracks.iter().find(|t| !t.is_empty()) else {
            continue;
        };

        let mut selection = Selection::new();
        for slice in dataset.all_slices() {
            if rng.random_bool(0.3) {
                selection.add(slice.id);
            }
        }
        selection.add(victim.slices[0].id);

        let mut visibility = TrackVisibility::new();
        visibility.hide(victim.id);

        let all = selection.slices(&dataset);
        let exported = selection.for_export(&dataset, &visibility);
        assert_eq!(all.len(), selection.len());
        assert!(all.iter().any(|s| s.track_id == victim.id));
        assert!(exported.iter().all(|s| s.track_id != victim.id));
        assert_eq!(
            exported.len(),
            all.iter().filter(|s| s.track_id != victim.id).count()
        );
    }
}
