use std::collections::HashMap;

use tracepick_protocol::{Args, Dataset, Slice, Track, TrackId};

use super::color::color_class;
use super::event::{RawEvent, RawTrace, ThreadKey};

/// An interval opened by a begin event and not yet closed.
struct OpenSlice {
    name: String,
    category: Option<String>,
    start: f64,
    args: Args,
}

/// Per-thread accumulation while events are replayed.
#[derive(Default)]
struct ThreadState {
    slices: Vec<Slice>,
    open: Vec<OpenSlice>,
}

/// Counters describing what the builder had to drop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// End events with no open interval on their thread.
    pub unmatched_ends: usize,
    /// Begin events still open when the trace ran out.
    pub unclosed_begins: usize,
}

fn new_slice(
    name: String,
    category: Option<String>,
    start: f64,
    end: f64,
    args: Args,
) -> Slice {
    let color = color_class(category.as_deref().unwrap_or(&name));
    Slice {
        id: 0,
        track_id: 0,
        name,
        category,
        start,
        end: end.max(start),
        depth: 0,
        color_class: color,
        args,
    }
}

/// Turn a raw event list into a dataset with sorted tracks.
///
/// Depth and track statistics are left at their defaults; run
/// [`super::depth::assign_depths`] afterwards.
pub fn build_dataset(trace: RawTrace) -> Dataset {
    build_dataset_with_report(trace).0
}

pub fn build_dataset_with_report(trace: RawTrace) -> (Dataset, BuildReport) {
    let mut report = BuildReport::default();
    let mut metadata = trace.metadata;
    let mut thread_names: HashMap<ThreadKey, String> = HashMap::new();
    let mut process_names: HashMap<u64, String> = HashMap::new();
    let mut sort_indices: HashMap<ThreadKey, i64> = HashMap::new();

    let mut intervals: Vec<(f64, RawEvent)> = Vec::with_capacity(trace.events.len());
    for event in trace.events {
        match event {
            RawEvent::ThreadName { thread, name } => {
                thread_names.entry(thread).or_insert(name);
            }
            RawEvent::ProcessName { pid, name } => {
                process_names.entry(pid).or_insert(name);
            }
            RawEvent::ThreadSortIndex { thread, index } => {
                sort_indices.insert(thread, index);
            }
            RawEvent::Metadata { name, value } => {
                metadata.insert(name, value);
            }
            interval => {
                if let Some(ts) = interval.interval_ts() {
                    intervals.push((ts, interval));
                }
            }
        }
    }

    // Producers do not guarantee ordering; stack matching needs time order.
    intervals.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut threads: HashMap<ThreadKey, ThreadState> = HashMap::new();
    for (_, event) in intervals {
        match event {
            RawEvent::Complete {
                thread,
                ts,
                dur,
                name,
                category,
                args,
            } => {
                let state = threads.entry(thread).or_default();
                state
                    .slices
                    .push(new_slice(name, category, ts, ts + dur.max(0.0), args));
            }
            RawEvent::Begin {
                thread,
                ts,
                name,
                category,
                args,
            } => {
                threads.entry(thread).or_default().open.push(OpenSlice {
                    name,
                    category,
                    start: ts,
                    args,
                });
            }
            RawEvent::End { thread, ts, args } => {
                let state = threads.entry(thread).or_default();
                match state.open.pop() {
                    Some(mut open) => {
                        open.args.extend(args);
                        state.slices.push(new_slice(
                            open.name,
                            open.category,
                            open.start,
                            ts,
                            open.args,
                        ));
                    }
                    None => report.unmatched_ends += 1,
                }
            }
            _ => {}
        }
    }

    let mut keys: Vec<ThreadKey> = threads.keys().copied().collect();
    keys.sort_by_key(|k| (k.pid, sort_indices.get(k).copied().unwrap_or(0), k.tid));

    let mut tracks = Vec::with_capacity(keys.len());
    let mut next_slice_id = 0u64;
    for (index, key) in keys.into_iter().enumerate() {
        let Some(state) = threads.remove(&key) else {
            continue;
        };
        report.unclosed_begins += state.open.len();

        let track_id = index as TrackId;
        let name = thread_names
            .remove(&key)
            .unwrap_or_else(|| format!("Thread {}", key.tid));
        let process_name = process_names
            .get(&key.pid)
            .cloned()
            .unwrap_or_else(|| format!("Process {}", key.pid));

        let mut track = Track::new(track_id, key.pid, key.tid, name, process_name);
        track.sort_index = sort_indices.get(&key).copied().unwrap_or(0);
        track.first_slice_id = next_slice_id;
        track.slices = state.slices;
        track.slices.sort_by(Slice::timeline_cmp);
        for slice in &mut track.slices {
            slice.id = next_slice_id;
            slice.track_id = track_id;
            next_slice_id += 1;
        }
        tracks.push(track);
    }

    if report.unmatched_ends > 0 || report.unclosed_begins > 0 {
        log::debug!(
            "dropped {} unmatched end markers and {} unclosed begins",
            report.unmatched_ends,
            report.unclosed_begins
        );
    }

    let mut dataset = Dataset::empty(trace.format);
    dataset.tracks = tracks;
    dataset.metadata = metadata;
    dataset.recompute_time_range();
    log::debug!(
        "built {} tracks with {} slices ({} events skipped by the parser)",
        dataset.tracks.len(),
        next_slice_id,
        trace.skipped
    );
    (dataset, report)
}
