//! Deterministic demonstration trace.
//!
//! Used when a payload cannot be decoded and the caller opts into showing
//! something anyway. The same seed always yields the same events.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use tracepick_protocol::{Args, Dataset, SourceFormat};

use crate::model::{RawEvent, RawTrace, ThreadKey};
use crate::pipeline;

pub const DEMO_FRAMES: usize = 120;
const FRAME_INTERVAL_US: f64 = 16_667.0;

const MAIN: ThreadKey = ThreadKey { pid: 1, tid: 1 };
const RENDER: ThreadKey = ThreadKey { pid: 1, tid: 2 };
const WORKERS: [ThreadKey; 2] = [ThreadKey { pid: 1, tid: 3 }, ThreadKey { pid: 1, tid: 4 }];
const GPU: ThreadKey = ThreadKey { pid: 2, tid: 20 };

fn complete(thread: ThreadKey, ts: f64, dur: f64, name: &str, category: &str) -> RawEvent {
    RawEvent::Complete {
        thread,
        ts,
        dur,
        name: name.to_string(),
        category: Some(category.to_string()),
        args: Args::new(),
    }
}

fn begin(thread: ThreadKey, ts: f64, name: String, category: &str) -> RawEvent {
    RawEvent::Begin {
        thread,
        ts,
        name,
        category: Some(category.to_string()),
        args: Args::new(),
    }
}

fn end(thread: ThreadKey, ts: f64) -> RawEvent {
    RawEvent::End {
        thread,
        ts,
        args: Args::new(),
    }
}

/// Build the raw event list for the demonstration trace.
pub fn demo_events(seed: u64) -> RawTrace {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut trace = RawTrace::new(SourceFormat::Synthetic);
    trace
        .metadata
        .insert("generator".into(), json!({ "name": "tracepick demo", "seed": seed }));

    let events = &mut trace.events;
    events.push(RawEvent::ProcessName {
        pid: 1,
        name: "DemoApp".into(),
    });
    events.push(RawEvent::ProcessName {
        pid: 2,
        name: "GPU Process".into(),
    });
    events.push(RawEvent::ThreadName {
        thread: MAIN,
        name: "Main".into(),
    });
    events.push(RawEvent::ThreadName {
        thread: RENDER,
        name: "Render".into(),
    });
    for (i, worker) in WORKERS.iter().enumerate() {
        events.push(RawEvent::ThreadName {
            thread: *worker,
            name: format!("Worker {}", i + 1),
        });
    }
    events.push(RawEvent::ThreadName {
        thread: GPU,
        name: "GPU Main".into(),
    });

    for frame in 0..DEMO_FRAMES {
        let frame_start = frame as f64 * FRAME_INTERVAL_US + rng.random_range(0.0..500.0);
        main_thread_frame(&mut rng, events, frame, frame_start);
        render_frame(&mut rng, events, frame_start);
        worker_tasks(&mut rng, events, frame_start);

        let gpu_start = frame_start + rng.random_range(4_000.0..8_000.0);
        events.push(complete(
            GPU,
            gpu_start,
            rng.random_range(1_000.0..6_000.0),
            "GpuWork",
            "gpu",
        ));
    }
    trace
}

fn main_thread_frame(rng: &mut StdRng, events: &mut Vec<RawEvent>, frame: usize, frame_start: f64) {
    let frame_dur = rng.random_range(8_000.0..15_000.0);
    let frame_end = frame_start + frame_dur;
    let mut args = Args::new();
    args.insert("frame".into(), json!(frame));
    events.push(RawEvent::Complete {
        thread: MAIN,
        ts: frame_start,
        dur: frame_dur,
        name: "Frame".into(),
        category: Some("frame".into()),
        args,
    });

    let phases = [
        ("Input", "input", 200.0..800.0),
        ("Update", "script", 2_000.0..5_000.0),
        ("Layout", "layout", 500.0..2_000.0),
        ("Paint", "paint", 500.0..2_500.0),
    ];
    let mut cursor = frame_start + 100.0;
    for (name, category, range) in phases {
        let dur = rng.random_range(range);
        if cursor + dur > frame_end - 50.0 {
            break;
        }
        events.push(complete(MAIN, cursor, dur, name, category));
        if name == "Update" {
            let entities = rng.random_range(2u32..6);
            let share = dur / f64::from(entities);
            for i in 0..entities {
                let start = cursor + f64::from(i) * share + 10.0;
                let len = rng.random_range(share * 0.3..share * 0.9);
                events.push(complete(MAIN, start, len, "UpdateEntity", "script"));
            }
        }
        cursor += dur + rng.random_range(20.0..200.0);
    }
}

fn render_frame(rng: &mut StdRng, events: &mut Vec<RawEvent>, frame_start: f64) {
    let start = frame_start + rng.random_range(1_000.0..3_000.0);
    events.push(begin(RENDER, start, "DrawFrame".into(), "render"));
    let mut cursor = start + 50.0;
    for pass in 0..rng.random_range(2u32..5) {
        let dur = rng.random_range(300.0..2_000.0);
        events.push(begin(RENDER, cursor, format!("Pass {pass}"), "render"));
        events.push(end(RENDER, cursor + dur));
        cursor += dur + 20.0;
    }
    events.push(end(RENDER, cursor + 50.0));
}

fn worker_tasks(rng: &mut StdRng, events: &mut Vec<RawEvent>, frame_start: f64) {
    for worker in WORKERS {
        for _ in 0..rng.random_range(0u32..4) {
            let start = frame_start + rng.random_range(0.0..FRAME_INTERVAL_US);
            let dur = rng.random_range(500.0..4_000.0);
            events.push(complete(worker, start, dur, "Task", "worker"));
        }
    }
}

/// The demonstration trace run through the standard load pipeline.
pub fn demo_dataset(seed: u64) -> Dataset {
    pipeline::build(demo_events(seed))
}
