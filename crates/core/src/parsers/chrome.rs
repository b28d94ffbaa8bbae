use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracepick_protocol::{Args, SourceFormat};

use super::systrace;
use crate::model::{RawEvent, RawTrace, ThreadKey};

#[derive(Debug, Error)]
pub enum ChromeParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing traceEvents array")]
    MissingTraceEvents,
    #[error("array does not contain trace events")]
    NotTraceEvents,
}

/// Raw Chrome trace event as found in DevTools / `chrome://tracing` exports.
#[derive(Debug, Clone, Deserialize)]
struct TraceEvent {
    #[serde(default)]
    name: String,
    #[serde(default)]
    cat: String,
    ph: String,
    #[serde(default)]
    ts: f64,
    #[serde(default)]
    dur: Option<f64>,
    #[serde(default, deserialize_with = "lenient_id")]
    pid: u64,
    #[serde(default, deserialize_with = "lenient_id")]
    tid: u64,
    #[serde(default)]
    args: Option<serde_json::Value>,
}

/// Top-level trace JSON: object format or bare array format.
///
/// Events are kept as raw values so one malformed entry does not reject the
/// whole file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TraceFile {
    Object {
        #[serde(rename = "traceEvents", default)]
        trace_events: Option<Vec<serde_json::Value>>,
        #[serde(rename = "systemTraceEvents", default)]
        system_trace_events: Option<String>,
        #[serde(rename = "displayTimeUnit", default)]
        display_time_unit: Option<String>,
        #[serde(default)]
        metadata: Option<Args>,
    },
    Array(Vec<serde_json::Value>),
}

/// Process and thread ids show up as numbers, signed numbers, or numeric strings.
fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Unsigned(u64),
        Signed(i64),
        Float(f64),
        Text(String),
    }

    Ok(match IdRepr::deserialize(deserializer)? {
        IdRepr::Unsigned(v) => v,
        IdRepr::Signed(v) => v as u64,
        IdRepr::Float(v) => v as u64,
        IdRepr::Text(s) => s.trim().parse().unwrap_or(0),
    })
}

fn args_map(args: Option<serde_json::Value>) -> Args {
    match args {
        Some(serde_json::Value::Object(map)) => map,
        _ => Args::new(),
    }
}

fn arg_str<'a>(args: &'a Option<serde_json::Value>, key: &str) -> Option<&'a str> {
    args.as_ref()
        .and_then(|a| a.get(key))
        .and_then(serde_json::Value::as_str)
}

/// Lower one decoded event. Returns `None` for phases that carry no slice or
/// metadata information.
fn lower_event(event: TraceEvent) -> Option<RawEvent> {
    let thread = ThreadKey::new(event.pid, event.tid);
    if event.ph == "M" {
        return Some(lower_metadata(thread, event));
    }
    let category = if event.cat.is_empty() {
        None
    } else {
        Some(event.cat)
    };

    match event.ph.as_str() {
        "X" => Some(RawEvent::Complete {
            thread,
            ts: event.ts,
            dur: event.dur.unwrap_or(0.0).max(0.0),
            name: event.name,
            category,
            args: args_map(event.args),
        }),
        "B" => Some(RawEvent::Begin {
            thread,
            ts: event.ts,
            name: event.name,
            category,
            args: args_map(event.args),
        }),
        "E" => Some(RawEvent::End {
            thread,
            ts: event.ts,
            args: args_map(event.args),
        }),
        _ => None,
    }
}

fn lower_metadata(thread: ThreadKey, event: TraceEvent) -> RawEvent {
    match event.name.as_str() {
        "thread_name" => {
            if let Some(name) = arg_str(&event.args, "name") {
                return RawEvent::ThreadName {
                    thread,
                    name: name.to_string(),
                };
            }
        }
        "process_name" => {
            if let Some(name) = arg_str(&event.args, "name") {
                return RawEvent::ProcessName {
                    pid: thread.pid,
                    name: name.to_string(),
                };
            }
        }
        "thread_sort_index" => {
            if let Some(index) = event
                .args
                .as_ref()
                .and_then(|a| a.get("sort_index"))
                .and_then(serde_json::Value::as_i64)
            {
                return RawEvent::ThreadSortIndex { thread, index };
            }
        }
        _ => {}
    }
    RawEvent::Metadata {
        name: event.name,
        value: event.args.unwrap_or(serde_json::Value::Null),
    }
}

/// Parse a Chrome trace event JSON document into a raw event list.
///
/// Supported phases are `X`, `B`, `E` and `M`; everything else is counted in
/// `RawTrace::skipped`. An embedded `systemTraceEvents` ftrace dump is parsed
/// with the marker grammar and merged in.
pub fn parse_chrome_trace(data: &[u8]) -> Result<RawTrace, ChromeParseError> {
    let trace_file: TraceFile = serde_json::from_slice(data)?;
    let mut trace = RawTrace::new(SourceFormat::ChromeJson);

    let values = match trace_file {
        TraceFile::Object {
            trace_events,
            system_trace_events,
            display_time_unit,
            metadata,
        } => {
            if trace_events.is_none() && system_trace_events.is_none() {
                return Err(ChromeParseError::MissingTraceEvents);
            }
            if let Some(metadata) = metadata {
                trace.metadata.extend(metadata);
            }
            if let Some(unit) = display_time_unit {
                trace
                    .metadata
                    .insert("displayTimeUnit".into(), serde_json::Value::String(unit));
            }
            if let Some(text) = system_trace_events {
                match systrace::parse_systrace_text(&text) {
                    Ok(system) => {
                        trace.events.extend(system.events);
                        trace.skipped += system.skipped;
                    }
                    Err(e) => log::debug!("ignoring systemTraceEvents: {e}"),
                }
            }
            trace_events.unwrap_or_default()
        }
        TraceFile::Array(values) => {
            if !values.is_empty() && !values.iter().any(|v| v.get("ph").is_some()) {
                return Err(ChromeParseError::NotTraceEvents);
            }
            values
        }
    };

    trace.events.reserve(values.len());
    for value in values {
        let lowered = serde_json::from_value::<TraceEvent>(value)
            .ok()
            .and_then(lower_event);
        match lowered {
            Some(event) => trace.events.push(event),
            None => trace.skipped += 1,
        }
    }

    log::debug!(
        "chrome trace: {} events lowered, {} skipped",
        trace.events.len(),
        trace.skipped
    );
    Ok(trace)
}
