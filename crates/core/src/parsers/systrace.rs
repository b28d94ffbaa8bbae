use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracepick_protocol::{Args, SourceFormat};

use crate::model::{RawEvent, RawTrace, ThreadKey};

#[derive(Debug, Error)]
pub enum SystraceParseError {
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("no tracing_mark_write markers found")]
    NoMarkers,
}

const MARKER: &str = ": tracing_mark_write: ";
const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// The fixed columns in front of a marker payload.
#[derive(Debug, PartialEq)]
struct LineHeader<'a> {
    comm: &'a str,
    tid: u64,
    tgid: Option<u64>,
    cpu: u32,
    ts_us: f64,
}

/// Parse the `comm-tid (tgid) [cpu] flags seconds` prefix of an ftrace line.
///
/// `comm` may itself contain spaces and dashes, so the tid is taken from the
/// last dash and the cpu from the last bracket pair.
fn parse_header(head: &str) -> Option<LineHeader<'_>> {
    let head = head.trim();
    let (rest, ts) = head.rsplit_once(char::is_whitespace)?;
    let ts_us = ts.trim().parse::<f64>().ok()? * MICROS_PER_SECOND;

    let open = rest.rfind('[')?;
    let close = open + rest[open..].find(']')?;
    let cpu = rest[open + 1..close].trim().parse().ok()?;

    let mut task = rest[..open].trim_end();
    let mut tgid = None;
    if task.ends_with(')')
        && let Some(paren) = task.rfind('(')
    {
        tgid = task[paren + 1..task.len() - 1].trim().parse().ok();
        task = task[..paren].trim_end();
    }

    let (comm, tid) = task.trim_start().rsplit_once('-')?;
    let tid = tid.parse().ok()?;
    Some(LineHeader {
        comm,
        tid,
        tgid,
        cpu,
        ts_us,
    })
}

/// A `tracing_mark_write` payload we know how to interpret.
#[derive(Debug, PartialEq)]
enum Payload<'a> {
    Begin { pid: Option<u64>, name: &'a str },
    End,
}

fn parse_payload(payload: &str) -> Option<Payload<'_>> {
    let payload = payload.trim_end();
    let mut parts = payload.splitn(3, '|');
    match parts.next()? {
        "B" => {
            let pid = parts.next()?.trim().parse().ok();
            let name = parts.next().unwrap_or("").trim();
            Some(Payload::Begin { pid, name })
        }
        "E" => Some(Payload::End),
        _ => None,
    }
}

/// Parse ftrace/systrace text containing `tracing_mark_write` markers.
///
/// `B|pid|name` opens an interval and `E` closes the most recent one on the
/// same thread. Counter markers, other ftrace events and lines that do not
/// match the grammar are skipped. Timestamps are converted from seconds to
/// microseconds.
pub fn parse_systrace(data: &[u8]) -> Result<RawTrace, SystraceParseError> {
    parse_systrace_text(std::str::from_utf8(data)?)
}

pub fn parse_systrace_text(text: &str) -> Result<RawTrace, SystraceParseError> {
    let mut trace = RawTrace::new(SourceFormat::Systrace);
    let mut markers = Vec::new();

    for line in text.lines() {
        if line.trim_start().starts_with('#') {
            continue;
        }
        let Some((head, payload)) = line.split_once(MARKER) else {
            continue;
        };
        let Some(header) = parse_header(head) else {
            trace.skipped += 1;
            continue;
        };
        let Some(payload) = parse_payload(payload) else {
            trace.skipped += 1;
            continue;
        };
        markers.push((header, payload));
    }
    if markers.is_empty() {
        return Err(SystraceParseError::NoMarkers);
    }

    // A thread's pid may only show up on a later line, so resolve every
    // thread before any event is keyed.
    let mut thread_pid: HashMap<u64, u64> = HashMap::new();
    for (header, payload) in &markers {
        if let Some(tgid) = header.tgid {
            thread_pid.entry(header.tid).or_insert(tgid);
        }
        if let Payload::Begin { pid: Some(pid), .. } = payload {
            thread_pid.entry(header.tid).or_insert(*pid);
        }
    }

    let mut named: HashSet<u64> = HashSet::new();
    for (header, payload) in &markers {
        let pid = thread_pid.get(&header.tid).copied().unwrap_or(header.tid);
        let thread = ThreadKey::new(pid, header.tid);

        if named.insert(header.tid) && !header.comm.is_empty() {
            trace.events.push(RawEvent::ThreadName {
                thread,
                name: header.comm.to_string(),
            });
        }

        trace.events.push(match payload {
            Payload::Begin { name, .. } => {
                let mut args = Args::new();
                args.insert("cpu".into(), header.cpu.into());
                RawEvent::Begin {
                    thread,
                    ts: header.ts_us,
                    name: (*name).to_string(),
                    category: None,
                    args,
                }
            }
            Payload::End => RawEvent::End {
                thread,
                ts: header.ts_us,
                args: Args::new(),
            },
        });
    }

    log::debug!(
        "systrace: {} markers on {} threads, {} lines skipped",
        markers.len(),
        named.len(),
        trace.skipped
    );
    Ok(trace)
}
