use tracepick_protocol::{Args, SourceFormat};

/// Identifies the thread an event belongs to. Tracks are keyed by this pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadKey {
    pub pid: u64,
    pub tid: u64,
}

impl ThreadKey {
    pub fn new(pid: u64, tid: u64) -> Self {
        Self { pid, tid }
    }
}

/// A decoded trace event, before it is normalized into slices.
///
/// Every supported input syntax lowers into these variants; nothing past the
/// builder needs to know which syntax produced an event.
#[derive(Debug, Clone, PartialEq)]
pub enum RawEvent {
    /// An interval carrying its own duration.
    Complete {
        thread: ThreadKey,
        ts: f64,
        dur: f64,
        name: String,
        category: Option<String>,
        args: Args,
    },
    /// Opens an interval on `thread`.
    Begin {
        thread: ThreadKey,
        ts: f64,
        name: String,
        category: Option<String>,
        args: Args,
    },
    /// Closes the most recently opened interval on `thread`. Its args are
    /// merged into the closed slice.
    End {
        thread: ThreadKey,
        ts: f64,
        args: Args,
    },
    ThreadName {
        thread: ThreadKey,
        name: String,
    },
    ProcessName {
        pid: u64,
        name: String,
    },
    ThreadSortIndex {
        thread: ThreadKey,
        index: i64,
    },
    /// Any other non-interval record, kept by name in the dataset metadata.
    Metadata {
        name: String,
        value: serde_json::Value,
    },
}

impl RawEvent {
    /// Timestamp of interval events; `None` for metadata records.
    pub fn interval_ts(&self) -> Option<f64> {
        match self {
            Self::Complete { ts, .. } | Self::Begin { ts, .. } | Self::End { ts, .. } => Some(*ts),
            _ => None,
        }
    }
}

/// The output of a parser: a flat event list plus trace-level metadata.
#[derive(Debug, Clone)]
pub struct RawTrace {
    pub format: SourceFormat,
    pub events: Vec<RawEvent>,
    /// Top-level metadata found outside the event list.
    pub metadata: Args,
    /// Events whose phase or shape was not supported.
    pub skipped: usize,
}

impl RawTrace {
    pub fn new(format: SourceFormat) -> Self {
        Self {
            format,
            events: Vec::new(),
            metadata: Args::new(),
            skipped: 0,
        }
    }
}
