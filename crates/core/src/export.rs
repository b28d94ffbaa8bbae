//! The hand-off to export formatters.
//!
//! An exporter sees only the selected slices and the visible tracks. It never
//! queries the dataset, the layout or the selection itself.

use serde::Serialize;
use thiserror::Error;
use tracepick_protocol::{Slice, Track, TrackId};

use crate::selection::SelectionStats;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize export: {0}")]
    Json(#[from] serde_json::Error),
}

/// Selected slices (hidden tracks already excluded) plus the visible tracks.
#[derive(Debug, Clone, Default)]
pub struct ExportPayload<'a> {
    pub slices: Vec<&'a Slice>,
    pub tracks: Vec<&'a Track>,
}

impl<'a> ExportPayload<'a> {
    pub fn new(slices: Vec<&'a Slice>, tracks: Vec<&'a Track>) -> Self {
        Self { slices, tracks }
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn stats(&self) -> SelectionStats {
        SelectionStats::from_slices(&self.slices)
    }
}

/// Turns an [`ExportPayload`] into a textual report.
pub trait Exporter {
    fn export(&self, payload: &ExportPayload<'_>) -> Result<String, ExportError>;
}

/// Track fields worth exporting; the slice list is left out.
#[derive(Serialize)]
struct TrackRecord<'a> {
    id: TrackId,
    name: &'a str,
    process_name: &'a str,
    pid: u64,
    tid: u64,
}

impl<'a> From<&'a Track> for TrackRecord<'a> {
    fn from(track: &'a Track) -> Self {
        Self {
            id: track.id,
            name: &track.name,
            process_name: &track.process_name,
            pid: track.pid,
            tid: track.tid,
        }
    }
}

#[derive(Serialize)]
struct Report<'a> {
    stats: SelectionStats,
    tracks: Vec<TrackRecord<'a>>,
    slices: &'a [&'a Slice],
}

/// Serializes the payload as a JSON document with `stats`, `tracks` and
/// `slices` keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExporter {
    pub pretty: bool,
}

impl JsonExporter {
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Exporter for JsonExporter {
    fn export(&self, payload: &ExportPayload<'_>) -> Result<String, ExportError> {
        let report = Report {
            stats: payload.stats(),
            tracks: payload.tracks.iter().map(|t| TrackRecord::from(*t)).collect(),
            slices: &payload.slices,
        };
        let text = if self.pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };
        Ok(text)
    }
}
