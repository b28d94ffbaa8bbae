use tracepick_protocol::Dataset;

use crate::model::{BuildReport, RawTrace, assign_depths, build_dataset_with_report, normalize_timestamps};
use crate::parsers::{self, InputShape, ParseError};

/// Run the fixed construction passes: normalize events into tracks, assign
/// depths, then shift time so the earliest slice starts at zero.
///
/// The dataset is complete when this returns; nothing downstream ever sees
/// it half built.
pub fn build(trace: RawTrace) -> Dataset {
    build_with_report(trace).0
}

pub fn build_with_report(trace: RawTrace) -> (Dataset, BuildReport) {
    let skipped = trace.skipped;
    let (mut dataset, report) = build_dataset_with_report(trace);
    assign_depths(&mut dataset);
    normalize_timestamps(&mut dataset);
    log::debug!(
        "built {} dataset: {} tracks, {} slices, {:.3} µs ({} events skipped, {} unmatched ends, {} unclosed begins)",
        dataset.source_format,
        dataset.tracks.len(),
        dataset.slice_count(),
        dataset.duration(),
        skipped,
        report.unmatched_ends,
        report.unclosed_begins,
    );
    (dataset, report)
}

/// Decode `data` and build a dataset from it.
///
/// `declared` overrides sniffing. Undecodable or unsupported payloads are
/// returned as errors; substituting demonstration data is left to the caller.
pub fn load(data: &[u8], declared: Option<InputShape>) -> Result<Dataset, ParseError> {
    let trace = parsers::parse(data, declared)?;
    Ok(build(trace))
}
