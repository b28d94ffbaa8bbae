use std::io::{self, Write};

use tracepick_core::find_overlapping;
use tracepick_core::model::Session;
use tracepick_protocol::{SliceId, Track};

fn track_line(track: &Track) -> String {
    format!(
        "[{}] {}  pid {} tid {}  {} slices  depth {}",
        track.id,
        track.label(),
        track.pid,
        track.tid,
        track.len(),
        track.max_depth
    )
}

pub fn summary(out: &mut impl Write, session: &Session) -> io::Result<()> {
    let dataset = session.dataset();
    writeln!(out, "source: {}", dataset.source_format)?;
    writeln!(
        out,
        "tracks: {}  slices: {}  span: {:.3} – {:.3} µs (origin {:.3} µs)",
        dataset.tracks.len(),
        dataset.slice_count(),
        dataset.time_range.start,
        dataset.time_range.end,
        dataset.time_origin
    )?;
    let report = session.build_report();
    if report.unmatched_ends + report.unclosed_begins > 0 {
        writeln!(
            out,
            "dropped: {} unmatched ends, {} unclosed begins",
            report.unmatched_ends, report.unclosed_begins
        )?;
    }
    for track in &dataset.tracks {
        let hidden = if session.visibility().is_hidden(track.id) {
            "  (hidden)"
        } else {
            ""
        };
        writeln!(out, "  {}{hidden}", track_line(track))?;
    }
    Ok(())
}

/// Per-track counts of what the current window would draw.
pub fn window(out: &mut impl Write, session: &Session) -> io::Result<()> {
    let window = session.window();
    writeln!(out, "window: {:.3} – {:.3} µs", window.start, window.end)?;
    for track in session.visibility().visible_tracks(session.dataset()) {
        let visible = find_overlapping(track, window.start, window.end);
        writeln!(out, "  [{}] {} visible", track.id, visible.len())?;
    }
    Ok(())
}

pub fn hit(
    out: &mut impl Write,
    session: &Session,
    time: f64,
    y: f64,
    hit: Option<SliceId>,
) -> io::Result<()> {
    match hit.and_then(|id| session.dataset().slice(id)) {
        Some(slice) => writeln!(
            out,
            "at {time} y={y}: #{} {} [{:.3}, {:.3}] depth {} on track {}",
            slice.id, slice.name, slice.start, slice.end, slice.depth, slice.track_id
        ),
        None => writeln!(out, "at {time} y={y}: nothing"),
    }
}

pub fn selection(out: &mut impl Write, session: &Session) -> io::Result<()> {
    let stats = session.selection_stats();
    writeln!(
        out,
        "selection: {} slices, {:.3} µs total, span {:.3} – {:.3} µs",
        stats.count, stats.total_duration, stats.span.start, stats.span.end
    )?;
    let exported = session.export_payload().slices.len();
    if exported != stats.count {
        writeln!(out, "  {} on hidden tracks, left out of export", stats.count - exported)?;
    }
    Ok(())
}
