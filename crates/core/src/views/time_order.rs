use tracepick_protocol::{
    Point, Rect, RenderCommand, TextAlign, ThemeToken, TimeRange, Track, Viewport,
};

use crate::config::ViewConfig;
use crate::query::find_overlapping;
use crate::selection::Selection;

const LABEL_FONT_SIZE: f64 = 11.0;

/// Render one track in time order: x = time across `window`, y = lane.
///
/// Coordinates are track-local: the header strip sits at `y = 0` and lane 0
/// starts at `config.track_header_height`. Only slices returned by the
/// viewport cull are considered, and slices narrower than
/// `config.min_slice_width` pixels are dropped. Selected slices get the
/// selection border.
pub fn render_track(
    track: &Track,
    window: TimeRange,
    viewport: &Viewport,
    selection: &Selection,
    config: &ViewConfig,
) -> Vec<RenderCommand> {
    let span = window.duration();
    if span <= 0.0 || viewport.width <= 0.0 {
        return Vec::new();
    }

    let x_scale = viewport.width / span;
    let visible = find_overlapping(track, window.start, window.end);
    let mut commands = Vec::with_capacity(visible.len() + 7);

    commands.push(RenderCommand::BeginGroup {
        id: format!("track-{}", track.id),
        label: Some(track.label()),
    });
    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(0.0, 0.0, viewport.width, config.track_header_height),
        color: ThemeToken::TrackHeaderBackground,
        border_color: None,
        label: None,
        frame_id: None,
    });
    commands.push(RenderCommand::DrawText {
        position: Point::new(4.0, config.track_header_height / 2.0),
        text: track.label(),
        color: ThemeToken::TrackHeaderText,
        font_size: LABEL_FONT_SIZE,
        align: TextAlign::Left,
    });

    let lanes = Rect::new(
        0.0,
        config.track_header_height,
        viewport.width,
        f64::from(track.max_depth) * config.row_height,
    );
    commands.push(RenderCommand::DrawRect {
        rect: lanes,
        color: ThemeToken::TrackBackground,
        border_color: None,
        label: None,
        frame_id: None,
    });
    commands.push(RenderCommand::SetClip { rect: lanes });

    for slice in visible {
        let w = slice.duration() * x_scale;
        if w < config.min_slice_width {
            continue;
        }
        // Clip to the viewport.
        let x0 = ((slice.start - window.start) * x_scale).max(0.0);
        let x1 = ((slice.end - window.start) * x_scale).min(viewport.width);
        let y = config.track_header_height + f64::from(slice.depth) * config.row_height;

        let border = if selection.contains(slice.id) {
            ThemeToken::SelectionHighlight
        } else {
            ThemeToken::Border
        };
        commands.push(RenderCommand::DrawRect {
            rect: Rect::new(x0, y, (x1 - x0).max(config.min_slice_width), config.row_height - 1.0),
            color: ThemeToken::slice_color(slice.color_class),
            border_color: Some(border),
            label: Some(slice.name.clone()),
            frame_id: Some(slice.id),
        });
    }

    commands.push(RenderCommand::ClearClip);
    commands.push(RenderCommand::EndGroup);
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RawEvent, RawTrace, ThreadKey};
    use crate::pipeline;
    use tracepick_protocol::{Args, SourceFormat};

    fn track() -> Track {
        let thread = ThreadKey::new(1, 1);
        let mut trace = RawTrace::new(SourceFormat::ChromeJson);
        for (ts, dur, name) in [(0.0, 100.0, "main"), (10.0, 50.0, "child"), (200.0, 0.01, "tiny")] {
            trace.events.push(RawEvent::Complete {
                thread,
                ts,
                dur,
                name: name.into(),
                category: None,
                args: Args::new(),
            });
        }
        pipeline::build(trace).tracks.remove(0)
    }

    fn rects(cmds: &[RenderCommand]) -> Vec<(&Rect, Option<ThemeToken>, Option<u64>)> {
        cmds.iter()
            .filter_map(|c| match c {
                RenderCommand::DrawRect {
                    rect,
                    border_color,
                    frame_id: Some(id),
                    ..
                } => Some((rect, *border_color, Some(*id))),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn produces_draw_rects_for_culled_slices() {
        let t = track();
        let cmds = render_track(
            &t,
            TimeRange::new(0.0, 100.0),
            &Viewport::new(800.0, 600.0),
            &Selection::new(),
            &ViewConfig::default(),
        );
        assert!(matches!(cmds.first(), Some(RenderCommand::BeginGroup { .. })));
        assert!(matches!(cmds.last(), Some(RenderCommand::EndGroup)));
        let r = rects(&cmds);
        assert_eq!(r.len(), 2);
        assert_eq!(r[0].0.w, 800.0);
        assert_eq!(r[1].0.x, 80.0);
        assert_eq!(r[1].0.y, 24.0 + 20.0);
    }

    #[test]
    fn sub_pixel_slices_are_skipped() {
        let t = track();
        let cmds = render_track(
            &t,
            TimeRange::new(0.0, 300.0),
            &Viewport::new(300.0, 600.0),
            &Selection::new(),
            &ViewConfig::default(),
        );
        assert!(rects(&cmds).iter().all(|(_, _, id)| *id != Some(2)));
    }

    #[test]
    fn selected_slices_are_highlighted() {
        let t = track();
        let mut selection = Selection::new();
        selection.add(1);
        let cmds = render_track(
            &t,
            TimeRange::new(0.0, 100.0),
            &Viewport::new(800.0, 600.0),
            &selection,
            &ViewConfig::default(),
        );
        let r = rects(&cmds);
        assert_eq!(r[0].1, Some(ThemeToken::Border));
        assert_eq!(r[1].1, Some(ThemeToken::SelectionHighlight));
    }

    #[test]
    fn long_slice_is_clipped_to_viewport() {
        let t = track();
        let cmds = render_track(
            &t,
            TimeRange::new(40.0, 80.0),
            &Viewport::new(400.0, 600.0),
            &Selection::new(),
            &ViewConfig::default(),
        );
        let r = rects(&cmds);
        assert_eq!((r[0].0.x, r[0].0.w), (0.0, 400.0));
        assert_eq!((r[1].0.x, r[1].0.w), (0.0, 200.0));
    }

    #[test]
    fn empty_window_renders_nothing() {
        let t = track();
        let cmds = render_track(
            &t,
            TimeRange::new(5.0, 5.0),
            &Viewport::default(),
            &Selection::new(),
            &ViewConfig::default(),
        );
        assert!(cmds.is_empty());
    }
}
