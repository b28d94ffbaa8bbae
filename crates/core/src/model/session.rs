use tracepick_protocol::{
    Dataset, RenderCommand, SliceId, SourceFormat, TimeRange, TrackId, Viewport,
};

use crate::config::ViewConfig;
use crate::export::ExportPayload;
use crate::layout::TrackLayout;
use crate::model::BuildReport;
use crate::parsers::{self, InputShape, ParseError};
use crate::pipeline;
use crate::query::{SelectionRect, ViewportQuery};
use crate::scheduler::{FrameRequest, RedrawReason, RenderScheduler};
use crate::selection::{Selection, SelectionStats};
use crate::synthetic;
use crate::views::render_track;
use crate::visibility::TrackVisibility;

/// Narrowest window zoom can reach, in microseconds.
pub const MIN_WINDOW_SPAN: f64 = 1e-3;

/// One interactive browsing session over a loaded dataset.
///
/// Owns the dataset and everything derived from it: selection, hidden
/// tracks, vertical layout, the visible time window and the redraw
/// scheduler. Every mutation requests a redraw; the host collects coalesced
/// frames with [`Session::take_frame`].
#[derive(Debug, Clone)]
pub struct Session {
    dataset: Dataset,
    report: BuildReport,
    selection: Selection,
    visibility: TrackVisibility,
    layout: TrackLayout,
    window: TimeRange,
    viewport: Viewport,
    config: ViewConfig,
    scheduler: RenderScheduler,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ViewConfig::default())
    }
}

impl Session {
    /// An empty session.
    pub fn new(config: ViewConfig) -> Self {
        Self::with_dataset(Dataset::empty(SourceFormat::Synthetic), config)
    }

    pub fn with_dataset(dataset: Dataset, config: ViewConfig) -> Self {
        let mut session = Self {
            dataset: Dataset::empty(SourceFormat::Synthetic),
            report: BuildReport::default(),
            selection: Selection::new(),
            visibility: TrackVisibility::new(),
            layout: TrackLayout::compute(
                &Dataset::empty(SourceFormat::Synthetic),
                &TrackVisibility::new(),
                &config,
            ),
            window: TimeRange::new(0.0, MIN_WINDOW_SPAN),
            viewport: Viewport::default(),
            config,
            scheduler: RenderScheduler::new(),
        };
        session.replace_dataset(dataset, BuildReport::default());
        session
    }

    /// Decode and build a new dataset, then swap it in.
    ///
    /// Selection, hidden tracks and the window are reset together with the
    /// dataset. On error nothing changes.
    pub fn load(&mut self, data: &[u8], shape: Option<InputShape>) -> Result<(), ParseError> {
        let trace = parsers::parse(data, shape).inspect_err(|err| {
            log::warn!("load failed, keeping current dataset: {err}");
        })?;
        let (dataset, report) = pipeline::build_with_report(trace);
        self.replace_dataset(dataset, report);
        Ok(())
    }

    /// Swap in the synthetic demonstration dataset.
    pub fn load_demo(&mut self, seed: u64) {
        self.replace_dataset(synthetic::demo_dataset(seed), BuildReport::default());
    }

    fn replace_dataset(&mut self, dataset: Dataset, report: BuildReport) {
        self.dataset = dataset;
        self.report = report;
        self.selection.clear();
        self.visibility.show_all();
        self.relayout();
        self.window = self.full_window();
        log::debug!(
            "session now holds {} tracks, {} slices",
            self.dataset.tracks.len(),
            self.dataset.slice_count()
        );
        self.scheduler.request_redraw(RedrawReason::Load);
    }

    fn relayout(&mut self) {
        self.layout = TrackLayout::compute(&self.dataset, &self.visibility, &self.config);
    }

    fn full_window(&self) -> TimeRange {
        let range = self.dataset.time_range;
        TimeRange::new(range.start, range.end.max(range.start + MIN_WINDOW_SPAN))
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// What the builder dropped while constructing the current dataset.
    pub fn build_report(&self) -> BuildReport {
        self.report
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn visibility(&self) -> &TrackVisibility {
        &self.visibility
    }

    pub fn layout(&self) -> &TrackLayout {
        &self.layout
    }

    pub fn window(&self) -> TimeRange {
        self.window
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn query(&self) -> ViewportQuery<'_> {
        ViewportQuery::new(&self.dataset, &self.visibility, &self.layout)
    }

    // ----- window -----

    /// Set the visible window, clamped to the dataset range. The span is
    /// kept at least [`MIN_WINDOW_SPAN`] and at most the dataset duration.
    pub fn set_window(&mut self, start: f64, end: f64) {
        if !start.is_finite() || !end.is_finite() {
            return;
        }
        self.window = self.clamp_window(start.min(end), start.max(end));
        self.scheduler.request_redraw(RedrawReason::Window);
    }

    fn clamp_window(&self, start: f64, end: f64) -> TimeRange {
        let full = self.full_window();
        let max_span = full.duration().max(MIN_WINDOW_SPAN);
        let span = (end - start).max(MIN_WINDOW_SPAN).min(max_span);
        let start = start.min(full.end - span).max(full.start);
        TimeRange::new(start, start + span)
    }

    /// Shift the window by `dt` microseconds, keeping its span.
    pub fn pan(&mut self, dt: f64) {
        if !dt.is_finite() {
            return;
        }
        self.window = self.clamp_window(self.window.start + dt, self.window.end + dt);
        self.scheduler.request_redraw(RedrawReason::Pan);
    }

    /// Divide the window span by `factor` (> 1 zooms in), keeping the time at
    /// `anchor_fraction` of the window fixed on screen.
    pub fn zoom(&mut self, factor: f64, anchor_fraction: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let anchor_fraction = if anchor_fraction.is_nan() {
            0.5
        } else {
            anchor_fraction.clamp(0.0, 1.0)
        };
        let span = self.window.duration();
        let anchor = self.window.start + anchor_fraction * span;
        let new_span = span / factor;
        let start = anchor - anchor_fraction * new_span;
        self.window = self.clamp_window(start, start + new_span);
        self.scheduler.request_redraw(RedrawReason::Zoom);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport.width = width.max(0.0);
        self.viewport.height = height.max(0.0);
        self.scheduler.request_redraw(RedrawReason::Resize);
    }

    // ----- selection -----

    /// Hit-test at `time` and layout height `y`.
    ///
    /// A plain click selects only the hit slice, or clears the selection on
    /// a miss. An additive click toggles the hit slice and ignores misses.
    pub fn click(&mut self, time: f64, y: f64, additive: bool) -> Option<SliceId> {
        if !time.is_finite() || !y.is_finite() {
            return None;
        }
        let hit = self.query().slice_at(time, y).map(|s| s.id);
        match (hit, additive) {
            (Some(id), true) => {
                self.selection.toggle(id);
            }
            (Some(id), false) => self.selection.replace([id]),
            (None, true) => return None,
            (None, false) => self.selection.clear(),
        }
        self.scheduler.request_redraw(RedrawReason::Selection);
        hit
    }

    /// Select the slices inside a drag rectangle. Returns how many the
    /// rectangle covered.
    pub fn drag_select(&mut self, t0: f64, t1: f64, y0: f64, y1: f64, additive: bool) -> usize {
        let rect = SelectionRect::from_corners(t0, y0, t1, y1);
        let ids: Vec<SliceId> = ViewportQuery::new(&self.dataset, &self.visibility, &self.layout)
            .select_in_rect(&rect)
            .into_iter()
            .map(|s| s.id)
            .collect();
        let covered = ids.len();
        if additive {
            self.selection.extend(ids);
        } else {
            self.selection.replace(ids);
        }
        self.scheduler.request_redraw(RedrawReason::Selection);
        covered
    }

    /// Replace the selection with everything visible in the current window.
    pub fn select_all_visible(&mut self) -> usize {
        let query = ViewportQuery::new(&self.dataset, &self.visibility, &self.layout);
        let count = self.selection.select_all_visible(&query, self.window);
        self.scheduler.request_redraw(RedrawReason::Selection);
        count
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.scheduler.request_redraw(RedrawReason::Selection);
    }

    pub fn selection_stats(&self) -> SelectionStats {
        self.selection.stats(&self.dataset)
    }

    // ----- tracks -----

    /// Hide or show a track. Returns `true` if the track is now hidden.
    /// Unknown ids are ignored.
    pub fn toggle_track(&mut self, id: TrackId) -> bool {
        if self.dataset.track(id).is_none() {
            return false;
        }
        let hidden = self.visibility.toggle(id);
        self.relayout();
        self.scheduler.request_redraw(RedrawReason::Visibility);
        hidden
    }

    // ----- output -----

    /// The selection minus hidden tracks, plus the visible track list.
    pub fn export_payload(&self) -> ExportPayload<'_> {
        ExportPayload::new(
            self.selection.for_export(&self.dataset, &self.visibility),
            self.visibility.visible_tracks(&self.dataset).collect(),
        )
    }

    /// Render commands for one visible track in the current window.
    pub fn render(&self, track_id: TrackId) -> Vec<RenderCommand> {
        if self.visibility.is_hidden(track_id) {
            return Vec::new();
        }
        match self.dataset.track(track_id) {
            Some(track) => render_track(
                track,
                self.window,
                &self.viewport,
                &self.selection,
                &self.config,
            ),
            None => Vec::new(),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.scheduler.is_dirty()
    }

    /// Collect the pending redraw, if any.
    pub fn take_frame(&mut self) -> Option<FrameRequest> {
        self.scheduler.take_frame()
    }
}
