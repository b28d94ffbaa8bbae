//! Redraw coalescing.
//!
//! Mutations mark the view dirty and ask for a redraw. At most one request is
//! ever pending; further requests before the next frame fold into it. The
//! host drives frames by calling [`RenderScheduler::take_frame`] or
//! [`RenderScheduler::run_frame`] at its display-frame boundary.

use std::collections::BTreeSet;

use serde::Serialize;

/// What triggered a redraw request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum RedrawReason {
    Load,
    Pan,
    Zoom,
    Window,
    Resize,
    Selection,
    Visibility,
}

/// Result of [`RenderScheduler::request_redraw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// The view was clean; a new frame is now pending.
    Scheduled,
    /// A frame was already pending and absorbed this request.
    Coalesced,
}

/// One coalesced redraw handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRequest {
    /// Monotonic frame number, starting at 1.
    pub seq: u64,
    /// Every distinct reason requested since the previous frame.
    pub reasons: BTreeSet<RedrawReason>,
    /// How many requests folded into this frame.
    pub requests: usize,
}

#[derive(Debug, Clone)]
struct PendingFrame {
    reasons: BTreeSet<RedrawReason>,
    requests: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RenderScheduler {
    pending: Option<PendingFrame>,
    last_seq: u64,
    coalesced: u64,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the view dirty. Never blocks and never draws.
    pub fn request_redraw(&mut self, reason: RedrawReason) -> ScheduleOutcome {
        match &mut self.pending {
            Some(pending) => {
                pending.reasons.insert(reason);
                pending.requests += 1;
                self.coalesced += 1;
                log::trace!(
                    "redraw {reason:?} coalesced into pending frame ({} requests)",
                    pending.requests
                );
                ScheduleOutcome::Coalesced
            }
            None => {
                self.pending = Some(PendingFrame {
                    reasons: BTreeSet::from([reason]),
                    requests: 1,
                });
                log::trace!("redraw {reason:?} scheduled");
                ScheduleOutcome::Scheduled
            }
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.pending.is_some()
    }

    /// Clear the pending slot and return what it held.
    pub fn take_frame(&mut self) -> Option<FrameRequest> {
        let pending = self.pending.take()?;
        self.last_seq += 1;
        Some(FrameRequest {
            seq: self.last_seq,
            reasons: pending.reasons,
            requests: pending.requests,
        })
    }

    /// Run `draw` for the pending frame, if any. Returns whether it ran.
    ///
    /// The slot is cleared before `draw` runs, so requests made while drawing
    /// schedule the next frame.
    pub fn run_frame(&mut self, draw: impl FnOnce(&FrameRequest)) -> bool {
        match self.take_frame() {
            Some(frame) => {
                draw(&frame);
                true
            }
            None => false,
        }
    }

    /// Frames handed out so far.
    pub fn frames(&self) -> u64 {
        self.last_seq
    }

    /// Requests absorbed into an already pending frame.
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_coalesces_into_one_frame() {
        let mut s = RenderScheduler::new();
        assert_eq!(s.request_redraw(RedrawReason::Pan), ScheduleOutcome::Scheduled);
        assert_eq!(s.request_redraw(RedrawReason::Pan), ScheduleOutcome::Coalesced);
        assert_eq!(s.request_redraw(RedrawReason::Zoom), ScheduleOutcome::Coalesced);
        assert!(s.is_dirty());

        let frame = s.take_frame().unwrap();
        assert_eq!(frame.seq, 1);
        assert_eq!(frame.requests, 3);
        assert_eq!(
            frame.reasons.into_iter().collect::<Vec<_>>(),
            vec![RedrawReason::Pan, RedrawReason::Zoom]
        );
        assert!(!s.is_dirty());
        assert!(s.take_frame().is_none());
        assert_eq!(s.coalesced(), 2);
    }

    #[test]
    fn run_frame_only_when_dirty() {
        let mut s = RenderScheduler::new();
        let mut drawn = Vec::new();
        assert!(!s.run_frame(|f| drawn.push(f.seq)));

        s.request_redraw(RedrawReason::Selection);
        assert!(s.run_frame(|f| drawn.push(f.seq)));
        s.request_redraw(RedrawReason::Resize);
        assert!(s.run_frame(|f| drawn.push(f.seq)));
        assert_eq!(drawn, vec![1, 2]);
        assert_eq!(s.frames(), 2);
    }
}
