use serde::{Deserialize, Serialize};

use crate::theme::ThemeToken;
use crate::types::{Point, Rect};

/// A single, stateless render instruction.
///
/// View transforms emit a `Vec<RenderCommand>` per track; the presentation
/// layer replays them in order. Each command carries everything it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderCommand {
    /// Draw a filled rectangle, optionally labelled and tagged with the slice
    /// it represents (for hit regions and selection markers).
    DrawRect {
        rect: Rect,
        color: ThemeToken,
        border_color: Option<ThemeToken>,
        label: Option<String>,
        frame_id: Option<u64>,
    },

    /// Draw a text string at a position.
    DrawText {
        position: Point,
        text: String,
        color: ThemeToken,
        font_size: f64,
        align: TextAlign,
    },

    /// Restrict subsequent drawing to a rectangular region.
    SetClip { rect: Rect },

    /// Remove the active clip region.
    ClearClip,

    /// Begin a logical group (one track). Renderers may use it for batching.
    BeginGroup { id: String, label: Option<String> },

    /// End the current group.
    EndGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}
