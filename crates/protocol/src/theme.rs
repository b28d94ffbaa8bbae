use serde::{Deserialize, Serialize};

/// Semantic color tokens resolved by the renderer's active theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    // Slice palette, indexed by `Slice::color_class`.
    Slice0,
    Slice1,
    Slice2,
    Slice3,
    Slice4,
    Slice5,
    Slice6,
    Slice7,

    TrackBackground,
    TrackHeaderBackground,
    TrackHeaderText,

    SelectionHighlight,
    Border,
}

impl ThemeToken {
    /// Number of entries in the slice palette.
    pub const SLICE_PALETTE_LEN: u32 = 8;

    /// Palette token for a slice color class. Classes wrap around.
    pub fn slice_color(color_class: u32) -> Self {
        match color_class % Self::SLICE_PALETTE_LEN {
            0 => Self::Slice0,
            1 => Self::Slice1,
            2 => Self::Slice2,
            3 => Self::Slice3,
            4 => Self::Slice4,
            5 => Self::Slice5,
            6 => Self::Slice6,
            _ => Self::Slice7,
        }
    }
}
