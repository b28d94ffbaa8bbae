use tracepick_protocol::ThemeToken;

/// Deterministic color class for a grouping key (category, else name).
///
/// FNV-1a over the UTF-8 bytes, so the class is stable across runs and
/// platforms unlike `std`'s randomized hasher.
pub fn color_class(key: &str) -> u32 {
    let hash = key.bytes().fold(0x811c_9dc5_u32, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193)
    });
    hash % ThemeToken::SLICE_PALETTE_LEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_and_in_range() {
        assert_eq!(color_class("v8"), color_class("v8"));
        for key in ["", "gc", "layout", "paint", "a much longer category name"] {
            assert!(color_class(key) < ThemeToken::SLICE_PALETTE_LEN);
        }
    }

    #[test]
    fn empty_key_uses_offset_basis() {
        assert_eq!(color_class(""), 0x811c_9dc5 % ThemeToken::SLICE_PALETTE_LEN);
    }
}
