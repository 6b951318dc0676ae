//! Character-offset string helpers
//!
//! The document's linear offset space counts Unicode scalar values, while
//! Rust strings are indexed by UTF-8 bytes. Characters like `ø`, `é`, `中`
//! and `🎉` are multi-byte, so a character offset must be converted before
//! a text run can be sliced or split.
//!
//! # Example
//! ```ignore
//! use crate::string_utils::split_at_char;
//!
//! let (left, right) = split_at_char("Hei på deg", 5);
//! assert_eq!(left, "Hei p");
//! assert_eq!(right, "å deg");
//! ```

// ─────────────────────────────────────────────────────────────────────────────
// Index Conversion Utilities
// ─────────────────────────────────────────────────────────────────────────────

/// Number of characters (Unicode scalar values) in `s`.
#[inline]
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Convert a character index to a byte index.
///
/// Returns the string length if `char_index` is beyond the string.
pub fn char_index_to_byte_index(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Split `s` at a character offset. Offsets past the end split at the end.
pub fn split_at_char(s: &str, char_index: usize) -> (&str, &str) {
    s.split_at(char_index_to_byte_index(s, char_index))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_len_multibyte() {
        assert_eq!(char_len("Hei på deg"), 10);
        assert_eq!(char_len("你好"), 2);
        assert_eq!(char_len("🎉"), 1);
        assert_eq!(char_len(""), 0);
    }

    #[test]
    fn test_char_to_byte_index() {
        let s = "på";
        assert_eq!(char_index_to_byte_index(s, 0), 0);
        assert_eq!(char_index_to_byte_index(s, 1), 1);
        assert_eq!(char_index_to_byte_index(s, 2), 3);
        assert_eq!(char_index_to_byte_index(s, 10), 3);
    }

    #[test]
    fn test_split_at_char_norwegian() {
        let (left, right) = split_at_char("Hei på deg", 5);
        assert_eq!(left, "Hei p");
        assert_eq!(right, "å deg");
    }

    #[test]
    fn test_split_at_char_emoji() {
        let (left, right) = split_at_char("Party 🎉 time", 7);
        assert_eq!(left, "Party 🎉");
        assert_eq!(right, " time");
    }
}
