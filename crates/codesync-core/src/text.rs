//! Text buffer abstraction for live document storage.
//!
//! The `TextBuffer` trait provides a common interface for text storage,
//! allowing the patch adapter to drive different backends (ropey for local
//! buffers, host editor models behind an FFI boundary).

use std::ops::Range;

/// A text buffer that supports char-addressed editing.
///
/// All offsets are in Unicode scalar values (chars), not bytes or UTF-16.
pub trait TextBuffer {
    /// Total length in chars (Unicode scalar values).
    fn len_chars(&self) -> usize;

    /// Insert text at char offset.
    fn insert(&mut self, char_offset: usize, text: &str);

    /// Delete char range.
    fn delete(&mut self, char_range: Range<usize>);

    /// Replace char range with text.
    fn replace(&mut self, char_range: Range<usize>, text: &str) {
        if !char_range.is_empty() {
            self.delete(char_range.clone());
        }
        if !text.is_empty() {
            self.insert(char_range.start, text);
        }
    }

    /// Replace the whole content.
    fn set_text(&mut self, text: &str) {
        self.replace(0..self.len_chars(), text);
    }

    /// Convert entire buffer to String.
    fn to_string(&self) -> String;
}

/// Ropey-backed text buffer for local editing.
///
/// Provides O(log n) editing operations.
#[derive(Clone, Debug, Default)]
pub struct EditorRope {
    rope: ropey::Rope,
}

impl EditorRope {
    /// Create from string.
    pub fn from_str(s: &str) -> Self {
        Self {
            rope: ropey::Rope::from_str(s),
        }
    }
}

impl TextBuffer for EditorRope {
    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn insert(&mut self, char_offset: usize, text: &str) {
        self.rope.insert(char_offset, text);
    }

    fn delete(&mut self, char_range: Range<usize>) {
        self.rope.remove(char_range);
    }

    // Rebuilding is cheaper than a full-range remove and insert.
    fn set_text(&mut self, text: &str) {
        self.rope = ropey::Rope::from_str(text);
    }

    fn to_string(&self) -> String {
        self.rope.to_string()
    }
}
