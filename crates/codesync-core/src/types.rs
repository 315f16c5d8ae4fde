//! Caret and viewport types shared by edit surfaces.
//!
//! These types are framework-agnostic and can be used with any text buffer implementation.

/// Text selection with anchor and head positions.
///
/// The anchor is where the selection started, the head is where the cursor is now.
/// They may be in any order.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    /// Where selection started
    pub anchor: usize,
    /// Where cursor is now
    pub head: usize,
}

impl Selection {
    /// Create a new selection.
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// Create a collapsed selection (cursor position).
    pub fn collapsed(offset: usize) -> Self {
        Self {
            anchor: offset,
            head: offset,
        }
    }

    /// Clamp both ends to a document of `len` chars.
    pub fn clamped(&self, len: usize) -> Self {
        Self {
            anchor: self.anchor.min(len),
            head: self.head.min(len),
        }
    }
}

/// Saved caret and scroll position of a surface.
///
/// Captured before a remote patch and restored afterwards when the local
/// user is not focused on the buffer.
#[derive(Clone, Debug, Copy, PartialEq, Default)]
pub struct ViewState {
    pub selection: Selection,
    /// First visible line.
    pub scroll_line: usize,
    /// Horizontal scroll in pixels.
    pub scroll_left: f64,
}

impl ViewState {
    pub fn with_selection(selection: Selection) -> Self {
        Self {
            selection,
            ..Self::default()
        }
    }
}
