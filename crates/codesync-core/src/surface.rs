//! Editing surface abstraction.
//!
//! An `EditSurface` is the live editor widget the sync engine patches: it owns
//! a text buffer (when a document is loaded), knows whether the local user is
//! focused on it, and can save and restore caret/scroll state.
//!
//! Only the patch adapter writes to a surface's content. Host editors with a
//! native batched-edit API should override [`EditSurface::apply_splices`].

use crate::op::Splice;
use crate::text::{EditorRope, TextBuffer};
use crate::types::ViewState;

/// A live editable text buffer with view state.
pub trait EditSurface {
    /// The buffer type used for text storage.
    type Buffer: TextBuffer;

    /// The loaded document buffer, or `None` if no document is loaded.
    fn buffer(&self) -> Option<&Self::Buffer>;

    /// Mutable access to the loaded document buffer.
    fn buffer_mut(&mut self) -> Option<&mut Self::Buffer>;

    /// Whether the local user's input focus is on this surface.
    fn has_focus(&self) -> bool;

    /// Capture the current caret/scroll state.
    fn save_view_state(&self) -> ViewState;

    /// Restore a previously captured caret/scroll state.
    fn restore_view_state(&mut self, state: ViewState);

    /// Current full text, if a document is loaded.
    fn text(&self) -> Option<String> {
        self.buffer().map(TextBuffer::to_string)
    }

    /// Replace the entire content in one step.
    fn set_content(&mut self, text: &str) {
        if let Some(buffer) = self.buffer_mut() {
            buffer.set_text(text);
        }
    }

    /// Apply a batch of splices as one edit.
    ///
    /// Splices arrive ordered from the highest offset to the lowest, so each
    /// one can be applied with offsets computed against the original text.
    fn apply_splices(&mut self, splices: &[Splice]) {
        if let Some(buffer) = self.buffer_mut() {
            for splice in splices {
                buffer.replace(splice.range.clone(), &splice.text);
            }
        }
    }
}

/// In-process surface backed by an [`EditorRope`].
///
/// Used by headless clients and tests. Caret state is tracked but not mapped
/// through edits; a focused user's caret stays where it was.
#[derive(Clone, Debug, Default)]
pub struct LocalSurface {
    buffer: Option<EditorRope>,
    focused: bool,
    view: ViewState,
    batches: usize,
}

impl LocalSurface {
    /// A surface with no document loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface with `text` loaded.
    pub fn with_text(text: &str) -> Self {
        Self {
            buffer: Some(EditorRope::from_str(text)),
            ..Self::default()
        }
    }

    /// Load a document, replacing any previous one.
    pub fn load(&mut self, text: &str) {
        self.buffer = Some(EditorRope::from_str(text));
        self.view = ViewState::default();
    }

    /// Unload the current document.
    pub fn unload(&mut self) {
        self.buffer = None;
    }

    pub fn set_focus(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// Move the caret, as the local user would.
    pub fn set_view(&mut self, view: ViewState) {
        self.view = view;
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    /// Number of edit batches applied through this surface.
    pub fn batches(&self) -> usize {
        self.batches
    }
}

impl EditSurface for LocalSurface {
    type Buffer = EditorRope;

    fn buffer(&self) -> Option<&EditorRope> {
        self.buffer.as_ref()
    }

    fn buffer_mut(&mut self) -> Option<&mut EditorRope> {
        self.buffer.as_mut()
    }

    fn has_focus(&self) -> bool {
        self.focused
    }

    fn save_view_state(&self) -> ViewState {
        self.view
    }

    fn restore_view_state(&mut self, state: ViewState) {
        let len = self.buffer.as_ref().map_or(0, TextBuffer::len_chars);
        self.view = ViewState {
            selection: state.selection.clamped(len),
            ..state
        };
    }

    fn set_content(&mut self, text: &str) {
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.set_text(text);
            self.batches += 1;
        }
    }

    fn apply_splices(&mut self, splices: &[Splice]) {
        if let Some(buffer) = self.buffer.as_mut() {
            for splice in splices {
                buffer.replace(splice.range.clone(), &splice.text);
            }
            self.batches += 1;
        }
    }
}
