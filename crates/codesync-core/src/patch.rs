//! Replaying text changes into a live surface.
//!
//! Rather than resetting the whole buffer on every remote edit, the target
//! text is diffed against what the surface currently shows and only the
//! changed spans are spliced in. Caret and scroll state survive the patch
//! unless the local user is typing in the surface.

use crate::diff::diff;
use crate::op::Splice;
use crate::surface::EditSurface;

/// What [`patch_surface`] did to the surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatchOutcome {
    /// No document loaded; nothing touched.
    Unloaded,
    /// Surface already showed the target text.
    Unchanged,
    /// Applied this many splices in one batch.
    Spliced(usize),
    /// Content replaced wholesale.
    Replaced,
}

/// Bring `surface` to `target` with the smallest splice batch the codec finds.
pub fn patch_surface<S: EditSurface>(surface: &mut S, target: &str) -> PatchOutcome {
    let Some(current) = surface.text() else {
        tracing::trace!("patch skipped, no document loaded");
        return PatchOutcome::Unloaded;
    };
    if current == target {
        return PatchOutcome::Unchanged;
    }

    let splices = diff(&current, target).splices();
    write_batch(surface, target, splices)
}

/// Write `splices` (ascending) to a surface known to differ from `target`.
///
/// The trimmed diff always yields at least one splice for differing texts;
/// an empty list still falls back to replacing the whole content.
fn write_batch<S: EditSurface>(
    surface: &mut S,
    target: &str,
    mut splices: Vec<Splice>,
) -> PatchOutcome {
    let view = surface.save_view_state();
    let focused = surface.has_focus();

    let outcome = if splices.is_empty() {
        surface.set_content(target);
        PatchOutcome::Replaced
    } else {
        // Highest offset first keeps the remaining offsets valid.
        splices.reverse();
        surface.apply_splices(&splices);
        PatchOutcome::Spliced(splices.len())
    };

    if !focused {
        surface.restore_view_state(view);
    }

    tracing::debug!(?outcome, focused, "patched surface");
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::LocalSurface;
    use crate::text::{EditorRope, TextBuffer};
    use crate::types::{Selection, ViewState};

    #[test]
    fn test_unloaded_is_noop() {
        let mut surface = LocalSurface::new();
        assert_eq!(patch_surface(&mut surface, "abc"), PatchOutcome::Unloaded);
        assert_eq!(surface.text(), None);
        assert_eq!(surface.batches(), 0);
    }

    #[test]
    fn test_unchanged_is_noop() {
        let mut surface = LocalSurface::with_text("abc");
        assert_eq!(patch_surface(&mut surface, "abc"), PatchOutcome::Unchanged);
        assert_eq!(surface.batches(), 0);
    }

    #[test]
    fn test_splices_into_middle() {
        let mut surface = LocalSurface::with_text("fn main() {}");
        let outcome = patch_surface(&mut surface, "fn main() { go(); }");
        assert_eq!(outcome, PatchOutcome::Spliced(1));
        assert_eq!(surface.text().as_deref(), Some("fn main() { go(); }"));
        assert_eq!(surface.batches(), 1);
    }

    #[test]
    fn test_whole_text_swap_is_one_splice() {
        let mut surface = LocalSurface::with_text("abc");
        assert_eq!(patch_surface(&mut surface, "xyz"), PatchOutcome::Spliced(1));
        assert_eq!(patch_surface(&mut surface, ""), PatchOutcome::Spliced(1));
        assert_eq!(patch_surface(&mut surface, "🌍"), PatchOutcome::Spliced(1));
        assert_eq!(surface.text().as_deref(), Some("🌍"));
        assert_eq!(surface.batches(), 3);
    }

    #[test]
    fn test_empty_batch_replaces_content() {
        let mut surface = LocalSurface::with_text("old text");
        surface.set_view(ViewState::with_selection(Selection::collapsed(8)));

        let outcome = write_batch(&mut surface, "new", Vec::new());
        assert_eq!(outcome, PatchOutcome::Replaced);
        assert_eq!(surface.text().as_deref(), Some("new"));
        assert_eq!(surface.batches(), 1);
        assert_eq!(surface.view().selection, Selection::collapsed(3));
    }

    #[test]
    fn test_unfocused_view_restored() {
        let mut surface = LocalSurface::with_text("hello world");
        let view = ViewState {
            selection: Selection::new(2, 4),
            scroll_line: 7,
            scroll_left: 12.5,
        };
        surface.set_view(view);

        patch_surface(&mut surface, "hello brave world");
        assert_eq!(surface.view(), view);
    }

    #[test]
    fn test_restored_selection_clamped_to_new_length() {
        let mut surface = LocalSurface::with_text("a long line of text");
        surface.set_view(ViewState::with_selection(Selection::collapsed(19)));

        patch_surface(&mut surface, "short");
        assert_eq!(surface.view().selection, Selection::collapsed(5));
    }

    /// Surface that moves its caret on every edit, like a real editor
    /// widget does, so restoring can be observed.
    #[derive(Default)]
    struct JumpySurface {
        buffer: Option<EditorRope>,
        focused: bool,
        view: ViewState,
        seen: Vec<Splice>,
    }

    impl EditSurface for JumpySurface {
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
            self.view = state;
        }

        fn apply_splices(&mut self, splices: &[Splice]) {
            self.seen.extend_from_slice(splices);
            let buffer = self.buffer.as_mut().unwrap();
            for splice in splices {
                buffer.replace(splice.range.clone(), &splice.text);
                self.view.selection = Selection::collapsed(splice.range.start);
            }
        }
    }

    #[test]
    fn test_focused_caret_not_overridden() {
        let mut surface = JumpySurface {
            buffer: Some(EditorRope::from_str("abcdef")),
            focused: true,
            view: ViewState::with_selection(Selection::collapsed(6)),
            seen: Vec::new(),
        };

        patch_surface(&mut surface, "abXdef");
        // The widget moved the caret itself; the patch did not restore it.
        assert_eq!(surface.view.selection, Selection::collapsed(2));
        assert_eq!(surface.buffer.as_ref().unwrap().to_string(), "abXdef");
    }

    #[test]
    fn test_unfocused_caret_restored_after_widget_moves_it() {
        let mut surface = JumpySurface {
            buffer: Some(EditorRope::from_str("abcdef")),
            focused: false,
            view: ViewState::with_selection(Selection::collapsed(6)),
            seen: Vec::new(),
        };

        patch_surface(&mut surface, "abXdef");
        assert_eq!(surface.view.selection, Selection::collapsed(6));
    }

    #[test]
    fn test_descending_batch_keeps_offsets_valid() {
        use crate::diff::apply;
        use crate::op::{Component, Operation};

        let source = "one two three";
        let op = Operation::from_components(vec![
            Component::Delete(3),
            Component::Insert("ONE".into()),
            Component::Retain(1),
            Component::Insert("2".into()),
            Component::Delete(3),
            Component::Retain(6),
        ]);
        let mut splices = op.splices();
        assert_eq!(splices.len(), 2);
        splices.reverse();

        let mut surface = LocalSurface::with_text(source);
        surface.apply_splices(&splices);
        assert_eq!(surface.text(), apply(source, &op).ok());
        assert_eq!(surface.text().as_deref(), Some("ONE 2 three"));
    }
}
