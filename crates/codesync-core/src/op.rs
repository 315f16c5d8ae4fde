//! Edit scripts: ordered retain/delete/insert components.
//!
//! An [`Operation`] walks a source text from start to end. `Retain` copies
//! chars through, `Delete` skips them, `Insert` emits new text at the current
//! position. All lengths are in Unicode scalar values (chars), not bytes.
//!
//! On the wire each component is a single-key object:
//! `{"retain": 3}`, `{"delete": 1}` or `{"insert": "abc"}`.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// One step of an edit script.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    /// Skip `n` chars unchanged.
    Retain(usize),
    /// Remove the next `n` chars.
    Delete(usize),
    /// Insert literal text at the current position.
    Insert(SmolStr),
}

impl Component {
    /// Chars of the source text this component consumes.
    pub fn consumed(&self) -> usize {
        match self {
            Component::Retain(n) | Component::Delete(n) => *n,
            Component::Insert(_) => 0,
        }
    }

    /// Chars this component contributes to the output text.
    pub fn produced(&self) -> usize {
        match self {
            Component::Retain(n) => *n,
            Component::Delete(_) => 0,
            Component::Insert(text) => text.chars().count(),
        }
    }
}

/// An ordered sequence of components describing a text transformation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Operation {
    components: Vec<Component>,
}

/// A position-addressed replacement against the source text.
///
/// `range` is in source char offsets; the chars in `range` are replaced by
/// `text`. Pure insertions have an empty range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Splice {
    pub range: Range<usize>,
    pub text: SmolStr,
}

impl Operation {
    /// Create an empty operation (the identity edit).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw components without normalizing.
    ///
    /// Used for decoded wire data; the codec tolerates zero-length and
    /// unmerged components.
    pub fn from_components(components: Vec<Component>) -> Self {
        Self { components }
    }

    /// Append a retain, merging with a preceding retain.
    pub fn retain(&mut self, n: usize) -> &mut Self {
        if n == 0 {
            return self;
        }
        match self.components.last_mut() {
            Some(Component::Retain(last)) => *last += n,
            _ => self.components.push(Component::Retain(n)),
        }
        self
    }

    /// Append a delete, merging with a preceding delete.
    pub fn delete(&mut self, n: usize) -> &mut Self {
        if n == 0 {
            return self;
        }
        match self.components.last_mut() {
            Some(Component::Delete(last)) => *last += n,
            _ => self.components.push(Component::Delete(n)),
        }
        self
    }

    /// Append an insert, merging with a preceding insert.
    pub fn insert(&mut self, text: &str) -> &mut Self {
        if text.is_empty() {
            return self;
        }
        match self.components.last_mut() {
            Some(Component::Insert(last)) => {
                let mut merged = String::with_capacity(last.len() + text.len());
                merged.push_str(last);
                merged.push_str(text);
                *last = merged.into();
            }
            _ => self.components.push(Component::Insert(text.into())),
        }
        self
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn into_components(self) -> Vec<Component> {
        self.components
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Component> {
        self.components.iter()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// True when the operation has no components at all.
    ///
    /// The empty operation is the identity for every source text.
    pub fn is_noop(&self) -> bool {
        self.components.is_empty()
    }

    /// Length in chars of the text this operation must be applied to.
    ///
    /// `None` when the component lengths overflow `usize`, which only a
    /// hostile or corrupt wire operation can produce.
    pub fn base_len(&self) -> Option<usize> {
        self.components
            .iter()
            .try_fold(0usize, |sum, c| sum.checked_add(c.consumed()))
    }

    /// Length in chars of the text this operation produces.
    pub fn target_len(&self) -> Option<usize> {
        self.components
            .iter()
            .try_fold(0usize, |sum, c| sum.checked_add(c.produced()))
    }

    /// Convert to absolute splices over the source text, in ascending order.
    ///
    /// Retains only advance the running offset. A delete directly adjacent
    /// to an insert collapses into one replacement splice. Offsets saturate,
    /// so an operation whose [`base_len`](Self::base_len) overflows yields
    /// ranges no buffer can hold; validate with `apply` first.
    pub fn splices(&self) -> Vec<Splice> {
        let mut splices: Vec<Splice> = Vec::new();
        let mut offset: usize = 0;

        for component in &self.components {
            let (range, text) = match component {
                Component::Retain(n) => {
                    offset = offset.saturating_add(*n);
                    continue;
                }
                Component::Delete(0) => continue,
                Component::Delete(n) => {
                    let end = offset.saturating_add(*n);
                    let range = offset..end;
                    offset = end;
                    (range, SmolStr::default())
                }
                Component::Insert(text) if text.is_empty() => continue,
                Component::Insert(text) => (offset..offset, text.clone()),
            };

            match splices.last_mut() {
                Some(last) if last.range.end == range.start => {
                    last.range.end = range.end;
                    if !text.is_empty() {
                        let mut merged = String::with_capacity(last.text.len() + text.len());
                        merged.push_str(&last.text);
                        merged.push_str(&text);
                        last.text = merged.into();
                    }
                }
                _ => splices.push(Splice { range, text }),
            }
        }

        splices
    }
}

impl From<Vec<Component>> for Operation {
    fn from(components: Vec<Component>) -> Self {
        Self::from_components(components)
    }
}

impl<'a> IntoIterator for &'a Operation {
    type Item = &'a Component;
    type IntoIter = std::slice::Iter<'a, Component>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.iter()
    }
}
