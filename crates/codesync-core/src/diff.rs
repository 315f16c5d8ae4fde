//! Operation codec: text snapshots to edit scripts and back.
//!
//! `diff` trims the common prefix and suffix and describes the differing
//! middle as one delete followed by one insert. It is deterministic and keeps
//! unchanged regions as retains so the transmitted payload only carries the
//! edited span.

use crate::error::OpError;
use crate::op::{Component, Operation};

/// Length of a shared run, in both units the codec needs.
#[derive(Clone, Copy, Debug, Default)]
struct Run {
    chars: usize,
    bytes: usize,
}

fn common_prefix(a: &str, b: &str) -> Run {
    let mut run = Run::default();
    for (ca, cb) in a.chars().zip(b.chars()) {
        if ca != cb {
            break;
        }
        run.chars += 1;
        run.bytes += ca.len_utf8();
    }
    run
}

fn common_suffix(a: &str, b: &str) -> Run {
    let mut run = Run::default();
    for (ca, cb) in a.chars().rev().zip(b.chars().rev()) {
        if ca != cb {
            break;
        }
        run.chars += 1;
        run.bytes += ca.len_utf8();
    }
    run
}

/// Compute an operation turning `old` into `new`.
///
/// Returns the empty operation when the texts are equal.
pub fn diff(old: &str, new: &str) -> Operation {
    let mut op = Operation::new();
    if old == new {
        return op;
    }

    let prefix = common_prefix(old, new);
    let old_rest = &old[prefix.bytes..];
    let new_rest = &new[prefix.bytes..];

    // Suffix is measured on the remainders so it can never overlap the prefix.
    let suffix = common_suffix(old_rest, new_rest);
    let old_mid = &old_rest[..old_rest.len() - suffix.bytes];
    let new_mid = &new_rest[..new_rest.len() - suffix.bytes];

    op.retain(prefix.chars)
        .delete(old_mid.chars().count())
        .insert(new_mid)
        .retain(suffix.chars);

    tracing::trace!(
        prefix = prefix.chars,
        suffix = suffix.chars,
        components = op.len(),
        "diff computed"
    );
    op
}

/// Apply `op` to `text`, producing the edited text.
///
/// The input is never modified. Fails with [`OpError::Malformed`] when the
/// retained and deleted lengths do not add up to the length of `text`, and
/// with [`OpError::Overflow`] when they cannot be added up at all.
pub fn apply(text: &str, op: &Operation) -> Result<String, OpError> {
    if op.is_noop() {
        return Ok(text.to_owned());
    }

    let expected = text.chars().count();
    let consumed = op.base_len().ok_or(OpError::Overflow)?;
    if consumed != expected {
        return Err(OpError::Malformed { expected, consumed });
    }

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    for component in op {
        match component {
            Component::Retain(n) => out.extend(chars.by_ref().take(*n)),
            Component::Delete(n) => chars.by_ref().take(*n).for_each(drop),
            Component::Insert(s) => out.push_str(s),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn roundtrip(old: &str, new: &str) {
        let op = diff(old, new);
        assert_eq!(apply(old, &op).as_deref(), Ok(new), "{old:?} -> {new:?}");
        assert_eq!(
            op.base_len(),
            Some(if op.is_noop() { 0 } else { old.chars().count() })
        );
    }

    #[test]
    fn test_insert_into_empty() {
        let op = diff("", "hello");
        assert_eq!(op.components(), &[Component::Insert("hello".into())]);
    }

    #[test]
    fn test_identical_is_empty() {
        assert!(diff("same text", "same text").is_noop());
        assert!(diff("", "").is_noop());
        assert_eq!(apply("same text", &Operation::new()).unwrap(), "same text");
    }

    #[test]
    fn test_prefix_and_suffix_are_retained() {
        insta::assert_yaml_snapshot!(diff("let x = 1;", "let y = 1;"), @r#"
        - retain: 4
        - delete: 1
        - insert: y
        - retain: 5
        "#);
    }

    #[test]
    fn test_delete_only() {
        let op = diff("abcdef", "abef");
        assert_eq!(
            op.components(),
            &[
                Component::Retain(2),
                Component::Delete(2),
                Component::Retain(2)
            ]
        );
    }

    #[test]
    fn test_deterministic() {
        let a = diff("fn main() {}", "fn main() { run(); }");
        let b = diff("fn main() {}", "fn main() { run(); }");
        assert_eq!(a, b);
    }

    #[test]
    fn test_roundtrips() {
        let cases = [
            ("", ""),
            ("", "abc"),
            ("abc", ""),
            ("aaa", "aaaa"),
            ("aaaa", "aa"),
            ("abc", "xbz"),
            ("hello world", "hello brave new world"),
            ("line1\nline2\n", "line1\nline1.5\nline2\n"),
            ("héllo 🌍", "hallo 🌎!"),
            ("🌍🌍🌍", "🌍🌎🌍"),
        ];
        for (old, new) in cases {
            roundtrip(old, new);
            roundtrip(new, old);
        }
    }

    #[test]
    fn test_malformed_retain_too_long() {
        let op = Operation::from_components(vec![Component::Retain(5)]);
        assert_eq!(
            apply("abc", &op),
            Err(OpError::Malformed {
                expected: 3,
                consumed: 5
            })
        );
    }

    #[test]
    fn test_malformed_too_short() {
        let op = Operation::from_components(vec![Component::Retain(1), Component::Delete(1)]);
        assert!(matches!(apply("abc", &op), Err(OpError::Malformed { .. })));
    }

    #[test]
    fn test_overflowing_operation_rejected() {
        let op: Operation =
            serde_json::from_str(r#"[{"retain":18446744073709551615},{"retain":1}]"#).unwrap();
        assert_eq!(apply("", &op), Err(OpError::Overflow));
        assert_eq!(apply("abc", &op), Err(OpError::Overflow));
    }

    #[test]
    fn test_apply_counts_chars_not_bytes() {
        let op = Operation::from_components(vec![
            Component::Retain(1),
            Component::Delete(1),
            Component::Insert("ü".into()),
        ]);
        assert_eq!(apply("🌍x", &op).unwrap(), "🌍ü");
    }

    /// Small alphabet so generated pairs share prefixes and suffixes.
    fn near_text() -> impl Strategy<Value = String> {
        "[ab🌍é\n]{0,10}"
    }

    proptest! {
        #[test]
        fn prop_roundtrip_any_text(old in any::<String>(), new in any::<String>()) {
            let op = diff(&old, &new);
            prop_assert_eq!(apply(&old, &op), Ok(new.clone()));
            prop_assert_eq!(op.target_len(), Some(if op.is_noop() { 0 } else { new.chars().count() }));
        }

        #[test]
        fn prop_roundtrip_similar_text(
            prefix in near_text(),
            old in near_text(),
            new in near_text(),
            suffix in near_text(),
        ) {
            let old = format!("{prefix}{old}{suffix}");
            let new = format!("{prefix}{new}{suffix}");
            let op = diff(&old, &new);
            prop_assert_eq!(apply(&old, &op), Ok(new));
            // At most retain, delete, insert, retain.
            prop_assert!(op.len() <= 4);
        }

        #[test]
        fn prop_empty_operation_is_identity(text in any::<String>()) {
            prop_assert_eq!(apply(&text, &Operation::new()), Ok(text.clone()));
        }
    }
}
