//! Concurrent operation transform.
//!
//! Used by authorities to rebase an incoming operation over history the
//! sender had not seen. Clients never transform.

use crate::error::OpError;
use crate::op::{Component, Operation};

/// Transform two operations computed against the same text.
///
/// Returns `(a', b')` such that applying `a` then `b'` yields the same text
/// as applying `b` then `a'`. When both insert at the same position, `a`'s
/// text ends up first. The empty operation passes through unchanged, being
/// the identity on any text.
pub fn transform(a: &Operation, b: &Operation) -> Result<(Operation, Operation), OpError> {
    if a.is_noop() || b.is_noop() {
        return Ok((a.clone(), b.clone()));
    }
    let base = a.base_len().ok_or(OpError::Overflow)?;
    let consumed = b.base_len().ok_or(OpError::Overflow)?;
    if base != consumed {
        return Err(OpError::Malformed {
            expected: base,
            consumed,
        });
    }
    // The outputs retain at most what the other side produces.
    if a.target_len().is_none() || b.target_len().is_none() {
        return Err(OpError::Overflow);
    }

    let mut a_prime = Operation::new();
    let mut b_prime = Operation::new();
    let mut a_iter = a.iter().cloned();
    let mut b_iter = b.iter().cloned();
    let mut ca = a_iter.next();
    let mut cb = b_iter.next();

    loop {
        match (&ca, &cb) {
            (None, None) => break,
            (Some(Component::Insert(text)), _) => {
                a_prime.insert(text);
                b_prime.retain(text.chars().count());
                ca = a_iter.next();
            }
            (_, Some(Component::Insert(text))) => {
                a_prime.retain(text.chars().count());
                b_prime.insert(text);
                cb = b_iter.next();
            }
            (Some(Component::Retain(x)), Some(Component::Retain(y))) => {
                let (x, y) = (*x, *y);
                let n = x.min(y);
                a_prime.retain(n);
                b_prime.retain(n);
                ca = remainder(x, n, Component::Retain, &mut a_iter);
                cb = remainder(y, n, Component::Retain, &mut b_iter);
            }
            (Some(Component::Delete(x)), Some(Component::Delete(y))) => {
                // Both removed the same span.
                let (x, y) = (*x, *y);
                let n = x.min(y);
                ca = remainder(x, n, Component::Delete, &mut a_iter);
                cb = remainder(y, n, Component::Delete, &mut b_iter);
            }
            (Some(Component::Delete(x)), Some(Component::Retain(y))) => {
                let (x, y) = (*x, *y);
                let n = x.min(y);
                a_prime.delete(n);
                ca = remainder(x, n, Component::Delete, &mut a_iter);
                cb = remainder(y, n, Component::Retain, &mut b_iter);
            }
            (Some(Component::Retain(x)), Some(Component::Delete(y))) => {
                let (x, y) = (*x, *y);
                let n = x.min(y);
                b_prime.delete(n);
                ca = remainder(x, n, Component::Retain, &mut a_iter);
                cb = remainder(y, n, Component::Delete, &mut b_iter);
            }
            // Base lengths matched, so one side cannot run out early.
            (None, Some(_)) | (Some(_), None) => {
                return Err(OpError::Malformed {
                    expected: base,
                    consumed,
                });
            }
        }
    }

    Ok((a_prime, b_prime))
}

fn remainder(
    len: usize,
    used: usize,
    make: fn(usize) -> Component,
    rest: &mut impl Iterator<Item = Component>,
) -> Option<Component> {
    if len > used {
        Some(make(len - used))
    } else {
        rest.next()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::diff::{apply, diff};

    fn converge(base: &str, left: &str, right: &str) -> String {
        let a = diff(base, left);
        let b = diff(base, right);
        let (a_prime, b_prime) = transform(&a, &b).unwrap();
        let via_a = apply(&apply(base, &a).unwrap(), &b_prime).unwrap();
        let via_b = apply(&apply(base, &b).unwrap(), &a_prime).unwrap();
        assert_eq!(via_a, via_b);
        via_a
    }

    #[test]
    fn test_disjoint_edits_converge() {
        assert_eq!(converge("hello world", "Hello world", "hello world!"), "Hello world!");
    }

    #[test]
    fn test_same_position_insert_prefers_left() {
        assert_eq!(converge("ab", "aXb", "aYb"), "aXYb");
    }

    #[test]
    fn test_overlapping_deletes() {
        assert_eq!(converge("abcdef", "af", "abef"), "af");
    }

    #[test]
    fn test_delete_vs_insert_inside() {
        assert_eq!(converge("abcdef", "aef", "abcZdef"), "aZef");
    }

    #[test]
    fn test_noop_against_edit() {
        let a = Operation::new();
        let mut b = Operation::new();
        b.insert("x");
        let (a_prime, b_prime) = transform(&a, &b).unwrap();
        assert_eq!(apply(&apply("", &a).unwrap(), &b_prime).unwrap(), "x");
        assert_eq!(apply("x", &a_prime).unwrap(), "x");

        assert_eq!(converge("unchanged", "unchanged", "changed"), "changed");
        assert_eq!(converge("unchanged", "unchanged!", "unchanged"), "unchanged!");
    }

    #[test]
    fn test_base_mismatch_rejected() {
        let mut a = Operation::new();
        a.retain(3);
        let mut b = Operation::new();
        b.retain(4);
        assert!(transform(&a, &b).is_err());
    }

    #[test]
    fn test_overflowing_operation_rejected() {
        let hostile: Operation =
            serde_json::from_str(r#"[{"retain":18446744073709551615},{"retain":1}]"#).unwrap();
        let mut edit = Operation::new();
        edit.retain(2).insert("x");
        assert_eq!(transform(&edit, &hostile), Err(OpError::Overflow));
        assert_eq!(transform(&hostile, &edit), Err(OpError::Overflow));

        let mut full = Operation::new();
        full.insert("x").retain(usize::MAX);
        assert_eq!(transform(&full, &full), Err(OpError::Overflow));
    }

    #[test]
    fn test_unicode_lengths() {
        assert_eq!(converge("héllo", "héllo ✓", "¡héllo"), "¡héllo ✓");
    }

    /// Build an operation consuming exactly `len` chars from raw steps.
    fn build_op(len: usize, steps: Vec<(u8, usize, String)>) -> Operation {
        let mut op = Operation::new();
        let mut left = len;
        for (kind, n, text) in steps {
            let n = n % (left + 1);
            match kind % 3 {
                0 => {
                    op.retain(n);
                    left -= n;
                }
                1 => {
                    op.delete(n);
                    left -= n;
                }
                _ => {
                    op.insert(&text);
                }
            }
        }
        op.retain(left);
        op
    }

    fn steps() -> impl Strategy<Value = Vec<(u8, usize, String)>> {
        prop::collection::vec((any::<u8>(), 0usize..8, "[xy✓]{1,3}"), 0..8)
    }

    proptest! {
        #[test]
        fn prop_transform_converges(base in "[a-e🌍]{0,12}", left in steps(), right in steps()) {
            let len = base.chars().count();
            let a = build_op(len, left);
            let b = build_op(len, right);
            let (a_prime, b_prime) = transform(&a, &b).unwrap();

            let via_a = apply(&apply(&base, &a).unwrap(), &b_prime);
            let via_b = apply(&apply(&base, &b).unwrap(), &a_prime);
            prop_assert!(via_a.is_ok());
            prop_assert_eq!(via_a, via_b);
        }

        #[test]
        fn prop_transform_converges_on_diffs(
            base in "[ab🌍\\n]{0,10}",
            left in "[ab🌍\\n]{0,10}",
            right in "[ab🌍\\n]{0,10}",
        ) {
            let merged = converge(&base, &left, &right);
            if left == base {
                prop_assert_eq!(&merged, &right);
            }
            if right == base {
                prop_assert_eq!(&merged, &left);
            }
        }
    }
}
