//! Error types for operation handling.

use thiserror::Error;

/// Errors raised while applying an operation to a text snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum OpError {
    /// The operation does not cover the source text exactly.
    ///
    /// Retained plus deleted lengths must equal the source length.
    #[error("malformed operation: source has {expected} chars but operation consumes {consumed}")]
    Malformed {
        /// Length of the source text in chars.
        expected: usize,
        /// Chars consumed by retain and delete components.
        consumed: usize,
    },

    /// Component lengths add up to more than `usize` can hold.
    #[error("malformed operation: component lengths overflow")]
    Overflow,
}
