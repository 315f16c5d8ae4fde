//! Error types for sync session operations.

use codesync_common::FileId;
use codesync_core::OpError;
use miette::Diagnostic;
use thiserror::Error;

/// Errors that can occur while driving a sync session.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SyncError {
    /// The local user may not edit this file.
    #[error("not allowed to edit {0}")]
    #[diagnostic(code(codesync::session::permission_denied))]
    PermissionDenied(FileId),

    /// No document snapshot has been received yet.
    #[error("no document joined")]
    #[diagnostic(
        code(codesync::session::not_joined),
        help("wait for the ready snapshot before editing")
    )]
    NotJoined,

    /// A remote operation did not fit the local content.
    #[error(transparent)]
    #[diagnostic(code(codesync::op::malformed))]
    Malformed(#[from] OpError),

    /// The session task has shut down.
    #[error("sync session closed")]
    #[diagnostic(code(codesync::session::closed))]
    Closed,
}
