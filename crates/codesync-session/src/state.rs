//! Session status and per-document sync state.

use std::collections::VecDeque;

use codesync_common::{FileId, OperationEnvelope, Version};
use codesync_core::Operation;
use smol_str::SmolStr;

/// Lifecycle of a sync session.
///
/// UI can use this to show status indicators and error banners.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// Not connected, or no document requested.
    #[default]
    Idle,
    /// Join sent, waiting for the ready snapshot.
    Connecting {
        /// True when the join was triggered by a resync request.
        resyncing: bool,
    },
    /// Snapshot received; edits flow.
    Ready,
    /// The authority reported an error. Needs a resync or reconnect.
    Error(SmolStr),
}

impl SessionStatus {
    /// Returns true if the session is in an error state.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    pub fn is_resyncing(&self) -> bool {
        matches!(self, Self::Connecting { resyncing: true })
    }

    /// Returns the error message if in error state.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error(msg) => Some(msg.as_str()),
            _ => None,
        }
    }
}

/// A transmitted local edit awaiting acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOperation {
    pub base_version: Version,
    pub components: Operation,
}

/// Sync state for the active document.
///
/// Created when the ready snapshot arrives and dropped on file switch.
/// Exclusively owned by the controller.
#[derive(Debug, Clone)]
pub struct DocumentSessionState {
    pub file_id: FileId,
    pub content: String,
    /// Last version confirmed by the authority.
    pub server_version: Version,
    /// Version the next outgoing operation claims as its base.
    pub local_version: Version,
    /// Sent, unacknowledged local edits in submission order.
    pub pending: VecDeque<PendingOperation>,
    /// Peer operations held back while `pending` is non-empty.
    pub remote_buffer: VecDeque<OperationEnvelope>,
}

impl DocumentSessionState {
    /// Fresh state from a ready snapshot.
    pub fn from_snapshot(file_id: FileId, content: String, version: Version) -> Self {
        Self {
            file_id,
            content,
            server_version: version,
            local_version: version,
            pending: VecDeque::new(),
            remote_buffer: VecDeque::new(),
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
