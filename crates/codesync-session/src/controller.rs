//! Per-document sync session controller.
//!
//! Drives the join/ready/operate/resync protocol for the active document.
//! Local edits are diffed against the last known content and sent with the
//! version they were based on. Peer operations that arrive while local edits
//! are still in flight are held back in arrival order and applied once every
//! local edit has been acknowledged. The client never transforms operations;
//! that is the authority's job.

use codesync_common::perf::TimingGuard;
use codesync_common::{
    AuthorityError, ClientId, ClientMessage, FileId, JoinRequest, OperationEnvelope,
    ReadySnapshot, ServerMessage, Version,
};
use codesync_core::{EditSurface, apply, diff, patch_surface};

use crate::error::SyncError;
use crate::outbox::Outbox;
use crate::permission::{AllowAll, EditPermission};
use crate::state::{DocumentSessionState, PendingOperation, SessionStatus};

/// Controller for one client's view of the active document.
///
/// Owns the document sync state, the editing surface it patches, and the
/// outbox it transmits through. All methods are synchronous; the caller
/// feeds events one at a time.
pub struct SyncController<S, O, P = AllowAll> {
    client_id: ClientId,
    active_file: Option<FileId>,
    doc: Option<DocumentSessionState>,
    status: SessionStatus,
    surface: S,
    outbox: O,
    permission: P,
}

impl<S, O> SyncController<S, O, AllowAll>
where
    S: EditSurface,
    O: Outbox,
{
    /// Controller that may edit every file.
    pub fn new(client_id: ClientId, surface: S, outbox: O) -> Self {
        Self::with_permission(client_id, surface, outbox, AllowAll)
    }
}

impl<S, O, P> SyncController<S, O, P>
where
    S: EditSurface,
    O: Outbox,
    P: EditPermission,
{
    pub fn with_permission(client_id: ClientId, surface: S, outbox: O, permission: P) -> Self {
        Self {
            client_id,
            active_file: None,
            doc: None,
            status: SessionStatus::Idle,
            surface,
            outbox,
            permission,
        }
    }

    // === Accessors ===

    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn active_file(&self) -> Option<&FileId> {
        self.active_file.as_ref()
    }

    /// Sync state of the active document, once its snapshot has arrived.
    pub fn document(&self) -> Option<&DocumentSessionState> {
        self.doc.as_ref()
    }

    pub fn content(&self) -> Option<&str> {
        self.doc.as_ref().map(|doc| doc.content.as_str())
    }

    pub fn server_version(&self) -> Option<Version> {
        self.doc.as_ref().map(|doc| doc.server_version)
    }

    pub fn local_version(&self) -> Option<Version> {
        self.doc.as_ref().map(|doc| doc.local_version)
    }

    pub fn pending_len(&self) -> usize {
        self.doc.as_ref().map_or(0, |doc| doc.pending.len())
    }

    pub fn buffered_len(&self) -> usize {
        self.doc.as_ref().map_or(0, |doc| doc.remote_buffer.len())
    }

    /// Message of the last authority error, until the next ready snapshot.
    pub fn error(&self) -> Option<&str> {
        self.status.error_message()
    }

    pub fn can_edit(&self) -> bool {
        self.active_file
            .as_ref()
            .is_some_and(|file_id| self.permission.can_edit(file_id))
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable surface access for the host (loading documents, focus).
    ///
    /// Content changes must go through [`SyncController::local_edit`].
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn outbox(&self) -> &O {
        &self.outbox
    }

    pub fn outbox_mut(&mut self) -> &mut O {
        &mut self.outbox
    }

    // === Connection lifecycle ===

    /// Transport (re)connected: join the active document again.
    pub fn connected(&mut self) {
        if let Some(file_id) = self.active_file.clone() {
            tracing::debug!(%file_id, "transport connected, joining");
            self.join(file_id, false);
        }
    }

    /// Transport dropped.
    ///
    /// Sync state is kept until the next snapshot replaces it, so unsent
    /// work stays visible; it is not resent.
    pub fn disconnected(&mut self) {
        tracing::debug!(
            pending = self.pending_len(),
            buffered = self.buffered_len(),
            "transport disconnected"
        );
        self.status = SessionStatus::Idle;
    }

    /// Make `file_id` the active document and request its snapshot.
    ///
    /// All sync state of the previous document is discarded.
    pub fn open(&mut self, file_id: FileId) {
        if let Some(previous) = self.doc.take() {
            tracing::debug!(
                file_id = %previous.file_id,
                dropped_pending = previous.pending.len(),
                dropped_buffered = previous.remote_buffer.len(),
                "discarding document state"
            );
        }
        self.active_file = Some(file_id.clone());
        self.join(file_id, false);
    }

    /// Close the active document.
    pub fn close(&mut self) {
        self.doc = None;
        self.active_file = None;
        self.status = SessionStatus::Idle;
    }

    fn join(&mut self, file_id: FileId, resyncing: bool) {
        self.outbox.send(ClientMessage::Join(JoinRequest { file_id }));
        self.status = SessionStatus::Connecting { resyncing };
    }

    // === Authority messages ===

    /// Dispatch a message from the authority.
    pub fn handle(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Ready(snapshot) => self.on_ready(snapshot),
            ServerMessage::OperationApplied(envelope) => self.on_operation_applied(envelope),
            ServerMessage::Error(error) => self.on_error(error),
            ServerMessage::Resync => self.on_resync(),
        }
    }

    fn is_active(&self, file_id: &FileId) -> bool {
        self.active_file.as_ref() == Some(file_id)
    }

    fn on_ready(&mut self, snapshot: ReadySnapshot) {
        if !self.is_active(&snapshot.file_id) {
            tracing::debug!(file_id = %snapshot.file_id, "ignoring snapshot for inactive file");
            return;
        }

        if let Some(previous) = &self.doc {
            if previous.has_pending() {
                tracing::warn!(
                    file_id = %snapshot.file_id,
                    dropped = previous.pending.len(),
                    "snapshot supersedes unacknowledged local edits"
                );
            }
        }

        tracing::info!(
            file_id = %snapshot.file_id,
            version = snapshot.version,
            "document ready"
        );
        let doc = DocumentSessionState::from_snapshot(
            snapshot.file_id,
            snapshot.content,
            snapshot.version,
        );
        self.doc = Some(doc);
        self.status = SessionStatus::Ready;
        self.publish();
    }

    fn on_operation_applied(&mut self, envelope: OperationEnvelope) {
        if !self.is_active(&envelope.file_id) {
            tracing::trace!(file_id = %envelope.file_id, "ignoring operation for inactive file");
            return;
        }
        let Some(doc) = self.doc.as_mut() else {
            tracing::debug!("operation before snapshot, ignoring");
            return;
        };

        if envelope.client_id == self.client_id {
            let Some(oldest) = doc.pending.front() else {
                tracing::warn!(
                    version = envelope.version,
                    "acknowledgment with nothing pending, rejected"
                );
                return;
            };
            if envelope.version <= oldest.base_version {
                tracing::warn!(
                    version = envelope.version,
                    expected_after = oldest.base_version,
                    "out-of-order acknowledgment, rejected"
                );
                return;
            }

            doc.pending.pop_front();
            doc.server_version = envelope.version;
            tracing::debug!(
                version = envelope.version,
                pending = doc.pending.len(),
                "local operation acknowledged"
            );

            if doc.pending.is_empty() {
                self.drain_remote_buffer();
            }
        } else if doc.has_pending() {
            tracing::debug!(
                version = envelope.version,
                from = %envelope.client_id,
                buffered = doc.remote_buffer.len() + 1,
                "buffering peer operation behind local edits"
            );
            doc.remote_buffer.push_back(envelope);
        } else if self.apply_remote(envelope) {
            self.publish();
        }
    }

    fn on_error(&mut self, error: AuthorityError) {
        tracing::warn!(message = %error.message, "authority error");
        self.status = SessionStatus::Error(error.message.into());
    }

    fn on_resync(&mut self) {
        let Some(file_id) = self.active_file.clone() else {
            tracing::debug!("resync with no active file, ignoring");
            return;
        };
        tracing::info!(%file_id, "resync requested");
        self.join(file_id, true);
    }

    /// Apply one peer operation to the content. Returns whether it applied.
    fn apply_remote(&mut self, envelope: OperationEnvelope) -> bool {
        let Some(doc) = self.doc.as_mut() else {
            return false;
        };
        match apply(&doc.content, &envelope.components) {
            Ok(content) => {
                doc.content = content;
                doc.server_version = doc.server_version.max(envelope.version);
                if doc.pending.is_empty() {
                    doc.local_version = doc.server_version;
                }
                true
            }
            Err(error) => {
                tracing::warn!(
                    %error,
                    version = envelope.version,
                    from = %envelope.client_id,
                    "dropping remote operation"
                );
                false
            }
        }
    }

    fn drain_remote_buffer(&mut self) {
        let Some(doc) = self.doc.as_mut() else {
            return;
        };
        let buffered = std::mem::take(&mut doc.remote_buffer);
        doc.local_version = doc.server_version;
        if buffered.is_empty() {
            return;
        }

        let _timing = TimingGuard::new("drain remote buffer");
        let mut applied = 0;
        for envelope in buffered {
            if self.apply_remote(envelope) {
                applied += 1;
            }
        }
        if applied > 0 {
            self.publish();
        }
    }

    /// Push the current content to the editing surface.
    fn publish(&mut self) {
        if let Some(doc) = &self.doc {
            patch_surface(&mut self.surface, &doc.content);
        }
    }

    // === Local edits ===

    /// The editing surface now holds `new_value`.
    ///
    /// Returns the base version of the transmitted operation, or `None` if
    /// the text did not change.
    pub fn local_edit(&mut self, new_value: &str) -> Result<Option<Version>, SyncError> {
        let Some(file_id) = self.active_file.as_ref() else {
            return Err(SyncError::NotJoined);
        };
        if !self.permission.can_edit(file_id) {
            tracing::debug!(%file_id, "edit rejected, no write permission");
            return Err(SyncError::PermissionDenied(file_id.clone()));
        }
        let Some(doc) = self.doc.as_mut() else {
            return Err(SyncError::NotJoined);
        };

        let components = diff(&doc.content, new_value);
        if components.is_noop() {
            doc.content = new_value.to_owned();
            return Ok(None);
        }

        let base_version = doc.local_version;
        doc.local_version += 1;
        doc.pending.push_back(PendingOperation {
            base_version,
            components: components.clone(),
        });
        doc.content = new_value.to_owned();

        tracing::debug!(
            file_id = %doc.file_id,
            base_version,
            components = components.len(),
            pending = doc.pending.len(),
            "sending local operation"
        );

        let envelope = OperationEnvelope {
            file_id: doc.file_id.clone(),
            version: base_version,
            components,
            client_id: self.client_id.clone(),
        };
        self.outbox.send(ClientMessage::Operation(envelope));
        Ok(Some(base_version))
    }
}
