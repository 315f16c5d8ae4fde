//! Async session reactor.
//!
//! Owns a [`SyncController`] on a tokio task and turns it into a pair of
//! channels: transport events and local edits go in as [`SessionInput`],
//! outgoing wire messages and surface updates come out as [`SessionOutput`].
//! Inputs are processed one at a time in arrival order.

use codesync_common::{ClientId, ClientMessage, FileId, ServerMessage};
use codesync_core::{EditSurface, patch_surface};
use tokio::sync::mpsc;

use crate::controller::SyncController;
use crate::error::SyncError;
use crate::outbox::QueuedOutbox;
use crate::permission::EditPermission;
use crate::state::SessionStatus;

/// Input messages to the session reactor.
#[derive(Debug, Clone)]
pub enum SessionInput {
    /// Transport link established.
    Connected,
    /// Transport link lost.
    Disconnected,
    /// Decoded message from the authority.
    Message(ServerMessage),
    /// Undecoded JSON frame from the authority.
    Raw(String),
    /// The editing surface now holds this text.
    LocalEdit(String),
    /// Switch to another document.
    Open(FileId),
    /// Close the active document.
    Close,
}

/// Output messages from the session reactor.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutput {
    /// Transmit to the authority.
    Send(ClientMessage),
    /// Session status changed.
    Status(SessionStatus),
    /// Document content changed due to remote activity or a snapshot.
    Content(String),
    /// A local edit was refused.
    Rejected(SyncError),
}

/// Handle for feeding a running reactor.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionInput>,
}

impl SessionHandle {
    pub async fn send(&self, input: SessionInput) -> Result<(), SyncError> {
        self.tx.send(input).await.map_err(|_| SyncError::Closed)
    }

    pub async fn connected(&self) -> Result<(), SyncError> {
        self.send(SessionInput::Connected).await
    }

    pub async fn disconnected(&self) -> Result<(), SyncError> {
        self.send(SessionInput::Disconnected).await
    }

    pub async fn open(&self, file_id: impl Into<FileId>) -> Result<(), SyncError> {
        self.send(SessionInput::Open(file_id.into())).await
    }

    pub async fn local_edit(&self, text: impl Into<String>) -> Result<(), SyncError> {
        self.send(SessionInput::LocalEdit(text.into())).await
    }

    pub async fn deliver(&self, message: ServerMessage) -> Result<(), SyncError> {
        self.send(SessionInput::Message(message)).await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Reactor state: a controller plus its channels.
pub struct SessionReactor<S, P> {
    controller: SyncController<S, QueuedOutbox, P>,
    inputs: mpsc::Receiver<SessionInput>,
    outputs: mpsc::Sender<SessionOutput>,
}

impl<S, P> SessionReactor<S, P>
where
    S: EditSurface + Send + 'static,
    P: EditPermission + Send + 'static,
{
    /// Build a reactor and the handle/receiver pair that talks to it.
    pub fn new(
        client_id: ClientId,
        surface: S,
        permission: P,
        capacity: usize,
    ) -> (Self, SessionHandle, mpsc::Receiver<SessionOutput>) {
        let (in_tx, in_rx) = mpsc::channel(capacity.max(1));
        let (out_tx, out_rx) = mpsc::channel(capacity.max(1));
        let controller =
            SyncController::with_permission(client_id, surface, QueuedOutbox::new(), permission);
        let reactor = Self {
            controller,
            inputs: in_rx,
            outputs: out_tx,
        };
        (reactor, SessionHandle { tx: in_tx }, out_rx)
    }

    /// Spawn the reactor on the current tokio runtime.
    pub fn spawn(
        client_id: ClientId,
        surface: S,
        permission: P,
        capacity: usize,
    ) -> (SessionHandle, mpsc::Receiver<SessionOutput>) {
        let (reactor, handle, outputs) = Self::new(client_id, surface, permission, capacity);
        tokio::spawn(reactor.run());
        (handle, outputs)
    }

    /// Process inputs until every handle is dropped or the output receiver
    /// goes away. Returns the controller for inspection.
    pub async fn run(mut self) -> SyncController<S, QueuedOutbox, P> {
        tracing::debug!(client_id = %self.controller.client_id(), "session reactor started");
        while let Some(input) = self.inputs.recv().await {
            if self.step(input).await.is_err() {
                tracing::debug!("output receiver dropped, stopping reactor");
                break;
            }
        }
        tracing::debug!(client_id = %self.controller.client_id(), "session reactor stopped");
        self.controller
    }

    async fn step(
        &mut self,
        input: SessionInput,
    ) -> Result<(), mpsc::error::SendError<SessionOutput>> {
        let status_before = self.controller.status().clone();
        let content_before = self.controller.content().map(str::to_owned);
        let mut rejected = None;
        let local = matches!(input, SessionInput::LocalEdit(_));

        match input {
            SessionInput::Connected => self.controller.connected(),
            SessionInput::Disconnected => self.controller.disconnected(),
            SessionInput::Message(message) => self.controller.handle(message),
            SessionInput::Raw(frame) => match ServerMessage::from_json(&frame) {
                Ok(message) => self.controller.handle(message),
                Err(error) => tracing::warn!(%error, "undecodable frame from authority"),
            },
            SessionInput::LocalEdit(text) => {
                match self.controller.local_edit(&text) {
                    // The owned surface mirrors the typed text.
                    Ok(_) => {
                        patch_surface(self.controller.surface_mut(), &text);
                    }
                    Err(error) => rejected = Some(error),
                }
            }
            SessionInput::Open(file_id) => self.controller.open(file_id),
            SessionInput::Close => self.controller.close(),
        }

        let messages: Vec<ClientMessage> = self.controller.outbox_mut().drain().collect();
        for message in messages {
            self.outputs.send(SessionOutput::Send(message)).await?;
        }
        if let Some(error) = rejected {
            self.outputs.send(SessionOutput::Rejected(error)).await?;
        }
        if self.controller.status() != &status_before {
            self.outputs
                .send(SessionOutput::Status(self.controller.status().clone()))
                .await?;
        }
        // Local edits already live in the surface; only echo other changes.
        let content_after = self.controller.content().map(str::to_owned);
        if !local && content_after != content_before {
            if let Some(content) = content_after {
                self.outputs.send(SessionOutput::Content(content)).await?;
            }
        }
        Ok(())
    }
}
