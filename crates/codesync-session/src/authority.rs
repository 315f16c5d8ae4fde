//! In-memory reference authority.
//!
//! Holds the authoritative content, version and history of each document,
//! rebases incoming operations over history their sender had not seen, and
//! broadcasts the result to every joined client. Used by tests and the demo
//! binary; a production authority speaks the same messages over a network.
//!
//! A client's base version counts the versions it had synced to plus one per
//! operation it sent since, so it is not a plain history index. The rebase
//! recovers the sync point from the history authors and moves the unseen peer
//! entries through the sender's own earlier operations before applying.

use std::collections::{BTreeMap, BTreeSet};

use codesync_common::{
    AuthorityError, ClientId, ClientMessage, FileId, OperationEnvelope, ReadySnapshot,
    ServerMessage, Version,
};
use codesync_core::{OpError, Operation, apply, transform};

/// Identifies one client connection to the authority.
pub type ConnectionId = u64;

/// A message addressed to one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub to: ConnectionId,
    pub message: ServerMessage,
}

#[derive(Debug)]
struct Entry {
    author: ClientId,
    /// As sent, against the author's view of the document.
    submitted: Operation,
    /// As applied at this version.
    applied: Operation,
}

#[derive(Debug, Default)]
struct Room {
    content: String,
    version: Version,
    /// `history[v]` took the document from version `v` to `v + 1`.
    history: Vec<Entry>,
    members: BTreeSet<ConnectionId>,
}

impl Room {
    /// Latest version the author can have been synced at when it sent an
    /// operation with base `base`.
    ///
    /// Every operation the author sent after syncing is already in history,
    /// so `base` equals the sync point plus the author's entries from there
    /// on. Where several points fit, the entries between them are the
    /// author's own, applied unchanged, and the latest is equivalent.
    fn sync_point(&self, author: &ClientId, base: Version) -> Option<usize> {
        let base = usize::try_from(base).ok()?;
        let mut point = self.history.len();
        let mut claimed = point;
        while claimed > base {
            point = point.checked_sub(1)?;
            if self.history[point].author != *author {
                claimed -= 1;
            }
        }
        Some(point)
    }

    /// Rebase `op`, sent by `author` after syncing at `point`, onto head.
    ///
    /// Returns the rebased operation and how many peer entries it crossed.
    fn rebase(
        &self,
        author: &ClientId,
        point: usize,
        mut op: Operation,
    ) -> Result<(Operation, usize), OpError> {
        // Peer entries the author had not seen, kept applicable on top of
        // the author's own operations walked so far.
        let mut unseen: Vec<Operation> = Vec::new();
        for entry in &self.history[point..] {
            if entry.author == *author {
                let mut own = entry.submitted.clone();
                for peer in &mut unseen {
                    let (peer_after, own_after) = transform(peer, &own)?;
                    *peer = peer_after;
                    own = own_after;
                }
            } else if !entry.applied.is_noop() {
                unseen.push(entry.applied.clone());
            }
        }

        for peer in &unseen {
            op = transform(peer, &op)?.1;
        }
        Ok((op, unseen.len()))
    }
}

#[derive(Debug, Default)]
pub struct LoopbackAuthority {
    rooms: BTreeMap<FileId, Room>,
    connections: BTreeMap<ConnectionId, Option<FileId>>,
    next_connection: ConnectionId,
}

impl LoopbackAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document at version 0.
    pub fn with_file(mut self, file_id: impl Into<FileId>, content: impl Into<String>) -> Self {
        self.rooms.insert(
            file_id.into(),
            Room {
                content: content.into(),
                ..Room::default()
            },
        );
        self
    }

    pub fn connect(&mut self) -> ConnectionId {
        let id = self.next_connection;
        self.next_connection += 1;
        self.connections.insert(id, None);
        tracing::debug!(connection = id, "client connected");
        id
    }

    pub fn disconnect(&mut self, connection: ConnectionId) {
        if let Some(Some(file_id)) = self.connections.remove(&connection) {
            if let Some(room) = self.rooms.get_mut(&file_id) {
                room.members.remove(&connection);
            }
        }
        tracing::debug!(connection, "client disconnected");
    }

    pub fn content(&self, file_id: &FileId) -> Option<&str> {
        self.rooms.get(file_id).map(|room| room.content.as_str())
    }

    pub fn version(&self, file_id: &FileId) -> Option<Version> {
        self.rooms.get(file_id).map(|room| room.version)
    }

    /// Ask every client in a room to drop its state and re-join.
    pub fn resync(&self, file_id: &FileId) -> Vec<Delivery> {
        self.rooms.get(file_id).map_or_else(Vec::new, |room| {
            tracing::info!(%file_id, members = room.members.len(), "requesting resync");
            room.members
                .iter()
                .map(|&to| Delivery {
                    to,
                    message: ServerMessage::Resync,
                })
                .collect()
        })
    }

    /// Decode and handle a JSON frame from a connection.
    pub fn handle_json(&mut self, connection: ConnectionId, frame: &str) -> Vec<Delivery> {
        match ClientMessage::from_json(frame) {
            Ok(message) => self.handle(connection, message),
            Err(error) => {
                tracing::warn!(connection, %error, "undecodable client frame");
                vec![error_to(connection, format!("undecodable message: {error}"))]
            }
        }
    }

    /// Handle one message from a connection, returning what to deliver.
    pub fn handle(&mut self, connection: ConnectionId, message: ClientMessage) -> Vec<Delivery> {
        if !self.connections.contains_key(&connection) {
            tracing::warn!(connection, "message from unknown connection");
            return Vec::new();
        }
        match message {
            ClientMessage::Join(join) => self.join(connection, join.file_id),
            ClientMessage::Operation(envelope) => self.operation(connection, envelope),
        }
    }

    fn join(&mut self, connection: ConnectionId, file_id: FileId) -> Vec<Delivery> {
        let previous = self.connections.insert(connection, Some(file_id.clone()));
        if let Some(Some(previous)) = previous {
            if let Some(room) = self.rooms.get_mut(&previous) {
                room.members.remove(&connection);
            }
        }

        let room = self.rooms.entry(file_id.clone()).or_default();
        room.members.insert(connection);
        tracing::debug!(connection, %file_id, version = room.version, "joined");

        vec![Delivery {
            to: connection,
            message: ServerMessage::Ready(ReadySnapshot {
                file_id,
                content: room.content.clone(),
                version: room.version,
            }),
        }]
    }

    fn operation(&mut self, connection: ConnectionId, envelope: OperationEnvelope) -> Vec<Delivery> {
        let joined = self.connections.get(&connection).and_then(Option::as_ref);
        if joined != Some(&envelope.file_id) {
            return vec![error_to(
                connection,
                format!("not joined to {}", envelope.file_id),
            )];
        }
        let Some(room) = self.rooms.get_mut(&envelope.file_id) else {
            return vec![error_to(
                connection,
                format!("unknown file {}", envelope.file_id),
            )];
        };

        let base = envelope.version;
        if base > room.version {
            tracing::warn!(
                connection,
                base,
                head = room.version,
                "operation based on a future version"
            );
            return vec![error_to(
                connection,
                format!(
                    "operation based on version {base} but head is {}",
                    room.version
                ),
            )];
        }

        let Some(point) = room.sync_point(&envelope.client_id, base) else {
            tracing::warn!(connection, base, "base version does not match history");
            return vec![error_to(
                connection,
                format!("operation based on version {base} does not match history"),
            )];
        };
        let (components, rebased_over) =
            match room.rebase(&envelope.client_id, point, envelope.components.clone()) {
                Ok(rebased) => rebased,
                Err(error) => {
                    tracing::warn!(connection, %error, "operation does not fit history");
                    return vec![error_to(connection, error.to_string())];
                }
            };

        let content = match apply(&room.content, &components) {
            Ok(content) => content,
            Err(error) => {
                tracing::warn!(connection, %error, "rejecting malformed operation");
                return vec![error_to(connection, error.to_string())];
            }
        };

        room.content = content;
        room.version += 1;
        room.history.push(Entry {
            author: envelope.client_id.clone(),
            submitted: envelope.components,
            applied: components.clone(),
        });
        tracing::debug!(
            file_id = %envelope.file_id,
            version = room.version,
            from = %envelope.client_id,
            rebased_over,
            "operation applied"
        );

        let applied = OperationEnvelope {
            file_id: envelope.file_id,
            version: room.version,
            components,
            client_id: envelope.client_id,
        };
        room.members
            .iter()
            .map(|&to| Delivery {
                to,
                message: ServerMessage::OperationApplied(applied.clone()),
            })
            .collect()
    }
}

fn error_to(to: ConnectionId, message: String) -> Delivery {
    Delivery {
        to,
        message: ServerMessage::Error(AuthorityError { message }),
    }
}
