//! Wire messages for document synchronization.

use codesync_core::Operation;
use serde::{Deserialize, Serialize};

use crate::error::SerDeError;
use crate::ids::{ClientId, FileId};

/// Position in a document's authoritative edit history.
pub type Version = u64;

/// Ask the authority to join a document room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub file_id: FileId,
}

/// Full document snapshot sent after a join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadySnapshot {
    pub file_id: FileId,
    pub content: String,
    pub version: Version,
}

/// An operation on a document.
///
/// Sent by a client with `version` set to the base version it was computed
/// against; broadcast back by the authority with `version` set to the version
/// the operation produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationEnvelope {
    pub file_id: FileId,
    pub version: Version,
    pub components: Operation,
    pub client_id: ClientId,
}

/// Error reported by the authority, shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityError {
    pub message: String,
}

/// Messages sent from a client to the authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    Join(JoinRequest),
    Operation(OperationEnvelope),
}

/// Messages sent from the authority to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    Ready(ReadySnapshot),
    OperationApplied(OperationEnvelope),
    Error(AuthorityError),
    /// Drop incremental state and re-join.
    Resync,
}

impl ClientMessage {
    /// Serialize to JSON for wire transmission.
    pub fn to_json(&self) -> Result<String, SerDeError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, SerDeError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn file_id(&self) -> &FileId {
        match self {
            ClientMessage::Join(join) => &join.file_id,
            ClientMessage::Operation(op) => &op.file_id,
        }
    }
}

impl ServerMessage {
    /// Serialize to JSON for wire transmission.
    pub fn to_json(&self) -> Result<String, SerDeError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, SerDeError> {
        Ok(serde_json::from_str(json)?)
    }
}
