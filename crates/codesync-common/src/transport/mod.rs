//! Wire protocol between editing clients and the document authority.
//!
//! One bidirectional channel per connection; rooms are keyed by file id.
//! The transport itself (websocket, in-process channel, ...) is supplied by
//! the host and only has to deliver messages in order per connection.

mod messages;

pub use messages::{
    AuthorityError, ClientMessage, JoinRequest, OperationEnvelope, ReadySnapshot, ServerMessage,
    Version,
};
