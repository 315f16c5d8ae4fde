//! Client-side document sync sessions for codesync.
//!
//! A [`SyncController`] tracks one client's view of one document: the last
//! confirmed content and version, local edits in flight, and peer operations
//! held back until those edits are acknowledged. It talks to the authority
//! through an [`Outbox`] and writes remote changes into an
//! [`EditSurface`](codesync_core::EditSurface).
//!
//! [`SessionReactor`] runs a controller on a tokio task behind channels, and
//! [`LoopbackAuthority`] is an in-memory authority for tests and demos.

pub mod authority;
pub mod controller;
pub mod error;
pub mod outbox;
pub mod permission;
pub mod reactor;
pub mod state;

pub use authority::{ConnectionId, Delivery, LoopbackAuthority};
pub use controller::SyncController;
pub use error::SyncError;
pub use outbox::{Outbox, QueuedOutbox};
pub use permission::{AllowAll, EditPermission, ReadOnly};
pub use reactor::{SessionHandle, SessionInput, SessionOutput, SessionReactor};
pub use state::{DocumentSessionState, PendingOperation, SessionStatus};
