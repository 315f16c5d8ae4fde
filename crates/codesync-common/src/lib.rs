//! Shared plumbing for codesync clients and authorities.
//!
//! - `ids`: client and file identifiers
//! - `transport`: wire messages exchanged with the authority
//! - `config`: file/env backed client configuration
//! - `signal`: process-wide "external run in progress" flag
//! - `telemetry`: tracing subscriber setup (feature `telemetry`)

pub mod config;
pub mod error;
pub mod ids;
pub mod perf;
pub mod signal;
#[cfg(feature = "telemetry")]
pub mod telemetry;
pub mod transport;

pub use crate::config::{ConfigError, FileStore, Loader, Saver, SyncConfig};
pub use crate::error::{CodesyncError, SerDeError};
pub use crate::ids::{ClientId, FileId};
pub use crate::signal::{ExecutionSignal, RunGuard};
pub use crate::transport::{
    AuthorityError, ClientMessage, JoinRequest, OperationEnvelope, ReadySnapshot, ServerMessage,
    Version,
};
