//! codesync-core: pure Rust text synchronization primitives.
//!
//! This crate provides:
//! - `Operation` / `Component` - compact retain/delete/insert edit scripts
//! - `diff` / `apply` - the operation codec between text snapshots
//! - `transform` - rebasing concurrent operations (authority side)
//! - `TextBuffer` trait for text storage abstraction
//! - `EditorRope` - ropey-backed implementation
//! - `EditSurface` + `patch_surface` - replaying remote edits into a live buffer

pub mod diff;
pub mod error;
pub mod op;
pub mod patch;
pub mod surface;
pub mod text;
pub mod transform;
pub mod types;

pub use diff::{apply, diff};
pub use error::OpError;
pub use op::{Component, Operation, Splice};
pub use patch::{PatchOutcome, patch_surface};
pub use smol_str::SmolStr;
pub use surface::{EditSurface, LocalSurface};
pub use text::{EditorRope, TextBuffer};
pub use transform::transform;
pub use types::{Selection, ViewState};
