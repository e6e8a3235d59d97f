//! Configuration backend abstraction.
//!
//! The persisted export configuration lives behind an asynchronous
//! request/response channel. The panel issues `type`-discriminated
//! requests and consumes completion events; it never blocks on the wire.
//!
//! ```text
//! ┌──────────────┐  BackendRequest   ┌──────────────────────────┐
//! │   pipeline   │ ────────────────▶ │ driver task              │
//! │ (TUI thread) │ ◀──────────────── │  remote: JSON lines/TCP  │
//! └──────────────┘  BackendEvent     │  local: JSON file store  │
//!                                    └──────────────────────────┘
//! ```

pub mod handle;
pub mod local;
pub mod protocol;
pub mod remote;

pub use handle::{BackendEndpoint, BackendHandle};
pub use protocol::{BackendEvent, BackendRequest, BackendResponse};
