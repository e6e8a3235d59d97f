//! Data source abstraction for receiving live state snapshots.
//!
//! The host pushes its full state picture as an opaque, replace-wholesale
//! snapshot. This module abstracts over where those snapshots come from
//! (files, channels) behind a non-blocking poll interface.

mod channel;
mod file;
mod snapshot;

pub use channel::ChannelSource;
pub use file::FileSource;
pub use snapshot::{Device, EntityState, StateSnapshot};

use std::fmt::Debug;

/// Trait for receiving state snapshots from various sources.
pub trait SnapshotSource: Send + Debug {
    /// Poll for the latest snapshot.
    ///
    /// Returns `Some(snapshot)` if new data is available, `None` otherwise.
    /// This method must be non-blocking.
    fn poll(&mut self) -> Option<StateSnapshot>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;

    /// The error message from the last poll, if any.
    fn error(&self) -> Option<&str>;
}
