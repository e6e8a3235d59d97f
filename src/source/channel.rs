//! Channel-based snapshot source.
//!
//! Receives state snapshots via a tokio watch channel. This is the
//! integration point for hosts that push snapshots rather than writing
//! them to a file; intermediate snapshots are coalesced by the watch
//! semantics so the panel only ever sees the latest.

use tokio::sync::watch;

use super::{SnapshotSource, StateSnapshot};

/// A snapshot source fed through a watch channel.
#[derive(Debug)]
pub struct ChannelSource {
    receiver: watch::Receiver<StateSnapshot>,
    description: String,
    /// Track if we've returned the initial value yet
    initial_returned: bool,
}

impl ChannelSource {
    /// Wrap the receiving end of a watch channel.
    pub fn new(receiver: watch::Receiver<StateSnapshot>, source_description: &str) -> Self {
        Self {
            receiver,
            description: format!("channel: {}", source_description),
            initial_returned: false,
        }
    }

    /// Create a channel pair for pushing snapshots into the panel.
    ///
    /// Returns (sender, source) where the sender is handed to whatever
    /// bridges the host feed.
    pub fn create(source_description: &str) -> (watch::Sender<StateSnapshot>, Self) {
        let (tx, rx) = watch::channel(StateSnapshot::default());
        let source = Self::new(rx, source_description);
        (tx, source)
    }
}

impl SnapshotSource for ChannelSource {
    fn poll(&mut self) -> Option<StateSnapshot> {
        // Return the initial value on first poll
        if !self.initial_returned {
            self.initial_returned = true;
            self.receiver.mark_changed();
        }

        if self.receiver.has_changed().unwrap_or(false) {
            Some(self.receiver.borrow_and_update().clone())
        } else {
            None
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        // Feed errors are handled by whatever drives the sender.
        None
    }
}
