//! Channel bridge between the pipeline and a backend driver.
//!
//! The TUI loop is synchronous; backend round-trips are not. The handle
//! carries requests out and completion events back over unbounded mpsc
//! channels so the pipeline never blocks on the wire.

use tokio::sync::mpsc;
use tracing::warn;

use super::protocol::{BackendEvent, BackendRequest};

/// The pipeline's end of a backend connection.
#[derive(Debug)]
pub struct BackendHandle {
    tx: mpsc::UnboundedSender<BackendRequest>,
    rx: mpsc::UnboundedReceiver<BackendEvent>,
}

/// The driver's end: requests in, completion events out.
#[derive(Debug)]
pub struct BackendEndpoint {
    pub requests: mpsc::UnboundedReceiver<BackendRequest>,
    pub events: mpsc::UnboundedSender<BackendEvent>,
}

impl BackendHandle {
    /// Create a connected handle/endpoint pair.
    pub fn pair() -> (Self, BackendEndpoint) {
        let (req_tx, req_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        (
            Self {
                tx: req_tx,
                rx: event_rx,
            },
            BackendEndpoint {
                requests: req_rx,
                events: event_tx,
            },
        )
    }

    /// Send a request to the backend driver.
    ///
    /// A closed driver is logged, not propagated; the pipeline's recovery
    /// path is the same either way.
    pub fn send(&self, request: BackendRequest) {
        if self.tx.send(request).is_err() {
            warn!("backend driver gone, request dropped");
        }
    }

    /// Poll for a completion event without blocking.
    pub fn poll_event(&mut self) -> Option<BackendEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => None,
        }
    }
}
