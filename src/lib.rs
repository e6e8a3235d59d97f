// Library crate: public API items may not be used by the binary
#![allow(unused)]

//! # export-panel
//!
//! An interactive TUI for managing which entities a metrics exporter
//! tracks, kept live-synchronized against both the host's state feed and
//! the exporter's persisted configuration.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Application                           │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌──────────┐  │
//! │  │  app    │───▶│   data   │───▶│   ui    │───▶│ Terminal │  │
//! │  │ (state) │    │ (project)│    │ (render)│    │          │  │
//! │  └──┬───┬──┘    └──────────┘    └─────────┘    └──────────┘  │
//! │     │   │                                                    │
//! │     ▼   ▼                                                    │
//! │  ┌────────┐   ┌──────────┐                                   │
//! │  │ source │   │ pipeline │──▶ backend (local file | TCP)     │
//! │  │ (feed) │   │ (mutate) │                                   │
//! │  └────────┘   └──────────┘                                   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`app`]**: Application state, selection, and user interaction logic
//! - **[`source`]**: Snapshot feed abstraction ([`SnapshotSource`] trait) with
//!   file-polling and channel implementations
//! - **[`data`]**: Pure data half - configuration types, snapshot projection
//!   into display [`Row`]s, render gating, candidate search, name resolution
//! - **[`pipeline`]**: Mutation execution - optimistic updates, debounced
//!   interval commits, and reconciliation fetches
//! - **[`backend`]**: Configuration persistence drivers (local JSON file or
//!   a newline-delimited JSON protocol over TCP)
//! - **[`ui`]**: Terminal rendering using ratatui
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch a snapshot file, persist configuration locally
//! export-panel --feed snapshot.json --store export_config.json
//!
//! # Watch a snapshot file, talk to a remote exporter backend
//! export-panel --feed snapshot.json --connect localhost:9190
//! ```
//!
//! ### As a library with a channel feed
//!
//! ```
//! use export_panel::{App, BackendHandle, ChannelSource};
//!
//! // Snapshots are pushed by whatever bridges the host feed.
//! let (tx, source) = ChannelSource::create("host feed");
//!
//! // A driverless handle; in practice use backend::local or backend::remote.
//! let (handle, _endpoint) = BackendHandle::pair();
//! let app = App::new(Box::new(source), handle);
//! ```
//!
//! ### With a backend driven over an arbitrary stream
//!
//! ```no_run
//! use export_panel::backend;
//!
//! # tokio_test::block_on(async {
//! // Example with an in-memory duplex (in practice, use TcpStream)
//! let (client, _server) = tokio::io::duplex(4096);
//! let handle = backend::remote::spawn(client);
//! # });
//! ```

pub mod app;
pub mod backend;
pub mod data;
pub mod events;
pub mod pipeline;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use backend::{BackendEvent, BackendHandle, BackendRequest};
pub use data::{ExportConfig, Row, TrackedEntity};
pub use pipeline::{MutationPipeline, PipelineEffect};
pub use source::{ChannelSource, FileSource, SnapshotSource, StateSnapshot};
