//! Data models and processing for the export panel.
//!
//! This module owns the pure half of the synchronization pipeline: joining
//! the persisted configuration against the live snapshot and deciding
//! whether the result is worth rendering.
//!
//! ## Submodules
//!
//! - [`config`]: Persisted configuration types ([`ExportConfig`], [`TrackedEntity`])
//! - [`gate`]: Render suppression via row-set fingerprints ([`ChangeGate`])
//! - [`matcher`]: Bounded candidate search over the snapshot
//! - [`names`]: Display name resolution against device relationships
//! - [`project`]: Configuration x snapshot projection into [`Row`]s
//!
//! ## Data Flow
//!
//! ```text
//! ExportConfig ──┐
//!                ├──▶ project() ──▶ Vec<Row> ──▶ ChangeGate ──▶ render?
//! StateSnapshot ─┘
//! ```

pub mod config;
pub mod gate;
pub mod matcher;
pub mod names;
pub mod project;

pub use config::{build_metric_name, ExportConfig, TrackedEntity};
pub use gate::ChangeGate;
pub use matcher::{find_candidates, Candidate};
pub use names::resolve_display_name;
pub use project::{project, ExportIndex, Row};
