//! Terminal rendering using ratatui.
//!
//! One main table view plus modal overlays for candidate search, entity
//! detail, and help. All rendering is stateless over [`App`](crate::app::App).

pub mod common;
pub mod detail;
pub mod search;
pub mod table;
pub mod theme;

pub use theme::Theme;
