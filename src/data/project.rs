//! Snapshot projection.
//!
//! Joins the persisted export configuration against the live snapshot to
//! produce the render-ready row set. Projection is pure and total: missing
//! snapshot entries degrade to the entity id, missing annotations to an
//! empty tag set. Rows are always rebuilt from scratch, never patched.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::config::ExportConfig;
use crate::data::names::resolve_display_name;
use crate::source::{EntityState, StateSnapshot};

/// Placeholder shown when an entity carries no tag annotations.
pub const EMPTY_TAGS: &str = "\u{2014}";

/// A single render-ready table row. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub entity_id: String,
    pub display_name: String,
    pub metric_name: String,
    pub realtime: bool,
    /// Effective batch interval in seconds.
    pub interval: u64,
    /// Formatted `k=v` tag annotations, or the em-dash placeholder.
    pub tags: String,
}

/// Secondary index over the snapshot's export sensors.
///
/// The exporter publishes one derived sensor per tracked entity, carrying a
/// `source_entity` attribute pointing back at it. Indexing on that
/// attribute makes the join explicit instead of reconstructing the export
/// sensor's id from a naming convention.
pub struct ExportIndex<'a> {
    by_source: BTreeMap<&'a str, &'a EntityState>,
}

impl<'a> ExportIndex<'a> {
    /// Build the index by scanning the snapshot once.
    pub fn build(snapshot: &'a StateSnapshot) -> Self {
        let mut by_source = BTreeMap::new();
        for entity in snapshot.entities.values() {
            if let Some(source) = entity.attr_str("source_entity") {
                by_source.insert(source, entity);
            }
        }
        Self { by_source }
    }

    /// The export sensor reporting on the given source entity, if any.
    pub fn for_source(&self, entity_id: &str) -> Option<&'a EntityState> {
        self.by_source.get(entity_id).copied()
    }
}

/// Project the configuration against the snapshot into sorted rows.
pub fn project(config: &ExportConfig, snapshot: &StateSnapshot) -> Vec<Row> {
    let index = ExportIndex::build(snapshot);

    let mut rows: Vec<Row> = config
        .entities
        .iter()
        .map(|entity| Row {
            entity_id: entity.entity_id.clone(),
            display_name: resolve_display_name(&entity.entity_id, snapshot),
            metric_name: entity.metric_name.clone(),
            realtime: entity.realtime,
            interval: entity.interval.unwrap_or(config.default_interval),
            tags: format_tags(index.for_source(&entity.entity_id)),
        })
        .collect();

    rows.sort_by(|a, b| {
        a.display_name
            .cmp(&b.display_name)
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    });
    rows
}

/// Format an export sensor's `custom_tags` attribute as `k=v` pairs joined
/// by `", "`. Keys are emitted in sorted order so the output is stable.
fn format_tags(export_sensor: Option<&EntityState>) -> String {
    let Some(tags) = export_sensor
        .and_then(|e| e.attributes.get("custom_tags"))
        .and_then(|v| v.as_object())
    else {
        return EMPTY_TAGS.to_string();
    };

    let mut pairs: Vec<String> = tags
        .iter()
        .map(|(k, v)| match v.as_str() {
            Some(s) => format!("{}={}", k, s),
            None => format!("{}={}", k, v),
        })
        .collect();

    if pairs.is_empty() {
        return EMPTY_TAGS.to_string();
    }
    pairs.sort();
    pairs.join(", ")
}
