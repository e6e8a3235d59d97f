//! Persisted export configuration.
//!
//! This is the backend-owned truth about which entities are exported and
//! how. The panel only ever holds a fetched copy, replaced wholesale on
//! every reconciliation fetch.

use serde::{Deserialize, Serialize};

/// Fallback batch interval when neither the entity nor the configuration
/// specifies one.
pub const DEFAULT_INTERVAL_SECS: u64 = 300;

/// Default metric name prefix.
pub const DEFAULT_METRIC_PREFIX: &str = "hass";

/// Entity id prefix reserved for the exporter's own derived sensors.
///
/// These report on the export itself and must never be offered as tracking
/// candidates, otherwise exporting an export sensor would feed back into
/// the snapshot.
pub const EXPORT_SENSOR_PREFIX: &str = "sensor.vm_export_";

fn default_metric_prefix() -> String {
    DEFAULT_METRIC_PREFIX.to_string()
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

/// The persisted export configuration as returned by `get_config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Prefix applied to every derived metric name.
    #[serde(default = "default_metric_prefix")]
    pub metric_prefix: String,
    /// Batch interval in seconds for entities without a per-entity override.
    #[serde(default = "default_interval")]
    pub default_interval: u64,
    /// Tracked entities, in backend order.
    #[serde(default)]
    pub entities: Vec<TrackedEntity>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            metric_prefix: default_metric_prefix(),
            default_interval: default_interval(),
            entities: Vec::new(),
        }
    }
}

impl ExportConfig {
    /// Returns the ids of all tracked entities, in configuration order.
    pub fn entity_ids(&self) -> Vec<String> {
        self.entities.iter().map(|e| e.entity_id.clone()).collect()
    }

    /// Returns true if the given entity id is already tracked.
    pub fn is_tracked(&self, entity_id: &str) -> bool {
        self.entities.iter().any(|e| e.entity_id == entity_id)
    }

    /// Look up a tracked entity by id.
    pub fn entity(&self, entity_id: &str) -> Option<&TrackedEntity> {
        self.entities.iter().find(|e| e.entity_id == entity_id)
    }
}

/// A single entity selected for export, with its per-entity settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedEntity {
    /// Stable identifier, unique within the configuration. Doubles as the
    /// lookup key into the live snapshot.
    pub entity_id: String,
    /// Metric name the backend exports this entity under.
    pub metric_name: String,
    /// True for immediate export on every state change, false for batched
    /// interval export.
    #[serde(default)]
    pub realtime: bool,
    /// Per-entity batch interval override in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u64>,
}

impl TrackedEntity {
    /// Create a placeholder entry for an entity the backend has not
    /// confirmed yet. Settings match the backend's defaults for new
    /// entities so the optimistic view agrees with the fetched truth.
    pub fn placeholder(entity_id: &str, metric_prefix: &str) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            metric_name: build_metric_name(metric_prefix, entity_id),
            realtime: false,
            interval: None,
        }
    }
}

/// Derive the exported metric name for an entity id.
///
/// Non-alphanumeric characters fold to underscores so the result is a valid
/// metric identifier: `("hass", "sensor.living room")` -> `"hass_sensor_living_room"`.
pub fn build_metric_name(prefix: &str, entity_id: &str) -> String {
    let slug: String = entity_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    format!("{}_{}", prefix, slug)
}
