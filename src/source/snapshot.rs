//! Shared types for live state snapshots.
//!
//! These types match the serialization format of the host's state feed.
//! A snapshot is the complete picture of current entity state and device
//! relationships; it is replaced wholesale on every push, never patched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A complete snapshot of host state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Current entity states, keyed by entity id.
    #[serde(default)]
    pub entities: BTreeMap<String, EntityState>,
    /// Device registry entries, keyed by device id.
    #[serde(default)]
    pub devices: BTreeMap<String, Device>,
}

impl StateSnapshot {
    /// Resolve the human-oriented name of an entity.
    ///
    /// Falls back to the entity id itself when the entity is absent from
    /// the snapshot (source not currently reporting) or carries no
    /// friendly name.
    pub fn display_value(&self, entity_id: &str) -> String {
        self.entities
            .get(entity_id)
            .and_then(|e| e.friendly_name())
            .unwrap_or(entity_id)
            .to_string()
    }

    /// Look up the device an entity belongs to, if any.
    pub fn device_for(&self, entity_id: &str) -> Option<&Device> {
        let device_id = self.entities.get(entity_id)?.device_id.as_deref()?;
        self.devices.get(device_id)
    }
}

/// State and attributes of a single entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    /// Current state value, as reported by the host.
    pub state: String,
    /// Free-form attribute map.
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
    /// Id of the device this entity belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

impl EntityState {
    /// The `friendly_name` attribute, if present and a string.
    pub fn friendly_name(&self) -> Option<&str> {
        self.attributes.get("friendly_name").and_then(|v| v.as_str())
    }

    /// A string attribute by name.
    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(|v| v.as_str())
    }
}

/// A device registry entry, used to derive concise display names for the
/// entities attached to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Device {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_snapshot() {
        let json = r#"{
            "entities": {
                "sensor.kitchen_temp": {
                    "state": "21.5",
                    "attributes": { "friendly_name": "Kitchen Temperature", "unit": "C" },
                    "device_id": "dev1"
                }
            },
            "devices": {
                "dev1": { "name": "Acme X100 Kitchen", "manufacturer": "Acme", "model": "X100" }
            }
        }"#;

        let snapshot: StateSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.entities.len(), 1);

        let entity = snapshot.entities.get("sensor.kitchen_temp").unwrap();
        assert_eq!(entity.state, "21.5");
        assert_eq!(entity.friendly_name(), Some("Kitchen Temperature"));

        let device = snapshot.device_for("sensor.kitchen_temp").unwrap();
        assert_eq!(device.manufacturer.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_display_value_fallback() {
        let snapshot = StateSnapshot::default();
        assert_eq!(snapshot.display_value("sensor.ghost"), "sensor.ghost");
    }

    #[test]
    fn test_missing_sections_default_empty() {
        let snapshot: StateSnapshot = serde_json::from_str("{}").unwrap();
        assert!(snapshot.entities.is_empty());
        assert!(snapshot.devices.is_empty());
    }
}
