//! Wire protocol for the configuration backend.
//!
//! Requests and responses are single JSON objects discriminated by a
//! `type` field, exchanged as newline-delimited lines. In process, backend
//! completions travel as [`BackendEvent`]s; the drivers map wire responses
//! onto events based on which request they answer (a connection serves
//! requests strictly in order).

use serde::{Deserialize, Serialize};

use crate::data::ExportConfig;

/// A request to the configuration backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendRequest {
    /// Fetch the current export configuration.
    GetConfig,
    /// Replace the full tracked entity list. Triggers a slow backend
    /// reload once acknowledged.
    SaveEntities { entities: Vec<String> },
    /// Patch a single entity's settings in place. No reload.
    UpdateEntitySettings {
        entity_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        realtime: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        interval: Option<u64>,
    },
}

/// A response from the configuration backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendResponse {
    /// The current configuration, answering `get_config`.
    Config {
        #[serde(flatten)]
        config: ExportConfig,
    },
    /// No configuration exists yet. A normal condition, not an error.
    NotFound,
    /// Acknowledgement of a mutation.
    Ack { success: bool },
    /// Backend-side failure.
    Error { message: String },
}

/// In-process completion event delivered back to the mutation pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    /// A configuration fetch completed. `None` means the configuration
    /// does not exist yet (zero tracked entities).
    Config(Option<ExportConfig>),
    /// A `save_entities` round-trip completed.
    SaveCompleted(bool),
    /// An `update_entity_settings` round-trip completed.
    UpdateCompleted(bool),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let request = BackendRequest::SaveEntities {
            entities: vec!["sensor.a".to_string(), "light.b".to_string()],
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""type":"save_entities""#));

        let parsed: BackendRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, request);
    }

    #[test]
    fn test_update_omits_absent_fields() {
        let request = BackendRequest::UpdateEntitySettings {
            entity_id: "sensor.a".to_string(),
            realtime: Some(true),
            interval: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""realtime":true"#));
        assert!(!json.contains("interval"));
    }

    #[test]
    fn test_config_response_flattened() {
        let json = r#"{
            "type": "config",
            "metric_prefix": "vm",
            "default_interval": 60,
            "entities": []
        }"#;
        let response: BackendResponse = serde_json::from_str(json).unwrap();
        match response {
            BackendResponse::Config { config } => {
                assert_eq!(config.metric_prefix, "vm");
                assert_eq!(config.default_interval, 60);
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn test_not_found_response() {
        let response: BackendResponse = serde_json::from_str(r#"{"type":"not_found"}"#).unwrap();
        assert_eq!(response, BackendResponse::NotFound);
    }
}
