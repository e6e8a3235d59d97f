//! Local file-backed backend.
//!
//! Persists the export configuration as a JSON file and serves the same
//! request set as a remote backend. This makes the panel runnable
//! standalone and mirrors the real backend's reload semantics: a
//! `save_entities` replace keeps per-entity settings for surviving keys
//! and materializes defaults for new ones.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::handle::{BackendEndpoint, BackendHandle};
use super::protocol::{BackendEvent, BackendRequest};
use crate::data::{ExportConfig, TrackedEntity};

/// Spawn a local backend serving requests against a JSON config file.
pub fn spawn<P: AsRef<Path>>(path: P) -> BackendHandle {
    let (handle, endpoint) = BackendHandle::pair();
    let store = Store::new(path);
    tokio::spawn(serve(store, endpoint));
    handle
}

async fn serve(mut store: Store, mut endpoint: BackendEndpoint) {
    while let Some(request) = endpoint.requests.recv().await {
        let event = store.apply(&request);
        if endpoint.events.send(event).is_err() {
            break;
        }
    }
}

/// The file-backed configuration store.
#[derive(Debug)]
struct Store {
    path: PathBuf,
}

impl Store {
    fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn apply(&mut self, request: &BackendRequest) -> BackendEvent {
        match request {
            BackendRequest::GetConfig => BackendEvent::Config(self.load()),
            BackendRequest::SaveEntities { entities } => {
                let ok = self.replace_entities(entities).map_or_else(
                    |e| {
                        warn!("save_entities failed: {}", e);
                        false
                    },
                    |_| true,
                );
                BackendEvent::SaveCompleted(ok)
            }
            BackendRequest::UpdateEntitySettings {
                entity_id,
                realtime,
                interval,
            } => {
                let ok = self.update_entity(entity_id, *realtime, *interval).map_or_else(
                    |e| {
                        warn!("update_entity_settings failed: {}", e);
                        false
                    },
                    |found| found,
                );
                BackendEvent::UpdateCompleted(ok)
            }
        }
    }

    /// Load the stored configuration. A missing file means the
    /// configuration does not exist yet.
    fn load(&self) -> Option<ExportConfig> {
        let content = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("ignoring malformed config store: {}", e);
                None
            }
        }
    }

    fn save(&self, config: &ExportConfig) -> Result<()> {
        let json = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, json)
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }

    /// Replace the tracked entity list, in the given order.
    ///
    /// Settings of entities that survive the replace are carried over;
    /// new entities get backend defaults.
    fn replace_entities(&self, entity_ids: &[String]) -> Result<()> {
        let mut config = self.load().unwrap_or_default();

        let old = std::mem::take(&mut config.entities);
        config.entities = entity_ids
            .iter()
            .map(|id| {
                old.iter()
                    .find(|e| &e.entity_id == id)
                    .cloned()
                    .unwrap_or_else(|| TrackedEntity::placeholder(id, &config.metric_prefix))
            })
            .collect();

        debug!("replacing entity list, {} entries", config.entities.len());
        self.save(&config)
    }

    /// Patch one entity's settings. Returns false if it is not tracked.
    fn update_entity(
        &self,
        entity_id: &str,
        realtime: Option<bool>,
        interval: Option<u64>,
    ) -> Result<bool> {
        let mut config = self.load().unwrap_or_default();

        let Some(entity) = config.entities.iter_mut().find(|e| e.entity_id == entity_id) else {
            return Ok(false);
        };
        if let Some(realtime) = realtime {
            entity.realtime = realtime;
        }
        if let Some(interval) = interval {
            entity.interval = Some(interval);
        }

        self.save(&config)?;
        Ok(true)
    }
}
