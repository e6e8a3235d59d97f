//! Mutation pipeline.
//!
//! All edits to the tracked entity list flow through here: optimistic
//! local state, a coarse-grained saving lock, debounced interval commits,
//! and reconciliation fetches after every backend round-trip. Backend
//! failures are swallowed into the same recovery path as success (a
//! re-fetch), so the panel always converges on whatever the backend
//! actually holds.
//!
//! Time never comes from the clock directly; callers pass `Instant`s in,
//! which keeps debounce and settle behavior testable.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::backend::{BackendEvent, BackendHandle, BackendRequest};
use crate::data::ExportConfig;

/// Wait after a successful `save_entities` before re-fetching.
///
/// The backend's apply step includes a slow out-of-band reload with no
/// completion signal; this delay is a heuristic to avoid reading a
/// half-applied configuration, not a correctness guarantee. Under load the
/// reload can outlast it, in which case the fetched configuration is
/// simply stale until the next snapshot-triggered fetch.
pub const SETTLE_DELAY: Duration = Duration::from_secs(2);

/// An interval edit commits only once edits to that field have stopped
/// for this long.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Inclusive bounds for a committable batch interval, in seconds.
pub const INTERVAL_MIN: u64 = 10;
pub const INTERVAL_MAX: u64 = 3600;

/// What the in-flight mutation was, so its ack can be interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Inflight {
    /// Full list replace; the new list is applied optimistically on ack.
    Replace { entities: Vec<String> },
    /// Targeted settings patch.
    Update,
}

/// A debounced interval edit waiting to commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingInterval {
    value: u64,
    due: Instant,
}

/// State changes the pipeline hands back to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEffect {
    /// Fresh configuration fetched from the backend. Replace wholesale.
    Config(Option<ExportConfig>),
    /// Tracked entity list acknowledged by the backend but not yet
    /// reconciled; apply locally ahead of the fetched truth.
    OptimisticEntities(Vec<String>),
    /// A mutation failed; the reconciliation fetch is already on its way.
    MutationFailed,
}

/// Executes add/remove/update operations with eventual-consistency
/// reconciliation.
#[derive(Debug)]
pub struct MutationPipeline {
    backend: BackendHandle,
    /// Process-wide lock: while a mutation is in flight, further mutating
    /// actions are rejected outright, not queued. The backend's apply is
    /// a single atomic reload of the whole configuration, so per-entity
    /// concurrency would buy nothing.
    saving: bool,
    inflight: Option<Inflight>,
    /// At most one configuration fetch is in flight or scheduled.
    fetch_pending: bool,
    /// Deadline for the post-save settle fetch.
    fetch_due: Option<Instant>,
    debounce: BTreeMap<String, PendingInterval>,
    force_render: bool,
}

impl MutationPipeline {
    pub fn new(backend: BackendHandle) -> Self {
        Self {
            backend,
            saving: false,
            inflight: None,
            fetch_pending: false,
            fetch_due: None,
            debounce: BTreeMap::new(),
            force_render: false,
        }
    }

    /// True while a mutation round-trip is outstanding.
    pub fn saving(&self) -> bool {
        self.saving
    }

    /// The uncommitted debounced interval for an entity, if any.
    pub fn pending_interval(&self, entity_id: &str) -> Option<u64> {
        self.debounce.get(entity_id).map(|p| p.value)
    }

    /// Take the forced-render flag, clearing it.
    pub fn take_force_render(&mut self) -> bool {
        std::mem::take(&mut self.force_render)
    }

    /// Request a configuration fetch, coalescing duplicates.
    pub fn request_fetch(&mut self) {
        if self.fetch_pending {
            return;
        }
        self.fetch_pending = true;
        self.backend.send(BackendRequest::GetConfig);
    }

    /// Track a new entity. Returns false when rejected (already saving,
    /// or already tracked).
    pub fn add(&mut self, entity_id: &str, current: &[String]) -> bool {
        if self.saving || current.iter().any(|id| id == entity_id) {
            return false;
        }
        let mut entities = current.to_vec();
        entities.push(entity_id.to_string());
        self.begin_replace(entities);
        true
    }

    /// Stop tracking an entity. Returns false when rejected.
    pub fn remove(&mut self, entity_id: &str, current: &[String]) -> bool {
        if self.saving || !current.iter().any(|id| id == entity_id) {
            return false;
        }
        let entities: Vec<String> = current
            .iter()
            .filter(|id| id.as_str() != entity_id)
            .cloned()
            .collect();
        self.begin_replace(entities);
        true
    }

    fn begin_replace(&mut self, entities: Vec<String>) {
        self.saving = true;
        self.inflight = Some(Inflight::Replace {
            entities: entities.clone(),
        });
        self.backend.send(BackendRequest::SaveEntities { entities });
    }

    /// Switch an entity between realtime and batch mode. Returns false
    /// when rejected.
    pub fn set_realtime(&mut self, entity_id: &str, realtime: bool) -> bool {
        if self.saving {
            return false;
        }
        self.begin_update(BackendRequest::UpdateEntitySettings {
            entity_id: entity_id.to_string(),
            realtime: Some(realtime),
            interval: None,
        });
        true
    }

    fn begin_update(&mut self, request: BackendRequest) {
        self.saving = true;
        self.inflight = Some(Inflight::Update);
        self.backend.send(request);
    }

    /// Record an interval edit, restarting the debounce window for that
    /// entity. Out-of-range values are inert: neither committed nor
    /// allowed to cancel an earlier in-range edit.
    pub fn edit_interval(&mut self, entity_id: &str, value: u64, now: Instant) -> bool {
        if !(INTERVAL_MIN..=INTERVAL_MAX).contains(&value) {
            return false;
        }
        self.debounce.insert(
            entity_id.to_string(),
            PendingInterval {
                value,
                due: now + DEBOUNCE_WINDOW,
            },
        );
        true
    }

    /// Cancel any uncommitted interval edit for an entity.
    pub fn cancel_interval_edit(&mut self, entity_id: &str) {
        self.debounce.remove(entity_id);
    }

    /// Advance time-based work: fire due debounce commits and the settle
    /// fetch.
    pub fn tick(&mut self, now: Instant) {
        let due: Vec<String> = self
            .debounce
            .iter()
            .filter(|(_, p)| p.due <= now)
            .map(|(id, _)| id.clone())
            .collect();
        for entity_id in due {
            let Some(pending) = self.debounce.remove(&entity_id) else {
                continue;
            };
            if self.saving {
                // Reject, don't queue: same rule as every other mutation.
                debug!("interval commit for {} dropped while saving", entity_id);
                continue;
            }
            self.begin_update(BackendRequest::UpdateEntitySettings {
                entity_id,
                realtime: None,
                interval: Some(pending.value),
            });
        }

        if self.fetch_due.is_some_and(|due| due <= now) {
            self.fetch_due = None;
            self.request_fetch();
        }
    }

    /// Drain backend completions, translating them into effects for the
    /// owner to apply.
    pub fn poll(&mut self, now: Instant) -> Vec<PipelineEffect> {
        let mut effects = Vec::new();

        while let Some(event) = self.backend.poll_event() {
            match event {
                BackendEvent::Config(config) => {
                    self.fetch_pending = false;
                    effects.push(PipelineEffect::Config(config));
                }
                BackendEvent::SaveCompleted(success) => {
                    self.saving = false;
                    let inflight = self.inflight.take();
                    if success {
                        if let Some(Inflight::Replace { entities }) = inflight {
                            effects.push(PipelineEffect::OptimisticEntities(entities));
                        }
                        // Let the backend's reload settle before trusting
                        // a fresh fetch.
                        self.fetch_due = Some(now + SETTLE_DELAY);
                    } else {
                        warn!("save_entities failed, re-fetching configuration");
                        effects.push(PipelineEffect::MutationFailed);
                        self.request_fetch();
                    }
                }
                BackendEvent::UpdateCompleted(success) => {
                    self.saving = false;
                    self.inflight = None;
                    if !success {
                        warn!("update_entity_settings failed, re-fetching configuration");
                        effects.push(PipelineEffect::MutationFailed);
                    }
                    // No settle delay: a targeted patch does not trigger
                    // the slow reload. The fetched truth must overwrite
                    // any optimistic guess, so force the next render.
                    self.request_fetch();
                    self.force_render = true;
                }
            }
        }

        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendEndpoint;
    use tokio::sync::mpsc::error::TryRecvError;

    fn pipeline() -> (MutationPipeline, BackendEndpoint) {
        let (handle, endpoint) = BackendHandle::pair();
        (MutationPipeline::new(handle), endpoint)
    }

    fn drain_requests(endpoint: &mut BackendEndpoint) -> Vec<BackendRequest> {
        let mut requests = Vec::new();
        while let Ok(request) = endpoint.requests.try_recv() {
            requests.push(request);
        }
        requests
    }

    #[test]
    fn test_add_issues_full_list_replace() {
        let (mut pipeline, mut endpoint) = pipeline();
        let current = vec!["sensor.a".to_string()];

        assert!(pipeline.add("sensor.b", &current));
        assert!(pipeline.saving());

        assert_eq!(
            drain_requests(&mut endpoint),
            vec![BackendRequest::SaveEntities {
                entities: vec!["sensor.a".to_string(), "sensor.b".to_string()],
            }]
        );
    }

    #[test]
    fn test_add_rejected_when_already_tracked() {
        let (mut pipeline, mut endpoint) = pipeline();
        let current = vec!["sensor.a".to_string()];

        assert!(!pipeline.add("sensor.a", &current));
        assert!(!pipeline.saving());
        assert!(drain_requests(&mut endpoint).is_empty());
    }

    #[test]
    fn test_mutations_rejected_while_saving() {
        let (mut pipeline, mut endpoint) = pipeline();
        let current = vec!["sensor.a".to_string()];

        assert!(pipeline.add("sensor.b", &current));
        // Second action while Saving is a no-op, verified by call count.
        assert!(!pipeline.remove("sensor.b", &current));
        assert!(!pipeline.set_realtime("sensor.a", true));

        assert_eq!(drain_requests(&mut endpoint).len(), 1);
    }

    #[test]
    fn test_successful_save_applies_optimistic_list_and_defers_fetch() {
        let (mut pipeline, mut endpoint) = pipeline();
        let t0 = Instant::now();

        pipeline.add("sensor.b", &["sensor.a".to_string()]);
        drain_requests(&mut endpoint);

        endpoint.events.send(BackendEvent::SaveCompleted(true)).unwrap();
        let effects = pipeline.poll(t0);
        assert_eq!(
            effects,
            vec![PipelineEffect::OptimisticEntities(vec![
                "sensor.a".to_string(),
                "sensor.b".to_string(),
            ])]
        );
        assert!(!pipeline.saving());

        // No fetch until the settle delay has elapsed.
        pipeline.tick(t0 + SETTLE_DELAY - Duration::from_millis(1));
        assert!(drain_requests(&mut endpoint).is_empty());

        pipeline.tick(t0 + SETTLE_DELAY);
        assert_eq!(
            drain_requests(&mut endpoint),
            vec![BackendRequest::GetConfig]
        );
    }

    #[test]
    fn test_failed_save_refetches_immediately() {
        let (mut pipeline, mut endpoint) = pipeline();
        let t0 = Instant::now();

        pipeline.add("sensor.b", &[]);
        drain_requests(&mut endpoint);

        endpoint.events.send(BackendEvent::SaveCompleted(false)).unwrap();
        let effects = pipeline.poll(t0);

        // No optimistic swap on failure, and exactly one re-fetch.
        assert_eq!(effects, vec![PipelineEffect::MutationFailed]);
        assert_eq!(
            drain_requests(&mut endpoint),
            vec![BackendRequest::GetConfig]
        );
        assert!(!pipeline.saving());
    }

    #[test]
    fn test_failed_update_still_refetches_once() {
        let (mut pipeline, mut endpoint) = pipeline();
        let t0 = Instant::now();

        pipeline.set_realtime("sensor.a", true);
        drain_requests(&mut endpoint);

        endpoint.events.send(BackendEvent::UpdateCompleted(false)).unwrap();
        pipeline.poll(t0);

        assert_eq!(
            drain_requests(&mut endpoint),
            vec![BackendRequest::GetConfig]
        );
    }

    #[test]
    fn test_update_refetches_immediately_and_forces_render() {
        let (mut pipeline, mut endpoint) = pipeline();
        let t0 = Instant::now();

        assert!(pipeline.set_realtime("sensor.a", true));
        assert_eq!(
            drain_requests(&mut endpoint),
            vec![BackendRequest::UpdateEntitySettings {
                entity_id: "sensor.a".to_string(),
                realtime: Some(true),
                interval: None,
            }]
        );

        endpoint.events.send(BackendEvent::UpdateCompleted(true)).unwrap();
        pipeline.poll(t0);

        assert_eq!(
            drain_requests(&mut endpoint),
            vec![BackendRequest::GetConfig]
        );
        assert!(pipeline.take_force_render());
        assert!(!pipeline.take_force_render());
    }

    #[test]
    fn test_debounce_commits_last_value_once() {
        let (mut pipeline, mut endpoint) = pipeline();
        let t0 = Instant::now();

        // Three edits 100ms apart: each restarts the window.
        pipeline.edit_interval("sensor.a", 30, t0);
        pipeline.edit_interval("sensor.a", 45, t0 + Duration::from_millis(100));
        pipeline.edit_interval("sensor.a", 60, t0 + Duration::from_millis(200));

        // Not yet due relative to the last edit.
        pipeline.tick(t0 + Duration::from_millis(600));
        assert!(drain_requests(&mut endpoint).is_empty());

        pipeline.tick(t0 + Duration::from_millis(700));
        assert_eq!(
            drain_requests(&mut endpoint),
            vec![BackendRequest::UpdateEntitySettings {
                entity_id: "sensor.a".to_string(),
                realtime: None,
                interval: Some(60),
            }]
        );
    }

    #[test]
    fn test_out_of_range_interval_is_inert() {
        let (mut pipeline, mut endpoint) = pipeline();
        let t0 = Instant::now();

        assert!(!pipeline.edit_interval("sensor.a", 5, t0));
        assert!(!pipeline.edit_interval("sensor.a", 9999, t0));
        assert!(pipeline.pending_interval("sensor.a").is_none());

        // An out-of-range edit does not cancel an in-range one.
        assert!(pipeline.edit_interval("sensor.a", 60, t0));
        assert!(!pipeline.edit_interval("sensor.a", 5000, t0 + Duration::from_millis(100)));
        assert_eq!(pipeline.pending_interval("sensor.a"), Some(60));

        pipeline.tick(t0 + Duration::from_secs(1));
        assert_eq!(drain_requests(&mut endpoint).len(), 1);
    }

    #[test]
    fn test_boundary_intervals_accepted() {
        let (mut pipeline, _endpoint) = pipeline();
        let t0 = Instant::now();
        assert!(pipeline.edit_interval("sensor.a", INTERVAL_MIN, t0));
        assert!(pipeline.edit_interval("sensor.a", INTERVAL_MAX, t0));
    }

    #[test]
    fn test_debounce_commit_dropped_while_saving() {
        let (mut pipeline, mut endpoint) = pipeline();
        let t0 = Instant::now();

        pipeline.edit_interval("sensor.a", 60, t0);
        pipeline.add("sensor.b", &[]);
        drain_requests(&mut endpoint);

        // The commit falls due while the save is still in flight.
        pipeline.tick(t0 + Duration::from_secs(1));
        assert!(drain_requests(&mut endpoint).is_empty());
        assert!(pipeline.pending_interval("sensor.a").is_none());
    }

    #[test]
    fn test_fetches_are_coalesced() {
        let (mut pipeline, mut endpoint) = pipeline();

        pipeline.request_fetch();
        pipeline.request_fetch();
        pipeline.request_fetch();
        assert_eq!(drain_requests(&mut endpoint).len(), 1);

        // Completion clears the pending flag; the next request goes out.
        endpoint.events.send(BackendEvent::Config(None)).unwrap();
        pipeline.poll(Instant::now());
        pipeline.request_fetch();
        assert_eq!(drain_requests(&mut endpoint).len(), 1);
    }

    #[test]
    fn test_config_event_passed_through() {
        let (mut pipeline, endpoint) = pipeline();
        let config = ExportConfig::default();
        endpoint
            .events
            .send(BackendEvent::Config(Some(config.clone())))
            .unwrap();

        assert_eq!(
            pipeline.poll(Instant::now()),
            vec![PipelineEffect::Config(Some(config))]
        );
    }

    #[test]
    fn test_remove_of_untracked_entity_rejected() {
        let (mut pipeline, mut endpoint) = pipeline();
        assert!(!pipeline.remove("sensor.ghost", &["sensor.a".to_string()]));
        assert!(matches!(
            endpoint.requests.try_recv(),
            Err(TryRecvError::Empty)
        ));
    }
}
