//! Application state and interaction logic.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use crate::backend::BackendHandle;
use crate::data::config::EXPORT_SENSOR_PREFIX;
use crate::data::{find_candidates, project, Candidate, ChangeGate, ExportConfig, Row, TrackedEntity};
use crate::pipeline::{MutationPipeline, PipelineEffect};
use crate::source::{SnapshotSource, StateSnapshot};
use crate::ui::Theme;

/// Input mode of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Table navigation.
    #[default]
    Normal,
    /// Typing a candidate search query.
    Search,
    /// Typing an interval for the selected row.
    EditInterval,
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub mode: Mode,
    pub show_help: bool,
    pub show_detail: bool,

    // Data
    source: Box<dyn SnapshotSource>,
    pub snapshot: StateSnapshot,
    pub config: Option<ExportConfig>,
    pub rows: Vec<Row>,
    gate: ChangeGate,
    pub pipeline: MutationPipeline,
    pub load_error: Option<String>,

    // Navigation
    pub selected: usize,

    // Candidate search
    pub search_query: String,
    pub candidates: Vec<Candidate>,
    pub candidate_selected: usize,

    // Interval editing
    pub interval_input: String,

    // UI
    pub theme: Theme,
    pub dirty: bool,
    pub last_updated: Option<Instant>,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App over a snapshot source and a backend connection.
    pub fn new(source: Box<dyn SnapshotSource>, backend: BackendHandle) -> Self {
        Self {
            running: true,
            mode: Mode::Normal,
            show_help: false,
            show_detail: false,
            source,
            snapshot: StateSnapshot::default(),
            config: None,
            rows: Vec::new(),
            gate: ChangeGate::new(),
            pipeline: MutationPipeline::new(backend),
            load_error: None,
            selected: 0,
            search_query: String::new(),
            candidates: Vec::new(),
            candidate_selected: 0,
            interval_input: String::new(),
            theme: Theme::auto_detect(),
            dirty: true,
            last_updated: None,
            status_message: None,
        }
    }

    /// Returns a description of the snapshot source.
    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    /// Advance the panel by one cooperative step: poll the snapshot feed,
    /// fire due timers, drain backend completions, re-project.
    pub fn tick(&mut self, now: Instant) {
        if let Some(err) = self.source.error() {
            self.load_error = Some(err.to_string());
        }

        if let Some(snapshot) = self.source.poll() {
            self.snapshot = snapshot;
            self.load_error = None;
            self.last_updated = Some(now);
            // The configuration is fetched lazily, on first snapshot
            // delivery; the pending-fetch flag coalesces repeats.
            self.pipeline.request_fetch();
            if self.mode == Mode::Search {
                self.refresh_candidates();
            }
            self.reproject();
        }

        self.pipeline.tick(now);

        for effect in self.pipeline.poll(now) {
            match effect {
                PipelineEffect::Config(config) => {
                    // Wholesale replace, never a field-level merge: the
                    // fetched truth wins over any optimistic guess.
                    self.config = config;
                    self.clamp_selection();
                    self.reproject();
                }
                PipelineEffect::OptimisticEntities(entity_ids) => {
                    self.apply_optimistic(entity_ids);
                    self.clamp_selection();
                    self.reproject();
                }
                PipelineEffect::MutationFailed => {
                    self.set_status_message("Save failed, reloading configuration".to_string());
                }
            }
        }

        if self.pipeline.take_force_render() {
            self.gate.force();
            self.reproject();
        }
    }

    /// Rebuild rows from configuration x snapshot and mark the UI dirty
    /// if the projected view actually changed.
    fn reproject(&mut self) {
        let config = self.config.clone().unwrap_or_default();
        let rows = project(&config, &self.snapshot);
        if self.gate.should_render(&rows) {
            self.rows = rows;
            self.dirty = true;
        }
    }

    /// Swap the local tracked list to the acknowledged one, reusing
    /// settings for entities that survive and placeholders for new ones.
    /// The next reconciliation fetch overwrites all of this.
    fn apply_optimistic(&mut self, entity_ids: Vec<String>) {
        let mut config = self.config.clone().unwrap_or_default();
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
        self.config = Some(config);
    }

    /// Ids of all tracked entities, in configuration order.
    pub fn tracked_ids(&self) -> Vec<String> {
        self.config.as_ref().map(ExportConfig::entity_ids).unwrap_or_default()
    }

    /// The currently selected row, if any.
    pub fn selected_row(&self) -> Option<&Row> {
        self.rows.get(self.selected)
    }

    fn clamp_selection(&mut self) {
        let len = self
            .config
            .as_ref()
            .map(|c| c.entities.len())
            .unwrap_or(0);
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    // ---- navigation ----

    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    pub fn select_next_n(&mut self, n: usize) {
        match self.mode {
            Mode::Search => {
                let max = self.candidates.len().saturating_sub(1);
                self.candidate_selected = (self.candidate_selected + n).min(max);
            }
            _ => {
                let max = self.rows.len().saturating_sub(1);
                self.selected = (self.selected + n).min(max);
            }
        }
        self.dirty = true;
    }

    pub fn select_prev_n(&mut self, n: usize) {
        match self.mode {
            Mode::Search => {
                self.candidate_selected = self.candidate_selected.saturating_sub(n);
            }
            _ => {
                self.selected = self.selected.saturating_sub(n);
            }
        }
        self.dirty = true;
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
        self.dirty = true;
    }

    pub fn select_last(&mut self) {
        self.selected = self.rows.len().saturating_sub(1);
        self.dirty = true;
    }

    // ---- candidate search ----

    /// Enter search mode for adding a new tracked entity.
    pub fn start_search(&mut self) {
        self.mode = Mode::Search;
        self.search_query.clear();
        self.candidates.clear();
        self.candidate_selected = 0;
        self.dirty = true;
    }

    pub fn cancel_search(&mut self) {
        self.mode = Mode::Normal;
        self.search_query.clear();
        self.candidates.clear();
        self.dirty = true;
    }

    pub fn search_push(&mut self, c: char) {
        self.search_query.push(c);
        self.refresh_candidates();
        self.dirty = true;
    }

    pub fn search_pop(&mut self) {
        self.search_query.pop();
        self.refresh_candidates();
        self.dirty = true;
    }

    fn refresh_candidates(&mut self) {
        let tracked: BTreeSet<String> = self.tracked_ids().into_iter().collect();
        self.candidates = find_candidates(
            &self.search_query,
            &self.snapshot,
            &tracked,
            &[EXPORT_SENSOR_PREFIX],
        );
        let max = self.candidates.len().saturating_sub(1);
        self.candidate_selected = self.candidate_selected.min(max);
    }

    /// Track the currently highlighted candidate.
    pub fn add_selected_candidate(&mut self) {
        let Some(candidate) = self.candidates.get(self.candidate_selected) else {
            return;
        };
        let entity_id = candidate.entity_id.clone();
        let current = self.tracked_ids();
        if self.pipeline.add(&entity_id, &current) {
            self.set_status_message(format!("Adding {}", entity_id));
            self.cancel_search();
        } else {
            self.set_status_message("Busy saving, try again".to_string());
        }
    }

    // ---- mutations on the selected row ----

    /// Stop tracking the selected entity.
    pub fn remove_selected(&mut self) {
        let Some(row) = self.selected_row() else {
            return;
        };
        let entity_id = row.entity_id.clone();
        let current = self.tracked_ids();
        if self.pipeline.remove(&entity_id, &current) {
            self.set_status_message(format!("Removing {}", entity_id));
        } else {
            self.set_status_message("Busy saving, try again".to_string());
        }
        self.dirty = true;
    }

    /// Flip the selected entity between realtime and batch mode.
    pub fn toggle_realtime_selected(&mut self) {
        let Some(row) = self.selected_row() else {
            return;
        };
        let entity_id = row.entity_id.clone();
        let realtime = !row.realtime;
        if self.pipeline.set_realtime(&entity_id, realtime) {
            let mode = if realtime { "realtime" } else { "batch" };
            self.set_status_message(format!("{} -> {}", entity_id, mode));
        } else {
            self.set_status_message("Busy saving, try again".to_string());
        }
        self.dirty = true;
    }

    // ---- interval editing ----

    /// Begin editing the selected row's batch interval.
    pub fn start_interval_edit(&mut self) {
        if self.selected_row().is_none() {
            return;
        }
        self.mode = Mode::EditInterval;
        self.interval_input.clear();
        self.dirty = true;
    }

    /// Append a digit to the interval input and restart the debounce
    /// window with the current value. Out-of-range values stay visible in
    /// the input but are never scheduled for commit.
    pub fn interval_push(&mut self, c: char, now: Instant) {
        if !c.is_ascii_digit() || self.interval_input.len() >= 4 {
            return;
        }
        self.interval_input.push(c);
        self.schedule_interval(now);
        self.dirty = true;
    }

    pub fn interval_pop(&mut self, now: Instant) {
        self.interval_input.pop();
        self.schedule_interval(now);
        self.dirty = true;
    }

    fn schedule_interval(&mut self, now: Instant) {
        let Some(row) = self.selected_row() else {
            return;
        };
        let entity_id = row.entity_id.clone();
        if let Ok(value) = self.interval_input.parse::<u64>() {
            self.pipeline.edit_interval(&entity_id, value, now);
        }
    }

    /// Leave interval editing; any scheduled commit stays armed.
    pub fn finish_interval_edit(&mut self) {
        self.mode = Mode::Normal;
        self.interval_input.clear();
        self.dirty = true;
    }

    /// Leave interval editing and discard the uncommitted edit.
    pub fn cancel_interval_edit(&mut self) {
        if let Some(row) = self.selected_row() {
            let entity_id = row.entity_id.clone();
            self.pipeline.cancel_interval_edit(&entity_id);
        }
        self.mode = Mode::Normal;
        self.interval_input.clear();
        self.dirty = true;
    }

    // ---- overlays, status, lifecycle ----

    /// Open the detail overlay for the selected entity.
    pub fn enter_detail(&mut self) {
        if self.selected_row().is_some() {
            self.show_detail = true;
            self.dirty = true;
        }
    }

    /// Navigate back: close overlays first, then cancel modes.
    pub fn go_back(&mut self) {
        if self.show_help {
            self.show_help = false;
        } else if self.show_detail {
            self.show_detail = false;
        } else {
            match self.mode {
                Mode::Search => self.cancel_search(),
                Mode::EditInterval => self.cancel_interval_edit(),
                Mode::Normal => {}
            }
        }
        self.dirty = true;
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        self.dirty = true;
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
        self.dirty = true;
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendEndpoint, BackendEvent, BackendRequest};
    use crate::source::{ChannelSource, EntityState};
    use tokio::sync::watch;

    fn app_with_channel() -> (App, watch::Sender<StateSnapshot>, BackendEndpoint) {
        let (tx, source) = ChannelSource::create("test");
        let (handle, endpoint) = BackendHandle::pair();
        let app = App::new(Box::new(source), handle);
        (app, tx, endpoint)
    }

    fn snapshot_with(ids: &[&str]) -> StateSnapshot {
        let mut snapshot = StateSnapshot::default();
        for id in ids {
            snapshot.entities.insert(
                id.to_string(),
                EntityState {
                    state: "1".to_string(),
                    ..Default::default()
                },
            );
        }
        snapshot
    }

    fn count_requests(endpoint: &mut BackendEndpoint) -> usize {
        let mut n = 0;
        while endpoint.requests.try_recv().is_ok() {
            n += 1;
        }
        n
    }

    #[test]
    fn test_first_snapshot_triggers_single_fetch() {
        let (mut app, tx, mut endpoint) = app_with_channel();
        let now = Instant::now();

        // The channel source yields its initial snapshot and then a push;
        // both trigger a fetch request, coalesced to one.
        app.tick(now);
        tx.send(snapshot_with(&["sensor.a"])).unwrap();
        app.tick(now);

        assert_eq!(count_requests(&mut endpoint), 1);
    }

    #[test]
    fn test_config_effect_projects_rows() {
        let (mut app, tx, endpoint) = app_with_channel();
        let now = Instant::now();

        tx.send(snapshot_with(&["sensor.a"])).unwrap();
        app.tick(now);

        let config = ExportConfig {
            entities: vec![TrackedEntity::placeholder("sensor.a", "hass")],
            ..Default::default()
        };
        endpoint
            .events
            .send(BackendEvent::Config(Some(config)))
            .unwrap();
        app.tick(now);

        assert_eq!(app.rows.len(), 1);
        assert_eq!(app.rows[0].entity_id, "sensor.a");
    }

    #[test]
    fn test_absent_config_means_zero_rows() {
        let (mut app, tx, endpoint) = app_with_channel();
        let now = Instant::now();

        tx.send(snapshot_with(&["sensor.a"])).unwrap();
        app.tick(now);
        endpoint.events.send(BackendEvent::Config(None)).unwrap();
        app.tick(now);

        assert!(app.config.is_none());
        assert!(app.rows.is_empty());
    }

    #[test]
    fn test_optimistic_entities_visible_before_reconciliation() {
        let (mut app, tx, mut endpoint) = app_with_channel();
        let now = Instant::now();

        tx.send(snapshot_with(&["sensor.a", "sensor.b"])).unwrap();
        app.tick(now);
        endpoint
            .events
            .send(BackendEvent::Config(Some(ExportConfig {
                entities: vec![TrackedEntity::placeholder("sensor.a", "hass")],
                ..Default::default()
            })))
            .unwrap();
        app.tick(now);
        count_requests(&mut endpoint);

        assert!(app.pipeline.add("sensor.b", &app.tracked_ids()));
        endpoint.events.send(BackendEvent::SaveCompleted(true)).unwrap();
        app.tick(now);

        // Local list already shows sensor.b; the fetch is still pending.
        assert_eq!(app.tracked_ids(), vec!["sensor.a", "sensor.b"]);
        assert_eq!(app.rows.len(), 2);
    }

    #[test]
    fn test_search_mode_filters_tracked_entities() {
        let (mut app, tx, endpoint) = app_with_channel();
        let now = Instant::now();

        tx.send(snapshot_with(&["sensor.temp_in", "sensor.temp_out"])).unwrap();
        app.tick(now);
        endpoint
            .events
            .send(BackendEvent::Config(Some(ExportConfig {
                entities: vec![TrackedEntity::placeholder("sensor.temp_in", "hass")],
                ..Default::default()
            })))
            .unwrap();
        app.tick(now);

        app.start_search();
        app.search_push('t');
        app.search_push('e');
        app.search_push('m');
        app.search_push('p');

        assert_eq!(app.candidates.len(), 1);
        assert_eq!(app.candidates[0].entity_id, "sensor.temp_out");
    }

    #[test]
    fn test_interval_digits_schedule_debounced_commit() {
        let (mut app, tx, mut endpoint) = app_with_channel();
        let t0 = Instant::now();

        tx.send(snapshot_with(&["sensor.a"])).unwrap();
        app.tick(t0);
        endpoint
            .events
            .send(BackendEvent::Config(Some(ExportConfig {
                entities: vec![TrackedEntity::placeholder("sensor.a", "hass")],
                ..Default::default()
            })))
            .unwrap();
        app.tick(t0);
        count_requests(&mut endpoint);

        app.start_interval_edit();
        app.interval_push('6', t0);
        app.interval_push('0', t0);
        app.finish_interval_edit();

        // "6" alone is below the minimum and never scheduled; "60" is the
        // armed value.
        assert_eq!(app.pipeline.pending_interval("sensor.a"), Some(60));

        app.tick(t0 + Duration::from_secs(1));
        let request = endpoint.requests.try_recv().unwrap();
        assert_eq!(
            request,
            BackendRequest::UpdateEntitySettings {
                entity_id: "sensor.a".to_string(),
                realtime: None,
                interval: Some(60),
            }
        );
    }
}
