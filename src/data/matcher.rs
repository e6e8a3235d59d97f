//! Candidate search over the live snapshot.
//!
//! Finds entities not yet tracked whose id or display name matches a
//! query. This is a latency guard for per-keystroke search against a
//! large snapshot, not a relevance ranking: results come back in
//! first-encountered snapshot order and the scan stops at the cap.

use std::collections::BTreeSet;

use crate::source::StateSnapshot;

/// Maximum number of candidates returned for one query.
pub const MAX_CANDIDATES: usize = 10;

/// Queries shorter than this return nothing, to avoid flooding the UI on
/// a near-empty query.
pub const MIN_QUERY_LEN: usize = 2;

/// An entity offered for tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub entity_id: String,
    pub display_name: String,
    pub state: String,
}

/// Search the snapshot for untracked entities matching `query`.
///
/// Matching is a case-insensitive substring test against the
/// concatenation of entity id and display name. Entities already in
/// `tracked` or whose id starts with one of `reserved_prefixes` are never
/// offered.
pub fn find_candidates(
    query: &str,
    snapshot: &StateSnapshot,
    tracked: &BTreeSet<String>,
    reserved_prefixes: &[&str],
) -> Vec<Candidate> {
    if query.chars().count() < MIN_QUERY_LEN {
        return Vec::new();
    }
    let needle = query.to_lowercase();

    let mut candidates = Vec::new();
    for (entity_id, entity) in &snapshot.entities {
        if tracked.contains(entity_id) {
            continue;
        }
        if reserved_prefixes.iter().any(|p| entity_id.starts_with(p)) {
            continue;
        }

        let display = entity.friendly_name().unwrap_or(entity_id);
        let haystack = format!("{} {}", entity_id, display).to_lowercase();
        if !haystack.contains(&needle) {
            continue;
        }

        candidates.push(Candidate {
            entity_id: entity_id.clone(),
            display_name: display.to_string(),
            state: entity.state.clone(),
        });
        if candidates.len() >= MAX_CANDIDATES {
            break;
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::EntityState;
    use serde_json::json;

    fn snapshot_of(ids: &[&str]) -> StateSnapshot {
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

    #[test]
    fn test_short_query_returns_nothing() {
        let snapshot = snapshot_of(&["sensor.temp"]);
        let tracked = BTreeSet::new();
        assert!(find_candidates("t", &snapshot, &tracked, &[]).is_empty());
        assert!(find_candidates("", &snapshot, &tracked, &[]).is_empty());
    }

    #[test]
    fn test_case_insensitive_match_on_id_and_name() {
        let mut snapshot = snapshot_of(&[]);
        snapshot.entities.insert(
            "sensor.outdoor".to_string(),
            EntityState {
                state: "5".to_string(),
                attributes: [("friendly_name".to_string(), json!("Garden Thermometer"))]
                    .into_iter()
                    .collect(),
                ..Default::default()
            },
        );
        let tracked = BTreeSet::new();

        // Matches on display name, regardless of case.
        let hits = find_candidates("GARDEN", &snapshot, &tracked, &[]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entity_id, "sensor.outdoor");

        // Matches on entity id.
        let hits = find_candidates("outdoor", &snapshot, &tracked, &[]);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_tracked_entities_excluded() {
        let snapshot = snapshot_of(&["sensor.temp_a", "sensor.temp_b"]);
        let tracked: BTreeSet<String> = ["sensor.temp_a".to_string()].into_iter().collect();

        let hits = find_candidates("temp", &snapshot, &tracked, &[]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entity_id, "sensor.temp_b");
    }

    #[test]
    fn test_reserved_prefixes_excluded() {
        let snapshot = snapshot_of(&["sensor.vm_export_temp", "sensor.temp"]);
        let tracked = BTreeSet::new();

        let hits = find_candidates("temp", &snapshot, &tracked, &["sensor.vm_export_"]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entity_id, "sensor.temp");
    }

    #[test]
    fn test_result_capped() {
        let ids: Vec<String> = (0..25).map(|i| format!("sensor.temp_{:02}", i)).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let snapshot = snapshot_of(&refs);
        let tracked = BTreeSet::new();

        let hits = find_candidates("temp", &snapshot, &tracked, &[]);
        assert_eq!(hits.len(), MAX_CANDIDATES);
        // First-encountered snapshot order, not relevance.
        assert_eq!(hits[0].entity_id, "sensor.temp_00");
    }
}
