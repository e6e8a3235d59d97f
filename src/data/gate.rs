//! Render change gate.
//!
//! Snapshots arrive far more often than the projected rows actually
//! change. The gate fingerprints each projected row set and lets the
//! caller skip redraw work when nothing is different.

use crate::data::project::Row;

/// Suppresses redundant renders by comparing row-set fingerprints.
///
/// The fingerprint is the canonical JSON serialization of the row
/// sequence: order-sensitive, field-order-stable, and free of unordered
/// map iteration, so identical inputs always produce identical bytes.
#[derive(Debug, Default)]
pub struct ChangeGate {
    last_fingerprint: Option<String>,
}

impl ChangeGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the rows differ from the last rendered set, and
    /// records their fingerprint as the new baseline.
    pub fn should_render(&mut self, rows: &[Row]) -> bool {
        // Serializing plain owned data cannot fail.
        let fingerprint = serde_json::to_string(rows).unwrap_or_default();
        if self.last_fingerprint.as_deref() == Some(fingerprint.as_str()) {
            return false;
        }
        self.last_fingerprint = Some(fingerprint);
        true
    }

    /// Discard the baseline so the next comparison passes unconditionally.
    ///
    /// Used after a settings mutation, where the fetched truth must
    /// overwrite any optimistic guess even if the rows happen to match.
    pub fn force(&mut self) {
        self.last_fingerprint = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, realtime: bool) -> Row {
        Row {
            entity_id: id.to_string(),
            display_name: id.to_string(),
            metric_name: format!("hass_{}", id),
            realtime,
            interval: 300,
            tags: "\u{2014}".to_string(),
        }
    }

    #[test]
    fn test_identical_rows_skip_second_render() {
        let mut gate = ChangeGate::new();
        let rows = vec![row("sensor.a", false)];
        assert!(gate.should_render(&rows));
        assert!(!gate.should_render(&rows));
    }

    #[test]
    fn test_changed_rows_pass() {
        let mut gate = ChangeGate::new();
        assert!(gate.should_render(&[row("sensor.a", false)]));
        assert!(gate.should_render(&[row("sensor.a", true)]));
    }

    #[test]
    fn test_order_is_significant() {
        let mut gate = ChangeGate::new();
        assert!(gate.should_render(&[row("sensor.a", false), row("sensor.b", false)]));
        assert!(gate.should_render(&[row("sensor.b", false), row("sensor.a", false)]));
    }

    #[test]
    fn test_force_bypasses_gate_once() {
        let mut gate = ChangeGate::new();
        let rows = vec![row("sensor.a", false)];
        assert!(gate.should_render(&rows));
        gate.force();
        assert!(gate.should_render(&rows));
        assert!(!gate.should_render(&rows));
    }

    #[test]
    fn test_empty_row_set_still_gated() {
        let mut gate = ChangeGate::new();
        assert!(gate.should_render(&[]));
        assert!(!gate.should_render(&[]));
    }
}
