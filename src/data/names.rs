//! Display name resolution.
//!
//! Host friendly names often duplicate the device name in full, producing
//! labels like "Acme X100 Kitchen Battery". This module decomposes such a
//! name against the entity's device registry entry into a shorter
//! "Acme X100 / Kitchen / Battery" form. Every step falls back
//! conservatively: when the pieces do not line up, the friendly name is
//! returned unchanged.

use crate::source::{Device, StateSnapshot};

/// Resolve the display name for an entity against the snapshot's device
/// relationships.
///
/// Returns the entity id itself when the entity is absent from the
/// snapshot.
pub fn resolve_display_name(entity_id: &str, snapshot: &StateSnapshot) -> String {
    let friendly = snapshot.display_value(entity_id);
    match snapshot.device_for(entity_id) {
        Some(device) => decompose(&friendly, device),
        None => friendly,
    }
}

/// Decompose a friendly name against its device entry.
///
/// The friendly name must either equal the device name or extend it by a
/// space-separated suffix; anything else means the two are unrelated and
/// the friendly name wins unchanged.
fn decompose(friendly: &str, device: &Device) -> String {
    let Some(device_name) = device.name.as_deref() else {
        return friendly.to_string();
    };

    let suffix = if friendly == device_name {
        ""
    } else if let Some(rest) = friendly.strip_prefix(device_name).and_then(|r| r.strip_prefix(' ')) {
        rest
    } else {
        return friendly.to_string();
    };

    let (prefix, remainder) = split_device_name(device_name, device);

    let mut segments: Vec<&str> = Vec::with_capacity(3);
    if !prefix.is_empty() {
        segments.push(prefix);
    }
    if !remainder.is_empty() {
        segments.push(remainder);
    }
    if !suffix.is_empty() {
        segments.push(suffix);
    }
    segments.join(" / ")
}

/// Split a device name into a manufacturer/model prefix and a remainder.
///
/// Tries `"<manufacturer> <model> "` first, then `"<model> "` alone,
/// keeping the longest prefix that matches and leaves a non-empty
/// remainder. When neither matches, nothing is stripped.
fn split_device_name<'a>(device_name: &'a str, device: &Device) -> (&'a str, &'a str) {
    let manufacturer = device.manufacturer.as_deref().unwrap_or("");
    let model = device.model.as_deref().unwrap_or("");

    let mut candidates: Vec<String> = Vec::new();
    if !manufacturer.is_empty() && !model.is_empty() {
        candidates.push(format!("{} {}", manufacturer, model));
    }
    if !model.is_empty() {
        candidates.push(model.to_string());
    }

    for candidate in candidates {
        if let Some(rest) = device_name
            .strip_prefix(candidate.as_str())
            .and_then(|r| r.strip_prefix(' '))
        {
            // A prefix that consumes the whole name would leave a label
            // starting with "/"; leave the name intact instead.
            if !rest.is_empty() {
                return (&device_name[..candidate.len()], rest);
            }
        }
    }

    ("", device_name)
}
