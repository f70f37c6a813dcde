//! Campaign game state and the sparse state-update merge.
//!
//! `GameState` is the authoritative per-campaign document: location,
//! resources, hit points, the NPC registry, and any custom campaign
//! state all live in one JSON-object `fields` map. After each turn the
//! parser's `state_updates` mapping is merged in here.
//!
//! Merge contract:
//! - keys absent from the update leave existing state untouched;
//! - the `"__DELETE__"` sentinel removes a key at any nesting depth,
//!   and deleting an absent key is a no-op, never an error;
//! - malformed entries are skipped and reported while the rest of the
//!   update still applies - losing one field beats losing the turn.
//!
//! The domain stays free of logging; callers get an [`UpdateReport`]
//! and decide what to log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::CampaignId;

/// Wire sentinel meaning "remove this key from state".
pub const DELETE_SENTINEL: &str = "__DELETE__";

/// The authoritative mutable state document for one campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub campaign_id: CampaignId,
    /// Flexible JSON-object payload. Never contains debug or
    /// internal-only keys; those are stripped before anything is merged.
    #[serde(default)]
    pub fields: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GameState {
    pub fn new(campaign_id: CampaignId, now: DateTime<Utc>) -> Self {
        Self {
            campaign_id,
            fields: Map::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn location(&self) -> Option<&str> {
        self.fields.get("location").and_then(Value::as_str)
    }

    /// Merge a sparse `state_updates` mapping into this state.
    ///
    /// Object values merge recursively; scalars and arrays replace.
    /// Returns a report of what was applied, removed, and skipped.
    pub fn apply_updates(&mut self, updates: &Map<String, Value>, now: DateTime<Utc>) -> UpdateReport {
        let mut report = UpdateReport::default();
        merge_into(&mut self.fields, updates, "", &mut report);
        if !report.is_noop() {
            self.updated_at = now;
        }
        report
    }
}

/// Outcome of one `apply_updates` call, for engine-side logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Dotted paths of keys that were set or replaced.
    pub applied: Vec<String>,
    /// Dotted paths removed via the delete sentinel.
    pub removed: Vec<String>,
    /// Entries that could not be applied, with the reason.
    pub skipped: Vec<SkippedUpdate>,
}

impl UpdateReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty() && self.removed.is_empty()
    }
}

/// A single update entry that was rejected during the merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedUpdate {
    pub path: String,
    pub reason: String,
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn is_delete_sentinel(value: &Value) -> bool {
    value.as_str() == Some(DELETE_SENTINEL)
}

fn merge_into(
    target: &mut Map<String, Value>,
    updates: &Map<String, Value>,
    prefix: &str,
    report: &mut UpdateReport,
) {
    for (key, value) in updates {
        let path = join_path(prefix, key);

        if key.is_empty() {
            report.skipped.push(SkippedUpdate {
                path,
                reason: "empty key".to_string(),
            });
            continue;
        }

        if is_delete_sentinel(value) {
            // No-op when the key is absent.
            if target.remove(key).is_some() {
                report.removed.push(path);
            }
            continue;
        }

        match value {
            Value::Object(child_updates) => {
                // Recurse into an existing object; anything else is
                // replaced by a fresh object built from the update.
                if !target.get(key).is_some_and(Value::is_object) {
                    target.insert(key.clone(), Value::Object(Map::new()));
                }
                if let Some(Value::Object(child)) = target.get_mut(key) {
                    merge_into(child, child_updates, &path, report);
                    // A child consisting solely of delete sentinels can
                    // leave an empty object behind where none existed.
                    if child.is_empty() && child_updates.values().all(is_delete_sentinel) {
                        target.remove(key);
                    }
                }
            }
            _ => {
                target.insert(key.clone(), value.clone());
                report.applied.push(path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state_with(fields: Value) -> GameState {
        let mut state = GameState::new(CampaignId::new(), Utc::now());
        if let Value::Object(map) = fields {
            state.fields = map;
        }
        state
    }

    fn updates(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("updates must be an object"),
        }
    }

    #[test]
    fn test_sparse_merge_leaves_other_keys() {
        let mut state = state_with(json!({"location": "tavern", "hp": 12}));
        state.apply_updates(&updates(json!({"hp": 10})), Utc::now());

        assert_eq!(state.get("hp"), Some(&json!(10)));
        assert_eq!(state.location(), Some("tavern"));
    }

    #[test]
    fn test_delete_sentinel_removes_key() {
        let mut state = state_with(json!({"npc_guard_003": {"hp": 5}, "location": "gate"}));
        let report = state.apply_updates(&updates(json!({"npc_guard_003": "__DELETE__"})), Utc::now());

        assert!(state.get("npc_guard_003").is_none());
        assert_eq!(state.location(), Some("gate"));
        assert_eq!(report.removed, vec!["npc_guard_003".to_string()]);
    }

    #[test]
    fn test_delete_absent_key_is_noop() {
        let mut state = state_with(json!({"location": "gate"}));
        let report = state.apply_updates(&updates(json!({"npc_guard_003": "__DELETE__"})), Utc::now());

        assert!(report.removed.is_empty());
        assert!(report.skipped.is_empty());
        assert_eq!(state.location(), Some("gate"));
    }

    #[test]
    fn test_delete_sentinel_at_nested_depth() {
        let mut state = state_with(json!({
            "npcs": {"cassian": {"mood": "wary", "hp": 8}, "hale": {"hp": 14}}
        }));
        let report = state.apply_updates(
            &updates(json!({"npcs": {"cassian": {"mood": "__DELETE__"}}})),
            Utc::now(),
        );

        assert_eq!(state.get("npcs"), Some(&json!({"cassian": {"hp": 8}, "hale": {"hp": 14}})));
        assert_eq!(report.removed, vec!["npcs.cassian.mood".to_string()]);
    }

    #[test]
    fn test_nested_objects_merge_recursively() {
        let mut state = state_with(json!({"resources": {"gold": 10, "torches": 2}}));
        state.apply_updates(&updates(json!({"resources": {"gold": 7}})), Utc::now());

        assert_eq!(state.get("resources"), Some(&json!({"gold": 7, "torches": 2})));
    }

    #[test]
    fn test_object_update_over_scalar_replaces() {
        let mut state = state_with(json!({"hp": 12}));
        state.apply_updates(&updates(json!({"hp": {"current": 9, "max": 12}})), Utc::now());

        assert_eq!(state.get("hp"), Some(&json!({"current": 9, "max": 12})));
    }

    #[test]
    fn test_delete_only_update_on_missing_subtree_leaves_nothing() {
        let mut state = state_with(json!({"location": "gate"}));
        state.apply_updates(
            &updates(json!({"npcs": {"ghost": "__DELETE__"}})),
            Utc::now(),
        );

        // No phantom empty object should appear.
        assert!(state.get("npcs").is_none());
    }

    #[test]
    fn test_empty_key_skipped_but_rest_applies() {
        let mut state = state_with(json!({}));
        let report = state.apply_updates(&updates(json!({"": 1, "hp": 10})), Utc::now());

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(state.get("hp"), Some(&json!(10)));
    }

    #[test]
    fn test_noop_update_does_not_touch_timestamp() {
        let created = Utc::now();
        let mut state = GameState::new(CampaignId::new(), created);
        let later = created + chrono::Duration::seconds(30);
        state.apply_updates(&Map::new(), later);

        assert_eq!(state.updated_at, created);
    }

    #[test]
    fn test_serde_roundtrip() {
        let state = state_with(json!({"location": "tavern", "resources": {"gold": 3}}));
        let json = serde_json::to_string(&state).expect("serializes");
        let back: GameState = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back.fields, state.fields);
    }
}
