//! Entity mention validation.
//!
//! After each generation, verify that every entity the scene manifest
//! requires actually appears in the narrative. Lookup is by stable
//! entity ID against registered display names and aliases; the result
//! is an exact list of missing IDs, not a fuzzy confidence score.

use std::collections::HashMap;

use worldarch_domain::{Entity, EntityId, SceneManifest};

/// Result of one mention-validation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MentionReport {
    /// Required entities whose name or aliases never appear in the narrative.
    pub missing: Vec<EntityId>,
    /// Required entities not found in the registry at all.
    pub unknown: Vec<EntityId>,
}

impl MentionReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.unknown.is_empty()
    }
}

/// Check the narrative against the scene manifest.
///
/// Entities that are hidden, invisible, or unconscious are exempt from
/// the mention requirement.
pub fn verify_mentions(
    narrative: &str,
    manifest: &SceneManifest,
    entities: &[Entity],
) -> MentionReport {
    let by_id: HashMap<&EntityId, &Entity> = entities.iter().map(|e| (&e.id, e)).collect();

    let mut report = MentionReport::default();
    for required in &manifest.required {
        match by_id.get(required) {
            Some(entity) => {
                if entity.presence.requires_mention() && !entity.is_mentioned_in(narrative) {
                    report.missing.push(required.clone());
                }
            }
            None => report.unknown.push(required.clone()),
        }
    }

    report
}
