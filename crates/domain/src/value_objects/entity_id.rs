//! Stable entity identifiers.
//!
//! Every trackable game object (PC, NPC, location, item) carries an
//! immutable structured ID of the form `{kind}_{slug}_{sequence}`,
//! e.g. `npc_cassian_001`. Narrative validation looks entities up by
//! this ID instead of fuzzy name matching.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Category of a trackable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Pc,
    Npc,
    Location,
    Item,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pc => "pc",
            Self::Npc => "npc",
            Self::Location => "location",
            Self::Item => "item",
        }
    }
}

impl FromStr for EntityKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pc" => Ok(Self::Pc),
            "npc" => Ok(Self::Npc),
            "location" => Ok(Self::Location),
            "item" => Ok(Self::Item),
            other => Err(DomainError::invalid_id(format!(
                "unknown entity kind '{other}'"
            ))),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured entity ID: `{kind}_{slug}_{sequence:03}`.
///
/// The slug is lowercase ASCII (letters, digits, internal hyphens);
/// the sequence disambiguates entities that share a slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId {
    kind: EntityKind,
    slug: String,
    sequence: u32,
}

impl EntityId {
    pub fn new(kind: EntityKind, slug: impl Into<String>, sequence: u32) -> Result<Self, DomainError> {
        let slug = slug.into();
        if !is_valid_slug(&slug) {
            return Err(DomainError::invalid_id(format!(
                "invalid entity slug '{slug}'"
            )));
        }
        Ok(Self {
            kind,
            slug,
            sequence,
        })
    }

    /// Derive a slug from a display name and build an ID.
    pub fn from_display_name(
        kind: EntityKind,
        display_name: &str,
        sequence: u32,
    ) -> Result<Self, DomainError> {
        let slug: String = display_name
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-");
        if slug.is_empty() {
            return Err(DomainError::invalid_id(format!(
                "display name '{display_name}' produces an empty slug"
            )));
        }
        Self::new(kind, slug, sequence)
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }
}

fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{:03}", self.kind, self.slug, self.sequence)
    }
}

impl FromStr for EntityId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Kind is the first segment, sequence the last; the slug may itself
        // contain hyphens but never underscores.
        let mut parts = s.splitn(2, '_');
        let kind_str = parts
            .next()
            .ok_or_else(|| DomainError::invalid_id(s.to_string()))?;
        let rest = parts
            .next()
            .ok_or_else(|| DomainError::invalid_id(format!("'{s}' is missing slug and sequence")))?;
        let (slug, seq_str) = rest
            .rsplit_once('_')
            .ok_or_else(|| DomainError::invalid_id(format!("'{s}' is missing a sequence suffix")))?;
        let kind = kind_str.parse()?;
        let sequence: u32 = seq_str
            .parse()
            .map_err(|_| DomainError::invalid_id(format!("'{seq_str}' is not a valid sequence")))?;
        Self::new(kind, slug, sequence)
    }
}

impl TryFrom<String> for EntityId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EntityId> for String {
    fn from(value: EntityId) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_and_parse() {
        let id = EntityId::new(EntityKind::Npc, "cassian", 1).expect("valid id");
        assert_eq!(id.to_string(), "npc_cassian_001");

        let parsed: EntityId = "npc_cassian_001".parse().expect("parses");
        assert_eq!(parsed, id);
        assert_eq!(parsed.kind(), EntityKind::Npc);
        assert_eq!(parsed.slug(), "cassian");
        assert_eq!(parsed.sequence(), 1);
    }

    #[test]
    fn test_hyphenated_slug() {
        let parsed: EntityId = "location_old-mill_002".parse().expect("parses");
        assert_eq!(parsed.slug(), "old-mill");
        assert_eq!(parsed.sequence(), 2);
    }

    #[test]
    fn test_from_display_name() {
        let id = EntityId::from_display_name(EntityKind::Npc, "Guard Captain Hale", 3)
            .expect("valid id");
        assert_eq!(id.to_string(), "npc_guard-captain-hale_003");
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!("dragon_smaug_001".parse::<EntityId>().is_err());
        assert!("npc_cassian".parse::<EntityId>().is_err());
        assert!("npc__001".parse::<EntityId>().is_err());
        assert!("npc_Cassian_001".parse::<EntityId>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let id: EntityId = "item_heartstone_001".parse().expect("parses");
        let json = serde_json::to_string(&id).expect("serializes");
        assert_eq!(json, "\"item_heartstone_001\"");
        let back: EntityId = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back, id);
    }
}
