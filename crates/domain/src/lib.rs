//! WorldArchitect domain layer.
//!
//! Pure domain types and invariants for the narrative turn engine:
//! campaign game state, entity identity, and interaction modes.
//! No I/O, no logging - operations that can partially fail return
//! report types for the engine layer to log.

pub mod entities;
pub mod error;
pub mod ids;
pub mod value_objects;

pub use entities::{
    Entity, GameState, Presence, SceneManifest, SkippedUpdate, UpdateReport, DELETE_SENTINEL,
};
pub use error::DomainError;
pub use ids::{CampaignId, TurnId, UserId};
pub use value_objects::{EntityId, EntityKind, Mode};
