//! Domain entities.

pub mod entity;
pub mod game_state;

pub use entity::{Entity, Presence, SceneManifest};
pub use game_state::{GameState, SkippedUpdate, UpdateReport, DELETE_SENTINEL};
