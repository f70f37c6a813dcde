//! Value objects for the WorldArchitect domain.

pub mod entity_id;
pub mod mode;

pub use entity_id::{EntityId, EntityKind};
pub use mode::Mode;
