//! Entity operation wrappers over the persistence ports.

mod campaign;

pub use campaign::Campaign;
