//! Use cases: one module per player-facing operation group.

pub mod narrative;
pub mod turn;

pub use turn::{RunTurn, TurnError};
