//! Turn use cases.
//!
//! One player input in, one narrative response out. The flow is:
//! 1. Load campaign state, entities, manifest, and recent history
//! 2. Assemble the prompt and call the LLM
//! 3. Parse the response through the fallback chain
//! 4. Validate mode rules and required mentions (advisory)
//! 5. Merge state_updates into campaign state and persist
//! 6. Strip debug_info unless the caller asked for it

mod run;

pub use run::{RunTurn, TurnError};
