//! Narrative response handling: parsing, mention checks, mode rules.

pub mod mentions;
pub mod parser;
pub mod validation;

pub use mentions::{verify_mentions, MentionReport};
pub use parser::{parse_narrative_response, ParseOutcome, ParseStage, PLACEHOLDER_NARRATIVE};
pub use validation::{validate_mode_rules, ValidationIssue};
