//! WorldArchitect Protocol - Wire types for the engine HTTP boundary.
//!
//! This crate contains the types that cross the HTTP boundary between the
//! engine and the browser frontend:
//! - The narrative response schema produced by the LLM pipeline
//! - Turn request/response DTOs
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, serde_json, uuid, chrono
//! 2. **No business logic** - Pure data types and serialization
//! 3. **No domain IDs** - use raw `uuid::Uuid` in DTOs
//! 4. **Debug data never leaks** - `debug_info` is an `Option` that is
//!    omitted from serialization entirely when stripped server-side

pub mod requests;
pub mod responses;

pub use requests::{CreateCampaignRequest, ModeData, TurnRequest};
pub use responses::{
    CampaignCreated, DebugInfo, NarrativeResponse, TurnResponse, ValidationIssueDto,
};
