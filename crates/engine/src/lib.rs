//! WorldArchitect Engine library.
//!
//! This crate contains all server-side code for the WorldArchitect engine.
//!
//! ## Structure
//!
//! - `entities/` - Entity modules wrapping domain operations
//! - `use_cases/` - User story orchestration across entities
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `api/` - HTTP entry points
//! - `app` - Application composition
//! - `llm_context` / `prompt_templates` - Prompt assembly

pub mod api;
pub mod app;
pub mod entities;
pub mod infrastructure;
pub mod llm_context;
pub mod prompt_templates;
pub mod use_cases;

pub use app::App;
