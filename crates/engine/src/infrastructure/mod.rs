//! Infrastructure layer: ports and adapters for external systems.

pub mod clock;
pub mod gemini;
pub mod persistence;
pub mod ports;
pub mod resilient_llm;
