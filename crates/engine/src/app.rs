//! Application state and composition.

use std::sync::Arc;

use crate::entities::Campaign;
use crate::infrastructure::{
    clock::SystemClock,
    ports::{CampaignRepo, ClockPort, LlmPort},
};
use crate::use_cases::RunTurn;

/// Main application state.
///
/// Holds the entity wrappers and use cases. Passed to HTTP handlers
/// via Axum state.
pub struct App {
    pub campaign: Arc<Campaign>,
    pub use_cases: UseCases,
    pub llm: Arc<dyn LlmPort>,
}

/// Container for all use cases.
pub struct UseCases {
    pub run_turn: Arc<RunTurn>,
}

impl App {
    /// Create a new App with all dependencies wired up.
    pub fn new(repo: Arc<dyn CampaignRepo>, llm: Arc<dyn LlmPort>) -> Self {
        let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
        let campaign = Arc::new(Campaign::new(repo));

        let run_turn = Arc::new(RunTurn::new(campaign.clone(), llm.clone(), clock));

        Self {
            campaign,
            use_cases: UseCases { run_turn },
            llm,
        }
    }
}
