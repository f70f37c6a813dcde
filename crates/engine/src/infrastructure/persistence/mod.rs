//! Campaign persistence adapters.

pub mod campaign;
pub mod memory;

pub use campaign::SqliteCampaignRepo;
pub use memory::InMemoryCampaignRepo;
