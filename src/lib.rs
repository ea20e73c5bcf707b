// Library interface for preitv
// The binary and the integration tests both go through these modules

pub mod catalog;
pub mod checklist;
pub mod config;
pub mod errors;
pub mod history;
pub mod route;
pub mod session;
pub mod vehicle;

// Re-export commonly used types
pub use checklist::{
    Category, ChecklistOptions, ChecklistResult, Recommendation, RuleTable, UrgencyColor,
    generate_checklist, generate_for_profile, summarize_next_milestone,
};
pub use errors::PreItvError;
pub use session::{Advisor, SessionState};
pub use vehicle::{FuelType, VehicleProfile};
