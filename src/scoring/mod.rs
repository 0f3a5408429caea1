pub mod config;
pub mod engine;
pub mod overrides;
pub mod validation;

pub use config::*;
pub use engine::{ListError, Outcome, ScoredList};
pub use overrides::{OverrideError, OverrideScore};
pub use validation::validate_categories;
