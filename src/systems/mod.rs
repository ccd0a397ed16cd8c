mod drying;
mod fertilizer;
mod growth;
mod health;
mod pests;

pub use drying::DryingSystem;
pub use fertilizer::FertilizerSystem;
pub use growth::GrowthSystem;
pub use health::{health_delta, HealthSystem};
pub use pests::PestSystem;
