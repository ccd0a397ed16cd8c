pub mod actions;
pub mod dataset;
pub mod engine;
pub mod environment;
pub mod events;
pub mod plan;
pub mod plot;
pub mod report;
pub mod rng;
pub mod scenario;
pub mod session;
pub mod snapshot;
pub mod systems;
pub mod web;

pub use dataset::Dataset;
pub use engine::{Engine, EngineBuilder, EngineSettings, SeasonEnd, TurnOutcome};
pub use environment::{EnvironmentSample, EnvironmentSource, SourceError};
pub use report::SeasonReport;
pub use scenario::{Scenario, ScenarioLoader};
pub use session::Session;
