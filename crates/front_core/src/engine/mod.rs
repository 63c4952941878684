//! Simulation engine: scenario policy, day-step evolver, driver and batch runner.

pub mod batch;
pub mod config;
pub mod driver;
pub mod escalation;
pub mod evolver;
pub mod scenario;

#[cfg(all(test, feature = "proptest"))]
mod proptests;

pub use batch::{BatchRunner, BatchSummary, CancellationToken, OutcomeCounts};
pub use config::{MomentumConfig, SimConfig, CONFIG_PATH_ENV, DEFAULT_HORIZON_DAYS};
pub use driver::{CityState, RunState, SimulationDriver};
pub use escalation::EscalationCurve;
pub use evolver::{DayStep, DayStepEvolver};
pub use scenario::{Scenario, ScenarioPolicy};
