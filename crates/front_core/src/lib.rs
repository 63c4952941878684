//! # front_core - Deterministic City Occupation Projection Engine
//!
//! Projects, for each contested city, the day on which it falls to an
//! advancing force under one of three intensity scenarios.
//!
//! ## Features
//! - Day-by-day state evolution driven by three pluggable predictive models
//! - Scenario multipliers (conservative / inertial / aggressive)
//! - Tunable escalation curve above the encirclement threshold
//! - Parallel batch runs with per-run error isolation and cooperative cancellation
//!
//! Same seed row + same model outputs = same trajectory.

#![allow(clippy::doc_lazy_continuation)]

pub mod engine;
pub mod error;
pub mod models;
pub mod predict;

pub use engine::{
    BatchRunner, BatchSummary, CancellationToken, CityState, DayStep, DayStepEvolver,
    EscalationCurve, MomentumConfig, OutcomeCounts, RunState, Scenario, ScenarioPolicy,
    SimConfig, SimulationDriver,
};
pub use error::{Result, SimError};
pub use models::{
    keys, CitySeed, CityStatus, FeatureSnapshot, FeatureVector, GeoPoint, RunOutcome, RunResult,
    TrajectoryReport,
};
pub use predict::{
    ConstantPredictor, FnPredictor, LinearModel, Link, ModelKind, ModelSet, Predictor,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SCHEMA_VERSION: u8 = 1;
