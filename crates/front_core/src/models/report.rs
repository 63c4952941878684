//! Trajectory reports and per-run outcomes.

use serde::{Deserialize, Serialize};

use super::snapshot::FeatureSnapshot;
use crate::engine::Scenario;
use crate::error::SimError;

/// Read-only view over a finished (or aborted) run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryReport {
    pub city_id: String,
    pub city_name: String,
    pub scenario: Scenario,
    pub snapshots: Vec<FeatureSnapshot>,
    pub fell: bool,
    /// Present iff `fell`.
    pub fall_day: Option<u32>,
}

impl TrajectoryReport {
    pub fn new(
        city_id: impl Into<String>,
        city_name: impl Into<String>,
        scenario: Scenario,
        snapshots: Vec<FeatureSnapshot>,
    ) -> Self {
        let fall_day = snapshots.iter().find(|s| s.is_occupied()).map(|s| s.day);
        Self {
            city_id: city_id.into(),
            city_name: city_name.into(),
            scenario,
            snapshots,
            fell: fall_day.is_some(),
            fall_day,
        }
    }

    pub fn final_snapshot(&self) -> Option<&FeatureSnapshot> {
        self.snapshots.last()
    }

    pub fn days_simulated(&self) -> u32 {
        self.snapshots.len() as u32
    }

    /// Final capture probability; frozen at the fall day once occupied.
    pub fn final_prob_capture(&self) -> Option<f64> {
        self.final_snapshot().map(|s| s.prob_capture)
    }
}

/// Terminal outcome of one (city, scenario) run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunOutcome {
    Occupied { fall_day: u32 },
    /// Horizon reached without capture. A normal outcome, not a failure.
    Exhausted { horizon: u32 },
    /// Source row was already captured; nothing to simulate.
    AlreadyOccupied,
    Errored { error: SimError },
    Cancelled,
}

impl RunOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, RunOutcome::Errored { .. })
    }

    pub fn fall_day(&self) -> Option<u32> {
        match self {
            RunOutcome::Occupied { fall_day } => Some(*fall_day),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::Occupied { .. } => "OCCUPIED",
            RunOutcome::Exhausted { .. } => "EXHAUSTED",
            RunOutcome::AlreadyOccupied => "ALREADY_OCCUPIED",
            RunOutcome::Errored { .. } => "ERRORED",
            RunOutcome::Cancelled => "CANCELLED",
        }
    }
}

/// Outcome plus the trajectory produced so far (partial for errored runs).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub outcome: RunOutcome,
    pub report: TrajectoryReport,
}

impl RunResult {
    pub fn city_id(&self) -> &str {
        &self.report.city_id
    }

    pub fn scenario(&self) -> Scenario {
        self.report.scenario
    }

    /// Result for a run that never reached the evolver.
    pub fn without_trajectory(
        city_id: impl Into<String>,
        city_name: impl Into<String>,
        scenario: Scenario,
        outcome: RunOutcome,
    ) -> Self {
        Self {
            outcome,
            report: TrajectoryReport::new(city_id, city_name, scenario, Vec::new()),
        }
    }
}
