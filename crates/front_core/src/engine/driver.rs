//! Simulation Driver: per-run state machine.
//!
//! ```text
//! Running(0) ──step──▶ Running(n+1)      status FREE, n+1 < horizon
//!            ──step──▶ Occupied(n+1)     status OCCUPIED
//!            ──step──▶ Exhausted         status FREE, n+1 == horizon
//! ```
//!
//! `Occupied` and `Exhausted` are terminal. A failed step leaves the state
//! at the last valid `Running(n)`; the partial trajectory is kept.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::config::SimConfig;
use super::evolver::DayStepEvolver;
use super::scenario::Scenario;
use crate::error::Result;
use crate::models::{
    CitySeed, FeatureSnapshot, FeatureVector, RunOutcome, RunResult, TrajectoryReport,
};
use crate::predict::ModelSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// Last completed day (0 before the first step).
    Running { day: u32 },
    Occupied { fall_day: u32 },
    Exhausted,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunState::Running { .. })
    }
}

/// Everything one (city, scenario) run owns. Mutated only by appending days.
#[derive(Debug, Clone)]
pub struct CityState {
    seed: CitySeed,
    scenario: Scenario,
    context: FeatureVector,
    snapshots: Vec<FeatureSnapshot>,
    state: RunState,
}

impl CityState {
    /// Rejects seeds that fail [`CitySeed::validate`].
    pub fn new(seed: CitySeed, scenario: Scenario) -> Result<Self> {
        seed.validate()?;
        Ok(Self::from_valid_seed(seed, scenario))
    }

    fn from_valid_seed(seed: CitySeed, scenario: Scenario) -> Self {
        let context = seed.initial_context();
        Self {
            seed,
            scenario,
            context,
            snapshots: Vec::new(),
            state: RunState::Running { day: 0 },
        }
    }

    pub fn seed(&self) -> &CitySeed {
        &self.seed
    }

    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn snapshots(&self) -> &[FeatureSnapshot] {
        &self.snapshots
    }

    /// Feature context the next step will start from.
    pub fn context(&self) -> &FeatureVector {
        &self.context
    }

    pub fn into_report(self) -> TrajectoryReport {
        TrajectoryReport::new(
            self.seed.city_id,
            self.seed.name,
            self.scenario,
            self.snapshots,
        )
    }
}

pub struct SimulationDriver {
    models: ModelSet,
    config: SimConfig,
}

impl SimulationDriver {
    /// Models are shared read-only; config is validated once here.
    pub fn new(models: ModelSet, config: SimConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { models, config })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn models(&self) -> &ModelSet {
        &self.models
    }

    /// Advance a running state by one day. No-op on terminal states.
    pub fn advance(&self, city: &mut CityState) -> Result<RunState> {
        let RunState::Running { day } = city.state else {
            return Ok(city.state);
        };
        let next_day = day + 1;

        let evolver = DayStepEvolver::new(&self.models, city.scenario.policy(), &self.config);
        let step = evolver.step(next_day, &city.context)?;

        let occupied = step.snapshot.is_occupied();
        city.snapshots.push(step.snapshot);
        city.context = step.context;
        city.state = if occupied {
            RunState::Occupied { fall_day: next_day }
        } else if next_day >= self.config.horizon_days {
            RunState::Exhausted
        } else {
            RunState::Running { day: next_day }
        };
        Ok(city.state)
    }

    /// Run one (city, scenario) pair to a terminal outcome.
    ///
    /// Never fails: errors are folded into [`RunOutcome::Errored`] together
    /// with the days completed before the failure.
    pub fn run(&self, seed: &CitySeed, scenario: Scenario) -> RunResult {
        if let Err(error) = seed.validate() {
            warn!(city = %seed.city_id, %scenario, %error, "rejected seed row");
            return RunResult::without_trajectory(
                seed.city_id.clone(),
                seed.name.clone(),
                scenario,
                RunOutcome::Errored { error },
            );
        }

        if seed.already_captured {
            info!(city = %seed.city_id, %scenario, "city already occupied, skipping");
            return RunResult::without_trajectory(
                seed.city_id.clone(),
                seed.name.clone(),
                scenario,
                RunOutcome::AlreadyOccupied,
            );
        }

        let mut city = CityState::from_valid_seed(seed.clone(), scenario);
        let outcome = loop {
            match self.advance(&mut city) {
                Ok(RunState::Running { .. }) => continue,
                Ok(RunState::Occupied { fall_day }) => {
                    info!(city = %seed.city_id, %scenario, fall_day, "city falls");
                    break RunOutcome::Occupied { fall_day };
                }
                Ok(RunState::Exhausted) => {
                    info!(
                        city = %seed.city_id,
                        %scenario,
                        horizon = self.config.horizon_days,
                        "not captured within horizon"
                    );
                    break RunOutcome::Exhausted {
                        horizon: self.config.horizon_days,
                    };
                }
                Err(error) => {
                    warn!(
                        city = %seed.city_id,
                        %scenario,
                        days_completed = city.snapshots.len(),
                        %error,
                        "run aborted"
                    );
                    break RunOutcome::Errored { error };
                }
            }
        };

        RunResult {
            outcome,
            report: city.into_report(),
        }
    }

    /// All three scenarios for one city, in intensity order.
    pub fn run_all_scenarios(&self, seed: &CitySeed) -> Vec<RunResult> {
        Scenario::ALL.iter().map(|s| self.run(seed, *s)).collect()
    }
}
