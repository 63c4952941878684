//! Batch execution over the (city × scenario) run space.
//!
//! Runs are independent: each owns its `CityState` and shares only the
//! read-only `ModelSet`. They are fanned out over a rayon pool and merged
//! afterwards by (city, scenario) key. Cancellation is cooperative and only
//! takes effect between runs.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::driver::SimulationDriver;
use super::scenario::Scenario;
use crate::error::{Result, SimError};
use crate::models::{CitySeed, RunOutcome, RunResult};

/// Shared stop flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub occupied: usize,
    pub exhausted: usize,
    pub already_occupied: usize,
    pub errored: usize,
    pub cancelled: usize,
}

impl OutcomeCounts {
    pub fn total(&self) -> usize {
        self.occupied + self.exhausted + self.already_occupied + self.errored + self.cancelled
    }
}

/// All run results, sorted by (city_id, scenario).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub results: Vec<RunResult>,
}

impl BatchSummary {
    pub fn from_results(mut results: Vec<RunResult>) -> Self {
        results.sort_by(|a, b| {
            a.city_id()
                .cmp(b.city_id())
                .then_with(|| a.scenario().cmp(&b.scenario()))
        });
        Self { results }
    }

    pub fn get(&self, city_id: &str, scenario: Scenario) -> Option<&RunResult> {
        self.results
            .iter()
            .find(|r| r.city_id() == city_id && r.scenario() == scenario)
    }

    pub fn counts(&self) -> OutcomeCounts {
        let mut counts = OutcomeCounts::default();
        for r in &self.results {
            match r.outcome {
                RunOutcome::Occupied { .. } => counts.occupied += 1,
                RunOutcome::Exhausted { .. } => counts.exhausted += 1,
                RunOutcome::AlreadyOccupied => counts.already_occupied += 1,
                RunOutcome::Errored { .. } => counts.errored += 1,
                RunOutcome::Cancelled => counts.cancelled += 1,
            }
        }
        counts
    }

    pub fn errored(&self) -> impl Iterator<Item = &RunResult> {
        self.results.iter().filter(|r| r.outcome.is_error())
    }

    /// Fall day per scenario, keyed by city.
    pub fn fall_days(&self) -> BTreeMap<&str, BTreeMap<Scenario, Option<u32>>> {
        let mut table: BTreeMap<&str, BTreeMap<Scenario, Option<u32>>> = BTreeMap::new();
        for r in &self.results {
            table
                .entry(r.city_id())
                .or_default()
                .insert(r.scenario(), r.outcome.fall_day());
        }
        table
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

pub struct BatchRunner {
    driver: SimulationDriver,
    cancel: CancellationToken,
    threads: Option<usize>,
}

impl BatchRunner {
    pub fn new(driver: SimulationDriver) -> Self {
        Self {
            driver,
            cancel: CancellationToken::new(),
            threads: None,
        }
    }

    /// Use a dedicated pool of `threads` workers instead of rayon's global pool.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn driver(&self) -> &SimulationDriver {
        &self.driver
    }

    pub fn run(&self, seeds: &[CitySeed], scenarios: &[Scenario]) -> Result<BatchSummary> {
        let jobs: Vec<(&CitySeed, Scenario)> = seeds
            .iter()
            .flat_map(|seed| scenarios.iter().map(move |s| (seed, *s)))
            .collect();

        info!(
            cities = seeds.len(),
            scenarios = scenarios.len(),
            runs = jobs.len(),
            "starting batch"
        );

        let results = match self.threads {
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| SimError::InvalidConfig(format!("thread pool: {}", e)))?;
                pool.install(|| self.execute(&jobs))
            }
            None => self.execute(&jobs),
        };

        let summary = BatchSummary::from_results(results);
        let counts = summary.counts();
        info!(
            occupied = counts.occupied,
            exhausted = counts.exhausted,
            already_occupied = counts.already_occupied,
            errored = counts.errored,
            cancelled = counts.cancelled,
            "batch finished"
        );
        Ok(summary)
    }

    fn execute(&self, jobs: &[(&CitySeed, Scenario)]) -> Vec<RunResult> {
        jobs.par_iter()
            .map(|(seed, scenario)| {
                if self.cancel.is_cancelled() {
                    RunResult::without_trajectory(
                        seed.city_id.clone(),
                        seed.name.clone(),
                        *scenario,
                        RunOutcome::Cancelled,
                    )
                } else {
                    self.driver.run(seed, *scenario)
                }
            })
            .collect()
    }
}
