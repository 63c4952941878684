//! Property-based tests for trajectory invariants.

use std::sync::Arc;

use proptest::prelude::*;

use super::*;
use crate::models::{keys, CitySeed, FeatureVector, RunOutcome};
use crate::predict::{ConstantPredictor, FnPredictor, ModelSet};

fn seed(dist: f64, enc: f64) -> CitySeed {
    CitySeed::new(
        "prop",
        "Prop City",
        FeatureVector::new()
            .with(keys::DIST_TO_FRONT, dist)
            .with(keys::ENCIRCLEMENT, enc),
    )
}

fn constant_models(front: f64, enc: f64, capture: f64) -> ModelSet {
    ModelSet::new(
        Arc::new(ConstantPredictor::new("front", front)),
        Arc::new(ConstantPredictor::new("enc", enc)),
        Arc::new(ConstantPredictor::new("capture", capture)),
    )
}

/// Capture probability rises linearly as the front closes in.
fn proximity_models(front: f64, reach: f64) -> ModelSet {
    ModelSet::new(
        Arc::new(ConstantPredictor::new("front", front)),
        Arc::new(FnPredictor::new("enc", move |fv: &FeatureVector| {
            (1.0 - fv.get(keys::DIST_TO_FRONT).unwrap_or(0.0) / (reach * 2.0)).clamp(0.0, 1.0)
        })),
        Arc::new(FnPredictor::new("capture", move |fv: &FeatureVector| {
            (1.0 - fv.get(keys::DIST_TO_FRONT).unwrap_or(0.0) / reach).clamp(0.0, 1.0)
        })),
    )
}

proptest! {
    /// Property: days are contiguous from 1, nothing follows OCCUPIED,
    /// every metric stays in range.
    #[test]
    fn prop_trajectory_invariants(
        front in -200.0f64..400.0,
        enc in 0.0f64..=1.0,
        capture in 0.0f64..=1.0,
        dist in 0.0f64..20_000.0,
        horizon in 1u32..90,
    ) {
        let config = SimConfig::default().with_horizon(horizon);
        let driver = SimulationDriver::new(constant_models(front, enc, capture), config).unwrap();
        let result = driver.run(&seed(dist, enc), Scenario::Inertial);
        let snaps = &result.report.snapshots;

        prop_assert!(!snaps.is_empty());
        prop_assert!(snaps.len() as u32 <= horizon);
        for (i, s) in snaps.iter().enumerate() {
            prop_assert_eq!(s.day, i as u32 + 1);
            prop_assert!(s.dist_to_front >= 0.0);
            prop_assert!((0.0..=1.0).contains(&s.encirclement));
            prop_assert!((0.0..=1.0).contains(&s.prob_capture));
        }
        let occupied = snaps.iter().filter(|s| s.is_occupied()).count();
        prop_assert!(occupied <= 1);
        match result.outcome {
            RunOutcome::Occupied { fall_day } => {
                prop_assert_eq!(occupied, 1);
                prop_assert_eq!(snaps.last().unwrap().day, fall_day);
            }
            RunOutcome::Exhausted { horizon: h } => {
                prop_assert_eq!(occupied, 0);
                prop_assert_eq!(snaps.len() as u32, h);
            }
            other => prop_assert!(false, "unexpected outcome {:?}", other),
        }
    }

    /// Property: encirclement at or below the threshold never boosts.
    #[test]
    fn prop_no_boost_below_threshold(
        enc in 0.0f64..=0.9,
        capture in 0.0f64..=0.5,
        dist in 0.0f64..5_000.0,
    ) {
        let driver = SimulationDriver::new(
            constant_models(25.0, enc, capture),
            SimConfig::default(),
        ).unwrap();
        let result = driver.run(&seed(dist, enc), Scenario::Aggressive);
        for s in &result.report.snapshots {
            prop_assert_eq!(s.prob_capture, capture);
        }
    }

    /// Property: a more intense scenario never falls later.
    #[test]
    fn prop_scenario_monotonicity(
        front in 1.0f64..300.0,
        reach in 500.0f64..5_000.0,
        dist in 0.0f64..15_000.0,
    ) {
        let driver =
            SimulationDriver::new(proximity_models(front, reach), SimConfig::default()).unwrap();
        let fall = |s: Scenario| {
            driver
                .run(&seed(dist, 0.0), s)
                .outcome
                .fall_day()
                .unwrap_or(u32::MAX)
        };

        let conservative = fall(Scenario::Conservative);
        let inertial = fall(Scenario::Inertial);
        let aggressive = fall(Scenario::Aggressive);
        prop_assert!(aggressive <= inertial);
        prop_assert!(inertial <= conservative);
    }

    /// Property: the scenario policy is a pure scaling.
    #[test]
    fn prop_policy_scales(raw in -1e6f64..1e6) {
        for scenario in Scenario::ALL {
            prop_assert_eq!(scenario.policy().apply(raw), raw * scenario.multiplier());
        }
    }

    /// Property: escalation keeps probabilities in range and never lowers them.
    #[test]
    fn prop_escalation_bounds(base in 0.0f64..=1.0, enc in 0.0f64..=1.0) {
        let boosted = EscalationCurve::default().apply(base, enc);
        prop_assert!((0.0..=1.0).contains(&boosted));
        prop_assert!(boosted >= base);
    }
}
