//! Day-Step Evolver: yesterday's feature context → today's snapshot.
//!
//! One step, in data-dependency order:
//!
//! 1. Offensive pressure: front-dynamics prediction, scaled by the scenario.
//! 2. Distance update, floored at 0. Momentum EMAs absorb the adjusted delta.
//! 3. Encirclement re-predicted from the updated context.
//! 4. Capture probability from the fully updated context, escalated above
//!    the encirclement threshold.
//! 5. Status: OCCUPIED iff `prob_capture > capture_threshold`.
//!
//! The evolver is a pure function of (day, context, models, policy, config).
//! It owns no state; replaying a step yields an identical result.

use tracing::{debug, trace};

use super::config::SimConfig;
use super::scenario::ScenarioPolicy;
use crate::error::Result;
use crate::models::{keys, CityStatus, FeatureSnapshot, FeatureVector};
use crate::predict::{ModelKind, ModelSet};

/// Output of one step: the reported snapshot and the feature context
/// that seeds the next step.
#[derive(Debug, Clone, PartialEq)]
pub struct DayStep {
    pub snapshot: FeatureSnapshot,
    pub context: FeatureVector,
}

pub struct DayStepEvolver<'a> {
    models: &'a ModelSet,
    policy: ScenarioPolicy,
    config: &'a SimConfig,
}

impl<'a> DayStepEvolver<'a> {
    pub fn new(models: &'a ModelSet, policy: ScenarioPolicy, config: &'a SimConfig) -> Self {
        Self {
            models,
            policy,
            config,
        }
    }

    pub fn policy(&self) -> ScenarioPolicy {
        self.policy
    }

    /// Compute `day` from the context left by `day - 1`.
    pub fn step(&self, day: u32, previous: &FeatureVector) -> Result<DayStep> {
        let mut context = previous.clone();

        // 1. Offensive pressure
        let raw_delta = self.query(ModelKind::FrontDynamics, day, &context)?;
        let adjusted = self.policy.apply(raw_delta);

        // 2. Distance + momentum
        let dist = context.require("evolver", keys::DIST_TO_FRONT)?;
        let new_dist = (dist - adjusted).max(0.0);

        let m7 = context.get(keys::MOMENTUM_7D).unwrap_or(0.0);
        let m30 = context.get(keys::MOMENTUM_30D).unwrap_or(0.0);
        context.set(keys::DELTA_DAILY, adjusted);
        context.set(keys::MOMENTUM_7D, self.config.momentum.update_7d(m7, adjusted));
        context.set(keys::MOMENTUM_30D, self.config.momentum.update_30d(m30, adjusted));
        context.set(keys::DIST_TO_FRONT, new_dist);

        // 3. Encirclement
        let encirclement = self.query(ModelKind::Encirclement, day, &context)?;
        context.set(keys::ENCIRCLEMENT, encirclement);

        // 4. Capture probability
        let base = self.query(ModelKind::CaptureProbability, day, &context)?;
        let boosted = self.config.escalation.apply(base, encirclement);
        let prob_capture = ModelKind::CaptureProbability.check_output(boosted, day, 0.0)?;
        if prob_capture != base {
            trace!(
                day,
                encirclement,
                base,
                boosted = prob_capture,
                "escalation boost applied"
            );
        }

        // 5. Status
        let status = if prob_capture > self.config.capture_threshold {
            CityStatus::Occupied
        } else {
            CityStatus::Free
        };

        debug!(
            day,
            scenario = %self.policy.scenario,
            dist_to_front = new_dist,
            delta_real = adjusted,
            encirclement,
            prob_capture,
            %status,
            "day step"
        );

        Ok(DayStep {
            snapshot: FeatureSnapshot {
                day,
                dist_to_front: new_dist,
                delta_real: adjusted,
                encirclement,
                prob_capture,
                status,
            },
            context,
        })
    }

    fn query(&self, kind: ModelKind, day: u32, context: &FeatureVector) -> Result<f64> {
        let raw = self.models.get(kind).predict(context)?;
        let overshoot = match kind {
            ModelKind::Encirclement => self.config.encirclement_overshoot,
            _ => 0.0,
        };
        kind.check_output(raw, day, overshoot)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::engine::{EscalationCurve, Scenario};
    use crate::error::SimError;
    use crate::predict::{ConstantPredictor, FnPredictor};

    fn models(front: f64, enc: f64, capture: f64) -> ModelSet {
        ModelSet::new(
            Arc::new(ConstantPredictor::new("front", front)),
            Arc::new(ConstantPredictor::new("enc", enc)),
            Arc::new(ConstantPredictor::new("capture", capture)),
        )
    }

    fn context(dist: f64) -> FeatureVector {
        FeatureVector::new()
            .with(keys::DIST_TO_FRONT, dist)
            .with(keys::ENCIRCLEMENT, 0.2)
            .with(keys::MOMENTUM_7D, 0.0)
            .with(keys::MOMENTUM_30D, 0.0)
    }

    #[test]
    fn test_basic_step() {
        let models = models(100.0, 0.4, 0.2);
        let config = SimConfig::default();
        let evolver = DayStepEvolver::new(&models, Scenario::Inertial.policy(), &config);

        let step = evolver.step(1, &context(1000.0)).unwrap();
        assert_eq!(step.snapshot.day, 1);
        assert_eq!(step.snapshot.dist_to_front, 900.0);
        assert_eq!(step.snapshot.delta_real, 100.0);
        assert_eq!(step.snapshot.encirclement, 0.4);
        assert_eq!(step.snapshot.prob_capture, 0.2);
        assert_eq!(step.snapshot.status, CityStatus::Free);

        assert_eq!(step.context.get(keys::DIST_TO_FRONT), Some(900.0));
        assert_eq!(step.context.get(keys::DELTA_DAILY), Some(100.0));
        assert!((step.context.get(keys::MOMENTUM_7D).unwrap() - 10.0).abs() < 1e-9);
        assert!((step.context.get(keys::MOMENTUM_30D).unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_scenario_scales_delta() {
        let models = models(100.0, 0.4, 0.2);
        let config = SimConfig::default();
        let evolver = DayStepEvolver::new(&models, Scenario::Conservative.policy(), &config);
        let step = evolver.step(1, &context(1000.0)).unwrap();
        assert_eq!(step.snapshot.delta_real, 50.0);
        assert_eq!(step.snapshot.dist_to_front, 950.0);
    }

    #[test]
    fn test_distance_floored_at_zero() {
        let models = models(500.0, 0.4, 0.2);
        let config = SimConfig::default();
        let evolver = DayStepEvolver::new(&models, Scenario::Aggressive.policy(), &config);
        let step = evolver.step(1, &context(100.0)).unwrap();
        assert_eq!(step.snapshot.dist_to_front, 0.0);
    }

    #[test]
    fn test_retreat_increases_distance() {
        let models = models(-20.0, 0.1, 0.0);
        let config = SimConfig::default();
        let evolver = DayStepEvolver::new(&models, Scenario::Inertial.policy(), &config);
        let step = evolver.step(1, &context(100.0)).unwrap();
        assert_eq!(step.snapshot.dist_to_front, 120.0);
        assert_eq!(step.snapshot.delta_real, -20.0);
    }

    #[test]
    fn test_encirclement_sees_updated_distance() {
        // Encirclement is a function of the distance *after* today's advance
        let models = ModelSet::new(
            Arc::new(ConstantPredictor::new("front", 400.0)),
            Arc::new(FnPredictor::new("enc", |fv: &FeatureVector| {
                1.0 - fv.get(keys::DIST_TO_FRONT).unwrap_or(0.0) / 1000.0
            })),
            Arc::new(FnPredictor::new("capture", |fv: &FeatureVector| {
                fv.get(keys::ENCIRCLEMENT).unwrap_or(0.0) / 2.0
            })),
        );
        let config = SimConfig::linear();
        let evolver = DayStepEvolver::new(&models, Scenario::Inertial.policy(), &config);
        let step = evolver.step(1, &context(1000.0)).unwrap();
        assert!((step.snapshot.encirclement - 0.4).abs() < 1e-12);
        assert!((step.snapshot.prob_capture - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_is_strict() {
        let models = models(0.0, 0.2, 0.5);
        let config = SimConfig::default();
        let evolver = DayStepEvolver::new(&models, Scenario::Inertial.policy(), &config);
        let step = evolver.step(1, &context(10.0)).unwrap();
        assert_eq!(step.snapshot.status, CityStatus::Free);

        let models = models_with_capture(0.5001);
        let evolver = DayStepEvolver::new(&models, Scenario::Inertial.policy(), &config);
        let step = evolver.step(1, &context(10.0)).unwrap();
        assert_eq!(step.snapshot.status, CityStatus::Occupied);
    }

    fn models_with_capture(p: f64) -> ModelSet {
        models(0.0, 0.2, p)
    }

    #[test]
    fn test_escalation_only_above_threshold() {
        let config = SimConfig::default();

        let below = models(0.0, 0.89, 0.3);
        let evolver = DayStepEvolver::new(&below, Scenario::Inertial.policy(), &config);
        assert_eq!(evolver.step(1, &context(10.0)).unwrap().snapshot.prob_capture, 0.3);

        let above = models(0.0, 0.97, 0.3);
        let evolver = DayStepEvolver::new(&above, Scenario::Inertial.policy(), &config);
        let p = evolver.step(1, &context(10.0)).unwrap().snapshot.prob_capture;
        assert!(p > 0.3);
        assert!((p - config.escalation.apply(0.3, 0.97)).abs() < 1e-12);
    }

    #[test]
    fn test_escalation_curve_is_swappable() {
        let models = models(0.0, 0.97, 0.3);
        let config = SimConfig::default().with_escalation(EscalationCurve::None);
        let evolver = DayStepEvolver::new(&models, Scenario::Inertial.policy(), &config);
        assert_eq!(evolver.step(1, &context(10.0)).unwrap().snapshot.prob_capture, 0.3);
    }

    #[test]
    fn test_steep_escalation_captures_at_full_encirclement() {
        let models = models(10.0, 1.0, 0.3);
        let config = SimConfig::default().with_escalation(EscalationCurve::Exponential {
            threshold: 0.9,
            steepness: 800.0,
        });
        let evolver = DayStepEvolver::new(&models, Scenario::Inertial.policy(), &config);
        let step = evolver.step(1, &context(1000.0)).unwrap();
        assert_eq!(step.snapshot.prob_capture, 1.0);
        assert_eq!(step.snapshot.status, CityStatus::Occupied);
    }

    #[test]
    fn test_rejects_nan_front_prediction() {
        let models = models(f64::NAN, 0.2, 0.1);
        let config = SimConfig::default();
        let evolver = DayStepEvolver::new(&models, Scenario::Inertial.policy(), &config);
        let err = evolver.step(4, &context(10.0)).unwrap_err();
        assert!(matches!(
            err,
            SimError::ModelOutput { model: ModelKind::FrontDynamics, day: 4, .. }
        ));
    }

    #[test]
    fn test_rejects_negative_probability() {
        let models = models(1.0, 0.2, -0.2);
        let config = SimConfig::default();
        let evolver = DayStepEvolver::new(&models, Scenario::Inertial.policy(), &config);
        let err = evolver.step(1, &context(10.0)).unwrap_err();
        assert!(matches!(
            err,
            SimError::ModelOutput { model: ModelKind::CaptureProbability, .. }
        ));
    }

    #[test]
    fn test_encirclement_overshoot() {
        let config = SimConfig::default();
        let slight = models(1.0, 1.02, 0.1);
        let evolver = DayStepEvolver::new(&slight, Scenario::Inertial.policy(), &config);
        assert_eq!(evolver.step(1, &context(10.0)).unwrap().snapshot.encirclement, 1.0);

        let strict = SimConfig::strict();
        let evolver = DayStepEvolver::new(&slight, Scenario::Inertial.policy(), &strict);
        assert!(evolver.step(1, &context(10.0)).is_err());

        let wild = models(1.0, 1.7, 0.1);
        let evolver = DayStepEvolver::new(&wild, Scenario::Inertial.policy(), &config);
        assert!(evolver.step(1, &context(10.0)).is_err());
    }

    #[test]
    fn test_replay_is_identical() {
        let models = ModelSet::new(
            Arc::new(FnPredictor::new("front", |fv: &FeatureVector| {
                12.5 + fv.get(keys::MOMENTUM_7D).unwrap_or(0.0) * 0.3
            })),
            Arc::new(FnPredictor::new("enc", |fv: &FeatureVector| {
                (1.0 - fv.get(keys::DIST_TO_FRONT).unwrap_or(0.0) / 5000.0).clamp(0.0, 1.0)
            })),
            Arc::new(ConstantPredictor::new("capture", 0.31)),
        );
        let config = SimConfig::default();
        let evolver = DayStepEvolver::new(&models, Scenario::Aggressive.policy(), &config);
        let prev = context(420.0).with(keys::MOMENTUM_7D, 7.7);

        let a = evolver.step(9, &prev).unwrap();
        let b = evolver.step(9, &prev).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a.snapshot).unwrap(),
            serde_json::to_string(&b.snapshot).unwrap()
        );
        assert_eq!(
            serde_json::to_string(&a.context).unwrap(),
            serde_json::to_string(&b.context).unwrap()
        );
    }
}
