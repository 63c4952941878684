//! Predictive model adapters.
//!
//! The three trained models are treated as pure oracles behind one
//! capability: feature vector in, scalar out. Anything implementing
//! [`Predictor`] can stand in for a trained model, which is how the engine
//! tests drive the evolver with deterministic stubs.
//!
//! Outputs are checked against the model's domain before the engine uses
//! them. A NaN or a negative probability is a data-quality failure and
//! aborts the run; it is never clamped away.

pub mod linear;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::models::FeatureVector;

pub use linear::{LinearModel, Link};

/// Vector in, scalar out. Must be deterministic for identical input.
pub trait Predictor: Send + Sync {
    fn name(&self) -> &str;

    fn predict(&self, features: &FeatureVector) -> Result<f64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    FrontDynamics,
    Encirclement,
    CaptureProbability,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [
        ModelKind::FrontDynamics,
        ModelKind::Encirclement,
        ModelKind::CaptureProbability,
    ];

    /// Inclusive output range; `None` means any finite real.
    pub fn domain(&self) -> Option<(f64, f64)> {
        match self {
            ModelKind::FrontDynamics => None,
            ModelKind::Encirclement | ModelKind::CaptureProbability => Some((0.0, 1.0)),
        }
    }

    /// Validate a raw prediction.
    ///
    /// `overshoot` widens the domain on both sides; values inside the
    /// widened band are snapped back to the boundary, values outside it are
    /// rejected.
    pub fn check_output(&self, value: f64, day: u32, overshoot: f64) -> Result<f64> {
        if !value.is_finite() {
            return Err(SimError::ModelOutput {
                model: *self,
                day,
                reason: format!("non-finite prediction ({})", value),
            });
        }
        let Some((lo, hi)) = self.domain() else {
            return Ok(value);
        };
        if value < lo - overshoot || value > hi + overshoot {
            return Err(SimError::ModelOutput {
                model: *self,
                day,
                reason: format!("prediction {} outside [{}, {}]", value, lo, hi),
            });
        }
        Ok(value.clamp(lo, hi))
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ModelKind::FrontDynamics => write!(f, "front-dynamics"),
            ModelKind::Encirclement => write!(f, "encirclement"),
            ModelKind::CaptureProbability => write!(f, "capture-probability"),
        }
    }
}

/// The three models, loaded once per batch and shared read-only by every run.
#[derive(Clone)]
pub struct ModelSet {
    pub front: Arc<dyn Predictor>,
    pub encirclement: Arc<dyn Predictor>,
    pub capture: Arc<dyn Predictor>,
}

impl ModelSet {
    pub fn new(
        front: Arc<dyn Predictor>,
        encirclement: Arc<dyn Predictor>,
        capture: Arc<dyn Predictor>,
    ) -> Self {
        Self {
            front,
            encirclement,
            capture,
        }
    }

    pub fn get(&self, kind: ModelKind) -> &dyn Predictor {
        match kind {
            ModelKind::FrontDynamics => self.front.as_ref(),
            ModelKind::Encirclement => self.encirclement.as_ref(),
            ModelKind::CaptureProbability => self.capture.as_ref(),
        }
    }
}

impl fmt::Debug for ModelSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ModelSet")
            .field("front", &self.front.name())
            .field("encirclement", &self.encirclement.name())
            .field("capture", &self.capture.name())
            .finish()
    }
}

/// Wraps a pure closure.
pub struct FnPredictor<F> {
    name: String,
    f: F,
}

impl<F> FnPredictor<F>
where
    F: Fn(&FeatureVector) -> f64 + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Predictor for FnPredictor<F>
where
    F: Fn(&FeatureVector) -> f64 + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        Ok((self.f)(features))
    }
}

/// Always returns the same value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstantPredictor {
    pub name: String,
    pub value: f64,
}

impl ConstantPredictor {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl Predictor for ConstantPredictor {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, _features: &FeatureVector) -> Result<f64> {
        Ok(self.value)
    }
}
