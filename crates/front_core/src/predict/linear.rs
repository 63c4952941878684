//! Linear / logistic model exported from the training pipeline as JSON.
//!
//! ```json
//! {
//!   "name": "capture_v3",
//!   "intercept": -2.1,
//!   "coefficients": { "encirclement_score": 3.4, "dist_to_front_m": -0.0004 },
//!   "link": "logistic"
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Predictor;
use crate::error::{Result, SimError};
use crate::models::FeatureVector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Link {
    /// Regression output.
    #[default]
    Identity,
    /// Positive-class probability.
    Logistic,
}

impl Link {
    pub fn apply(&self, z: f64) -> f64 {
        match self {
            Link::Identity => z,
            Link::Logistic => 1.0 / (1.0 + (-z).exp()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub name: String,
    #[serde(default)]
    pub intercept: f64,
    pub coefficients: BTreeMap<String, f64>,
    #[serde(default)]
    pub link: Link,
}

impl LinearModel {
    pub fn new(name: impl Into<String>, intercept: f64, link: Link) -> Self {
        Self {
            name: name.into(),
            intercept,
            coefficients: BTreeMap::new(),
            link,
        }
    }

    pub fn with_coefficient(mut self, feature: impl Into<String>, weight: f64) -> Self {
        self.coefficients.insert(feature.into(), weight);
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let model: LinearModel = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.intercept.is_finite() {
            return Err(SimError::InvalidConfig(format!(
                "model '{}' has a non-finite intercept",
                self.name
            )));
        }
        if let Some((feature, _)) = self.coefficients.iter().find(|(_, w)| !w.is_finite()) {
            return Err(SimError::InvalidConfig(format!(
                "model '{}' has a non-finite weight for '{}'",
                self.name, feature
            )));
        }
        Ok(())
    }

    /// Feature names the model reads.
    pub fn features(&self) -> impl Iterator<Item = &str> {
        self.coefficients.keys().map(String::as_str)
    }
}

impl Predictor for LinearModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        let mut z = self.intercept;
        for (feature, weight) in &self.coefficients {
            z += weight * features.require(&self.name, feature)?;
        }
        Ok(self.link.apply(z))
    }
}
