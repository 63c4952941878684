//! Intensity scenarios and the policy that scales predicted advance.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scenario {
    Conservative,
    Inertial,
    Aggressive,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [
        Scenario::Conservative,
        Scenario::Inertial,
        Scenario::Aggressive,
    ];

    pub fn multiplier(&self) -> f64 {
        match self {
            Scenario::Conservative => 0.5,
            Scenario::Inertial => 1.0,
            Scenario::Aggressive => 1.5,
        }
    }

    pub fn policy(&self) -> ScenarioPolicy {
        ScenarioPolicy::new(*self)
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Scenario::Conservative => write!(f, "CONSERVATIVE"),
            Scenario::Inertial => write!(f, "INERTIAL"),
            Scenario::Aggressive => write!(f, "AGGRESSIVE"),
        }
    }
}

impl FromStr for Scenario {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conservative" => Ok(Scenario::Conservative),
            "inertial" => Ok(Scenario::Inertial),
            "aggressive" => Ok(Scenario::Aggressive),
            other => Err(SimError::InvalidConfig(format!(
                "unknown scenario '{}' (expected conservative, inertial or aggressive)",
                other
            ))),
        }
    }
}

/// Scales the raw front-dynamics prediction. Pure and total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioPolicy {
    pub scenario: Scenario,
    pub multiplier: f64,
}

impl ScenarioPolicy {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            scenario,
            multiplier: scenario.multiplier(),
        }
    }

    #[inline]
    pub fn apply(&self, raw_delta: f64) -> f64 {
        raw_delta * self.multiplier
    }
}
