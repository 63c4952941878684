//! Simulation configuration.
//!
//! Every tuning constant of the engine lives here so runs can be replayed
//! from a single JSON document.
//!
//! ```rust
//! use front_core::engine::SimConfig;
//!
//! let config = SimConfig::default();
//! assert_eq!(config.horizon_days, 60);
//! ```

use serde::{Deserialize, Serialize};

use super::escalation::EscalationCurve;
use crate::error::{Result, SimError};

pub const DEFAULT_HORIZON_DAYS: u32 = 60;
pub const DEFAULT_CAPTURE_THRESHOLD: f64 = 0.5;
/// Env var naming a JSON config file that overrides the defaults.
pub const CONFIG_PATH_ENV: &str = "FRONT_SIM_CONFIG_PATH";

/// Exponential moving averages carried as trailing momentum features.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MomentumConfig {
    /// Weight kept from yesterday's 7-day momentum (default: 0.9)
    pub decay_7d: f64,
    /// Weight kept from yesterday's 30-day momentum (default: 0.95)
    pub decay_30d: f64,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            decay_7d: 0.9,
            decay_30d: 0.95,
        }
    }
}

impl MomentumConfig {
    #[inline]
    pub fn update_7d(&self, previous: f64, today: f64) -> f64 {
        previous * self.decay_7d + today * (1.0 - self.decay_7d)
    }

    #[inline]
    pub fn update_30d(&self, previous: f64, today: f64) -> f64 {
        previous * self.decay_30d + today * (1.0 - self.decay_30d)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Maximum number of simulated days (default: 60)
    #[serde(default = "default_horizon")]
    pub horizon_days: u32,
    /// `prob_capture` strictly above this marks the city OCCUPIED (default: 0.5)
    #[serde(default = "default_capture_threshold")]
    pub capture_threshold: f64,
    /// Regression overshoot tolerated on the encirclement model before the
    /// output counts as invalid; overshoot is snapped to [0, 1] (default: 0.05)
    #[serde(default = "default_encirclement_overshoot")]
    pub encirclement_overshoot: f64,
    #[serde(default)]
    pub escalation: EscalationCurve,
    #[serde(default)]
    pub momentum: MomentumConfig,
}

fn default_horizon() -> u32 {
    DEFAULT_HORIZON_DAYS
}

fn default_capture_threshold() -> f64 {
    DEFAULT_CAPTURE_THRESHOLD
}

fn default_encirclement_overshoot() -> f64 {
    0.05
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            horizon_days: DEFAULT_HORIZON_DAYS,
            capture_threshold: DEFAULT_CAPTURE_THRESHOLD,
            encirclement_overshoot: default_encirclement_overshoot(),
            escalation: EscalationCurve::default(),
            momentum: MomentumConfig::default(),
        }
    }
}

impl SimConfig {
    /// Plain projection of the model outputs: no escalation boost.
    pub fn linear() -> Self {
        Self {
            escalation: EscalationCurve::None,
            ..Self::default()
        }
    }

    /// Strict output checking: any encirclement outside [0, 1] is an error.
    pub fn strict() -> Self {
        Self {
            encirclement_overshoot: 0.0,
            ..Self::default()
        }
    }

    pub fn with_horizon(mut self, days: u32) -> Self {
        self.horizon_days = days;
        self
    }

    pub fn with_escalation(mut self, curve: EscalationCurve) -> Self {
        self.escalation = curve;
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.horizon_days == 0 {
            return Err(SimError::InvalidConfig(
                "horizon_days must be at least 1".to_string(),
            ));
        }
        if !(self.capture_threshold > 0.0 && self.capture_threshold < 1.0) {
            return Err(SimError::InvalidConfig(format!(
                "capture_threshold must be in (0, 1), got {}",
                self.capture_threshold
            )));
        }
        if !self.encirclement_overshoot.is_finite() || self.encirclement_overshoot < 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "encirclement_overshoot must be >= 0, got {}",
                self.encirclement_overshoot
            )));
        }
        for (name, decay) in [
            ("decay_7d", self.momentum.decay_7d),
            ("decay_30d", self.momentum.decay_30d),
        ] {
            if !(0.0..=1.0).contains(&decay) {
                return Err(SimError::InvalidConfig(format!(
                    "momentum {} must be in [0, 1], got {}",
                    name, decay
                )));
            }
        }
        self.escalation.validate()
    }
}

// ========== Tests ==========

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.horizon_days, 60);
        assert!((cfg.capture_threshold - 0.5).abs() < 1e-12);
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.escalation.threshold(), Some(0.90));
    }

    #[test]
    fn test_presets() {
        assert_eq!(SimConfig::linear().escalation, EscalationCurve::None);
        assert_eq!(SimConfig::strict().encirclement_overshoot, 0.0);
        assert_eq!(SimConfig::default().with_horizon(90).horizon_days, 90);
    }

    #[test]
    fn test_default_momentum_weights() {
        let m = MomentumConfig::default();
        assert!((m.update_7d(10.0, 20.0) - 11.0).abs() < 1e-12);
        assert!((m.update_30d(10.0, 20.0) - 10.5).abs() < 1e-12);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(SimConfig::default().with_horizon(0).validate().is_err());

        let mut cfg = SimConfig::default();
        cfg.capture_threshold = 1.0;
        assert!(cfg.validate().is_err());

        let mut cfg = SimConfig::default();
        cfg.momentum.decay_7d = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg = SimConfig::from_json(r#"{ "horizon_days": 30 }"#).unwrap();
        assert_eq!(cfg.horizon_days, 30);
        assert_eq!(cfg.escalation, EscalationCurve::default());

        assert!(SimConfig::from_json(r#"{ "horizon_days": 0 }"#).is_err());
    }

    #[test]
    fn test_config_serialization() {
        let cfg = SimConfig::default();
        let json = cfg.to_json().unwrap();
        let parsed = SimConfig::from_json(&json).unwrap();
        assert_eq!(parsed, cfg);
    }
}
