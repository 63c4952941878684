//! Capture-probability escalation above the encirclement threshold.
//!
//! Past the threshold, isolation produces a disproportionate collapse risk
//! rather than a linear continuation of trend. The boost `f(e)` is applied as
//!
//! ```text
//! boosted = base + (1 - base) * f(e)
//! ```
//!
//! with `f(e) = 0` at or below the threshold and `f(1) = 1`.
//!
//! Default curve (`Exponential`, threshold 0.90, steepness 4.0), with
//! `x = (e - t) / (1 - t)`:
//!
//! ```text
//! f(e) = (exp(k * x) - 1) / (exp(k) - 1)
//! ```
//!
//! | e     | f(e)   |
//! |-------|--------|
//! | 0.900 | 0.000  |
//! | 0.915 | 0.015  |
//! | 0.950 | 0.119  |
//! | 0.990 | 0.664  |
//! | 1.000 | 1.000  |

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

pub const DEFAULT_THRESHOLD: f64 = 0.90;
pub const DEFAULT_STEEPNESS: f64 = 4.0;

/// Smallest `g(1) - g(0)` a logistic curve may span before it degenerates.
const MIN_LOGISTIC_SPAN: f64 = 1e-9;

/// `(exp(k * x) - 1) / (exp(k) - 1)` for x in [0, 1].
///
/// Above `k = 1` the ratio is evaluated as
/// `(exp(k * (x - 1)) - exp(-k)) / (1 - exp(-k))`, which saturates instead
/// of overflowing for large `k`.
fn exponential(k: f64, x: f64) -> f64 {
    if k.abs() < 1e-9 {
        x
    } else if k < 1.0 {
        (k * x).exp_m1() / k.exp_m1()
    } else {
        let tail = (-k).exp();
        ((k * (x - 1.0)).exp() - tail) / (1.0 - tail)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "curve", rename_all = "snake_case")]
pub enum EscalationCurve {
    /// No boost at any encirclement.
    None,
    Exponential { threshold: f64, steepness: f64 },
    /// Logistic in `x`, rescaled to pass through (threshold, 0) and (1, 1).
    Logistic {
        threshold: f64,
        steepness: f64,
        midpoint: f64,
    },
}

impl Default for EscalationCurve {
    fn default() -> Self {
        EscalationCurve::Exponential {
            threshold: DEFAULT_THRESHOLD,
            steepness: DEFAULT_STEEPNESS,
        }
    }
}

impl EscalationCurve {
    pub fn threshold(&self) -> Option<f64> {
        match self {
            EscalationCurve::None => None,
            EscalationCurve::Exponential { threshold, .. }
            | EscalationCurve::Logistic { threshold, .. } => Some(*threshold),
        }
    }

    /// `f(e)` in [0, 1].
    pub fn boost(&self, encirclement: f64) -> f64 {
        let Some(t) = self.threshold() else {
            return 0.0;
        };
        if encirclement <= t {
            return 0.0;
        }
        let x = ((encirclement - t) / (1.0 - t)).clamp(0.0, 1.0);

        let f = match *self {
            EscalationCurve::None => 0.0,
            EscalationCurve::Exponential { steepness: k, .. } => exponential(k, x),
            EscalationCurve::Logistic {
                steepness: k,
                midpoint: m,
                ..
            } => {
                let g = |v: f64| 1.0 / (1.0 + (-k * (v - m)).exp());
                let (g0, g1) = (g(0.0), g(1.0));
                if g1 - g0 > MIN_LOGISTIC_SPAN {
                    (g(x) - g0) / (g1 - g0)
                } else {
                    x
                }
            }
        };
        if f.is_nan() {
            return 0.0;
        }
        f.clamp(0.0, 1.0)
    }

    /// Boosted probability, clamped to [0, 1].
    pub fn apply(&self, base: f64, encirclement: f64) -> f64 {
        let f = self.boost(encirclement);
        (base + (1.0 - base) * f).clamp(0.0, 1.0)
    }

    pub fn validate(&self) -> Result<()> {
        let check_threshold = |t: f64| {
            if t.is_finite() && (0.0..1.0).contains(&t) {
                Ok(())
            } else {
                Err(SimError::InvalidConfig(format!(
                    "escalation threshold must be in [0, 1), got {}",
                    t
                )))
            }
        };
        match *self {
            EscalationCurve::None => Ok(()),
            EscalationCurve::Exponential {
                threshold,
                steepness,
            } => {
                check_threshold(threshold)?;
                if !steepness.is_finite() || steepness < 0.0 {
                    return Err(SimError::InvalidConfig(format!(
                        "exponential steepness must be >= 0, got {}",
                        steepness
                    )));
                }
                Ok(())
            }
            EscalationCurve::Logistic {
                threshold,
                steepness,
                midpoint,
            } => {
                check_threshold(threshold)?;
                if !steepness.is_finite() || steepness <= 0.0 {
                    return Err(SimError::InvalidConfig(format!(
                        "logistic steepness must be > 0, got {}",
                        steepness
                    )));
                }
                if !(0.0..=1.0).contains(&midpoint) {
                    return Err(SimError::InvalidConfig(format!(
                        "logistic midpoint must be in [0, 1], got {}",
                        midpoint
                    )));
                }
                let g = |v: f64| 1.0 / (1.0 + (-steepness * (v - midpoint)).exp());
                if g(1.0) - g(0.0) <= MIN_LOGISTIC_SPAN {
                    return Err(SimError::InvalidConfig(format!(
                        "logistic steepness {} is too small to span [0, 1]",
                        steepness
                    )));
                }
                Ok(())
            }
        }
    }
}
