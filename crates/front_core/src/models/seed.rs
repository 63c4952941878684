//! Seed row: the latest known state of one city from the feature table.

use serde::{Deserialize, Serialize};

use super::features::{keys, FeatureVector};
use crate::error::{Result, SimError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// One city's starting point, immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySeed {
    pub city_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    /// Source table already marks the city as captured.
    #[serde(default)]
    pub already_captured: bool,
    pub features: FeatureVector,
}

impl CitySeed {
    pub fn new(
        city_id: impl Into<String>,
        name: impl Into<String>,
        features: FeatureVector,
    ) -> Self {
        Self {
            city_id: city_id.into(),
            name: name.into(),
            location: None,
            already_captured: false,
            features,
        }
    }

    pub fn with_location(mut self, lat: f64, lon: f64) -> Self {
        self.location = Some(GeoPoint { lat, lon });
        self
    }

    pub fn with_captured(mut self, captured: bool) -> Self {
        self.already_captured = captured;
        self
    }

    pub fn dist_to_front(&self) -> Option<f64> {
        self.features.get(keys::DIST_TO_FRONT)
    }

    pub fn encirclement(&self) -> Option<f64> {
        self.features.get(keys::ENCIRCLEMENT)
    }

    /// Reject rows the engine cannot start from.
    pub fn validate(&self) -> Result<()> {
        let label = if self.city_id.is_empty() {
            self.name.as_str()
        } else {
            self.city_id.as_str()
        };
        let fail = |reason: String| Err(SimError::invalid_row(label, reason));

        if self.city_id.trim().is_empty() {
            return fail("empty city identifier".to_string());
        }

        if let Some((key, value)) = self.features.first_non_finite() {
            return fail(format!("feature '{}' is not finite ({})", key, value));
        }

        match self.dist_to_front() {
            None => return fail(format!("missing '{}'", keys::DIST_TO_FRONT)),
            Some(d) if d < 0.0 => {
                return fail(format!("negative {} ({})", keys::DIST_TO_FRONT, d));
            }
            Some(_) => {}
        }

        match self.encirclement() {
            None => return fail(format!("missing '{}'", keys::ENCIRCLEMENT)),
            Some(e) if !(0.0..=1.0).contains(&e) => {
                return fail(format!("{} out of [0, 1] ({})", keys::ENCIRCLEMENT, e));
            }
            Some(_) => {}
        }

        if let Some(GeoPoint { lat, lon }) = self.location {
            if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
                return fail(format!("latitude out of range ({})", lat));
            }
            if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
                return fail(format!("longitude out of range ({})", lon));
            }
        }

        Ok(())
    }

    /// Day-0 feature context: the seed features with the momentum columns
    /// defaulted to zero when the table carries no history for them.
    pub fn initial_context(&self) -> FeatureVector {
        let mut ctx = self.features.clone();
        for key in [keys::DELTA_DAILY, keys::MOMENTUM_7D, keys::MOMENTUM_30D] {
            if !ctx.contains(key) {
                ctx.set(key, 0.0);
            }
        }
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(dist: f64, enc: f64) -> CitySeed {
        CitySeed::new(
            "pokrovsk",
            "Pokrovsk",
            FeatureVector::new()
                .with(keys::DIST_TO_FRONT, dist)
                .with(keys::ENCIRCLEMENT, enc),
        )
    }

    #[test]
    fn test_valid_seed() {
        assert!(seed(4500.0, 0.3).with_location(48.28, 37.18).validate().is_ok());
        assert!(seed(0.0, 1.0).validate().is_ok());
    }

    #[test]
    fn test_negative_distance_rejected() {
        let err = seed(-1.0, 0.3).validate().unwrap_err();
        assert!(matches!(err, SimError::InvalidFeatureRow { ref city, .. } if city == "pokrovsk"));
    }

    #[test]
    fn test_encirclement_out_of_range_rejected() {
        assert!(seed(10.0, 1.2).validate().is_err());
        assert!(seed(10.0, -0.1).validate().is_err());
    }

    #[test]
    fn test_missing_required_fields_rejected() {
        let s = CitySeed::new("x", "X", FeatureVector::new().with(keys::DIST_TO_FRONT, 5.0));
        let err = s.validate().unwrap_err().to_string();
        assert!(err.contains(keys::ENCIRCLEMENT), "{}", err);
    }

    #[test]
    fn test_non_finite_feature_rejected() {
        let mut s = seed(10.0, 0.5);
        s.features.set(keys::POPULATION, f64::INFINITY);
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_bad_location_rejected() {
        assert!(seed(10.0, 0.5).with_location(95.0, 0.0).validate().is_err());
        assert!(seed(10.0, 0.5).with_location(0.0, -200.0).validate().is_err());
    }

    #[test]
    fn test_initial_context_defaults_momentum() {
        let ctx = seed(100.0, 0.2).initial_context();
        assert_eq!(ctx.get(keys::MOMENTUM_7D), Some(0.0));
        assert_eq!(ctx.get(keys::MOMENTUM_30D), Some(0.0));
        assert_eq!(ctx.get(keys::DELTA_DAILY), Some(0.0));

        let mut s = seed(100.0, 0.2);
        s.features.set(keys::MOMENTUM_7D, 42.0);
        assert_eq!(s.initial_context().get(keys::MOMENTUM_7D), Some(42.0));
    }
}
