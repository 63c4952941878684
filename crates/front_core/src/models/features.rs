//! Named numeric feature vector exchanged with the predictive models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Column names shared with the upstream feature table.
pub mod keys {
    pub const DIST_TO_FRONT: &str = "dist_to_front_m";
    pub const ENCIRCLEMENT: &str = "encirclement_score";
    pub const DELTA_DAILY: &str = "delta_dist_daily";
    pub const MOMENTUM_7D: &str = "momentum_7d";
    pub const MOMENTUM_30D: &str = "momentum_30d";
    pub const PCT_OCCUPIED: &str = "pct_occupied";
    pub const FORTIFICATION: &str = "fortification_level";
    pub const TERRAIN: &str = "terrain_score";
    pub const TRANSPORT_HUB: &str = "is_transport_hub";
    pub const POPULATION: &str = "population";
    pub const AREA_KM2: &str = "geo_area_km2";
    pub const SYMBOLIC_WEIGHT: &str = "symbolic_weight";

    /// Columns the engine rewrites every simulated day.
    pub const DYNAMIC: [&str; 5] = [
        DIST_TO_FRONT,
        ENCIRCLEMENT,
        DELTA_DAILY,
        MOMENTUM_7D,
        MOMENTUM_30D,
    ];
}

/// Ordered map of feature name → value.
///
/// BTreeMap keeps iteration (and therefore serialization) order stable,
/// which the determinism checks rely on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector {
    values: BTreeMap<String, f64>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    /// Like `get`, but a missing key is reported against `owner`.
    pub fn require(&self, owner: &str, key: &str) -> Result<f64> {
        self.get(key).ok_or_else(|| SimError::MissingFeature {
            model: owner.to_string(),
            feature: key.to_string(),
        })
    }

    pub fn set(&mut self, key: impl Into<String>, value: f64) {
        self.values.insert(key.into(), value);
    }

    pub fn with(mut self, key: impl Into<String>, value: f64) -> Self {
        self.set(key, value);
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Project onto `keys`, in the order given. Every key must be present.
    pub fn select<'a, I>(&self, owner: &str, keys: I) -> Result<FeatureVector>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut out = FeatureVector::new();
        for key in keys {
            out.set(key, self.require(owner, key)?);
        }
        Ok(out)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// First feature whose value is NaN or infinite, if any.
    pub fn first_non_finite(&self) -> Option<(&str, f64)> {
        self.iter().find(|(_, v)| !v.is_finite())
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for FeatureVector {
    fn from_iter<T: IntoIterator<Item = (K, f64)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_reports_owner() {
        let fv = FeatureVector::new().with(keys::DIST_TO_FRONT, 1200.0);
        assert_eq!(fv.require("front", keys::DIST_TO_FRONT).unwrap(), 1200.0);

        let err = fv.require("capture", keys::ENCIRCLEMENT).unwrap_err();
        assert_eq!(
            err,
            SimError::MissingFeature {
                model: "capture".to_string(),
                feature: keys::ENCIRCLEMENT.to_string(),
            }
        );
    }

    #[test]
    fn test_select_projects_subset() {
        let fv: FeatureVector = [("a", 1.0), ("b", 2.0), ("c", 3.0)].into_iter().collect();
        let sub = fv.select("m", ["c", "a"]).unwrap();
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.get("a"), Some(1.0));
        assert_eq!(sub.get("b"), None);
        assert!(fv.select("m", ["z"]).is_err());
    }

    #[test]
    fn test_first_non_finite() {
        let fv = FeatureVector::new().with("ok", 1.0).with("bad", f64::NAN);
        assert_eq!(fv.first_non_finite().map(|(k, _)| k), Some("bad"));
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let fv = FeatureVector::new().with("b", 2.0).with("a", 1.0);
        assert_eq!(serde_json::to_string(&fv).unwrap(), r#"{"a":1.0,"b":2.0}"#);
    }
}
