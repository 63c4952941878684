//! Per-day city snapshot.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CityStatus {
    Free,
    /// Terminal.
    Occupied,
}

impl fmt::Display for CityStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CityStatus::Free => write!(f, "FREE"),
            CityStatus::Occupied => write!(f, "OCCUPIED"),
        }
    }
}

/// Derived metrics for one simulated day.
///
/// Values are kept at full precision; rounding is a rendering concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSnapshot {
    /// 1-based simulation day.
    pub day: u32,
    /// Never negative.
    pub dist_to_front: f64,
    /// Scenario-adjusted advance for this day (positive = front moved closer).
    pub delta_real: f64,
    /// In [0, 1].
    pub encirclement: f64,
    /// In [0, 1], after escalation.
    pub prob_capture: f64,
    pub status: CityStatus,
}

impl FeatureSnapshot {
    pub fn is_occupied(&self) -> bool {
        self.status == CityStatus::Occupied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_string(&CityStatus::Free).unwrap(), "\"FREE\"");
        assert_eq!(
            serde_json::from_str::<CityStatus>("\"OCCUPIED\"").unwrap(),
            CityStatus::Occupied
        );
        assert_eq!(CityStatus::Occupied.to_string(), "OCCUPIED");
    }
}
