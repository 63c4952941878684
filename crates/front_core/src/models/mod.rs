//! Data model: feature vectors, seed rows, daily snapshots and trajectory reports.

pub mod features;
pub mod report;
pub mod seed;
pub mod snapshot;

pub use features::{keys, FeatureVector};
pub use report::{RunOutcome, RunResult, TrajectoryReport};
pub use seed::{CitySeed, GeoPoint};
pub use snapshot::{CityStatus, FeatureSnapshot};
