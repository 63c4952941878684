//! front_cli library
//!
//! Feature table (CSV) → `CitySeed`s, model directory (JSON) → `ModelSet`,
//! config file / env → `SimConfig`, and text/JSON rendering of results.

pub mod config;
pub mod feature_table;
pub mod model_dir;
pub mod render;

use anyhow::Result;
use front_core::Scenario;

pub use config::load_sim_config;
pub use feature_table::{load_feature_table, FeatureTable, ParseStats};
pub use model_dir::load_models;

/// `all` or a comma-separated list of scenario names.
pub fn parse_scenarios(spec: &str) -> Result<Vec<Scenario>> {
    if spec.trim().eq_ignore_ascii_case("all") {
        return Ok(Scenario::ALL.to_vec());
    }
    let mut scenarios = spec
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<Scenario>().map_err(anyhow::Error::from))
        .collect::<Result<Vec<_>>>()?;
    if scenarios.is_empty() {
        anyhow::bail!("no scenario given");
    }
    scenarios.sort();
    scenarios.dedup();
    Ok(scenarios)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scenarios() {
        assert_eq!(parse_scenarios("all").unwrap(), Scenario::ALL.to_vec());
        assert_eq!(
            parse_scenarios("aggressive,conservative,aggressive").unwrap(),
            vec![Scenario::Conservative, Scenario::Aggressive]
        );
        assert!(parse_scenarios("inertial,bold").is_err());
        assert!(parse_scenarios(" , ").is_err());
    }
}
