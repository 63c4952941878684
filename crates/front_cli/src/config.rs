use std::path::Path;
use std::{env, fs};

use anyhow::{Context, Result};
use front_core::engine::CONFIG_PATH_ENV;
use front_core::SimConfig;

/// Resolve the simulation config: explicit path, then `FRONT_SIM_CONFIG_PATH`,
/// then defaults.
pub fn load_sim_config(path: Option<&Path>) -> Result<SimConfig> {
    if let Some(path) = path {
        return read_config(path);
    }

    let Ok(path) = env::var(CONFIG_PATH_ENV) else {
        return Ok(SimConfig::default());
    };
    let path = path.trim();
    if path.is_empty() {
        return Ok(SimConfig::default());
    }

    read_config(Path::new(path))
        .with_context(|| format!("Failed to apply config from {CONFIG_PATH_ENV}='{path}'"))
}

fn read_config(path: &Path) -> Result<SimConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config = SimConfig::from_json(&content)
        .with_context(|| format!("Invalid config file: {}", path.display()))?;
    Ok(config)
}
