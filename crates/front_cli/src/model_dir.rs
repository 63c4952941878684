//! Model directory: one JSON `LinearModel` per model kind.
//!
//! ```text
//! models/
//!   front_dynamics.json
//!   encirclement.json
//!   capture.json
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use front_core::{LinearModel, ModelKind, ModelSet};
use tracing::info;

pub fn model_file_name(kind: ModelKind) -> &'static str {
    match kind {
        ModelKind::FrontDynamics => "front_dynamics.json",
        ModelKind::Encirclement => "encirclement.json",
        ModelKind::CaptureProbability => "capture.json",
    }
}

fn load_model(dir: &Path, kind: ModelKind) -> Result<LinearModel> {
    let path = dir.join(model_file_name(kind));
    let json = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {} model: {}", kind, path.display()))?;
    let model = LinearModel::from_json(&json)
        .with_context(|| format!("Invalid {} model: {}", kind, path.display()))?;
    info!(
        kind = %kind,
        name = %model.name,
        features = model.coefficients.len(),
        "loaded model"
    );
    Ok(model)
}

/// Load all three models; any missing or malformed file fails the whole set.
pub fn load_models(dir: &Path) -> Result<ModelSet> {
    let front = load_model(dir, ModelKind::FrontDynamics)?;
    let encirclement = load_model(dir, ModelKind::Encirclement)?;
    let capture = load_model(dir, ModelKind::CaptureProbability)?;
    Ok(ModelSet::new(
        Arc::new(front),
        Arc::new(encirclement),
        Arc::new(capture),
    ))
}
