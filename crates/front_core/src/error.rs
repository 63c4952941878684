use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::predict::ModelKind;

#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimError {
    #[error("Invalid feature row for city '{city}': {reason}")]
    InvalidFeatureRow { city: String, reason: String },

    #[error("{model} model returned invalid output on day {day}: {reason}")]
    ModelOutput {
        model: ModelKind,
        day: u32,
        reason: String,
    },

    #[error("Model '{model}' requires missing feature '{feature}'")]
    MissingFeature { model: String, feature: String },

    #[error("Invalid simulation config: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SimError {
    pub fn invalid_row(city: impl Into<String>, reason: impl Into<String>) -> Self {
        SimError::InvalidFeatureRow {
            city: city.into(),
            reason: reason.into(),
        }
    }

    /// Per-run failures can be skipped at the batch level; setup failures cannot.
    pub fn is_recoverable(&self) -> bool {
        match self {
            SimError::InvalidFeatureRow { .. } => true,
            SimError::ModelOutput { .. } => true,
            SimError::MissingFeature { .. } => true,
            SimError::InvalidConfig(_) => false,
            SimError::Serialization(_) => false,
        }
    }
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        SimError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
