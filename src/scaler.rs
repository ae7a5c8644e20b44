//! Feature scaling
//!
//! Fitted scalers applied to the assembled feature vector before
//! classification:
//! - Standard: `(x - mean) / scale`
//! - Min-max: `(x - min) / (max - min)`

use crate::error::PredictError;
use crate::types::FeatureVector;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// What to do when the scaler does not fit the assembled vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalerPolicy {
    /// Log a warning and classify the unscaled vector
    #[default]
    Lenient,
    /// Surface the mismatch to the caller
    Strict,
}

/// Fitted feature scaler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    Standard {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        feature_names: Option<Vec<String>>,
        mean: Vec<f64>,
        scale: Vec<f64>,
    },
    MinMax {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        feature_names: Option<Vec<String>>,
        min: Vec<f64>,
        max: Vec<f64>,
    },
}

impl Scaler {
    /// Parse and validate a scaler artifact
    pub fn from_json(json: &str) -> Result<Self, PredictError> {
        let scaler: Scaler = serde_json::from_str(json)?;
        scaler.validate()?;
        Ok(scaler)
    }

    /// Load a scaler artifact from disk
    pub fn load(path: &Path) -> Result<Self, PredictError> {
        let json = fs::read_to_string(path).map_err(|e| PredictError::artifact_load(path, e))?;
        Scaler::from_json(&json).map_err(|e| PredictError::artifact_load(path, e))
    }

    /// Number of features the scaler was fit on
    pub fn n_features(&self) -> usize {
        match self {
            Scaler::Standard { mean, .. } => mean.len(),
            Scaler::MinMax { min, .. } => min.len(),
        }
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        match self {
            Scaler::Standard { feature_names, .. } | Scaler::MinMax { feature_names, .. } => {
                feature_names.as_deref()
            }
        }
    }

    fn validate(&self) -> Result<(), PredictError> {
        let (first, second) = match self {
            Scaler::Standard { mean, scale, .. } => (mean, scale),
            Scaler::MinMax { min, max, .. } => (min, max),
        };

        if first.len() != second.len() {
            return Err(PredictError::InvalidArtifact(format!(
                "scaler parameter lengths differ ({} vs {})",
                first.len(),
                second.len()
            )));
        }
        if let Some(names) = self.feature_names() {
            if names.len() != first.len() {
                return Err(PredictError::InvalidArtifact(format!(
                    "scaler has {} feature names for {} features",
                    names.len(),
                    first.len()
                )));
            }
        }
        if first.iter().chain(second.iter()).any(|v| !v.is_finite()) {
            return Err(PredictError::InvalidArtifact(
                "scaler parameters must be finite".to_string(),
            ));
        }

        Ok(())
    }

    /// Check the scaler fits the given column layout
    pub fn check_layout(&self, names: &[String]) -> Result<(), PredictError> {
        if names.len() != self.n_features() {
            return Err(PredictError::ScalerShapeMismatch {
                expected: self.n_features(),
                actual: names.len(),
            });
        }
        if let Some(expected) = self.feature_names() {
            if expected != names {
                return Err(PredictError::SchemaMismatch(format!(
                    "scaler was fit on columns {expected:?}, got {names:?}"
                )));
            }
        }
        Ok(())
    }

    /// Apply the fitted transform
    pub fn transform(&self, vector: &FeatureVector) -> Result<FeatureVector, PredictError> {
        self.check_layout(vector.names())?;

        let values = match self {
            Scaler::Standard { mean, scale, .. } => vector
                .values()
                .iter()
                .zip(mean.iter().zip(scale.iter()))
                .map(|(x, (m, s))| {
                    // Constant columns were fit with scale 0; treat as 1
                    let s = if *s == 0.0 { 1.0 } else { *s };
                    (x - m) / s
                })
                .collect(),
            Scaler::MinMax { min, max, .. } => vector
                .values()
                .iter()
                .zip(min.iter().zip(max.iter()))
                .map(|(x, (lo, hi))| {
                    let range = hi - lo;
                    if range == 0.0 {
                        0.0
                    } else {
                        (x - lo) / range
                    }
                })
                .collect(),
        };

        Ok(vector.with_values(values))
    }
}
