//! Pipeline orchestration
//!
//! This module provides the public prediction API. It runs one request from
//! raw attributes to a sleep quality label.

use std::sync::Arc;

use crate::bundle::ModelBundle;
use crate::config::PredictorConfig;
use crate::encoder::FeatureEncoder;
use crate::error::PredictError;
use crate::inputs::expand_blood_pressure;
use crate::scaler::ScalerPolicy;
use crate::types::{FeatureVector, Prediction, PredictionLabel, RawInputs};
use crate::validator::InputValidator;

/// Predict a sleep quality label with the default (lenient) scaling policy.
///
/// # Example
/// ```ignore
/// let bundle = ModelBundle::load(&config)?;
/// let label = predict(&bundle, &raw)?;
/// ```
pub fn predict(bundle: &ModelBundle, raw: &RawInputs) -> Result<PredictionLabel, PredictError> {
    run_pipeline(bundle, raw, ScalerPolicy::Lenient).map(|p| p.label)
}

/// Run the pipeline once.
///
/// Pipeline stages:
/// 1. FeatureEncoder - Derive and assemble the ordered feature vector
/// 2. Scaler - Optionally rescale (lenient fallback or strict error)
/// 3. Classifier - Predict a class code
/// 4. Schema labels - Map the code to a label (`Unknown` if unmapped)
fn run_pipeline(
    bundle: &ModelBundle,
    raw: &RawInputs,
    policy: ScalerPolicy,
) -> Result<Prediction, PredictError> {
    let schema = bundle.schema();

    // Stage 1: Derive and assemble features
    let features = FeatureEncoder::encode(schema, raw)?;

    // Stage 2: Rescale
    let (input, scaled) = scale(bundle, &features, policy)?;

    // Stage 3: Classify
    let class_code = bundle.classifier().predict(input.values())?;

    // Stage 4: Label
    let label = schema.label_for(class_code);
    if label == PredictionLabel::Unknown {
        log::debug!(
            "classifier returned unmapped class code {class_code} for schema {}",
            schema.id
        );
    }

    Ok(Prediction {
        label,
        class_code,
        scaled,
        schema: schema.id.clone(),
        features,
    })
}

/// Apply the bundle's scaler, if any. Returns the vector to classify and
/// whether it was scaled.
fn scale(
    bundle: &ModelBundle,
    features: &FeatureVector,
    policy: ScalerPolicy,
) -> Result<(FeatureVector, bool), PredictError> {
    let Some(scaler) = bundle.scaler() else {
        return Ok((features.clone(), false));
    };

    match scaler.transform(features) {
        Ok(scaled) => Ok((scaled, true)),
        Err(e @ (PredictError::ScalerShapeMismatch { .. } | PredictError::SchemaMismatch(_))) => {
            match policy {
                ScalerPolicy::Lenient => {
                    log::warn!("scaling skipped, classifying unscaled features: {e}");
                    Ok((features.clone(), false))
                }
                ScalerPolicy::Strict => Err(e),
            }
        }
        Err(e) => Err(e),
    }
}

/// Reusable predictor over a shared, immutable model bundle.
///
/// Cheap to clone; clones share the bundle.
#[derive(Debug, Clone)]
pub struct Predictor {
    bundle: Arc<ModelBundle>,
    scaler_policy: ScalerPolicy,
    validate_inputs: bool,
}

impl Predictor {
    /// Create a predictor with lenient scaling and no boundary validation
    pub fn new(bundle: impl Into<Arc<ModelBundle>>) -> Self {
        Self {
            bundle: bundle.into(),
            scaler_policy: ScalerPolicy::Lenient,
            validate_inputs: false,
        }
    }

    /// Load artifacts and apply the configured policies
    pub fn from_config(config: &PredictorConfig) -> Result<Self, PredictError> {
        let bundle = ModelBundle::load(config)?;
        Ok(Self::new(bundle)
            .with_scaler_policy(config.scaler_policy)
            .with_input_validation(config.validate_inputs))
    }

    pub fn with_scaler_policy(mut self, policy: ScalerPolicy) -> Self {
        self.scaler_policy = policy;
        self
    }

    /// Validate bounds and categories before running the pipeline
    pub fn with_input_validation(mut self, enabled: bool) -> Self {
        self.validate_inputs = enabled;
        self
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    /// Run the full pipeline for one request
    pub fn predict(&self, raw: &RawInputs) -> Result<Prediction, PredictError> {
        if self.validate_inputs {
            InputValidator::validate(self.bundle.schema(), raw)?;
        }
        run_pipeline(&self.bundle, raw, self.scaler_policy)
    }

    /// Run the pipeline and return only the label
    pub fn predict_label(&self, raw: &RawInputs) -> Result<PredictionLabel, PredictError> {
        self.predict(raw).map(|p| p.label)
    }

    /// Parse a JSON object of attributes and predict. A `"blood_pressure":
    /// "120/80"` attribute is split into `systolic` and `diastolic`.
    pub fn predict_json(&self, json: &str) -> Result<Prediction, PredictError> {
        let mut raw = RawInputs::from_json(json)?;
        expand_blood_pressure(&mut raw)?;
        self.predict(&raw)
    }
}
