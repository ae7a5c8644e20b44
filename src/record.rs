//! Prediction record encoding
//!
//! This module encodes a `Prediction` into the JSON record emitted by the CLI
//! and the C ABI, stamped with producer metadata and a computation time.

use crate::error::PredictError;
use crate::types::Prediction;
use crate::{PREDICTOR_VERSION, PRODUCER_NAME};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
    pub instance_id: Uuid,
}

/// Emitted prediction record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub label: String,
    pub advisory: String,
    pub class_code: i64,
    pub scaled: bool,
    pub schema: String,
    pub features: serde_json::Map<String, serde_json::Value>,
    pub producer: Producer,
    /// Serialized as RFC 3339
    pub computed_at_utc: DateTime<Utc>,
}

/// Record encoder holding a per-process instance id
#[derive(Debug, Clone)]
pub struct PredictionEncoder {
    instance_id: Uuid,
}

impl Default for PredictionEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictionEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: Uuid) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn encode(&self, prediction: &Prediction) -> PredictionRecord {
        PredictionRecord {
            label: prediction.label.as_str().to_string(),
            advisory: prediction.label.advisory().to_string(),
            class_code: prediction.class_code,
            scaled: prediction.scaled,
            schema: prediction.schema.clone(),
            features: prediction.features.to_json_map(),
            producer: Producer {
                name: PRODUCER_NAME.to_string(),
                version: PREDICTOR_VERSION.to_string(),
                instance_id: self.instance_id,
            },
            computed_at_utc: Utc::now(),
        }
    }

    /// Encode to a compact JSON string (one line, NDJSON friendly)
    pub fn encode_to_json(&self, prediction: &Prediction) -> Result<String, PredictError> {
        serde_json::to_string(&self.encode(prediction)).map_err(PredictError::JsonError)
    }

    /// Encode to a pretty-printed JSON string
    pub fn encode_to_json_pretty(&self, prediction: &Prediction) -> Result<String, PredictError> {
        serde_json::to_string_pretty(&self.encode(prediction)).map_err(PredictError::JsonError)
    }
}
