//! Sleep Quality - Feature pipeline and classifier inference for sleep quality prediction
//!
//! Turns a handful of lifestyle (and optionally clinical) attributes into a
//! categorical sleep quality label through a deterministic pipeline:
//! boundary validation → feature derivation → encoding → optional scaling
//! → classification → label mapping.
//!
//! ## Modules
//!
//! - **Schemas**: Declared inputs, category tables, ordered columns and labels per model version
//! - **Pipeline**: `Predictor` over an immutable `ModelBundle` (schema + classifier + scaler)
//! - **Surfaces**: `sleepq` CLI (feature `cli`) and C ABI (`ffi`)

pub mod bundle;
pub mod config;
pub mod encoder;
pub mod error;
pub mod features;
pub mod inputs;
pub mod model;
pub mod pipeline;
pub mod record;
pub mod scaler;
pub mod schema;
pub mod types;
pub mod validator;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use bundle::ModelBundle;
pub use config::{PredictorConfig, SchemaSource};
pub use error::PredictError;
pub use inputs::{BloodPressure, HealthInputs, LifestyleInputs};
pub use pipeline::{predict, Predictor};
pub use record::{PredictionEncoder, PredictionRecord};
pub use scaler::{Scaler, ScalerPolicy};
pub use schema::{FeatureSchema, SchemaId};
pub use types::{AttributeValue, FeatureVector, Prediction, PredictionLabel, RawInputs};
pub use validator::InputValidator;

/// Predictor version embedded in every prediction record
pub const PREDICTOR_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for prediction records
pub const PRODUCER_NAME: &str = "sleep-quality";
