//! Predictor configuration
//!
//! Artifact paths, the feature schema and the scaling policy are process
//! configuration, read from a JSON file or assembled from CLI flags.

use crate::error::PredictError;
use crate::scaler::ScalerPolicy;
use crate::schema::{FeatureSchema, SchemaId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Where the feature schema comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaSource {
    Builtin(SchemaId),
    File { path: PathBuf },
}

impl Default for SchemaSource {
    fn default() -> Self {
        SchemaSource::Builtin(SchemaId::LifestyleV1)
    }
}

impl SchemaSource {
    /// Resolve to a validated schema
    pub fn resolve(&self) -> Result<FeatureSchema, PredictError> {
        match self {
            SchemaSource::Builtin(id) => Ok(FeatureSchema::builtin(*id)),
            SchemaSource::File { path } => {
                let json =
                    fs::read_to_string(path).map_err(|e| PredictError::artifact_load(path, e))?;
                FeatureSchema::from_json(&json).map_err(|e| PredictError::artifact_load(path, e))
            }
        }
    }
}

fn default_validate_inputs() -> bool {
    true
}

/// Predictor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorConfig {
    #[serde(default)]
    pub schema: SchemaSource,
    pub classifier_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler_path: Option<PathBuf>,
    #[serde(default)]
    pub scaler_policy: ScalerPolicy,
    /// Check bounds and categories before the pipeline runs
    #[serde(default = "default_validate_inputs")]
    pub validate_inputs: bool,
}

impl PredictorConfig {
    pub fn new(schema: SchemaSource, classifier_path: impl Into<PathBuf>) -> Self {
        Self {
            schema,
            classifier_path: classifier_path.into(),
            scaler_path: None,
            scaler_policy: ScalerPolicy::default(),
            validate_inputs: default_validate_inputs(),
        }
    }

    pub fn with_scaler(mut self, path: impl Into<PathBuf>) -> Self {
        self.scaler_path = Some(path.into());
        self
    }

    pub fn with_scaler_policy(mut self, policy: ScalerPolicy) -> Self {
        self.scaler_policy = policy;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, PredictError> {
        let config: PredictorConfig = serde_json::from_str(json)?;
        if config.classifier_path.as_os_str().is_empty() {
            return Err(PredictError::InvalidConfig(
                "classifier_path must not be empty".to_string(),
            ));
        }
        Ok(config)
    }

    /// Load configuration from a JSON file. Relative artifact paths are
    /// resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self, PredictError> {
        let json = fs::read_to_string(path)
            .map_err(|e| PredictError::InvalidConfig(format!("{}: {e}", path.display())))?;
        let mut config = PredictorConfig::from_json(&json)?;

        if let Some(base) = path.parent() {
            config.classifier_path = base.join(&config.classifier_path);
            config.scaler_path = config.scaler_path.map(|p| base.join(p));
            if let SchemaSource::File { path: schema_path } = &mut config.schema {
                *schema_path = base.join(&*schema_path);
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_config_defaults() {
        let config = PredictorConfig::from_json(r#"{ "classifier_path": "model.json" }"#).unwrap();

        assert_eq!(config.schema, SchemaSource::Builtin(SchemaId::LifestyleV1));
        assert_eq!(config.scaler_path, None);
        assert_eq!(config.scaler_policy, ScalerPolicy::Lenient);
        assert!(config.validate_inputs);
    }

    #[test]
    fn test_config_full() {
        let config = PredictorConfig::from_json(
            r#"{
                "schema": "health.v1",
                "classifier_path": "model.json",
                "scaler_path": "scaler.json",
                "scaler_policy": "strict",
                "validate_inputs": false
            }"#,
        )
        .unwrap();

        assert_eq!(config.schema, SchemaSource::Builtin(SchemaId::HealthV1));
        assert_eq!(config.scaler_path, Some(PathBuf::from("scaler.json")));
        assert_eq!(config.scaler_policy, ScalerPolicy::Strict);
        assert!(!config.validate_inputs);
    }

    #[test]
    fn test_config_schema_file() {
        let config = PredictorConfig::from_json(
            r#"{ "schema": { "path": "custom.json" }, "classifier_path": "model.json" }"#,
        )
        .unwrap();

        assert_eq!(
            config.schema,
            SchemaSource::File {
                path: PathBuf::from("custom.json")
            }
        );
    }

    #[test]
    fn test_config_rejects_empty_classifier_path() {
        assert!(PredictorConfig::from_json(r#"{ "classifier_path": "" }"#).is_err());
        assert!(PredictorConfig::from_json(r#"{ "schema": "lifestyle.v1" }"#).is_err());
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("predictor.json");
        fs::write(
            &path,
            r#"{ "classifier_path": "model.json", "scaler_path": "scaler.json" }"#,
        )
        .unwrap();

        let config = PredictorConfig::load(&path).unwrap();

        assert_eq!(config.classifier_path, dir.path().join("model.json"));
        assert_eq!(config.scaler_path, Some(dir.path().join("scaler.json")));
    }

    #[test]
    fn test_builtin_source_resolves() {
        let schema = SchemaSource::Builtin(SchemaId::HealthV1).resolve().unwrap();
        assert_eq!(schema.id, "health.v1");
    }
}
