//! Model bundle
//!
//! A `ModelBundle` groups the feature schema, the classifier and the optional
//! scaler of one model version. It is built once by the process entry point
//! and read-only afterwards, so it can be shared across threads behind an
//! `Arc` without locking.

use crate::config::PredictorConfig;
use crate::error::PredictError;
use crate::model::{load_classifier, Classifier};
use crate::scaler::Scaler;
use crate::schema::FeatureSchema;

/// Immutable schema + classifier + optional scaler
#[derive(Debug)]
pub struct ModelBundle {
    schema: FeatureSchema,
    classifier: Box<dyn Classifier>,
    scaler: Option<Scaler>,
}

impl ModelBundle {
    /// Assemble a bundle, checking the classifier against the schema's columns
    pub fn new(
        schema: FeatureSchema,
        classifier: Box<dyn Classifier>,
        scaler: Option<Scaler>,
    ) -> Result<Self, PredictError> {
        schema.validate()?;
        classifier.validate()?;

        let columns = schema.column_names();
        if classifier.n_features() != columns.len() {
            return Err(PredictError::SchemaMismatch(format!(
                "classifier was fit on {} features, schema {} has {} columns",
                classifier.n_features(),
                schema.id,
                columns.len()
            )));
        }
        if let Some(names) = classifier.feature_names() {
            if names.iter().map(String::as_str).ne(columns.iter().copied()) {
                return Err(PredictError::SchemaMismatch(format!(
                    "classifier was fit on columns {names:?}, schema {} declares {columns:?}",
                    schema.id
                )));
            }
        }

        // Scaler mismatches are recovered per request; flag them once here
        if let Some(scaler) = &scaler {
            let names: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
            if let Err(e) = scaler.check_layout(&names) {
                log::warn!("scaler does not fit schema {}: {e}", schema.id);
            }
        }

        Ok(Self {
            schema,
            classifier,
            scaler,
        })
    }

    /// Load every artifact named by the configuration. Any failure is fatal
    /// for the process.
    pub fn load(config: &PredictorConfig) -> Result<Self, PredictError> {
        let schema = config.schema.resolve()?;
        let classifier = load_classifier(&config.classifier_path)?;
        let scaler = match &config.scaler_path {
            Some(path) => {
                log::info!("Loading scaler from {}", path.display());
                Some(Scaler::load(path)?)
            }
            None => None,
        };

        let bundle = ModelBundle::new(schema, classifier, scaler)
            .map_err(|e| PredictError::artifact_load(&config.classifier_path, e))?;

        log::info!(
            "Model bundle ready: schema {}, {} features, scaler {}",
            bundle.schema.id,
            bundle.classifier.n_features(),
            if bundle.scaler.is_some() { "present" } else { "absent" }
        );

        Ok(bundle)
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn scaler(&self) -> Option<&Scaler> {
        self.scaler.as_ref()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::{DecisionTree, LogisticRegression, RandomForest};
    use crate::schema::SchemaId;
    use std::fs;

    /// Logistic regression over the lifestyle columns that favours class 0
    /// for low stress and class 2 for high stress
    pub(crate) fn stress_classifier(schema: &FeatureSchema) -> LogisticRegression {
        let n = schema.columns.len();
        let stress = schema.column_names().iter().position(|c| *c == "StressLevel").unwrap();
        let mut coef = vec![vec![0.0; n]; 3];
        coef[0][stress] = -1.0;
        coef[2][stress] = 1.0;

        LogisticRegression {
            n_features: n,
            feature_names: None,
            classes: vec![0, 1, 2],
            coef,
            intercept: vec![0.5, 0.0, -1.5],
        }
    }

    #[test]
    fn test_bundle_accepts_matching_classifier() {
        let schema = FeatureSchema::builtin(SchemaId::LifestyleV1);
        let classifier = stress_classifier(&schema);

        let bundle = ModelBundle::new(schema, Box::new(classifier), None).unwrap();
        assert_eq!(bundle.classifier().n_features(), 12);
        assert!(bundle.scaler().is_none());
    }

    #[test]
    fn test_bundle_rejects_feature_count_mismatch() {
        let schema = FeatureSchema::builtin(SchemaId::LifestyleV1);
        let other = FeatureSchema::builtin(SchemaId::HealthV1);
        let classifier = stress_classifier(&schema);

        let err = ModelBundle::new(other, Box::new(classifier), None).unwrap_err();
        assert!(matches!(err, PredictError::SchemaMismatch(_)));
    }

    #[test]
    fn test_bundle_rejects_reordered_columns() {
        let schema = FeatureSchema::builtin(SchemaId::LifestyleV1);
        let mut classifier = stress_classifier(&schema);
        let mut names: Vec<String> = schema.column_names().iter().map(|c| c.to_string()).collect();
        names.swap(0, 1);
        classifier.feature_names = Some(names);

        let err = ModelBundle::new(schema, Box::new(classifier), None).unwrap_err();
        assert!(matches!(err, PredictError::SchemaMismatch(_)));
    }

    #[test]
    fn test_bundle_rejects_malformed_forest() {
        let schema = FeatureSchema::builtin(SchemaId::LifestyleV1);
        let tree = |feature: i64, left: i64| DecisionTree {
            children_left: vec![left, -1, -1],
            children_right: vec![2, -1, -1],
            feature: vec![feature, -2, -2],
            threshold: vec![5.0, -2.0, -2.0],
            value: vec![vec![1.0, 1.0, 1.0], vec![1.0, 0.0, 0.0], vec![0.0, 0.0, 1.0]],
        };
        let forest = |tree: DecisionTree| RandomForest {
            n_features: 12,
            feature_names: None,
            classes: vec![0, 1, 2],
            trees: vec![tree],
        };

        // Split on a feature the schema does not have
        let err = ModelBundle::new(schema.clone(), Box::new(forest(tree(40, 1))), None).unwrap_err();
        assert!(matches!(err, PredictError::InvalidArtifact(_)));

        // Child pointing back at its own node
        let err = ModelBundle::new(schema.clone(), Box::new(forest(tree(9, 0))), None).unwrap_err();
        assert!(matches!(err, PredictError::InvalidArtifact(_)));

        assert!(ModelBundle::new(schema, Box::new(forest(tree(9, 1))), None).is_ok());
    }

    #[test]
    fn test_bundle_rejects_malformed_regression() {
        let schema = FeatureSchema::builtin(SchemaId::LifestyleV1);
        let mut classifier = stress_classifier(&schema);
        classifier.coef[1].truncate(3);

        let err = ModelBundle::new(schema, Box::new(classifier), None).unwrap_err();
        assert!(matches!(err, PredictError::InvalidArtifact(_)));
    }

    #[test]
    fn test_bundle_keeps_mismatched_scaler() {
        let schema = FeatureSchema::builtin(SchemaId::LifestyleV1);
        let classifier = stress_classifier(&schema);
        let scaler = Scaler::Standard {
            feature_names: None,
            mean: vec![0.0; 7],
            scale: vec![1.0; 7],
        };

        let bundle = ModelBundle::new(schema, Box::new(classifier), Some(scaler)).unwrap();
        assert_eq!(bundle.scaler().unwrap().n_features(), 7);
    }

    #[test]
    fn test_load_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let schema = FeatureSchema::builtin(SchemaId::LifestyleV1);
        let artifact = crate::model::ClassifierArtifact::LogisticRegression(stress_classifier(&schema));
        fs::write(dir.path().join("model.json"), serde_json::to_string(&artifact).unwrap()).unwrap();
        fs::write(
            dir.path().join("scaler.json"),
            r#"{ "kind": "standard", "mean": [0,0,0,0,0,0,0,0,0,0,0,0], "scale": [1,1,1,1,1,1,1,1,1,1,1,1] }"#,
        )
        .unwrap();

        let config = PredictorConfig::new(
            crate::config::SchemaSource::Builtin(SchemaId::LifestyleV1),
            dir.path().join("model.json"),
        )
        .with_scaler(dir.path().join("scaler.json"));

        let bundle = ModelBundle::load(&config).unwrap();
        assert_eq!(bundle.schema().id, "lifestyle.v1");
        assert_eq!(bundle.scaler().unwrap().n_features(), 12);
    }

    #[test]
    fn test_load_missing_artifact_is_fatal() {
        let config = PredictorConfig::new(
            crate::config::SchemaSource::Builtin(SchemaId::LifestyleV1),
            "/nonexistent/model.json",
        );

        let err = ModelBundle::load(&config).unwrap_err();
        assert!(matches!(err, PredictError::ArtifactLoad { .. }));
    }
}
