//! Pre-trained classifiers
//!
//! This module provides the classifier seam and the JSON artifact formats
//! loaded at process start. Classifiers are read-only after loading.

mod forest;
mod linear;

pub use forest::{DecisionTree, RandomForest};
pub use linear::LogisticRegression;

use crate::error::PredictError;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::fs;
use std::path::Path;

/// Trait for pre-trained classifiers
pub trait Classifier: Send + Sync + Debug {
    /// Number of features the classifier was fit on
    fn n_features(&self) -> usize;

    /// Column names the classifier was fit on, when the artifact records them
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Check the model is internally consistent, so `predict` cannot index
    /// out of bounds or loop on a well-formed row
    fn validate(&self) -> Result<(), PredictError> {
        Ok(())
    }

    /// Predict an integer class code for one feature row
    fn predict(&self, features: &[f64]) -> Result<i64, PredictError>;
}

/// Serialized classifier artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierArtifact {
    RandomForest(RandomForest),
    LogisticRegression(LogisticRegression),
}

impl ClassifierArtifact {
    /// Parse and validate an artifact
    pub fn from_json(json: &str) -> Result<Self, PredictError> {
        let artifact: ClassifierArtifact = serde_json::from_str(json)?;
        match &artifact {
            ClassifierArtifact::RandomForest(model) => model.validate()?,
            ClassifierArtifact::LogisticRegression(model) => model.validate()?,
        }
        Ok(artifact)
    }

    pub fn into_classifier(self) -> Box<dyn Classifier> {
        match self {
            ClassifierArtifact::RandomForest(model) => Box::new(model),
            ClassifierArtifact::LogisticRegression(model) => Box::new(model),
        }
    }
}

/// Load a classifier artifact from disk
pub fn load_classifier(path: &Path) -> Result<Box<dyn Classifier>, PredictError> {
    log::info!("Loading classifier from {}", path.display());

    let json = fs::read_to_string(path).map_err(|e| PredictError::artifact_load(path, e))?;
    let artifact =
        ClassifierArtifact::from_json(&json).map_err(|e| PredictError::artifact_load(path, e))?;

    Ok(artifact.into_classifier())
}

/// Shared row-length check for classifier implementations
pub(crate) fn check_row(expected: usize, features: &[f64]) -> Result<(), PredictError> {
    if features.len() != expected {
        return Err(PredictError::SchemaMismatch(format!(
            "classifier expects {expected} features, got {}",
            features.len()
        )));
    }
    Ok(())
}

/// Index of the largest value; the first one wins ties
pub(crate) fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in values.iter().copied().enumerate() {
        match best {
            Some((_, current)) if v <= current => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const LINEAR_JSON: &str = r#"{
        "kind": "logistic_regression",
        "n_features": 2,
        "classes": [0, 1, 2],
        "coef": [[1.0, 0.0], [0.0, 1.0], [-1.0, -1.0]],
        "intercept": [0.0, 0.0, 0.0]
    }"#;

    #[test]
    fn test_argmax_first_wins() {
        assert_eq!(argmax(&[0.2, 0.5, 0.5]), Some(1));
        assert_eq!(argmax(&[3.0]), Some(0));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_artifact_dispatch() {
        let classifier = ClassifierArtifact::from_json(LINEAR_JSON)
            .unwrap()
            .into_classifier();

        assert_eq!(classifier.n_features(), 2);
        assert_eq!(classifier.predict(&[2.0, 1.0]).unwrap(), 0);
        assert_eq!(classifier.predict(&[1.0, 2.0]).unwrap(), 1);
        assert_eq!(classifier.predict(&[-3.0, -3.0]).unwrap(), 2);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let err = ClassifierArtifact::from_json(r#"{ "kind": "svm" }"#).unwrap_err();
        assert!(matches!(err, PredictError::JsonError(_)));
    }

    #[test]
    fn test_load_classifier_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(LINEAR_JSON.as_bytes()).unwrap();

        let classifier = load_classifier(file.path()).unwrap();
        assert_eq!(classifier.n_features(), 2);
    }

    #[test]
    fn test_load_classifier_corrupt_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\x80\x04\x95pickle").unwrap();

        let err = load_classifier(file.path()).unwrap_err();
        assert!(matches!(err, PredictError::ArtifactLoad { .. }));
    }

    #[test]
    fn test_load_classifier_missing_file() {
        let err = load_classifier(Path::new("/nonexistent/model.json")).unwrap_err();
        assert!(matches!(err, PredictError::ArtifactLoad { .. }));
    }
}
