//! Multinomial / binary logistic regression classifier

use super::{argmax, check_row, Classifier};
use crate::error::PredictError;
use serde::{Deserialize, Serialize};

/// Linear classifier: one coefficient row per class, or a single row for
/// two classes (positive score selects the second class)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub n_features: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    pub classes: Vec<i64>,
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

impl LogisticRegression {
    fn is_binary(&self) -> bool {
        self.classes.len() == 2 && self.coef.len() == 1
    }

    /// Linear decision scores, one per coefficient row
    pub fn decision_function(&self, features: &[f64]) -> Result<Vec<f64>, PredictError> {
        check_row(self.n_features, features)?;

        Ok(self
            .coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, b)| row.iter().zip(features).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect())
    }
}

impl Classifier for LogisticRegression {
    /// Coefficient, intercept and class counts must agree
    fn validate(&self) -> Result<(), PredictError> {
        if self.classes.len() < 2 {
            return Err(PredictError::InvalidArtifact(
                "logistic regression needs at least two classes".to_string(),
            ));
        }
        if !self.is_binary() && self.coef.len() != self.classes.len() {
            return Err(PredictError::InvalidArtifact(format!(
                "{} coefficient rows for {} classes",
                self.coef.len(),
                self.classes.len()
            )));
        }
        if self.intercept.len() != self.coef.len() {
            return Err(PredictError::InvalidArtifact(format!(
                "{} intercepts for {} coefficient rows",
                self.intercept.len(),
                self.coef.len()
            )));
        }
        if self.coef.iter().any(|row| row.len() != self.n_features) {
            return Err(PredictError::InvalidArtifact(format!(
                "coefficient rows must have {} entries",
                self.n_features
            )));
        }
        if let Some(names) = &self.feature_names {
            if names.len() != self.n_features {
                return Err(PredictError::InvalidArtifact(format!(
                    "{} feature names for {} features",
                    names.len(),
                    self.n_features
                )));
            }
        }
        Ok(())
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict(&self, features: &[f64]) -> Result<i64, PredictError> {
        let scores = self.decision_function(features)?;

        let index = if self.is_binary() {
            usize::from(scores[0] > 0.0)
        } else {
            argmax(&scores).ok_or_else(|| {
                PredictError::InvalidArtifact("logistic regression has no classes".to_string())
            })?
        };

        Ok(self.classes[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_decision() {
        let model = LogisticRegression {
            n_features: 2,
            feature_names: None,
            classes: vec![0, 2],
            coef: vec![vec![1.0, -1.0]],
            intercept: vec![0.5],
        };
        model.validate().unwrap();

        assert_eq!(model.predict(&[1.0, 3.0]).unwrap(), 0);
        assert_eq!(model.predict(&[3.0, 1.0]).unwrap(), 2);
    }

    #[test]
    fn test_multiclass_decision() {
        let model = LogisticRegression {
            n_features: 1,
            feature_names: None,
            classes: vec![0, 1, 2],
            coef: vec![vec![-1.0], vec![0.0], vec![1.0]],
            intercept: vec![0.0, 0.5, 0.0],
        };

        assert_eq!(model.decision_function(&[2.0]).unwrap(), vec![-2.0, 0.5, 2.0]);
        assert_eq!(model.predict(&[2.0]).unwrap(), 2);
        assert_eq!(model.predict(&[0.0]).unwrap(), 1);
        assert_eq!(model.predict(&[-2.0]).unwrap(), 0);
    }

    #[test]
    fn test_validate_shapes() {
        let mut model = LogisticRegression {
            n_features: 2,
            feature_names: Some(vec!["a".to_string(), "b".to_string()]),
            classes: vec![0, 1, 2],
            coef: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            intercept: vec![0.0, 0.0],
        };
        assert!(model.validate().is_err());

        model.coef.push(vec![1.0]);
        model.intercept.push(0.0);
        assert!(model.validate().is_err());

        model.coef[2] = vec![1.0, 1.0];
        assert!(model.validate().is_ok());
    }
}
