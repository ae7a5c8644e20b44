//! Random forest classifier
//!
//! Trees use the flat node layout of fitted tree ensembles: parallel arrays
//! indexed by node id, `-1` children marking leaves, and per-node class
//! distributions in `value`.

use super::{argmax, check_row, Classifier};
use crate::error::PredictError;
use serde::{Deserialize, Serialize};

const LEAF: i64 = -1;

/// Single fitted decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Class counts (or fractions) per node
    pub value: Vec<Vec<f64>>,
}

impl DecisionTree {
    fn node_count(&self) -> usize {
        self.children_left.len()
    }

    fn is_leaf(&self, node: usize) -> bool {
        self.children_left[node] == LEAF
    }

    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), PredictError> {
        let nodes = self.node_count();
        if nodes == 0 {
            return Err(PredictError::InvalidArtifact("tree has no nodes".to_string()));
        }
        if self.children_right.len() != nodes
            || self.feature.len() != nodes
            || self.threshold.len() != nodes
            || self.value.len() != nodes
        {
            return Err(PredictError::InvalidArtifact(
                "tree node arrays differ in length".to_string(),
            ));
        }

        for node in 0..nodes {
            if self.value[node].len() != n_classes {
                return Err(PredictError::InvalidArtifact(format!(
                    "node {node} has {} class values, expected {n_classes}",
                    self.value[node].len()
                )));
            }

            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == LEAF && right == LEAF {
                continue;
            }
            // Children always follow their parent, so traversal terminates
            let in_range = |child: i64| child > node as i64 && (child as usize) < nodes;
            if !in_range(left) || !in_range(right) {
                return Err(PredictError::InvalidArtifact(format!(
                    "node {node} has invalid children ({left}, {right})"
                )));
            }
            let feature = self.feature[node];
            if feature < 0 || feature as usize >= n_features {
                return Err(PredictError::InvalidArtifact(format!(
                    "node {node} splits on feature {feature} of {n_features}"
                )));
            }
        }

        Ok(())
    }

    /// Class distribution of the leaf reached by `features`, normalized to sum to 1
    pub fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        let mut node = 0;
        while !self.is_leaf(node) {
            let feature = self.feature[node] as usize;
            node = if features[feature] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }

        let counts = &self.value[node];
        let total: f64 = counts.iter().sum();
        if total > 0.0 {
            counts.iter().map(|c| c / total).collect()
        } else {
            vec![1.0 / counts.len() as f64; counts.len()]
        }
    }
}

/// Forest of decision trees; predicts the class with the highest mean
/// leaf probability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    /// Class code for each probability column
    pub classes: Vec<i64>,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Mean class distribution over all trees
    pub fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, PredictError> {
        check_row(self.n_features, features)?;

        let mut totals = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (total, p) in totals.iter_mut().zip(tree.predict_proba(features)) {
                *total += p;
            }
        }

        let n_trees = self.trees.len() as f64;
        Ok(totals.into_iter().map(|t| t / n_trees).collect())
    }
}

impl Classifier for RandomForest {
    /// Structural checks: array shapes, child indices, class widths
    fn validate(&self) -> Result<(), PredictError> {
        if self.trees.is_empty() {
            return Err(PredictError::InvalidArtifact("forest has no trees".to_string()));
        }
        if self.classes.is_empty() {
            return Err(PredictError::InvalidArtifact("forest has no classes".to_string()));
        }
        if let Some(names) = &self.feature_names {
            if names.len() != self.n_features {
                return Err(PredictError::InvalidArtifact(format!(
                    "forest has {} feature names for {} features",
                    names.len(),
                    self.n_features
                )));
            }
        }
        for tree in &self.trees {
            tree.validate(self.n_features, self.classes.len())?;
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
        let proba = self.predict_proba(features)?;
        let index = argmax(&proba)
            .ok_or_else(|| PredictError::InvalidArtifact("forest has no classes".to_string()))?;
        Ok(self.classes[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Splits on feature 0 at 5.0: left leaf favours class 0, right leaf class 2
    fn stump(threshold: f64) -> DecisionTree {
        DecisionTree {
            children_left: vec![1, LEAF, LEAF],
            children_right: vec![2, LEAF, LEAF],
            feature: vec![0, -2, -2],
            threshold: vec![threshold, -2.0, -2.0],
            value: vec![
                vec![10.0, 10.0, 10.0],
                vec![8.0, 2.0, 0.0],
                vec![0.0, 3.0, 7.0],
            ],
        }
    }

    fn forest(trees: Vec<DecisionTree>) -> RandomForest {
        RandomForest {
            n_features: 2,
            feature_names: None,
            classes: vec![0, 1, 2],
            trees,
        }
    }

    #[test]
    fn test_tree_traversal() {
        let tree = stump(5.0);

        assert_eq!(tree.predict_proba(&[5.0, 0.0]), vec![0.8, 0.2, 0.0]);
        assert_eq!(tree.predict_proba(&[5.1, 0.0]), vec![0.0, 0.3, 0.7]);
    }

    #[test]
    fn test_forest_averages_trees() {
        let model = forest(vec![stump(5.0), stump(10.0)]);
        model.validate().unwrap();

        // Between thresholds: first tree right leaf, second tree left leaf
        let proba = model.predict_proba(&[7.0, 0.0]).unwrap();
        assert!((proba[0] - 0.4).abs() < 1e-12);
        assert!((proba[1] - 0.25).abs() < 1e-12);
        assert!((proba[2] - 0.35).abs() < 1e-12);

        assert_eq!(model.predict(&[7.0, 0.0]).unwrap(), 0);
        assert_eq!(model.predict(&[1.0, 0.0]).unwrap(), 0);
        assert_eq!(model.predict(&[20.0, 0.0]).unwrap(), 2);
    }

    #[test]
    fn test_forest_maps_class_codes() {
        let mut model = forest(vec![stump(5.0)]);
        model.classes = vec![3, 4, 9];

        assert_eq!(model.predict(&[9.0, 0.0]).unwrap(), 9);
    }

    #[test]
    fn test_forest_rejects_wrong_row_length() {
        let model = forest(vec![stump(5.0)]);
        assert!(model.predict(&[1.0]).is_err());
    }

    #[test]
    fn test_validate_rejects_backward_child() {
        let mut tree = stump(5.0);
        tree.children_left[0] = 0;

        let model = forest(vec![tree]);
        assert!(matches!(
            model.validate(),
            Err(PredictError::InvalidArtifact(_))
        ));
    }

    #[test]
    fn test_validate_rejects_feature_out_of_range() {
        let mut tree = stump(5.0);
        tree.feature[0] = 2;

        assert!(forest(vec![tree]).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_class_width() {
        let mut tree = stump(5.0);
        tree.value[1] = vec![1.0, 1.0];

        assert!(forest(vec![tree]).validate().is_err());
    }
}
