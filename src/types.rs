//! Core types for the Sleep Quality pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: raw inputs, the assembled feature vector, and the prediction output.

use crate::error::PredictError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single caller-supplied attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Number(f64),
    Text(String),
}

impl AttributeValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            AttributeValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Number(_) => None,
            AttributeValue::Text(s) => Some(s.as_str()),
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<u32> for AttributeValue {
    fn from(value: u32) -> Self {
        AttributeValue::Number(f64::from(value))
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Number(n) => write!(f, "{n}"),
            AttributeValue::Text(s) => f.write_str(s),
        }
    }
}

/// Raw lifestyle attributes for a single prediction request.
///
/// Keys are schema attribute names (e.g. `screen_time`, `gender`). The record is
/// ephemeral: created per request and dropped once a label is produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawInputs {
    values: BTreeMap<String, AttributeValue>,
}

impl RawInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.values.get(name)
    }

    /// Look up a numeric attribute
    pub fn number(&self, name: &str) -> Result<f64, PredictError> {
        match self.values.get(name) {
            Some(AttributeValue::Number(n)) => Ok(*n),
            Some(AttributeValue::Text(s)) => Err(PredictError::InvalidAttribute {
                attribute: name.to_string(),
                reason: format!("expected a number, got text {s:?}"),
            }),
            None => Err(PredictError::MissingAttribute(name.to_string())),
        }
    }

    /// Look up a categorical (text) attribute
    pub fn text(&self, name: &str) -> Result<&str, PredictError> {
        match self.values.get(name) {
            Some(AttributeValue::Text(s)) => Ok(s.as_str()),
            Some(AttributeValue::Number(n)) => Err(PredictError::InvalidAttribute {
                attribute: name.to_string(),
                reason: format!("expected a category name, got number {n}"),
            }),
            None => Err(PredictError::MissingAttribute(name.to_string())),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parse a flat JSON object of attributes
    pub fn from_json(json: &str) -> Result<Self, PredictError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Fixed-order feature vector consumed by the scaler and classifier.
///
/// Column names travel with the values so order mismatches against a fitted
/// artifact can be detected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            names: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    /// Append a column
    pub fn push(&mut self, name: impl Into<String>, value: f64) {
        self.names.push(name.into());
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get a column value by name
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|i| self.values.get(i).copied())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// Same columns, new values. Caller guarantees the length matches.
    pub(crate) fn with_values(&self, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), self.names.len());
        Self {
            names: self.names.clone(),
            values,
        }
    }

    /// Name → value map, in column order, for logging and output
    pub fn to_json_map(&self) -> serde_json::Map<String, serde_json::Value> {
        self.iter()
            .map(|(name, value)| (name.to_string(), serde_json::Value::from(value)))
            .collect()
    }
}

/// Sleep quality category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredictionLabel {
    Good,
    Moderate,
    Average,
    Poor,
    Unknown,
}

impl PredictionLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionLabel::Good => "Good",
            PredictionLabel::Moderate => "Moderate",
            PredictionLabel::Average => "Average",
            PredictionLabel::Poor => "Poor",
            PredictionLabel::Unknown => "Unknown",
        }
    }

    /// Short advisory sentence shown next to the label
    pub fn advisory(&self) -> &'static str {
        match self {
            PredictionLabel::Good => {
                "Your routine supports restful sleep. Keep it up."
            }
            PredictionLabel::Moderate | PredictionLabel::Average => {
                "Your sleep could improve. Try cutting evening screen time and caffeine."
            }
            PredictionLabel::Poor => {
                "Your habits may be disrupting sleep. Consider more activity and less caffeine."
            }
            PredictionLabel::Unknown => "The model returned an unrecognized result.",
        }
    }
}

impl fmt::Display for PredictionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: PredictionLabel,
    /// Raw class code emitted by the classifier
    pub class_code: i64,
    /// Whether the classifier received the scaled vector
    pub scaled: bool,
    /// Schema the features were assembled with
    pub schema: String,
    /// Unscaled feature vector
    pub features: FeatureVector,
}
