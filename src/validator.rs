//! Input boundary validation
//!
//! Checks caller-supplied attributes against the schema before the pipeline
//! runs: every declared attribute present, numbers finite and inside their
//! documented bounds, categories present in their tables.

use crate::error::PredictError;
use crate::schema::{AttributeKind, FeatureSchema};
use crate::types::RawInputs;

/// Validation issue for one attribute
#[derive(Debug)]
pub struct ValidationIssue {
    pub attribute: String,
    pub error: PredictError,
}

/// Boundary validator for raw inputs
pub struct InputValidator;

impl InputValidator {
    /// Fail on the first invalid attribute
    pub fn validate(schema: &FeatureSchema, raw: &RawInputs) -> Result<(), PredictError> {
        match Self::check(schema, raw).into_iter().next() {
            Some(issue) => Err(issue.error),
            None => Ok(()),
        }
    }

    /// Collect every invalid attribute, in schema declaration order
    pub fn check(schema: &FeatureSchema, raw: &RawInputs) -> Vec<ValidationIssue> {
        schema
            .attributes
            .iter()
            .filter_map(|spec| {
                check_attribute(schema, &spec.name, &spec.kind, raw)
                    .err()
                    .map(|error| ValidationIssue {
                        attribute: spec.name.clone(),
                        error,
                    })
            })
            .collect()
    }
}

fn check_attribute(
    schema: &FeatureSchema,
    name: &str,
    kind: &AttributeKind,
    raw: &RawInputs,
) -> Result<(), PredictError> {
    match kind {
        AttributeKind::Numeric { min, max } => {
            let value = raw.number(name)?;
            if !value.is_finite() {
                return Err(PredictError::InvalidAttribute {
                    attribute: name.to_string(),
                    reason: "value must be finite".to_string(),
                });
            }

            let lo = min.unwrap_or(f64::NEG_INFINITY);
            let hi = max.unwrap_or(f64::INFINITY);
            if value < lo || value > hi {
                return Err(PredictError::OutOfRange {
                    attribute: name.to_string(),
                    value,
                    min: lo,
                    max: hi,
                });
            }
            Ok(())
        }
        AttributeKind::Categorical { table } => {
            let value = raw.text(name)?;
            let known = schema
                .table(table)
                .map(|t| t.code(value).is_some())
                .unwrap_or(false);
            if known {
                Ok(())
            } else {
                Err(PredictError::UnrecognizedCategory {
                    attribute: name.to_string(),
                    value: value.to_string(),
                })
            }
        }
    }
}
