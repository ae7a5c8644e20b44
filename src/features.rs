//! Feature derivation
//!
//! This module computes column values from raw attributes:
//! - Clamped linear estimates (estimated sleep hours)
//! - Ordinal buckets over fixed thresholds
//! - Boolean flags encoded as 0/1
//! - Category codes from the schema's tables

use crate::error::PredictError;
use crate::schema::{ColumnSource, FeatureSchema, LinearEstimate, Term};
use crate::types::RawInputs;

/// Feature deriver for computing column values
pub struct FeatureDeriver;

impl FeatureDeriver {
    /// Compute the value of one column
    pub fn derive(
        schema: &FeatureSchema,
        source: &ColumnSource,
        raw: &RawInputs,
    ) -> Result<f64, PredictError> {
        match source {
            ColumnSource::Raw { attribute } => raw.number(attribute),
            ColumnSource::Encoded { attribute } => {
                encode_category(schema, attribute, raw).map(|code| code as f64)
            }
            ColumnSource::Estimate { estimate } => evaluate_estimate(estimate, raw),
            ColumnSource::Bucket {
                attribute,
                upper_bounds,
            } => Ok(bucket(raw.number(attribute)?, upper_bounds) as f64),
            ColumnSource::Flag { attribute, above } => {
                Ok(f64::from(flag(raw.number(attribute)?, *above)))
            }
        }
    }
}

/// Evaluate a clamped linear estimate, folding terms left to right
pub fn evaluate_estimate(estimate: &LinearEstimate, raw: &RawInputs) -> Result<f64, PredictError> {
    let mut total = estimate.intercept;
    for term in &estimate.terms {
        total += match term {
            Term::Scaled { attribute, factor } => raw.number(attribute)? * factor,
            Term::Divided { attribute, divisor } => raw.number(attribute)? / divisor,
        };
    }
    Ok(total.clamp(estimate.min, estimate.max))
}

/// Ordinal bucket with upper-inclusive bounds
pub fn bucket(value: f64, upper_bounds: &[f64]) -> usize {
    upper_bounds
        .iter()
        .position(|bound| value <= *bound)
        .unwrap_or(upper_bounds.len())
}

/// 1 when strictly above the threshold
pub fn flag(value: f64, above: f64) -> u8 {
    u8::from(value > above)
}

/// Look up the table code of a categorical attribute
pub fn encode_category(
    schema: &FeatureSchema,
    attribute: &str,
    raw: &RawInputs,
) -> Result<usize, PredictError> {
    let value = raw.text(attribute)?;
    let table = schema
        .table_for(attribute)
        .ok_or_else(|| PredictError::SchemaMismatch(format!("no category table for {attribute}")))?;

    table
        .code(value)
        .ok_or_else(|| PredictError::UnrecognizedCategory {
            attribute: attribute.to_string(),
            value: value.to_string(),
        })
}
