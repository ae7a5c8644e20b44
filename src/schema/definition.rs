//! Feature schema definition
//!
//! A feature schema declares everything one model version was fit with:
//! - Input attributes and their documented bounds
//! - Category tables (name → integer code)
//! - Ordered output columns and how each is computed
//! - Class code → label mapping

use crate::error::PredictError;
use crate::types::PredictionLabel;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Identifier of a built-in schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaId {
    #[serde(rename = "lifestyle.v1")]
    LifestyleV1,
    #[serde(rename = "lifestyle.v2")]
    LifestyleV2,
    #[serde(rename = "health.v1")]
    HealthV1,
}

impl SchemaId {
    pub const ALL: [SchemaId; 3] = [SchemaId::LifestyleV1, SchemaId::LifestyleV2, SchemaId::HealthV1];

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaId::LifestyleV1 => "lifestyle.v1",
            SchemaId::LifestyleV2 => "lifestyle.v2",
            SchemaId::HealthV1 => "health.v1",
        }
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaId {
    type Err = PredictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SchemaId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| PredictError::InvalidConfig(format!("Unknown schema: {s}")))
    }
}

/// How an input attribute is typed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttributeKind {
    /// Number with optional inclusive bounds
    Numeric {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    /// Name drawn from a category table
    Categorical { table: String },
}

/// Input attribute declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSpec {
    pub name: String,
    #[serde(flatten)]
    pub kind: AttributeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Static name → code table. Codes are the value positions, so the mapping is a
/// bijection onto `0..len`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTable {
    pub name: String,
    pub values: Vec<String>,
}

impl CategoryTable {
    pub fn code(&self, value: &str) -> Option<usize> {
        self.values.iter().position(|v| v == value)
    }

    pub fn name_of(&self, code: usize) -> Option<&str> {
        self.values.get(code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One additive term of a linear estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Term {
    /// `attribute * factor`
    Scaled { attribute: String, factor: f64 },
    /// `attribute / divisor`
    Divided { attribute: String, divisor: f64 },
}

impl Term {
    pub fn attribute(&self) -> &str {
        match self {
            Term::Scaled { attribute, .. } | Term::Divided { attribute, .. } => attribute,
        }
    }
}

/// Clamped linear formula over raw attributes.
///
/// Terms are added to the intercept left to right; negative factors and
/// divisors express subtraction, which keeps results bit-identical to the
/// `a - x*k` form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearEstimate {
    pub intercept: f64,
    pub terms: Vec<Term>,
    pub min: f64,
    pub max: f64,
}

/// How a column value is produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnSource {
    /// Numeric attribute copied as-is
    Raw { attribute: String },
    /// Categorical attribute replaced by its table code
    Encoded { attribute: String },
    /// Clamped linear estimate over other attributes
    Estimate { estimate: LinearEstimate },
    /// Ordinal bucket: index of the first upper bound the value does not
    /// exceed, or `upper_bounds.len()` above all of them
    Bucket {
        attribute: String,
        upper_bounds: Vec<f64>,
    },
    /// 1 when the attribute is strictly above the threshold, else 0
    Flag { attribute: String, above: f64 },
}

impl ColumnSource {
    /// Attributes this column reads
    pub fn attributes(&self) -> Vec<&str> {
        match self {
            ColumnSource::Raw { attribute }
            | ColumnSource::Encoded { attribute }
            | ColumnSource::Bucket { attribute, .. }
            | ColumnSource::Flag { attribute, .. } => vec![attribute.as_str()],
            ColumnSource::Estimate { estimate } => {
                estimate.terms.iter().map(Term::attribute).collect()
            }
        }
    }
}

/// Output column in fit order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(flatten)]
    pub source: ColumnSource,
}

/// Class code → label entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelEntry {
    pub code: i64,
    pub label: PredictionLabel,
}

/// Declared feature schema for one model version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub attributes: Vec<AttributeSpec>,
    #[serde(default)]
    pub tables: Vec<CategoryTable>,
    pub columns: Vec<Column>,
    pub labels: Vec<LabelEntry>,
}

impl FeatureSchema {
    /// Parse and validate a custom schema
    pub fn from_json(json: &str) -> Result<Self, PredictError> {
        let schema: FeatureSchema = serde_json::from_str(json)?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn to_json(&self) -> Result<String, PredictError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Column names in fit order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn table(&self, name: &str) -> Option<&CategoryTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Category table backing a categorical attribute
    pub fn table_for(&self, attribute: &str) -> Option<&CategoryTable> {
        match &self.attribute(attribute)?.kind {
            AttributeKind::Categorical { table } => self.table(table),
            AttributeKind::Numeric { .. } => None,
        }
    }

    /// Label for a classifier output; codes outside the table are `Unknown`
    pub fn label_for(&self, code: i64) -> PredictionLabel {
        self.labels
            .iter()
            .find(|entry| entry.code == code)
            .map(|entry| entry.label)
            .unwrap_or(PredictionLabel::Unknown)
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<(), PredictError> {
        let fail = |msg: String| Err(PredictError::SchemaMismatch(format!("{}: {msg}", self.id)));

        if self.columns.is_empty() {
            return fail("schema declares no columns".to_string());
        }

        let mut seen = HashSet::new();
        for attr in &self.attributes {
            if !seen.insert(attr.name.as_str()) {
                return fail(format!("duplicate attribute {}", attr.name));
            }
            match &attr.kind {
                AttributeKind::Categorical { table } => match self.table(table) {
                    Some(t) if !t.is_empty() => {}
                    Some(_) => return fail(format!("category table {table} is empty")),
                    None => return fail(format!("attribute {} uses unknown table {table}", attr.name)),
                },
                AttributeKind::Numeric {
                    min: Some(min),
                    max: Some(max),
                } if min > max => {
                    return fail(format!("attribute {} has min > max", attr.name));
                }
                AttributeKind::Numeric { .. } => {}
            }
        }

        for table in &self.tables {
            let unique: HashSet<&str> = table.values.iter().map(String::as_str).collect();
            if unique.len() != table.values.len() {
                return fail(format!("category table {} has duplicate values", table.name));
            }
        }

        let mut names = HashSet::new();
        for column in &self.columns {
            if !names.insert(column.name.as_str()) {
                return fail(format!("duplicate column {}", column.name));
            }

            for attribute in column.source.attributes() {
                let Some(spec) = self.attribute(attribute) else {
                    return fail(format!(
                        "column {} reads undeclared attribute {attribute}",
                        column.name
                    ));
                };
                let categorical = matches!(spec.kind, AttributeKind::Categorical { .. });
                let wants_category = matches!(column.source, ColumnSource::Encoded { .. });
                if categorical != wants_category {
                    return fail(format!(
                        "column {} reads attribute {attribute} with the wrong kind",
                        column.name
                    ));
                }
            }

            match &column.source {
                ColumnSource::Bucket { upper_bounds, .. } => {
                    if upper_bounds.windows(2).any(|w| w[0] >= w[1]) {
                        return fail(format!("column {} bucket bounds not ascending", column.name));
                    }
                }
                ColumnSource::Estimate { estimate } => {
                    if estimate.min > estimate.max {
                        return fail(format!("column {} clamp min > max", column.name));
                    }
                    let zero_divisor = estimate
                        .terms
                        .iter()
                        .any(|t| matches!(t, Term::Divided { divisor, .. } if *divisor == 0.0));
                    if zero_divisor {
                        return fail(format!("column {} divides by zero", column.name));
                    }
                }
                _ => {}
            }
        }

        let mut codes = HashSet::new();
        for entry in &self.labels {
            if !codes.insert(entry.code) {
                return fail(format!("duplicate label code {}", entry.code));
            }
        }

        Ok(())
    }
}
