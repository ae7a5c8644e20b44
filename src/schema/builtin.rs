//! Built-in feature schemas
//!
//! - `lifestyle.v1`: lifestyle survey model, labels Good / Moderate / Poor
//! - `lifestyle.v2`: same columns, labels Good / Average / Poor
//! - `health.v1`: occupational health survey model, labels Good / Average / Poor

use super::definition::{
    AttributeKind, AttributeSpec, CategoryTable, Column, ColumnSource, FeatureSchema, LabelEntry,
    LinearEstimate, SchemaId, Term,
};
use crate::types::PredictionLabel;

/// Caffeine buckets: ≤50 mg, ≤150 mg, above
pub const CAFFEINE_BUCKETS: [f64; 2] = [50.0, 150.0];

/// Stress buckets: ≤4, ≤7, above
pub const STRESS_BUCKETS: [f64; 2] = [4.0, 7.0];

/// Exercise minutes above which a person counts as active
pub const ACTIVE_MINUTES: f64 = 60.0;

/// Ambient noise (dB) above which a bedroom counts as noisy
pub const HIGH_NOISE_DB: f64 = 40.0;

pub const GENDERS: [&str; 2] = ["Female", "Male"];

pub const OCCUPATIONS: [&str; 11] = [
    "Accountant",
    "Doctor",
    "Engineer",
    "Lawyer",
    "Manager",
    "Nurse",
    "Sales Representative",
    "Salesperson",
    "Scientist",
    "Software Engineer",
    "Teacher",
];

pub const BMI_CATEGORIES: [&str; 4] = ["Normal", "Normal Weight", "Obese", "Overweight"];

pub const SLEEP_DISORDERS: [&str; 3] = ["Insomnia", "None", "Sleep Apnea"];

/// Heuristic nightly sleep estimate:
/// `clamp(8 - 0.2*screen_time - 0.1*stress + exercise/100 - caffeine/500, 3, 10)`
pub fn sleep_hours_estimate() -> LinearEstimate {
    LinearEstimate {
        intercept: 8.0,
        terms: vec![
            Term::Scaled {
                attribute: "screen_time".to_string(),
                factor: -0.2,
            },
            Term::Scaled {
                attribute: "stress".to_string(),
                factor: -0.1,
            },
            Term::Divided {
                attribute: "exercise".to_string(),
                divisor: 100.0,
            },
            Term::Divided {
                attribute: "caffeine".to_string(),
                divisor: -500.0,
            },
        ],
        min: 3.0,
        max: 10.0,
    }
}

impl FeatureSchema {
    /// Built-in schema by id
    pub fn builtin(id: SchemaId) -> FeatureSchema {
        match id {
            SchemaId::LifestyleV1 => lifestyle(id, PredictionLabel::Moderate),
            SchemaId::LifestyleV2 => lifestyle(id, PredictionLabel::Average),
            SchemaId::HealthV1 => health(),
        }
    }
}

fn numeric(name: &str, min: f64, max: f64, description: &str) -> AttributeSpec {
    AttributeSpec {
        name: name.to_string(),
        kind: AttributeKind::Numeric {
            min: Some(min),
            max: Some(max),
        },
        description: Some(description.to_string()),
    }
}

fn categorical(name: &str, description: &str) -> AttributeSpec {
    AttributeSpec {
        name: name.to_string(),
        kind: AttributeKind::Categorical {
            table: name.to_string(),
        },
        description: Some(description.to_string()),
    }
}

fn table(name: &str, values: &[&str]) -> CategoryTable {
    CategoryTable {
        name: name.to_string(),
        values: values.iter().map(|v| v.to_string()).collect(),
    }
}

fn column(name: &str, source: ColumnSource) -> Column {
    Column {
        name: name.to_string(),
        source,
    }
}

fn raw(attribute: &str) -> ColumnSource {
    ColumnSource::Raw {
        attribute: attribute.to_string(),
    }
}

fn encoded(attribute: &str) -> ColumnSource {
    ColumnSource::Encoded {
        attribute: attribute.to_string(),
    }
}

fn bucket(attribute: &str, upper_bounds: &[f64]) -> ColumnSource {
    ColumnSource::Bucket {
        attribute: attribute.to_string(),
        upper_bounds: upper_bounds.to_vec(),
    }
}

fn flag(attribute: &str, above: f64) -> ColumnSource {
    ColumnSource::Flag {
        attribute: attribute.to_string(),
        above,
    }
}

fn labels(middle: PredictionLabel) -> Vec<LabelEntry> {
    vec![
        LabelEntry {
            code: 0,
            label: PredictionLabel::Good,
        },
        LabelEntry {
            code: 1,
            label: middle,
        },
        LabelEntry {
            code: 2,
            label: PredictionLabel::Poor,
        },
    ]
}

fn lifestyle(id: SchemaId, middle: PredictionLabel) -> FeatureSchema {
    FeatureSchema {
        id: id.as_str().to_string(),
        description: "Lifestyle survey: screen time, exercise, stress, caffeine, noise".to_string(),
        attributes: vec![
            numeric("age", 18.0, 70.0, "Age in years"),
            categorical("gender", "Gender"),
            numeric("screen_time", 0.5, 6.0, "Daily screen time (hours)"),
            numeric("exercise", 0.0, 120.0, "Exercise per day (minutes)"),
            numeric("stress", 1.0, 10.0, "Stress level (1-10)"),
            numeric("caffeine", 0.0, 250.0, "Caffeine intake (mg/day)"),
            numeric("noise", 20.0, 60.0, "Bedroom noise level (dB)"),
        ],
        tables: vec![table("gender", &GENDERS)],
        columns: vec![
            column("Age", raw("age")),
            column("Gender", encoded("gender")),
            column("ScreenTime", raw("screen_time")),
            column("Exercise", raw("exercise")),
            column("Stress", raw("stress")),
            column("Caffeine", raw("caffeine")),
            column("Noise", raw("noise")),
            column(
                "SleepHours",
                ColumnSource::Estimate {
                    estimate: sleep_hours_estimate(),
                },
            ),
            column("CaffeineCategory", bucket("caffeine", &CAFFEINE_BUCKETS)),
            column("StressLevel", bucket("stress", &STRESS_BUCKETS)),
            column("Active", flag("exercise", ACTIVE_MINUTES)),
            column("NoiseLevel", flag("noise", HIGH_NOISE_DB)),
        ],
        labels: labels(middle),
    }
}

fn health() -> FeatureSchema {
    FeatureSchema {
        id: SchemaId::HealthV1.as_str().to_string(),
        description: "Occupational health survey: activity, BMI, heart rate, blood pressure"
            .to_string(),
        attributes: vec![
            categorical("gender", "Gender"),
            numeric("age", 18.0, 70.0, "Age in years"),
            categorical("occupation", "Occupation"),
            numeric("activity_minutes", 0.0, 120.0, "Physical activity per day (minutes)"),
            categorical("bmi_category", "BMI category"),
            numeric("heart_rate", 50.0, 110.0, "Resting heart rate (bpm)"),
            numeric("daily_steps", 0.0, 30000.0, "Daily steps"),
            categorical("sleep_disorder", "Diagnosed sleep disorder"),
            numeric("systolic", 80.0, 200.0, "Systolic blood pressure (mmHg)"),
            numeric("diastolic", 50.0, 130.0, "Diastolic blood pressure (mmHg)"),
            numeric("caffeine", 0.0, 250.0, "Caffeine intake (mg/day)"),
            numeric("screen_time", 0.5, 6.0, "Daily screen time (hours)"),
        ],
        tables: vec![
            table("gender", &GENDERS),
            table("occupation", &OCCUPATIONS),
            table("bmi_category", &BMI_CATEGORIES),
            table("sleep_disorder", &SLEEP_DISORDERS),
        ],
        columns: vec![
            column("Gender", encoded("gender")),
            column("Age", raw("age")),
            column("Occupation", encoded("occupation")),
            column("PhysicalActivityLevel", raw("activity_minutes")),
            column("BMICategory", encoded("bmi_category")),
            column("HeartRate", raw("heart_rate")),
            column("DailySteps", raw("daily_steps")),
            column("SleepDisorder", encoded("sleep_disorder")),
            column("Systolic", raw("systolic")),
            column("Diastolic", raw("diastolic")),
            column("Caffeine", raw("caffeine")),
            column("ScreenTime", raw("screen_time")),
            column("CaffeineCategory", bucket("caffeine", &CAFFEINE_BUCKETS)),
            column("Active", flag("activity_minutes", ACTIVE_MINUTES)),
        ],
        labels: labels(PredictionLabel::Average),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_schemas_are_valid() {
        for id in SchemaId::ALL {
            let schema = FeatureSchema::builtin(id);
            assert_eq!(schema.id, id.as_str());
            schema.validate().unwrap();
        }
    }

    #[test]
    fn test_lifestyle_column_order() {
        let schema = FeatureSchema::builtin(SchemaId::LifestyleV1);

        assert_eq!(
            schema.column_names(),
            vec![
                "Age",
                "Gender",
                "ScreenTime",
                "Exercise",
                "Stress",
                "Caffeine",
                "Noise",
                "SleepHours",
                "CaffeineCategory",
                "StressLevel",
                "Active",
                "NoiseLevel",
            ]
        );
    }

    #[test]
    fn test_label_wording_per_schema() {
        let v1 = FeatureSchema::builtin(SchemaId::LifestyleV1);
        let v2 = FeatureSchema::builtin(SchemaId::LifestyleV2);
        let health = FeatureSchema::builtin(SchemaId::HealthV1);

        assert_eq!(v1.label_for(1), PredictionLabel::Moderate);
        assert_eq!(v2.label_for(1), PredictionLabel::Average);
        assert_eq!(health.label_for(1), PredictionLabel::Average);
        assert_eq!(v1.label_for(0), PredictionLabel::Good);
        assert_eq!(v1.label_for(2), PredictionLabel::Poor);
        assert_eq!(v1.label_for(3), PredictionLabel::Unknown);
        assert_eq!(v1.label_for(-1), PredictionLabel::Unknown);
    }

    #[test]
    fn test_category_tables_are_bijections() {
        let schema = FeatureSchema::builtin(SchemaId::HealthV1);

        for table in &schema.tables {
            for (expected, value) in table.values.iter().enumerate() {
                assert_eq!(table.code(value), Some(expected));
                assert_eq!(table.name_of(expected), Some(value.as_str()));
                // stable across repeated lookups
                assert_eq!(table.code(value), table.code(value));
            }
        }

        assert_eq!(schema.table_for("occupation").unwrap().len(), 11);
        assert_eq!(schema.table_for("gender").unwrap().code("Male"), Some(1));
    }

    #[test]
    fn test_builtin_json_roundtrip() {
        let schema = FeatureSchema::builtin(SchemaId::HealthV1);
        let parsed = FeatureSchema::from_json(&schema.to_json().unwrap()).unwrap();

        assert_eq!(parsed, schema);
    }
}
