//! Feature vector assembly
//!
//! Walks the schema's columns in fit order and produces the `FeatureVector`
//! handed to the scaler and classifier.

use crate::error::PredictError;
use crate::features::FeatureDeriver;
use crate::schema::FeatureSchema;
use crate::types::{FeatureVector, RawInputs};

/// Assembles fixed-order feature vectors for one schema
pub struct FeatureEncoder;

impl FeatureEncoder {
    /// Encode raw inputs into the schema's column order
    pub fn encode(schema: &FeatureSchema, raw: &RawInputs) -> Result<FeatureVector, PredictError> {
        let mut vector = FeatureVector::with_capacity(schema.columns.len());

        for column in &schema.columns {
            let value = FeatureDeriver::derive(schema, &column.source, raw)?;
            vector.push(column.name.clone(), value);
        }

        log::debug!(
            "encoded {} columns for schema {}: {:?}",
            vector.len(),
            schema.id,
            vector.values()
        );

        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaId;
    use pretty_assertions::assert_eq;

    fn lifestyle_inputs() -> RawInputs {
        RawInputs::new()
            .with("age", 25.0)
            .with("gender", "Male")
            .with("screen_time", 3.5)
            .with("exercise", 30.0)
            .with("stress", 5.0)
            .with("caffeine", 100.0)
            .with("noise", 35.0)
    }

    #[test]
    fn test_encode_lifestyle_scenario() {
        let schema = FeatureSchema::builtin(SchemaId::LifestyleV1);
        let vector = FeatureEncoder::encode(&schema, &lifestyle_inputs()).unwrap();

        assert_eq!(vector.names(), schema.column_names().as_slice());
        assert_eq!(vector.len(), 12);

        assert_eq!(vector.get("Age"), Some(25.0));
        assert_eq!(vector.get("Gender"), Some(1.0));
        assert_eq!(vector.get("CaffeineCategory"), Some(1.0));
        assert_eq!(vector.get("StressLevel"), Some(1.0));
        assert_eq!(vector.get("Active"), Some(0.0));
        assert_eq!(vector.get("NoiseLevel"), Some(0.0));
        assert!((vector.get("SleepHours").unwrap() - 6.9).abs() < 1e-9);
    }

    #[test]
    fn test_encode_health_scenario() {
        let schema = FeatureSchema::builtin(SchemaId::HealthV1);
        let raw = RawInputs::new()
            .with("gender", "Female")
            .with("age", 41.0)
            .with("occupation", "Nurse")
            .with("activity_minutes", 75.0)
            .with("bmi_category", "Overweight")
            .with("heart_rate", 72.0)
            .with("daily_steps", 8000.0)
            .with("sleep_disorder", "None")
            .with("systolic", 125.0)
            .with("diastolic", 82.0)
            .with("caffeine", 200.0)
            .with("screen_time", 2.0);

        let vector = FeatureEncoder::encode(&schema, &raw).unwrap();

        assert_eq!(
            vector.values(),
            &[0.0, 41.0, 5.0, 75.0, 3.0, 72.0, 8000.0, 1.0, 125.0, 82.0, 200.0, 2.0, 2.0, 1.0]
        );
    }

    #[test]
    fn test_encode_missing_attribute() {
        let schema = FeatureSchema::builtin(SchemaId::LifestyleV1);
        let raw = RawInputs::new()
            .with("age", 25.0)
            .with("gender", "Male")
            .with("screen_time", 3.5)
            .with("exercise", 30.0)
            .with("stress", 5.0)
            .with("caffeine", 100.0)
            .with("volume", 35.0);

        let err = FeatureEncoder::encode(&schema, &raw).unwrap_err();
        assert!(matches!(err, PredictError::MissingAttribute(ref name) if name == "noise"));
    }

    #[test]
    fn test_encode_is_deterministic() {
        let schema = FeatureSchema::builtin(SchemaId::LifestyleV2);
        let first = FeatureEncoder::encode(&schema, &lifestyle_inputs()).unwrap();
        let second = FeatureEncoder::encode(&schema, &lifestyle_inputs()).unwrap();

        assert_eq!(first, second);
    }
}
