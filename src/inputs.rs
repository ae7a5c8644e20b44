//! Typed input records
//!
//! Convenience structs for the built-in schemas. Each converts into the
//! generic `RawInputs` record the pipeline consumes.

use crate::error::PredictError;
use crate::types::RawInputs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Inputs for `lifestyle.v1` / `lifestyle.v2`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifestyleInputs {
    pub age: f64,
    pub gender: String,
    /// Hours per day
    pub screen_time: f64,
    /// Minutes per day
    pub exercise: f64,
    /// 1-10
    pub stress: f64,
    /// mg per day
    pub caffeine: f64,
    /// dB
    pub noise: f64,
}

impl From<LifestyleInputs> for RawInputs {
    fn from(inputs: LifestyleInputs) -> Self {
        RawInputs::new()
            .with("age", inputs.age)
            .with("gender", inputs.gender)
            .with("screen_time", inputs.screen_time)
            .with("exercise", inputs.exercise)
            .with("stress", inputs.stress)
            .with("caffeine", inputs.caffeine)
            .with("noise", inputs.noise)
    }
}

/// Blood pressure reading written as `systolic/diastolic`, e.g. `120/80`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BloodPressure {
    pub systolic: f64,
    pub diastolic: f64,
}

impl FromStr for BloodPressure {
    type Err = PredictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| PredictError::InvalidAttribute {
            attribute: "blood_pressure".to_string(),
            reason: format!("{reason} in {s:?}"),
        };

        let (systolic, diastolic) = s
            .split_once('/')
            .ok_or_else(|| invalid("expected systolic/diastolic"))?;
        let systolic: f64 = systolic
            .trim()
            .parse()
            .map_err(|_| invalid("invalid systolic value"))?;
        let diastolic: f64 = diastolic
            .trim()
            .parse()
            .map_err(|_| invalid("invalid diastolic value"))?;

        Ok(BloodPressure {
            systolic,
            diastolic,
        })
    }
}

impl TryFrom<String> for BloodPressure {
    type Error = PredictError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BloodPressure> for String {
    fn from(bp: BloodPressure) -> Self {
        bp.to_string()
    }
}

impl fmt::Display for BloodPressure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.systolic, self.diastolic)
    }
}

/// Inputs for `health.v1`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthInputs {
    pub gender: String,
    pub age: f64,
    pub occupation: String,
    /// Minutes per day
    pub activity_minutes: f64,
    pub bmi_category: String,
    /// bpm
    pub heart_rate: f64,
    pub daily_steps: f64,
    pub sleep_disorder: String,
    pub blood_pressure: BloodPressure,
    /// mg per day
    pub caffeine: f64,
    /// Hours per day
    pub screen_time: f64,
}

impl From<HealthInputs> for RawInputs {
    fn from(inputs: HealthInputs) -> Self {
        RawInputs::new()
            .with("gender", inputs.gender)
            .with("age", inputs.age)
            .with("occupation", inputs.occupation)
            .with("activity_minutes", inputs.activity_minutes)
            .with("bmi_category", inputs.bmi_category)
            .with("heart_rate", inputs.heart_rate)
            .with("daily_steps", inputs.daily_steps)
            .with("sleep_disorder", inputs.sleep_disorder)
            .with("systolic", inputs.blood_pressure.systolic)
            .with("diastolic", inputs.blood_pressure.diastolic)
            .with("caffeine", inputs.caffeine)
            .with("screen_time", inputs.screen_time)
    }
}

/// Replace a text `blood_pressure` attribute with numeric `systolic` and
/// `diastolic` attributes. Inputs without one are left untouched.
pub fn expand_blood_pressure(raw: &mut RawInputs) -> Result<(), PredictError> {
    let Some(text) = raw.get("blood_pressure").and_then(|v| v.as_text()) else {
        return Ok(());
    };
    let bp: BloodPressure = text.parse()?;
    raw.insert("systolic", bp.systolic);
    raw.insert("diastolic", bp.diastolic);
    Ok(())
}
