//! Vehicle insurance input record
//!
//! One customer observation as submitted by a user. Built from a loosely
//! typed field map by `VehicleData::from_map`, which either returns a fully
//! coerced record or the first field that failed.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use validator::Validate;

use super::row::{Cell, DataRow};

pub const GENDER: &str = "Gender";
pub const AGE: &str = "Age";
pub const DRIVING_LICENSE: &str = "Driving_License";
pub const REGION_CODE: &str = "Region_Code";
pub const PREVIOUSLY_INSURED: &str = "Previously_Insured";
pub const ANNUAL_PREMIUM: &str = "Annual_Premium";
pub const POLICY_SALES_CHANNEL: &str = "Policy_Sales_Channel";
pub const VINTAGE: &str = "Vintage";
pub const VEHICLE_AGE: &str = "Vehicle_Age";
pub const VEHICLE_DAMAGE: &str = "Vehicle_Damage";

/// Canonical raw column order
pub const RAW_COLUMNS: [&str; 10] = [
    GENDER,
    AGE,
    DRIVING_LICENSE,
    REGION_CODE,
    PREVIOUSLY_INSURED,
    ANNUAL_PREMIUM,
    POLICY_SALES_CHANNEL,
    VINTAGE,
    VEHICLE_AGE,
    VEHICLE_DAMAGE,
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing required field '{field}'")]
    Missing { field: &'static str },

    #[error("field '{field}' must be {expected}, got {value}")]
    Invalid {
        field: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("field '{field}' is out of range: {value}")]
    OutOfRange { field: &'static str, value: String },
}

impl ValidationError {
    /// Canonical name of the offending field
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Missing { field }
            | ValidationError::Invalid { field, .. }
            | ValidationError::OutOfRange { field, .. } => field,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
pub struct VehicleData {
    #[serde(rename = "Gender")]
    pub gender: String,

    #[serde(rename = "Age")]
    #[validate(range(min = 0))]
    pub age: i64,

    #[serde(rename = "Driving_License")]
    #[validate(range(min = 0, max = 1))]
    pub driving_license: i64,

    #[serde(rename = "Region_Code")]
    pub region_code: f64,

    #[serde(rename = "Previously_Insured")]
    #[validate(range(min = 0, max = 1))]
    pub previously_insured: i64,

    #[serde(rename = "Annual_Premium")]
    #[validate(range(min = 0.0))]
    pub annual_premium: f64,

    #[serde(rename = "Policy_Sales_Channel")]
    pub policy_sales_channel: f64,

    #[serde(rename = "Vintage")]
    #[validate(range(min = 0))]
    pub vintage: i64,

    #[serde(rename = "Vehicle_Age")]
    pub vehicle_age: String,

    #[serde(rename = "Vehicle_Damage")]
    pub vehicle_damage: String,
}

impl VehicleData {
    /// Build a record from named raw values.
    ///
    /// Fields are checked in canonical order and the first failure is
    /// returned; no partial record is ever produced.
    pub fn from_map(fields: &Map<String, Value>) -> Result<Self, ValidationError> {
        let record = Self {
            gender: text(fields, GENDER)?,
            age: int(fields, AGE)?,
            driving_license: int(fields, DRIVING_LICENSE)?,
            region_code: float(fields, REGION_CODE)?,
            previously_insured: int(fields, PREVIOUSLY_INSURED)?,
            annual_premium: float(fields, ANNUAL_PREMIUM)?,
            policy_sales_channel: float(fields, POLICY_SALES_CHANNEL)?,
            vintage: int(fields, VINTAGE)?,
            vehicle_age: text(fields, VEHICLE_AGE)?,
            vehicle_damage: text(fields, VEHICLE_DAMAGE)?,
        };

        record.validate().map_err(|errors| record.first_range_error(&errors))?;

        Ok(record)
    }

    /// Single-row table in canonical column order
    pub fn to_row(&self) -> DataRow {
        DataRow::new()
            .with(GENDER, Cell::Text(self.gender.clone()))
            .with(AGE, Cell::Int(self.age))
            .with(DRIVING_LICENSE, Cell::Int(self.driving_license))
            .with(REGION_CODE, Cell::Float(self.region_code))
            .with(PREVIOUSLY_INSURED, Cell::Int(self.previously_insured))
            .with(ANNUAL_PREMIUM, Cell::Float(self.annual_premium))
            .with(POLICY_SALES_CHANNEL, Cell::Float(self.policy_sales_channel))
            .with(VINTAGE, Cell::Int(self.vintage))
            .with(VEHICLE_AGE, Cell::Text(self.vehicle_age.clone()))
            .with(VEHICLE_DAMAGE, Cell::Text(self.vehicle_damage.clone()))
    }

    fn first_range_error(&self, errors: &validator::ValidationErrors) -> ValidationError {
        let failed: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(name, _)| {
                let name: &str = name.as_ref();
                name.to_string()
            })
            .collect();

        let checks: [(&str, &'static str, String); 5] = [
            ("age", AGE, self.age.to_string()),
            ("driving_license", DRIVING_LICENSE, self.driving_license.to_string()),
            ("previously_insured", PREVIOUSLY_INSURED, self.previously_insured.to_string()),
            ("annual_premium", ANNUAL_PREMIUM, self.annual_premium.to_string()),
            ("vintage", VINTAGE, self.vintage.to_string()),
        ];

        checks
            .into_iter()
            .find(|(attr, _, _)| failed.iter().any(|f| f == attr))
            .map(|(_, field, value)| ValidationError::OutOfRange { field, value })
            .unwrap_or(ValidationError::OutOfRange {
                field: AGE,
                value: errors.to_string(),
            })
    }
}

fn present<'a>(fields: &'a Map<String, Value>, field: &'static str) -> Result<&'a Value, ValidationError> {
    match fields.get(field) {
        None | Some(Value::Null) => Err(ValidationError::Missing { field }),
        Some(value) => Ok(value),
    }
}

fn text(fields: &Map<String, Value>, field: &'static str) -> Result<String, ValidationError> {
    match present(fields, field)? {
        Value::String(s) => Ok(s.clone()),
        other => Err(ValidationError::Invalid {
            field,
            expected: "a string",
            value: other.to_string(),
        }),
    }
}

fn int(fields: &Map<String, Value>, field: &'static str) -> Result<i64, ValidationError> {
    let value = present(fields, field)?;
    let parsed = match value {
        Value::Number(n) if n.is_u64() => n.as_u64().and_then(|u| i64::try_from(u).ok()),
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral_f64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| ValidationError::Invalid {
        field,
        expected: "an integer",
        value: value.to_string(),
    })
}

/// Whole floats inside the i64 range; `i64::MAX as f64` is 2^63 and already out
fn integral_f64(f: f64) -> Option<i64> {
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.is_finite() && f.fract() == 0.0 && in_range).then_some(f as i64)
}

fn float(fields: &Map<String, Value>, field: &'static str) -> Result<f64, ValidationError> {
    let value = present(fields, field)?;
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed
        .filter(|f| f.is_finite())
        .ok_or_else(|| ValidationError::Invalid {
            field,
            expected: "a number",
            value: value.to_string(),
        })
}
