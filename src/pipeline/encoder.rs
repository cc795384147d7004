//! Feature Encoder
//!
//! Maps the canonical raw row onto the numeric row the model was trained on:
//! categorical columns become 0/1 indicators, the source string columns
//! are dropped, and the fitted preprocessor scales and orders what is left.

use super::error::EncodingError;
use super::preprocessor::Preprocessor;
use crate::models::vehicle::{
    AGE, ANNUAL_PREMIUM, DRIVING_LICENSE, GENDER, POLICY_SALES_CHANNEL, PREVIOUSLY_INSURED,
    REGION_CODE, VEHICLE_AGE, VEHICLE_DAMAGE, VINTAGE,
};
use crate::models::{Cell, DataRow};

pub const VEHICLE_AGE_LT_1_YEAR: &str = "Vehicle_Age_lt_1_Year";
pub const VEHICLE_AGE_GT_2_YEARS: &str = "Vehicle_Age_gt_2_Years";
pub const VEHICLE_DAMAGE_YES: &str = "Vehicle_Damage_Yes";

/// Column layout handed to the preprocessor
pub const ENCODER_COLUMNS: [&str; 11] = [
    GENDER,
    AGE,
    DRIVING_LICENSE,
    REGION_CODE,
    PREVIOUSLY_INSURED,
    ANNUAL_PREMIUM,
    POLICY_SALES_CHANNEL,
    VINTAGE,
    VEHICLE_AGE_LT_1_YEAR,
    VEHICLE_AGE_GT_2_YEARS,
    VEHICLE_DAMAGE_YES,
];

/// Encoded feature row, names matching the preprocessor output
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRow {
    pub names: Vec<String>,
    pub values: Vec<f64>,
}

impl EncodedRow {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Model input precision
    pub fn to_f32(&self) -> Vec<f32> {
        self.values.iter().map(|&v| v as f32).collect()
    }
}

/// One-of-three vehicle age encoding; "1-2 Years" is both flags cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleAgeFlags {
    pub lt_1_year: u8,
    pub gt_2_years: u8,
}

impl VehicleAgeFlags {
    pub fn from_label(label: &str) -> Result<Self, EncodingError> {
        let (lt_1_year, gt_2_years) = match label {
            "< 1 Year" => (1, 0),
            "1-2 Years" => (0, 0),
            "> 2 Years" => (0, 1),
            other => return Err(unknown(VEHICLE_AGE, other)),
        };
        Ok(Self {
            lt_1_year,
            gt_2_years,
        })
    }
}

pub fn gender_code(value: &str) -> Result<u8, EncodingError> {
    match value {
        "Female" => Ok(0),
        "Male" => Ok(1),
        other => Err(unknown(GENDER, other)),
    }
}

pub fn vehicle_damage_flag(value: &str) -> Result<u8, EncodingError> {
    match value {
        "Yes" => Ok(1),
        "No" => Ok(0),
        other => Err(unknown(VEHICLE_DAMAGE, other)),
    }
}

/// Encode a canonical raw row with a fitted preprocessor.
///
/// Pure: the same row and preprocessor always give the same output.
pub fn encode(raw: &DataRow, preprocessor: &Preprocessor) -> Result<EncodedRow, EncodingError> {
    let mut row = raw.clone();

    let gender = gender_code(text(&row, GENDER)?)?;
    row.set(GENDER, Cell::Int(gender as i64));

    let vehicle_age = take_text(&mut row, VEHICLE_AGE)?;
    let flags = VehicleAgeFlags::from_label(&vehicle_age)?;
    let damage = vehicle_damage_flag(&take_text(&mut row, VEHICLE_DAMAGE)?)?;

    row.push(VEHICLE_AGE_LT_1_YEAR, Cell::Int(flags.lt_1_year as i64));
    row.push(VEHICLE_AGE_GT_2_YEARS, Cell::Int(flags.gt_2_years as i64));
    row.push(VEHICLE_DAMAGE_YES, Cell::Int(damage as i64));

    let numeric = row
        .columns()
        .iter()
        .zip(row.values())
        .map(|(column, cell)| {
            cell.as_f64().ok_or_else(|| EncodingError::WrongType {
                column: column.clone(),
                expected: "a numeric value",
            })
        })
        .collect::<Result<Vec<f64>, _>>()?;

    let values = preprocessor.transform(row.columns(), &numeric)?;

    Ok(EncodedRow {
        names: preprocessor.output_names(),
        values,
    })
}

fn text<'a>(row: &'a DataRow, column: &str) -> Result<&'a str, EncodingError> {
    let cell = row
        .get(column)
        .ok_or_else(|| EncodingError::MissingColumn(column.to_string()))?;
    cell.as_text().ok_or_else(|| EncodingError::WrongType {
        column: column.to_string(),
        expected: "a category label",
    })
}

fn take_text(row: &mut DataRow, column: &str) -> Result<String, EncodingError> {
    let value = text(row, column)?.to_string();
    row.remove(column);
    Ok(value)
}

fn unknown(column: &str, value: &str) -> EncodingError {
    EncodingError::UnknownCategory {
        column: column.to_string(),
        value: value.to_string(),
    }
}
