//! HTML form submission

use serde::Deserialize;
use serde_json::{Map, Number, Value};

use super::vehicle::{
    AGE, ANNUAL_PREMIUM, DRIVING_LICENSE, GENDER, POLICY_SALES_CHANNEL, PREVIOUSLY_INSURED,
    REGION_CODE, VEHICLE_AGE, VEHICLE_DAMAGE, VINTAGE,
};

/// Raw form fields, all strings on the wire
#[derive(Debug, Default, Deserialize)]
pub struct VehicleForm {
    #[serde(rename = "Gender")]
    pub gender: Option<String>,
    #[serde(rename = "Age")]
    pub age: Option<String>,
    #[serde(rename = "Driving_License")]
    pub driving_license: Option<String>,
    #[serde(rename = "Region_Code")]
    pub region_code: Option<String>,
    #[serde(rename = "Previously_Insured")]
    pub previously_insured: Option<String>,
    #[serde(rename = "Annual_Premium")]
    pub annual_premium: Option<String>,
    #[serde(rename = "Policy_Sales_Channel")]
    pub policy_sales_channel: Option<String>,
    #[serde(rename = "Vintage")]
    pub vintage: Option<String>,
    #[serde(rename = "Vehicle_Age")]
    pub vehicle_age: Option<String>,
    #[serde(rename = "Vehicle_Damage")]
    pub vehicle_damage: Option<String>,
}

impl VehicleForm {
    /// Convert to the field map `VehicleData::from_map` consumes.
    ///
    /// Numeric fields that do not parse become null; rejecting them is left
    /// to record validation.
    pub fn into_fields(self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert(GENDER.into(), text_value(self.gender));
        fields.insert(AGE.into(), int_value(self.age.as_deref()));
        fields.insert(DRIVING_LICENSE.into(), int_value(self.driving_license.as_deref()));
        fields.insert(REGION_CODE.into(), float_value(self.region_code.as_deref()));
        fields.insert(PREVIOUSLY_INSURED.into(), int_value(self.previously_insured.as_deref()));
        fields.insert(ANNUAL_PREMIUM.into(), float_value(self.annual_premium.as_deref()));
        fields.insert(POLICY_SALES_CHANNEL.into(), float_value(self.policy_sales_channel.as_deref()));
        fields.insert(VINTAGE.into(), int_value(self.vintage.as_deref()));
        fields.insert(VEHICLE_AGE.into(), text_value(self.vehicle_age));
        fields.insert(VEHICLE_DAMAGE.into(), text_value(self.vehicle_damage));
        fields
    }
}

fn text_value(raw: Option<String>) -> Value {
    raw.map(Value::String).unwrap_or(Value::Null)
}

fn int_value(raw: Option<&str>) -> Value {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .map(|v| Value::Number(v.into()))
        .unwrap_or(Value::Null)
}

fn float_value(raw: Option<&str>) -> Value {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ValidationError, VehicleData};

    fn filled_form() -> VehicleForm {
        VehicleForm {
            gender: Some("Female".into()),
            age: Some("52".into()),
            driving_license: Some("1".into()),
            region_code: Some("8".into()),
            previously_insured: Some("1".into()),
            annual_premium: Some("31500.50".into()),
            policy_sales_channel: Some("26.0".into()),
            vintage: Some("210".into()),
            vehicle_age: Some("> 2 Years".into()),
            vehicle_damage: Some("No".into()),
        }
    }

    #[test]
    fn test_form_values_are_parsed() {
        let fields = filled_form().into_fields();
        assert_eq!(fields[AGE], Value::from(52));
        assert_eq!(fields[REGION_CODE], Value::from(8.0));
        assert_eq!(fields[VEHICLE_AGE], Value::from("> 2 Years"));

        let record = VehicleData::from_map(&fields).unwrap();
        assert_eq!(record.annual_premium, 31500.5);
    }

    #[test]
    fn test_unparseable_numbers_become_null() {
        let mut form = filled_form();
        form.age = Some("thirty".into());
        form.annual_premium = Some("NaN".into());
        form.vintage = None;

        let fields = form.into_fields();
        assert_eq!(fields[AGE], Value::Null);
        assert_eq!(fields[ANNUAL_PREMIUM], Value::Null);
        assert_eq!(fields[VINTAGE], Value::Null);

        assert_eq!(
            VehicleData::from_map(&fields).unwrap_err(),
            ValidationError::Missing { field: AGE }
        );
    }

    #[test]
    fn test_deserialize_urlencoded_shape() {
        let form: VehicleForm = serde_json::from_value(serde_json::json!({
            "Gender": "Male",
            "Vehicle_Age": "< 1 Year"
        }))
        .unwrap();
        assert_eq!(form.gender.as_deref(), Some("Male"));
        assert!(form.age.is_none());
    }
}
