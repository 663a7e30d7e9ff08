use serde_json::Value;

use super::{
    bool_value, decimal, number_value, string_value, typed, value, whole, EntityForm, FormField, FormMode,
    FormValues, Violations,
};
use crate::models::{LateFeeConfig, Record};
use crate::resources::Resource;

pub const FEE_TYPES: [&str; 3] = ["multiplier", "flat_rate", "compound"];

pub struct LateFeeForm;

impl EntityForm for LateFeeForm {
    fn resource(&self) -> Resource {
        Resource::LateFees
    }

    fn fields(&self, _mode: &FormMode) -> Vec<FormField> {
        vec![
            FormField::text("name", "Name"),
            FormField::choice("fee_type", "Fee Type", &FEE_TYPES),
            FormField::number("multiplier", "Multiplier").with_placeholder("e.g. 2.0"),
            FormField::number("flat_rate_per_hour", "Flat Rate per Hour"),
            FormField::number("max_daily_rate", "Max Daily Rate (optional)"),
            FormField::number("grace_period_minutes", "Grace Period (minutes)").with_value("0"),
            FormField::text("description", "Description"),
            FormField::toggle("is_active", "Active"),
        ]
    }

    fn seed(&self, record: &Record) -> FormValues {
        let config: LateFeeConfig = typed(record);
        let mut values = FormValues::new();
        values.insert("name".into(), config.name);
        if !config.fee_type.is_empty() {
            values.insert("fee_type".into(), config.fee_type);
        }
        for (key, v) in [
            ("multiplier", config.multiplier),
            ("flat_rate_per_hour", config.flat_rate_per_hour),
            ("max_daily_rate", config.max_daily_rate),
            ("grace_period_minutes", config.grace_period_minutes),
            ("description", config.description),
        ] {
            if let Some(v) = v {
                values.insert(key.into(), v);
            }
        }
        values.insert("is_active".into(), config.is_active.to_string());
        values
    }

    fn validate(&self, values: &FormValues, _mode: &FormMode) -> Result<(), Violations> {
        let mut violations = Violations::new();

        if value(values, "name").is_empty() {
            violations.push("name", "Name is required");
        }

        let fee_type = value(values, "fee_type");
        if !FEE_TYPES.contains(&fee_type) {
            violations.push("fee_type", "Fee type must be multiplier, flat_rate or compound");
        }

        let needs_multiplier = matches!(fee_type, "multiplier" | "compound");
        let needs_flat_rate = matches!(fee_type, "flat_rate" | "compound");
        for (key, label, required) in [
            ("multiplier", "Multiplier", needs_multiplier),
            ("flat_rate_per_hour", "Flat rate per hour", needs_flat_rate),
            ("max_daily_rate", "Max daily rate", false),
        ] {
            if value(values, key).is_empty() {
                if required {
                    violations.push(key, &format!("{} is required for this fee type", label));
                }
                continue;
            }
            if !matches!(decimal(values, key), Some(n) if n >= 0.0) {
                violations.push(key, &format!("{} must be a non-negative number", label));
            }
        }

        if !matches!(whole(values, "grace_period_minutes"), Some(n) if n >= 0) {
            violations.push(
                "grace_period_minutes",
                "Grace period must be a whole number of minutes",
            );
        }

        violations.into_result()
    }

    fn payload(&self, values: &FormValues, _mode: &FormMode) -> Vec<(String, Value)> {
        vec![
            ("name".to_string(), string_value(values, "name")),
            ("fee_type".to_string(), string_value(values, "fee_type")),
            ("multiplier".to_string(), number_value(values, "multiplier")),
            ("flat_rate_per_hour".to_string(), number_value(values, "flat_rate_per_hour")),
            ("max_daily_rate".to_string(), number_value(values, "max_daily_rate")),
            ("grace_period_minutes".to_string(), number_value(values, "grace_period_minutes")),
            ("description".to_string(), string_value(values, "description")),
            ("is_active".to_string(), bool_value(values, "is_active")),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::BodyEncoding;
    use crate::api::RequestBody;
    use serde_json::json;

    fn values(pairs: &[(&str, &str)]) -> FormValues {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_fee_type_requirements() {
        let flat = values(&[
            ("name", "Flat"),
            ("fee_type", "flat_rate"),
            ("flat_rate_per_hour", "25"),
            ("grace_period_minutes", "10"),
        ]);
        assert!(LateFeeForm.validate(&flat, &FormMode::Create).is_ok());

        let compound = values(&[
            ("name", "Both"),
            ("fee_type", "compound"),
            ("multiplier", "1.5"),
            ("grace_period_minutes", "0"),
        ]);
        let err = LateFeeForm.validate(&compound, &FormMode::Create).unwrap_err();
        assert_eq!(
            err.for_field("flat_rate_per_hour"),
            Some("Flat rate per hour is required for this fee type")
        );
    }

    #[test]
    fn test_rejects_bad_values() {
        let v = values(&[
            ("name", "Odd"),
            ("fee_type", "percentage"),
            ("max_daily_rate", "-3"),
            ("grace_period_minutes", "2.5"),
        ]);
        let err = LateFeeForm.validate(&v, &FormMode::Create).unwrap_err();
        assert_eq!(
            err.first_message(),
            Some("Fee type must be multiplier, flat_rate or compound")
        );
        assert_eq!(err.for_field("max_daily_rate"), Some("Max daily rate must be a non-negative number"));
        assert!(err.for_field("grace_period_minutes").is_some());
    }

    #[test]
    fn test_json_payload_keeps_types() {
        let v = values(&[
            ("name", "Standard"),
            ("fee_type", "multiplier"),
            ("multiplier", "2"),
            ("grace_period_minutes", "15"),
            ("is_active", "true"),
        ]);
        let body = BodyEncoding::Json.encode(LateFeeForm.payload(&v, &FormMode::Create));
        match body {
            RequestBody::Json(object) => {
                assert_eq!(object["multiplier"], json!(2));
                assert_eq!(object["grace_period_minutes"], json!(15));
                assert_eq!(object["flat_rate_per_hour"], Value::Null);
                assert_eq!(object["is_active"], json!(true));
            }
            other => panic!("unexpected body: {:?}", other),
        }
    }

    #[test]
    fn test_seed_tolerates_null_fields() {
        let seeded = LateFeeForm.seed(&Record(json!({
            "id": 7, "name": "Standard", "fee_type": "flat_rate", "multiplier": null,
            "flat_rate_per_hour": "20.00", "max_daily_rate": null,
            "grace_period_minutes": 15, "is_active": null, "description": null
        })));
        assert_eq!(seeded["name"], "Standard");
        assert_eq!(seeded["fee_type"], "flat_rate");
        assert_eq!(seeded["grace_period_minutes"], "15");
        assert_eq!(seeded["is_active"], "false");
    }
}
