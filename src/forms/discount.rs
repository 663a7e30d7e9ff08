use chrono::{Duration, Local, NaiveDate};
use serde_json::Value;

use super::{date_part, decimal, string_value, typed, value, whole, EntityForm, FormField, FormMode, FormValues, Violations};
use crate::models::{Discount, Record};
use crate::resources::Resource;

pub const PERCENT_RANGE_ERROR: &str = "Discount percent must be between 0 and 100";

const STATUSES: [&str; 3] = ["active", "inactive", "expired"];

pub struct DiscountForm;

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&date_part(raw), "%Y-%m-%d").ok()
}

impl EntityForm for DiscountForm {
    fn resource(&self) -> Resource {
        Resource::Discounts
    }

    fn fields(&self, mode: &FormMode) -> Vec<FormField> {
        let today = Local::now().date_naive();
        let mut fields = Vec::new();
        if mode.is_create() {
            fields.push(FormField::text("station_id", "Station ID"));
            fields.push(FormField::text("package_id", "Package ID"));
        }
        fields.extend([
            FormField::number("discount_percent", "Discount (%)").with_placeholder("e.g. 25"),
            FormField::number("max_total_uses", "Max Total Uses"),
            FormField::number("max_uses_per_user", "Max Uses Per User").with_value("1"),
            FormField::date("valid_from", "Valid From").with_value(&today.to_string()),
            FormField::date("valid_until", "Valid Until")
                .with_value(&(today + Duration::days(30)).to_string()),
            FormField::choice("status", "Status", &STATUSES),
        ]);
        fields
    }

    fn seed(&self, record: &Record) -> FormValues {
        let discount: Discount = typed(record);
        let mut values = FormValues::new();
        let mut put = |key: &str, v: Option<String>| {
            if let Some(v) = v {
                values.insert(key.to_string(), v);
            }
        };
        put("station_id", discount.station_id);
        put("package_id", discount.package_id);
        put("discount_percent", discount.discount_percent);
        put("max_total_uses", discount.max_total_uses);
        put("max_uses_per_user", discount.max_uses_per_user);
        put("valid_from", discount.valid_from.as_deref().map(date_part));
        put("valid_until", discount.valid_until.as_deref().map(date_part));
        put("status", Some(discount.status).filter(|s| !s.is_empty()));
        values
    }

    fn validate(&self, values: &FormValues, mode: &FormMode) -> Result<(), Violations> {
        let mut violations = Violations::new();

        if mode.is_create() {
            if value(values, "station_id").is_empty() {
                violations.push("station_id", "Please select a station");
            }
            if value(values, "package_id").is_empty() {
                violations.push("package_id", "Please select a package");
            }
        }

        match decimal(values, "discount_percent") {
            Some(p) if p > 0.0 && p <= 100.0 => {}
            _ => violations.push("discount_percent", PERCENT_RANGE_ERROR),
        }

        let total = whole(values, "max_total_uses");
        if !matches!(total, Some(n) if n > 0) {
            violations.push("max_total_uses", "Max total uses must be greater than 0");
        }
        match whole(values, "max_uses_per_user") {
            Some(n) if n > 0 => {
                if matches!(total, Some(t) if t > 0 && n > t) {
                    violations.push(
                        "max_uses_per_user",
                        "Max uses per user cannot exceed max total uses",
                    );
                }
            }
            _ => violations.push("max_uses_per_user", "Max uses per user must be greater than 0"),
        }

        let from = parse_date(value(values, "valid_from"));
        let until = parse_date(value(values, "valid_until"));
        if from.is_none() {
            violations.push("valid_from", "Valid from must be a date (YYYY-MM-DD)");
        }
        if until.is_none() {
            violations.push("valid_until", "Valid until must be a date (YYYY-MM-DD)");
        }
        if let (Some(from), Some(until)) = (from, until) {
            if until <= from {
                violations.push("valid_until", "Valid until must be after valid from");
            }
        }

        if !STATUSES.contains(&value(values, "status")) {
            violations.push("status", "Please choose a status");
        }

        violations.into_result()
    }

    fn payload(&self, values: &FormValues, mode: &FormMode) -> Vec<(String, Value)> {
        let mut keys = Vec::new();
        if mode.is_create() {
            keys.extend(["station_id", "package_id"]);
        }
        keys.extend([
            "discount_percent",
            "max_total_uses",
            "max_uses_per_user",
            "valid_from",
            "valid_until",
            "status",
        ]);
        keys.into_iter()
            .map(|key| (key.to_string(), string_value(values, key)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(pairs: &[(&str, &str)]) -> FormValues {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn complete() -> FormValues {
        values(&[
            ("station_id", "12"),
            ("package_id", "3"),
            ("discount_percent", "25"),
            ("max_total_uses", "10"),
            ("max_uses_per_user", "1"),
            ("valid_from", "2026-01-01"),
            ("valid_until", "2026-02-01"),
            ("status", "active"),
        ])
    }

    #[test]
    fn test_percent_bounds() {
        for bad in ["0", "-5", "100.5", "150", "abc", ""] {
            let mut v = complete();
            v.insert("discount_percent".into(), bad.into());
            let err = DiscountForm.validate(&v, &FormMode::Create).unwrap_err();
            assert_eq!(err.for_field("discount_percent"), Some(PERCENT_RANGE_ERROR), "{}", bad);
        }

        let mut v = complete();
        v.insert("discount_percent".into(), "100".into());
        assert!(DiscountForm.validate(&v, &FormMode::Create).is_ok());
    }

    #[test]
    fn test_create_requires_station_and_package() {
        let mut v = complete();
        v.remove("station_id");
        v.insert("package_id".into(), " ".into());
        let err = DiscountForm.validate(&v, &FormMode::Create).unwrap_err();
        assert_eq!(err.first_message(), Some("Please select a station"));
        assert!(err.for_field("package_id").is_some());

        let edit = FormMode::Edit { key: "d1".into() };
        assert!(DiscountForm.validate(&v, &edit).is_ok());
    }

    #[test]
    fn test_date_range_and_usage() {
        let mut v = complete();
        v.insert("valid_until".into(), "2025-12-31".into());
        v.insert("max_uses_per_user".into(), "11".into());
        let err = DiscountForm.validate(&v, &FormMode::Create).unwrap_err();
        assert_eq!(err.for_field("valid_until"), Some("Valid until must be after valid from"));
        assert_eq!(
            err.for_field("max_uses_per_user"),
            Some("Max uses per user cannot exceed max total uses")
        );
    }

    #[test]
    fn test_edit_payload_omits_station_and_package() {
        let edit = FormMode::Edit { key: "d1".into() };
        let keys: Vec<String> = DiscountForm
            .payload(&complete(), &edit)
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert!(!keys.contains(&"station_id".to_string()));
        assert!(!keys.contains(&"package_id".to_string()));
        assert!(keys.contains(&"status".to_string()));

        let field_keys: Vec<String> = DiscountForm.fields(&edit).into_iter().map(|f| f.key).collect();
        assert!(!field_keys.contains(&"station_id".to_string()));
    }

    #[test]
    fn test_seed_from_record() {
        let record = Record(json!({
            "id": "d1", "station_id": 12, "package_id": 3, "discount_percent": "25.00",
            "max_total_uses": 10, "max_uses_per_user": 2,
            "valid_from": "2026-01-01T00:00:00Z", "valid_until": "2026-03-01T00:00:00Z",
            "status": "inactive"
        }));
        let seeded = DiscountForm.seed(&record);
        assert_eq!(seeded["discount_percent"], "25.00");
        assert_eq!(seeded["valid_until"], "2026-03-01");
        assert_eq!(seeded["status"], "inactive");
        assert!(DiscountForm.validate(&seeded, &FormMode::Create).is_ok());
    }

    #[test]
    fn test_seed_tolerates_null_fields() {
        let seeded = DiscountForm.seed(&Record(json!({
            "id": "b7c1", "station_id": 12, "package_id": 3, "discount_percent": "25.00",
            "max_total_uses": 10, "max_uses_per_user": null, "valid_from": null,
            "valid_until": null, "status": null
        })));
        assert_eq!(seeded["discount_percent"], "25.00");
        assert_eq!(seeded["station_id"], "12");
        assert!(!seeded.contains_key("status"));
        assert!(!seeded.contains_key("max_uses_per_user"));
    }
}
