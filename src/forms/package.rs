use serde_json::Value;

use super::{
    decimal, json_object, string_value, typed, value, whole, EntityForm, FormField, FormMode, FormValues,
    Violations,
};
use crate::models::{Record, RentalPackage};
use crate::resources::Resource;

const PACKAGE_TYPES: [&str; 4] = ["hourly", "daily", "weekly", "monthly"];
const PAYMENT_MODELS: [&str; 2] = ["prepaid", "postpaid"];

pub struct PackageForm;

impl EntityForm for PackageForm {
    fn resource(&self) -> Resource {
        Resource::Packages
    }

    fn fields(&self, _mode: &FormMode) -> Vec<FormField> {
        vec![
            FormField::text("name", "Name"),
            FormField::text("description", "Description"),
            FormField::number("duration_minutes", "Duration (minutes)"),
            FormField::number("price", "Price"),
            FormField::choice("package_type", "Package Type", &PACKAGE_TYPES),
            FormField::choice("payment_model", "Payment Model", &PAYMENT_MODELS),
            FormField::toggle("is_active", "Active"),
            FormField::json("package_metadata", "Metadata (JSON)"),
        ]
    }

    fn seed(&self, record: &Record) -> FormValues {
        let package: RentalPackage = typed(record);
        let mut values = FormValues::new();
        values.insert("name".into(), package.name);
        values.insert("description".into(), package.description);
        if let Some(duration) = package.duration_minutes {
            values.insert("duration_minutes".into(), duration);
        }
        if let Some(price) = package.price {
            values.insert("price".into(), price);
        }
        if !package.package_type.is_empty() {
            values.insert("package_type".into(), package.package_type);
        }
        if !package.payment_model.is_empty() {
            values.insert("payment_model".into(), package.payment_model);
        }
        values.insert("is_active".into(), package.is_active.to_string());
        if let Some(metadata) = package.package_metadata.filter(|m| !m.is_null()) {
            values.insert("package_metadata".into(), metadata.to_string());
        }
        values
    }

    fn validate(&self, values: &FormValues, _mode: &FormMode) -> Result<(), Violations> {
        let mut violations = Violations::new();

        if value(values, "name").is_empty() {
            violations.push("name", "Package name is required");
        }
        if !matches!(whole(values, "duration_minutes"), Some(n) if n > 0) {
            violations.push("duration_minutes", "Duration must be greater than 0 minutes");
        }
        match decimal(values, "price") {
            Some(p) if p < 0.0 => violations.push("price", "Price cannot be negative"),
            Some(_) => {}
            None => violations.push("price", "Price must be a number"),
        }
        if !PACKAGE_TYPES.contains(&value(values, "package_type")) {
            violations.push("package_type", "Please choose a package type");
        }
        if !PAYMENT_MODELS.contains(&value(values, "payment_model")) {
            violations.push("payment_model", "Please choose a payment model");
        }
        if json_object(values, "package_metadata").is_none() {
            violations.push("package_metadata", "Metadata must be a valid JSON object");
        }

        violations.into_result()
    }

    fn payload(&self, values: &FormValues, _mode: &FormMode) -> Vec<(String, Value)> {
        let mut fields: Vec<(String, Value)> = [
            "name",
            "description",
            "duration_minutes",
            "price",
            "package_type",
            "payment_model",
            "is_active",
        ]
        .into_iter()
        .map(|key| (key.to_string(), string_value(values, key)))
        .collect();

        // Multipart bodies carry the metadata as serialized JSON text
        let metadata = json_object(values, "package_metadata").unwrap_or_default();
        fields.push(("package_metadata".to_string(), Value::String(metadata.to_string())));
        fields
    }
}
