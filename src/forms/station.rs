use serde_json::Value;

use super::{
    bool_value, decimal, json_object, number_value, string_value, typed, value, whole, EntityForm,
    FormField, FormMode, FormValues, Violations,
};
use crate::models::{Record, Station};
use crate::resources::Resource;

const STATUSES: [&str; 4] = ["active", "inactive", "maintenance", "offline"];

pub struct StationForm;

impl EntityForm for StationForm {
    fn resource(&self) -> Resource {
        Resource::Stations
    }

    fn fields(&self, mode: &FormMode) -> Vec<FormField> {
        let mut fields = vec![FormField::text("station_name", "Station Name")];
        if mode.is_create() {
            fields.push(FormField::text("serial_number", "Serial Number"));
            fields.push(FormField::text("imei", "IMEI").with_placeholder("15 digits"));
        }
        fields.extend([
            FormField::number("latitude", "Latitude"),
            FormField::number("longitude", "Longitude"),
            FormField::text("address", "Address"),
            FormField::text("landmark", "Landmark"),
        ]);
        if mode.is_create() {
            fields.push(FormField::number("total_slots", "Total Slots").with_value("8"));
        }
        fields.extend([
            FormField::choice("status", "Status", &STATUSES),
            FormField::toggle("is_maintenance", "Maintenance Mode").with_value("false"),
            FormField::json("hardware_info", "Hardware Info (JSON)"),
        ]);
        fields
    }

    fn seed(&self, record: &Record) -> FormValues {
        let station: Station = typed(record);
        let mut values = FormValues::new();
        values.insert("station_name".into(), station.station_name);
        values.insert("serial_number".into(), station.serial_number);
        values.insert("imei".into(), station.imei);
        values.insert("address".into(), station.address);
        for (key, v) in [
            ("latitude", station.latitude),
            ("longitude", station.longitude),
            ("landmark", station.landmark),
            ("total_slots", station.total_slots.map(|n| n.to_string())),
        ] {
            if let Some(v) = v {
                values.insert(key.into(), v);
            }
        }
        if !station.status.is_empty() {
            values.insert("status".into(), station.status);
        }
        values.insert("is_maintenance".into(), station.is_maintenance.to_string());
        if let Some(info) = station.hardware_info.filter(|i| !i.is_null()) {
            values.insert("hardware_info".into(), info.to_string());
        }
        values
    }

    fn validate(&self, values: &FormValues, mode: &FormMode) -> Result<(), Violations> {
        let mut violations = Violations::new();

        if value(values, "station_name").is_empty() {
            violations.push("station_name", "Station name is required");
        }

        if mode.is_create() {
            if value(values, "serial_number").is_empty() {
                violations.push("serial_number", "Serial number is required");
            }
            let imei = value(values, "imei");
            if imei.len() != 15 || !imei.chars().all(|c| c.is_ascii_digit()) {
                violations.push("imei", "IMEI must be exactly 15 digits");
            }
            if !matches!(whole(values, "total_slots"), Some(n) if n > 0) {
                violations.push("total_slots", "Total slots must be greater than 0");
            }
        }

        if !matches!(decimal(values, "latitude"), Some(lat) if (-90.0..=90.0).contains(&lat)) {
            violations.push("latitude", "Latitude must be between -90 and 90");
        }
        if !matches!(decimal(values, "longitude"), Some(lng) if (-180.0..=180.0).contains(&lng)) {
            violations.push("longitude", "Longitude must be between -180 and 180");
        }
        if value(values, "address").is_empty() {
            violations.push("address", "Address is required");
        }
        if !STATUSES.contains(&value(values, "status")) {
            violations.push("status", "Please choose a status");
        }
        if json_object(values, "hardware_info").is_none() {
            violations.push("hardware_info", "Hardware info must be a valid JSON object");
        }

        violations.into_result()
    }

    fn payload(&self, values: &FormValues, mode: &FormMode) -> Vec<(String, Value)> {
        let mut fields = vec![("station_name".to_string(), string_value(values, "station_name"))];
        if mode.is_create() {
            fields.push(("serial_number".to_string(), string_value(values, "serial_number")));
            fields.push(("imei".to_string(), string_value(values, "imei")));
            fields.push(("total_slots".to_string(), number_value(values, "total_slots")));
        }
        fields.extend([
            ("latitude".to_string(), number_value(values, "latitude")),
            ("longitude".to_string(), number_value(values, "longitude")),
            ("address".to_string(), string_value(values, "address")),
            ("landmark".to_string(), string_value(values, "landmark")),
            ("status".to_string(), string_value(values, "status")),
            ("is_maintenance".to_string(), bool_value(values, "is_maintenance")),
            (
                "hardware_info".to_string(),
                json_object(values, "hardware_info").unwrap_or_default(),
            ),
        ]);
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete() -> FormValues {
        [
            ("station_name", "Durbar Marg Kiosk"),
            ("serial_number", "PB-0042"),
            ("imei", "356938035643809"),
            ("latitude", "27.7120"),
            ("longitude", "85.3170"),
            ("address", "Durbar Marg, Kathmandu"),
            ("total_slots", "8"),
            ("status", "active"),
            ("is_maintenance", "false"),
            ("hardware_info", r#"{"firmware": "1.4.2"}"#),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_create_rules() {
        assert!(StationForm.validate(&complete(), &FormMode::Create).is_ok());

        let mut v = complete();
        v.insert("imei".into(), "12345".into());
        v.insert("total_slots".into(), "0".into());
        v.insert("latitude".into(), "91".into());
        let err = StationForm.validate(&v, &FormMode::Create).unwrap_err();
        assert_eq!(err.for_field("imei"), Some("IMEI must be exactly 15 digits"));
        assert_eq!(err.for_field("total_slots"), Some("Total slots must be greater than 0"));
        assert_eq!(err.for_field("latitude"), Some("Latitude must be between -90 and 90"));
    }

    #[test]
    fn test_edit_omits_immutable_fields() {
        let edit = FormMode::Edit { key: "PB-0042".into() };
        let mut v = complete();
        v.insert("imei".into(), "bad".into());
        v.insert("total_slots".into(), "0".into());
        assert!(StationForm.validate(&v, &edit).is_ok());

        let keys: Vec<String> = StationForm.payload(&v, &edit).into_iter().map(|(k, _)| k).collect();
        for immutable in ["serial_number", "imei", "total_slots"] {
            assert!(!keys.contains(&immutable.to_string()), "{}", immutable);
        }
        let field_keys: Vec<String> = StationForm.fields(&edit).into_iter().map(|f| f.key).collect();
        assert!(!field_keys.contains(&"imei".to_string()));
    }

    #[test]
    fn test_payload_types() {
        let payload: serde_json::Map<String, Value> =
            StationForm.payload(&complete(), &FormMode::Create).into_iter().collect();
        assert_eq!(payload["latitude"], json!(27.712));
        assert_eq!(payload["total_slots"], json!(8));
        assert_eq!(payload["is_maintenance"], json!(false));
        assert_eq!(payload["hardware_info"], json!({ "firmware": "1.4.2" }));
    }

    #[test]
    fn test_seed_tolerates_null_fields() {
        let seeded = StationForm.seed(&Record(json!({
            "station_name": "Durbar Marg Kiosk", "serial_number": "PB-0042", "imei": null,
            "latitude": "27.7120", "longitude": 85.317, "address": null, "landmark": null,
            "total_slots": 8, "status": "active", "is_maintenance": null, "hardware_info": null
        })));
        assert_eq!(seeded["station_name"], "Durbar Marg Kiosk");
        assert_eq!(seeded["serial_number"], "PB-0042");
        assert_eq!(seeded["total_slots"], "8");
        assert_eq!(seeded["address"], "");
        assert_eq!(seeded["is_maintenance"], "false");
    }
}
