use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Untyped row as returned by any list endpoint
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub Value);

impl Record {
    /// Field lookup; dotted accessors walk nested objects (`station.name`)
    pub fn get(&self, accessor: &str) -> Option<&Value> {
        accessor
            .split('.')
            .try_fold(&self.0, |value, part| value.as_object()?.get(part))
    }

    /// Display text of a field, `None` when missing or null
    pub fn text(&self, accessor: &str) -> Option<String> {
        self.get(accessor).and_then(display_value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        Record(value)
    }
}

/// Raw display of a JSON value: strings unquoted, null as `None`
pub fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// `null` reads as the type's default; DRF sends it for blank optional fields
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts strings, numbers and null; DRF sends decimals as strings and ids as either
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Station {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub station_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub serial_number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub imei: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub latitude: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub longitude: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(default)]
    pub landmark: Option<String>,
    #[serde(default)]
    pub total_slots: Option<u32>,
    #[serde(default)]
    pub available_slots: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_maintenance: bool,
    #[serde(default)]
    pub hardware_info: Option<Value>,
    #[serde(default)]
    pub last_heartbeat: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Discount {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub station_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub package_id: Option<String>,
    #[serde(default)]
    pub station_name: Option<String>,
    #[serde(default)]
    pub package_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub discount_percent: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub max_total_uses: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub max_uses_per_user: Option<String>,
    #[serde(default)]
    pub current_usage_count: Option<u64>,
    #[serde(default)]
    pub valid_from: Option<String>,
    #[serde(default)]
    pub valid_until: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RentalPackage {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub duration_minutes: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub package_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub payment_model: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_active: bool,
    #[serde(default)]
    pub package_metadata: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LateFeeConfig {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fee_type: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub multiplier: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub flat_rate_per_hour: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub max_daily_rate: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub grace_period_minutes: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_active: bool,
    #[serde(default)]
    pub description: Option<String>,
}

/// Vendor or franchise partner
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Partner {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, alias = "name", deserialize_with = "null_as_default")]
    pub business_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub partner_type: String,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub revenue_share_percent: Option<String>,
    #[serde(default)]
    pub station_count: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
}

/// One row of partner revenue analytics; amounts are computed server-side
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevenueRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub partner_id: Option<String>,
    #[serde(default)]
    pub partner_name: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub gross_revenue: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub partner_share: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub platform_share: Option<String>,
    #[serde(default)]
    pub rental_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partner_name_alias_and_revenue_strings() {
        let partner: Partner = serde_json::from_value(json!({
            "id": 9, "name": "Kathmandu Cafe", "partner_type": "vendor",
            "revenue_share_percent": "12.50", "status": "active"
        }))
        .unwrap();
        assert_eq!(partner.business_name, "Kathmandu Cafe");
        assert_eq!(partner.revenue_share_percent.as_deref(), Some("12.50"));

        let revenue: RevenueRecord =
            serde_json::from_value(json!({ "partner_id": 9, "gross_revenue": 1520.5 })).unwrap();
        assert_eq!(revenue.partner_id.as_deref(), Some("9"));
        assert_eq!(revenue.gross_revenue.as_deref(), Some("1520.5"));
    }

    #[test]
    fn test_record_nested_accessor() {
        let record = Record(json!({ "id": 4, "station": { "name": "Mall" }, "note": null }));
        assert_eq!(record.text("id").as_deref(), Some("4"));
        assert_eq!(record.text("station.name").as_deref(), Some("Mall"));
        assert_eq!(record.text("note"), None);
        assert_eq!(record.get("actions"), None);
    }

    #[test]
    fn test_discount_accepts_decimal_strings_and_numbers() {
        let discount: Discount = serde_json::from_value(json!({
            "id": "b7c1",
            "station_id": 12,
            "package_id": "3",
            "discount_percent": "25.00",
            "max_total_uses": 10,
            "max_uses_per_user": null,
            "status": "active"
        }))
        .unwrap();

        assert_eq!(discount.station_id.as_deref(), Some("12"));
        assert_eq!(discount.discount_percent.as_deref(), Some("25.00"));
        assert_eq!(discount.max_total_uses.as_deref(), Some("10"));
        assert_eq!(discount.max_uses_per_user, None);
    }

    #[test]
    fn test_null_fields_read_as_defaults() {
        let package: RentalPackage = serde_json::from_value(json!({
            "id": 3, "name": "1 Hour", "description": null, "package_type": null,
            "payment_model": "prepaid", "is_active": null, "package_metadata": null
        }))
        .unwrap();
        assert_eq!(package.name, "1 Hour");
        assert_eq!(package.description, "");
        assert!(!package.is_active);

        let partner: Partner =
            serde_json::from_value(json!({ "business_name": "Cafe", "partner_type": null, "status": null }))
                .unwrap();
        assert_eq!(partner.business_name, "Cafe");
        assert_eq!(partner.status, "");
    }

    #[test]
    fn test_bools_display_raw() {
        assert_eq!(display_value(&json!(true)).as_deref(), Some("true"));
        assert_eq!(display_value(&json!(false)).as_deref(), Some("false"));
    }

    #[test]
    fn test_station_defaults_for_missing_fields() {
        let station: Station =
            serde_json::from_value(json!({ "serial_number": "PB-0001", "total_slots": 8 })).unwrap();
        assert_eq!(station.serial_number, "PB-0001");
        assert_eq!(station.total_slots, Some(8));
        assert!(station.id.is_none());
        assert!(!station.is_maintenance);
    }
}
