//! Create/edit forms for the editable resources
//!
//! Each entity form declares its fields, seeds them from an existing record,
//! validates synchronously and builds the payload. [`FormModal`] drives one
//! form through submission: validation failures never reach the network, API
//! failures keep the entered values and attach field errors.

pub mod discount;
pub mod field;
pub mod late_fee;
pub mod package;
pub mod station;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{extract_api_error, ApiError, RequestBody};
use crate::models::Record;
use crate::resources::{Resource, ResourceHandle};

pub use field::{FieldKind, Form, FormField, FormValues};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Discount,
    Package,
    LateFee,
    Station,
}

impl FormKind {
    fn entity(self) -> &'static dyn EntityForm {
        match self {
            FormKind::Discount => &discount::DiscountForm,
            FormKind::Package => &package::PackageForm,
            FormKind::LateFee => &late_fee::LateFeeForm,
            FormKind::Station => &station::StationForm,
        }
    }

    pub fn resource(self) -> Resource {
        self.entity().resource()
    }

    /// Singular noun for titles and toasts
    pub fn noun(self) -> &'static str {
        match self {
            FormKind::Discount => "Discount",
            FormKind::Package => "Package",
            FormKind::LateFee => "Late Fee Config",
            FormKind::Station => "Station",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { key: String },
}

impl FormMode {
    pub fn is_create(&self) -> bool {
        matches!(self, FormMode::Create)
    }
}

/// Client-side validation failures in field order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Violations(Vec<(String, String)>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: &str) {
        self.0.push((field.to_string(), message.to_string()));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first_message(&self) -> Option<&str> {
        self.0.first().map(|(_, message)| message.as_str())
    }

    pub fn for_field(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, message)| message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(f, m)| (f.as_str(), m.as_str()))
    }

    pub fn into_result(self) -> Result<(), Violations> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

#[derive(Error, Debug)]
pub enum FormError {
    #[error("{message}")]
    Invalid {
        message: String,
        violations: Violations,
    },

    #[error("{message}")]
    Api {
        message: String,
        #[source]
        source: ApiError,
    },

    #[error("A submission is already in progress")]
    Busy,

    #[error("Unknown field '{field}' for {noun}")]
    UnknownField { field: String, noun: &'static str },

    #[error("Expected key=value, got '{0}'")]
    MalformedPair(String),
}

/// Per-entity form behaviour
pub trait EntityForm: Sync {
    fn resource(&self) -> Resource;

    /// Fields shown in `mode`; edit mode leaves out immutable ones
    fn fields(&self, mode: &FormMode) -> Vec<FormField>;

    /// Field values taken from an existing record
    fn seed(&self, record: &Record) -> FormValues;

    fn validate(&self, values: &FormValues, mode: &FormMode) -> Result<(), Violations>;

    /// Field list for the request body, before encoding
    fn payload(&self, values: &FormValues, mode: &FormMode) -> Vec<(String, Value)>;
}

/// One form being filled in, in the TUI modal or from CLI arguments
#[derive(Debug, Clone)]
pub struct FormModal {
    kind: FormKind,
    mode: FormMode,
    pub form: Form,
    submitting: bool,
    error: Option<String>,
}

impl FormModal {
    pub fn create(kind: FormKind) -> Self {
        let mode = FormMode::Create;
        Self {
            form: Form::new(kind.entity().fields(&mode)),
            kind,
            mode,
            submitting: false,
            error: None,
        }
    }

    pub fn edit(kind: FormKind, key: &str, record: &Record) -> Self {
        let mode = FormMode::Edit {
            key: key.to_string(),
        };
        let mut form = Form::new(kind.entity().fields(&mode));
        form.fill(&kind.entity().seed(record));
        Self {
            kind,
            mode,
            form,
            submitting: false,
            error: None,
        }
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn title(&self) -> String {
        match &self.mode {
            FormMode::Create => format!("New {}", self.kind.noun()),
            FormMode::Edit { key } => format!("Edit {} {}", self.kind.noun(), key),
        }
    }

    /// Inputs are blocked while a submission is running
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Banner message from the last failed submit
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn values(&self) -> FormValues {
        self.form.values()
    }

    /// Set fields from `key=value` pairs
    pub fn apply_pairs<S: AsRef<str>>(&mut self, pairs: &[S]) -> Result<(), FormError> {
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| FormError::MalformedPair(pair.to_string()))?;
            let field = self
                .form
                .field_mut(key.trim())
                .ok_or_else(|| FormError::UnknownField {
                    field: key.trim().to_string(),
                    noun: self.kind.noun(),
                })?;
            field.set_value(value);
        }
        Ok(())
    }

    pub fn handle_char(&mut self, c: char) {
        if self.submitting {
            return;
        }
        if let Some(field) = self.form.current_field_mut() {
            field.insert_char(c);
        }
    }

    pub fn handle_backspace(&mut self) {
        if self.submitting {
            return;
        }
        if let Some(field) = self.form.current_field_mut() {
            field.delete_char();
        }
    }

    pub fn handle_delete(&mut self) {
        if self.submitting {
            return;
        }
        if let Some(field) = self.form.current_field_mut() {
            field.delete_char_forward();
        }
    }

    pub fn cycle_current(&mut self, forward: bool) {
        if self.submitting {
            return;
        }
        if let Some(field) = self.form.current_field_mut() {
            field.cycle(forward);
        }
    }

    pub fn next_field(&mut self) {
        if !self.submitting {
            self.form.next_field();
        }
    }

    pub fn previous_field(&mut self) {
        if !self.submitting {
            self.form.previous_field();
        }
    }

    /// Validate and encode. Failures are attached to the fields and banner.
    pub fn prepare(&mut self) -> Result<RequestBody, FormError> {
        let entity = self.kind.entity();
        let values = self.form.values();
        self.form.clear_errors();
        self.error = None;

        if let Err(violations) = entity.validate(&values, &self.mode) {
            let message = violations
                .first_message()
                .unwrap_or("Please check the form")
                .to_string();
            debug!("{} form blocked: {}", self.kind.noun(), message);
            self.form
                .apply_errors(violations.iter().map(|(f, m)| (f, m.to_string())));
            self.error = Some(message.clone());
            return Err(FormError::Invalid {
                message,
                violations,
            });
        }

        let fields = entity.payload(&values, &self.mode);
        Ok(entity.resource().body_encoding().encode(fields))
    }

    /// Validate and mark the form as submitting. The caller sends the body
    /// and hands the response to [`FormModal::finish_submit`].
    pub fn begin_submit(&mut self) -> Result<RequestBody, FormError> {
        if self.submitting {
            return Err(FormError::Busy);
        }
        let body = self.prepare()?;
        self.submitting = true;
        Ok(body)
    }

    /// Settle a submission. Returns the message for the success toast.
    pub fn finish_submit(&mut self, result: Result<Option<String>, ApiError>) -> Result<String, FormError> {
        self.submitting = false;
        match result {
            Ok(message) => {
                let verb = if self.mode.is_create() { "created" } else { "updated" };
                info!("{} {}", self.kind.noun(), verb);
                Ok(message.unwrap_or_else(|| format!("{} {} successfully", self.kind.noun(), verb)))
            }
            Err(source) => {
                let extracted = extract_api_error(&source);
                warn!("{} submit failed: {}", self.kind.noun(), extracted.message);
                for (field, messages) in &extracted.field_errors {
                    if let Some(f) = self.form.field_mut(field) {
                        f.validation_error = Some(messages.join(" "));
                    }
                }
                self.error = Some(extracted.message.clone());
                Err(FormError::Api {
                    message: extracted.message,
                    source,
                })
            }
        }
    }

    /// Send the create or update request for this form's mode
    pub async fn send(&self, handle: &ResourceHandle, body: RequestBody) -> Result<Option<String>, ApiError> {
        match &self.mode {
            FormMode::Create => handle.create(body).await,
            FormMode::Edit { key } => handle.update(key, body).await,
        }
    }

    /// Validate, then send exactly one create or update request.
    pub async fn submit(&mut self, handle: &ResourceHandle) -> Result<String, FormError> {
        let body = self.begin_submit()?;
        let result = self.send(handle, body).await;
        self.finish_submit(result)
    }
}

// Shared parsing helpers for the entity forms

pub(crate) fn value<'a>(values: &'a FormValues, key: &str) -> &'a str {
    values.get(key).map(|v| v.trim()).unwrap_or("")
}

pub(crate) fn decimal(values: &FormValues, key: &str) -> Option<f64> {
    value(values, key)
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

pub(crate) fn whole(values: &FormValues, key: &str) -> Option<i64> {
    value(values, key).parse::<i64>().ok()
}

/// Empty is allowed; anything else must be a JSON object
pub(crate) fn json_object(values: &FormValues, key: &str) -> Option<Value> {
    let raw = value(values, key);
    if raw.is_empty() {
        return Some(Value::Object(Default::default()));
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(parsed @ Value::Object(_)) => Some(parsed),
        _ => None,
    }
}

/// Numeric text as a JSON number, empty as null
pub(crate) fn number_value(values: &FormValues, key: &str) -> Value {
    let raw = value(values, key);
    if raw.is_empty() {
        return Value::Null;
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(n @ Value::Number(_)) => n,
        _ => Value::String(raw.to_string()),
    }
}

pub(crate) fn string_value(values: &FormValues, key: &str) -> Value {
    Value::String(value(values, key).to_string())
}

pub(crate) fn bool_value(values: &FormValues, key: &str) -> Value {
    Value::Bool(value(values, key) == "true")
}

/// Decode a record into its typed model, falling back to defaults
pub(crate) fn typed<T: DeserializeOwned + Default>(record: &Record) -> T {
    serde_json::from_value(record.0.clone()).unwrap_or_else(|err| {
        warn!("Record did not match the expected shape: {}", err);
        T::default()
    })
}

/// Date part of a timestamp (`2026-01-31T10:00:00Z` → `2026-01-31`)
pub(crate) fn date_part(raw: &str) -> String {
    raw.split(|c| c == 'T' || c == ' ').next().unwrap_or(raw).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::session::Session;
    use mockito::Matcher;

    fn handle(server: &mockito::ServerGuard, resource: Resource) -> ResourceHandle {
        let api = ApiClient::with_base_url(&server.url(), Session::bearer("tok")).unwrap();
        ResourceHandle::new(api, resource)
    }

    fn valid_discount() -> FormModal {
        let mut modal = FormModal::create(FormKind::Discount);
        modal
            .apply_pairs(&[
                "station_id=12",
                "package_id=3",
                "discount_percent=25",
                "max_total_uses=10",
                "max_uses_per_user=1",
                "valid_from=2026-01-01",
                "valid_until=2026-02-01",
            ])
            .unwrap();
        modal
    }

    fn part(name: &str, value: &str) -> Matcher {
        Matcher::Regex(format!("name=\"{}\"\r\n\r\n{}\r\n", name, value))
    }

    #[tokio::test]
    async fn test_discount_out_of_range_never_hits_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", Matcher::Any).expect(0).create_async().await;

        let mut modal = valid_discount();
        modal.apply_pairs(&["discount_percent=150"]).unwrap();
        let err = modal.submit(&handle(&server, Resource::Discounts)).await.unwrap_err();

        assert_eq!(err.to_string(), "Discount percent must be between 0 and 100");
        assert_eq!(modal.error(), Some("Discount percent must be between 0 and 100"));
        assert_eq!(
            modal.form.field("discount_percent").unwrap().validation_error.as_deref(),
            Some("Discount percent must be between 0 and 100")
        );
        assert_eq!(modal.values().get("discount_percent").map(String::as_str), Some("150"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_valid_discount_posts_one_multipart_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/discounts")
            .match_header("content-type", Matcher::Regex("^multipart/form-data".into()))
            .match_body(Matcher::AllOf(vec![
                part("station_id", "12"),
                part("package_id", "3"),
                part("discount_percent", "25"),
                part("max_total_uses", "10"),
                part("max_uses_per_user", "1"),
                part("status", "active"),
            ]))
            .with_status(201)
            .with_body(r#"{"success":true,"message":"Discount created successfully","data":{"id":"d1"}}"#)
            .expect(1)
            .create_async()
            .await;

        let mut modal = valid_discount();
        let message = modal.submit(&handle(&server, Resource::Discounts)).await.unwrap();

        assert_eq!(message, "Discount created successfully");
        assert!(!modal.is_submitting());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_failure_keeps_values_and_marks_fields() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PATCH", "/api/admin/late-fee-configs/7")
            .with_status(400)
            .with_body(r#"{"name":["Late fee config with this name already exists."]}"#)
            .expect(1)
            .create_async()
            .await;

        let record = Record(serde_json::json!({
            "id": 7, "name": "Standard", "fee_type": "multiplier",
            "multiplier": "2.00", "grace_period_minutes": 15, "is_active": true
        }));
        let mut modal = FormModal::edit(FormKind::LateFee, "7", &record);
        let err = modal.submit(&handle(&server, Resource::LateFees)).await.unwrap_err();

        assert!(matches!(err, FormError::Api { .. }));
        assert_eq!(modal.error(), Some("Invalid request. Please check your input."));
        assert_eq!(
            modal.form.field("name").unwrap().validation_error.as_deref(),
            Some("Late fee config with this name already exists.")
        );
        assert_eq!(modal.values().get("multiplier").map(String::as_str), Some("2.00"));
        mock.assert_async().await;
    }

    #[test]
    fn test_input_blocked_while_submitting() {
        let mut modal = FormModal::create(FormKind::LateFee);
        modal
            .apply_pairs(&["name=Standard", "fee_type=flat_rate", "flat_rate_per_hour=20"])
            .unwrap();
        modal.begin_submit().unwrap();
        assert!(modal.is_submitting());
        assert!(matches!(modal.begin_submit(), Err(FormError::Busy)));

        modal.handle_backspace();
        modal.next_field();
        assert_eq!(modal.values().get("name").map(String::as_str), Some("Standard"));
        assert_eq!(modal.form.current_field, 0);

        assert_eq!(modal.finish_submit(Ok(None)).unwrap(), "Late Fee Config created successfully");
        assert!(!modal.is_submitting());
    }

    #[test]
    fn test_apply_pairs_errors() {
        let mut modal = FormModal::create(FormKind::Station);
        assert!(matches!(
            modal.apply_pairs(&["colour=red"]),
            Err(FormError::UnknownField { .. })
        ));
        assert!(matches!(
            modal.apply_pairs(&["station_name"]),
            Err(FormError::MalformedPair(_))
        ));
    }

    #[test]
    fn test_titles() {
        assert_eq!(FormModal::create(FormKind::LateFee).title(), "New Late Fee Config");
        let record = Record(serde_json::json!({ "serial_number": "PB-1" }));
        assert_eq!(
            FormModal::edit(FormKind::Station, "PB-1", &record).title(),
            "Edit Station PB-1"
        );
    }

    #[test]
    fn test_helpers() {
        let mut values = FormValues::new();
        values.insert("n".into(), " 2.5 ".into());
        values.insert("meta".into(), "[1]".into());
        assert_eq!(decimal(&values, "n"), Some(2.5));
        assert_eq!(number_value(&values, "n"), serde_json::json!(2.5));
        assert_eq!(number_value(&values, "missing"), Value::Null);
        assert!(json_object(&values, "meta").is_none());
        assert_eq!(date_part("2026-01-31T10:00:00Z"), "2026-01-31");
    }
}
