//! API error types and the shared error extraction helper

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error. Please check your connection and try again.";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not signed in. Run `pb-admin login --token <TOKEN>` first")]
    Unauthenticated,

    /// No response was received
    #[error("Network error. Please check your connection and try again. ({0})")]
    Transport(#[source] reqwest::Error),

    /// The server answered with a non-2xx status
    #[error("API error (status {status}): {body}")]
    Status { status: u16, body: String },

    /// 2xx response whose envelope says `success: false`
    #[error("API rejected the request: {message}")]
    Rejected { status: u16, message: String },

    #[error("Failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err)
    }
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } | ApiError::Rejected { status, .. } => Some(*status),
            ApiError::Unauthenticated => Some(401),
            _ => None,
        }
    }

    /// Message suitable for a toast / status bar
    pub fn user_message(&self) -> String {
        extract_api_error(self).message
    }
}

/// Error details pulled out of a failed request
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractedError {
    pub message: String,
    pub status: Option<u16>,
    pub code: Option<String>,
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl ExtractedError {
    pub fn field_error(&self, field: &str) -> Option<String> {
        self.field_errors
            .get(field)
            .filter(|messages| !messages.is_empty())
            .map(|messages| messages.join(" "))
    }
}

/// Static fallback message per HTTP status
pub fn status_message(status: u16) -> String {
    let message = match status {
        400 => "Invalid request. Please check your input.",
        401 => "Your session has expired. Please log in again.",
        403 => "You don't have permission to perform this action.",
        404 => "The requested resource was not found.",
        409 => "This action conflicts with the current state of the resource.",
        422 => "The submitted data is invalid.",
        429 => "Too many requests. Please slow down and try again.",
        500 => "Internal server error. Please try again later.",
        502 => "Bad gateway. The server is temporarily unreachable.",
        503 => "Service unavailable. Please try again later.",
        other => return format!("Request failed with status {}", other),
    };
    message.to_string()
}

/// Turn any [`ApiError`] into a displayable message plus field errors
pub fn extract_api_error(err: &ApiError) -> ExtractedError {
    match err {
        ApiError::Transport(_) => ExtractedError {
            message: NETWORK_ERROR_MESSAGE.to_string(),
            ..Default::default()
        },
        ApiError::Unauthenticated => ExtractedError {
            message: err.to_string(),
            status: Some(401),
            ..Default::default()
        },
        ApiError::Status { status, body } => {
            let parsed = serde_json::from_str::<Value>(body).ok();
            extract_from_body(*status, parsed.as_ref())
        }
        ApiError::Rejected { status, message } => ExtractedError {
            message: message.clone(),
            status: Some(*status),
            ..Default::default()
        },
        ApiError::Decode { .. } | ApiError::InvalidRequest(_) => ExtractedError {
            message: err.to_string(),
            ..Default::default()
        },
    }
}

/// Extraction over an already-parsed body.
///
/// Order: `message`, `detail`, `error` (string or `{message, code}`), then the
/// static table for the status code.
pub fn extract_from_body(status: u16, body: Option<&Value>) -> ExtractedError {
    let object = body.and_then(Value::as_object);

    let non_empty_str = |key: &str| {
        object
            .and_then(|o| o.get(key))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let mut code = None;
    let message = non_empty_str("message")
        .or_else(|| non_empty_str("detail"))
        .or_else(|| match object.and_then(|o| o.get("error")) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::Object(e)) => {
                code = e.get("code").and_then(|c| match c {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                });
                e.get("message")
                    .and_then(Value::as_str)
                    .filter(|s| !s.trim().is_empty())
                    .map(str::to_string)
            }
            _ => None,
        })
        .unwrap_or_else(|| status_message(status));

    ExtractedError {
        message,
        status: Some(status),
        code,
        field_errors: body.map(extract_field_errors).unwrap_or_default(),
    }
}

/// Field errors from `errors` or from flat keys holding string arrays
pub fn extract_field_errors(body: &Value) -> BTreeMap<String, Vec<String>> {
    let Some(object) = body.as_object() else {
        return BTreeMap::new();
    };

    if let Some(Value::Object(errors)) = object.get("errors") {
        return errors
            .iter()
            .filter_map(|(field, value)| string_list(value).map(|list| (field.clone(), list)))
            .collect();
    }

    object
        .iter()
        .filter(|(_, value)| value.is_array())
        .filter_map(|(field, value)| string_list(value).map(|list| (field.clone(), list)))
        .collect()
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(s) => Some(vec![s.clone()]),
        Value::Array(items) => {
            let list: Vec<String> = items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect();
            if list.is_empty() || list.len() != items.len() {
                None
            } else {
                Some(list)
            }
        }
        _ => None,
    }
}
