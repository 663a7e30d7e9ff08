//! Response envelope decoding
//!
//! Most endpoints answer `{ success, message, data }`, where `data` is the
//! payload itself, `{ results, pagination }`, or a bare array. Some skip the
//! envelope entirely, and a few use the DRF `{ count, next, previous, results }`
//! shape. Everything is normalised here.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::api::errors::ApiError;
use crate::listing::cursor::{PaginationCursor, RawPagination};

/// A decoded list response
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    pub pagination: Option<PaginationCursor>,
    pub message: Option<String>,
}

impl<T> ListPage<T> {
    pub fn unpaginated(items: Vec<T>) -> Self {
        Self {
            items,
            pagination: None,
            message: None,
        }
    }
}

/// Payload of a successful response after the envelope is removed
#[derive(Debug, Clone, PartialEq)]
pub struct Unwrapped {
    pub data: Value,
    pub message: Option<String>,
}

fn is_envelope(object: &Map<String, Value>) -> bool {
    matches!(object.get("success"), Some(Value::Bool(_)))
        && (object.contains_key("data") || object.contains_key("message"))
}

/// Strip the `{success, message, data}` wrapper when present.
///
/// `success: false` on a 2xx response is reported as [`ApiError::Rejected`].
pub fn unwrap_envelope(status: u16, body: Value) -> Result<Unwrapped, ApiError> {
    match body {
        Value::Object(mut object) if is_envelope(&object) => {
            let message = object
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string);

            if object.get("success") == Some(&Value::Bool(false)) {
                return Err(ApiError::Rejected {
                    status,
                    message: message.unwrap_or_else(|| "Request was not successful".to_string()),
                });
            }

            Ok(Unwrapped {
                data: object.remove("data").unwrap_or(Value::Null),
                message,
            })
        }
        other => Ok(Unwrapped {
            data: other,
            message: None,
        }),
    }
}

/// Decode a single record
pub fn decode_item<T: DeserializeOwned>(path: &str, unwrapped: Unwrapped) -> Result<T, ApiError> {
    serde_json::from_value(unwrapped.data).map_err(|source| ApiError::Decode {
        path: path.to_string(),
        source,
    })
}

/// Decode a list payload; `requested_page`/`requested_size` fill pagination gaps
pub fn decode_list<T: DeserializeOwned>(
    path: &str,
    unwrapped: Unwrapped,
    requested_page: u32,
    requested_size: u32,
) -> Result<ListPage<T>, ApiError> {
    let decode_err = |source| ApiError::Decode {
        path: path.to_string(),
        source,
    };

    let (rows, pagination) = match unwrapped.data {
        Value::Array(rows) => (rows, None),
        Value::Null => (Vec::new(), None),
        Value::Object(mut object) => {
            let rows = take_rows(&mut object).ok_or_else(|| {
                ApiError::InvalidRequest(format!("{} did not return a list", path))
            })?;

            let pagination = match object.remove("pagination") {
                Some(raw @ Value::Object(_)) => Some(
                    serde_json::from_value::<RawPagination>(raw)
                        .map_err(decode_err)?
                        .into_cursor(requested_page, requested_size),
                ),
                _ => object.get("count").and_then(Value::as_u64).map(|count| {
                    PaginationCursor::from_count(requested_page, requested_size, count)
                }),
            };
            (rows, pagination)
        }
        _ => {
            return Err(ApiError::InvalidRequest(format!(
                "{} did not return a list",
                path
            )))
        }
    };

    let items = rows
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<T>, _>>()
        .map_err(decode_err)?;

    Ok(ListPage {
        items,
        pagination,
        message: unwrapped.message,
    })
}

/// `results` when present, otherwise the only array-valued field
fn take_rows(object: &mut Map<String, Value>) -> Option<Vec<Value>> {
    if let Some(Value::Array(rows)) = object.remove("results") {
        return Some(rows);
    }

    let array_keys: Vec<String> = object
        .iter()
        .filter(|(_, value)| value.is_array())
        .map(|(key, _)| key.clone())
        .collect();

    match array_keys.as_slice() {
        [only] => match object.remove(only) {
            Some(Value::Array(rows)) => Some(rows),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn list(body: Value) -> Result<ListPage<Value>, ApiError> {
        let unwrapped = unwrap_envelope(200, body)?;
        decode_list("/api/test", unwrapped, 1, 20)
    }

    #[test]
    fn test_envelope_with_results_and_pagination() {
        let page = list(json!({
            "success": true,
            "message": "ok",
            "data": {
                "results": [{"id": 1}, {"id": 2}],
                "pagination": {
                    "current_page": 1, "total_pages": 3, "total_count": 45,
                    "page_size": 20, "has_next": true, "has_previous": false
                }
            }
        }))
        .unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.message.as_deref(), Some("ok"));
        let cursor = page.pagination.unwrap();
        assert_eq!(cursor.total_pages, 3);
        assert!(cursor.has_next);
    }

    #[test]
    fn test_envelope_with_bare_array() {
        let page = list(json!({ "success": true, "data": [{"id": "a"}] })).unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(page.pagination.is_none());
    }

    #[test]
    fn test_no_envelope_and_drf_shape() {
        let bare = list(json!([{"id": 1}, {"id": 2}, {"id": 3}])).unwrap();
        assert_eq!(bare.items.len(), 3);

        let drf = list(json!({ "count": 41, "next": "x", "previous": null, "results": [{"id": 1}] }))
            .unwrap();
        assert_eq!(drf.pagination.unwrap().total_pages, 3);
    }

    #[test]
    fn test_named_array_field() {
        let page = list(json!({ "success": true, "data": { "stations": [{"id": 1}], "total": 1 } }))
            .unwrap();
        assert_eq!(page.items.len(), 1);
    }

    #[test]
    fn test_success_false_is_rejected() {
        let err = unwrap_envelope(200, json!({ "success": false, "message": "Package inactive" }))
            .unwrap_err();
        match err {
            ApiError::Rejected { status, message } => {
                assert_eq!(status, 200);
                assert_eq!(message, "Package inactive");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_object_without_rows_is_an_error() {
        assert!(list(json!({ "success": true, "data": { "id": 4 } })).is_err());
    }
}
