//! Response envelope decoding
//!
//! Every JSON endpoint answers `{success, message, data?, error?, errors?}`;
//! list endpoints add `pagination`. Error statuses are classified into
//! [`ClientError`] variants here, once, for every resource.

use crate::error::{ClientError, Result};
use crate::model::{Page, Pagination};
use crate::remote::transport::ApiResponse;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Standard response wrapper
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub errors: Option<FieldErrors>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Field-level validation detail, sent either as a map or as a list
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FieldErrors {
    Map(BTreeMap<String, Vec<String>>),
    List(Vec<FieldError>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldErrors {
    pub fn into_map(self) -> BTreeMap<String, Vec<String>> {
        match self {
            FieldErrors::Map(map) => map,
            FieldErrors::List(list) => {
                let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
                for e in list {
                    map.entry(e.field).or_default().push(e.message);
                }
                map
            }
        }
    }
}

impl<T> Envelope<T> {
    fn failure_message(&self, fallback: &str) -> String {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| fallback.to_string())
    }

    fn into_error(self, status: u16) -> ClientError {
        let message = self.failure_message(&format!("request failed with status {}", status));
        let fields = self.errors.map(FieldErrors::into_map).unwrap_or_default();
        ClientError::from_status(status, message, fields)
    }
}

/// Decode a response into its envelope, turning failures into errors
pub fn decode<T: DeserializeOwned>(response: &ApiResponse) -> Result<Envelope<T>> {
    if !response.is_success() {
        return Err(error_from(response));
    }

    let envelope: Envelope<T> = serde_json::from_slice(&response.body)?;
    if !envelope.success {
        // 2xx with success=false: the server refused the payload
        return Err(envelope.into_error(400));
    }
    Ok(envelope)
}

/// Decode the `data` member, which must be present
pub fn decode_data<T: DeserializeOwned>(response: &ApiResponse) -> Result<T> {
    decode::<T>(response)?
        .data
        .ok_or_else(|| ClientError::Decode("response envelope has no data".to_string()))
}

/// Decode a list response into a page
pub fn decode_page<T: DeserializeOwned>(response: &ApiResponse) -> Result<Page<T>> {
    let envelope = decode::<Vec<T>>(response)?;
    let items = envelope
        .data
        .ok_or_else(|| ClientError::Decode("list response has no data".to_string()))?;
    let pagination = envelope
        .pagination
        .unwrap_or_else(|| Pagination::single(items.len() as u64));
    Ok(Page { items, pagination })
}

/// Check a response whose body carries no data of interest
pub fn expect_success(response: &ApiResponse) -> Result<()> {
    decode::<serde_json::Value>(response).map(|_| ())
}

/// Build the error for a non-2xx response, using the envelope if there is one
pub fn error_from(response: &ApiResponse) -> ClientError {
    match serde_json::from_slice::<Envelope<serde_json::Value>>(&response.body) {
        Ok(envelope) => envelope.into_error(response.status),
        Err(_) => {
            let text = String::from_utf8_lossy(&response.body).trim().to_string();
            let message = if text.is_empty() {
                format!("request failed with status {}", response.status)
            } else {
                text
            };
            ClientError::from_status(response.status, message, BTreeMap::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UnreadCount;
    use serde_json::json;

    #[test]
    fn test_decode_data() {
        let response = ApiResponse::json(200, &json!({"success": true, "data": {"count": 4}}));
        let count: UnreadCount = decode_data(&response).unwrap();
        assert_eq!(count.count, 4);
    }

    #[test]
    fn test_missing_data_is_decode_error() {
        let response = ApiResponse::json(200, &json!({"success": true}));
        let err = decode_data::<UnreadCount>(&response).unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn test_conflict_status() {
        let response = ApiResponse::json(
            409,
            &json!({"success": false, "error": "Application is already rejected"}),
        );
        let err = decode_data::<UnreadCount>(&response).unwrap_err();
        assert_eq!(err, ClientError::conflict("Application is already rejected"));
    }

    #[test]
    fn test_validation_fields_as_list() {
        let response = ApiResponse::json(
            422,
            &json!({
                "success": false,
                "message": "Invalid payload",
                "errors": [
                    {"field": "coverLetter", "message": "too long"},
                    {"field": "coverLetter", "message": "contains links"}
                ]
            }),
        );
        match error_from(&response) {
            ClientError::Validation { message, fields } => {
                assert_eq!(message, "Invalid payload");
                assert_eq!(fields["coverLetter"].len(), 2);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_validation_fields_as_map() {
        let response = ApiResponse::json(
            400,
            &json!({"success": false, "errors": {"title": ["required"]}}),
        );
        match error_from(&response) {
            ClientError::Validation { fields, .. } => {
                assert_eq!(fields["title"], vec!["required".to_string()])
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_non_json_error_body() {
        let response = ApiResponse::new(502, b"Bad Gateway".to_vec());
        let err = error_from(&response);
        assert!(err.is_retryable());
        assert!(err.to_string().contains("Bad Gateway"));
    }

    #[test]
    fn test_unauthorized() {
        let response = ApiResponse::json(401, &json!({"success": false, "message": "Token expired"}));
        assert!(error_from(&response).is_auth());
    }

    #[test]
    fn test_success_false_on_2xx() {
        let response = ApiResponse::json(200, &json!({"success": false, "error": "Nope"}));
        let err = expect_success(&response).unwrap_err();
        assert!(matches!(err, ClientError::Validation { .. }));
    }

    #[test]
    fn test_decode_page_without_pagination() {
        let response = ApiResponse::json(
            200,
            &json!({"success": true, "data": [{"count": 1}, {"count": 2}]}),
        );
        let page: Page<UnreadCount> = decode_page(&response).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page.pagination.total, 2);
        assert!(!page.pagination.has_next_page);
    }

    #[test]
    fn test_decode_page_with_pagination() {
        let response = ApiResponse::json(
            200,
            &json!({
                "success": true,
                "data": [],
                "pagination": {
                    "page": 3, "limit": 10, "total": 25, "totalPages": 3,
                    "hasNextPage": false, "hasPrevPage": true
                }
            }),
        );
        let page: Page<UnreadCount> = decode_page(&response).unwrap();
        assert!(page.is_empty());
        assert_eq!(page.pagination.page, 3);
        assert!(page.pagination.has_prev_page);
    }
}
