//! The `{success, message, data?, error?}` wrapper every `/api/v1` response is rendered in.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error detail carried by failed responses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorBody {
    /// Machine-readable code such as `VALIDATION_ERROR` or `INSUFFICIENT_FUNDS`
    pub code: String,
    pub details: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorBody>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>, code: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: Some(ApiErrorBody {
                code: code.into(),
                details: details.into(),
            }),
        }
    }
}

impl ApiResponse<()> {
    /// A successful response with no payload
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_omits_error() {
        let body = serde_json::to_value(ApiResponse::success("ok", json!({"id": 1}))).unwrap();
        assert_eq!(body, json!({"success": true, "message": "ok", "data": {"id": 1}}));
    }

    #[test]
    fn test_failure_omits_data() {
        let body = serde_json::to_value(ApiResponse::<()>::failure("Validation failed", "VALIDATION_ERROR", "title is required")).unwrap();
        assert_eq!(
            body,
            json!({
                "success": false,
                "message": "Validation failed",
                "error": {"code": "VALIDATION_ERROR", "details": "title is required"}
            })
        );
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Order {
        id: u32,
    }

    #[test]
    fn test_failure_deserializes_without_payload() {
        let body = json!({
            "success": false,
            "message": "Order not found",
            "error": {"code": "NOT_FOUND", "details": "Order with ID 7 not found"}
        });
        let parsed: ApiResponse<Order> = serde_json::from_value(body).unwrap();
        assert!(parsed.data.is_none());
        assert_eq!(parsed.error.unwrap().code, "NOT_FOUND");

        let parsed: ApiResponse<Order> = serde_json::from_value(json!({"success": true, "message": "ok", "data": {"id": 7}})).unwrap();
        assert_eq!(parsed.data, Some(Order { id: 7 }));
    }
}
