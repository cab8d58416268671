use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Values of the `code` field in error bodies. Clients match on these, not
/// on `message`.
pub mod error_code {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const DUPLICATE_CODE: &str = "DUPLICATE_CODE";
    pub const ALREADY_EXISTS: &str = "ALREADY_EXISTS";
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const INTERNAL: &str = "INTERNAL";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
}

/// Error type shared by every service crate.
///
/// Each variant maps to a stable error code (see [`error_code`]) and an
/// HTTP status code. Client errors carry their message verbatim:
///
/// ```json
/// {"code": "DUPLICATE_CODE", "message": "code 'TS00007' already exists"}
/// ```
///
/// Server errors carry a generic message plus the underlying detail:
///
/// ```json
/// {"code": "STORAGE_ERROR", "message": "storage unavailable", "detail": "..."}
/// ```
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Resource does not exist. HTTP 404.
    #[error("{0}")]
    NotFound(String),

    /// A human-readable code (asset code, voucher number) is already taken.
    /// Carries the offending code. HTTP 409.
    #[error("code '{0}' already exists")]
    DuplicateCode(String),

    /// Any other conflict with current state. HTTP 409.
    #[error("{0}")]
    Conflict(String),

    /// Input data is invalid. HTTP 400.
    #[error("{0}")]
    Validation(String),

    /// Storage backend failure. HTTP 500.
    #[error("{0}")]
    Storage(String),

    /// Unexpected internal error. HTTP 500.
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    /// HTTP status and stable code for each variant.
    fn classify(&self) -> (StatusCode, &'static str) {
        use error_code::*;
        match self {
            ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, NOT_FOUND),
            ServiceError::DuplicateCode(_) => (StatusCode::CONFLICT, DUPLICATE_CODE),
            ServiceError::Conflict(_) => (StatusCode::CONFLICT, ALREADY_EXISTS),
            ServiceError::Validation(_) => (StatusCode::BAD_REQUEST, VALIDATION_FAILED),
            ServiceError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, STORAGE_ERROR),
            ServiceError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL),
        }
    }

    pub fn error_code(&self) -> &'static str {
        self.classify().1
    }

    pub fn status_code(&self) -> StatusCode {
        self.classify().0
    }

    /// JSON body sent to clients.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ServiceError::Storage(detail) => serde_json::json!({
                "code": self.error_code(),
                "message": "storage unavailable",
                "detail": detail,
            }),
            ServiceError::Internal(detail) => serde_json::json!({
                "code": self.error_code(),
                "message": "internal server error",
                "detail": detail,
            }),
            _ => serde_json::json!({
                "code": self.error_code(),
                "message": self.to_string(),
            }),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (self.status_code(), axum::Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_mapping() {
        let cases = [
            (ServiceError::NotFound("x".into()), 404, "NOT_FOUND"),
            (ServiceError::DuplicateCode("x".into()), 409, "DUPLICATE_CODE"),
            (ServiceError::Conflict("x".into()), 409, "ALREADY_EXISTS"),
            (ServiceError::Validation("x".into()), 400, "VALIDATION_FAILED"),
            (ServiceError::Storage("x".into()), 500, "STORAGE_ERROR"),
            (ServiceError::Internal("x".into()), 500, "INTERNAL"),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status_code().as_u16(), status, "{err:?}");
            assert_eq!(err.error_code(), code);
        }
    }

    #[test]
    fn duplicate_code_names_the_code() {
        let err = ServiceError::DuplicateCode("TS00007".into());
        assert_eq!(err.to_string(), "code 'TS00007' already exists");
        assert_eq!(err.to_json()["message"], "code 'TS00007' already exists");
    }

    #[test]
    fn server_errors_hide_detail_in_message() {
        let json = ServiceError::Storage("disk I/O error".into()).to_json();
        assert_eq!(json["code"], "STORAGE_ERROR");
        assert_eq!(json["message"], "storage unavailable");
        assert_eq!(json["detail"], "disk I/O error");
    }

    #[tokio::test]
    async fn json_response_format() {
        let resp = ServiceError::NotFound("asset 7 not found".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["message"], "asset 7 not found");
    }
}
