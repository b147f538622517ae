// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::codec::TransformError;
use crate::pipeline::Stage;
use crate::store::StoreError;

/// HTTP API error with appropriate status codes and client-friendly messages.
///
/// Every failure in the request pipeline is mapped to exactly one of these
/// kinds at the boundary; nothing is retried and no partial success exists.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    MissingFile(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 413 Payload Too Large
    PayloadTooLarge(String),

    // 415 Unsupported Media Type
    UnsupportedMediaType(String),

    // 429 Too Many Requests
    TooManyRequests(String),

    // 500 Internal Server Error
    DecodeFailed(String),
    EncodeFailed(String),
    ArtifactWriteFailed(String),
    InternalError(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::MissingFile(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::PayloadTooLarge(_) => 413,
            ApiError::UnsupportedMediaType(_) => 415,
            ApiError::TooManyRequests(_) => 429,
            ApiError::DecodeFailed(_) => 500,
            ApiError::EncodeFailed(_) => 500,
            ApiError::ArtifactWriteFailed(_) => 500,
            ApiError::InternalError(_) => 500,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::MissingFile(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::PayloadTooLarge(msg) => msg,
            ApiError::UnsupportedMediaType(msg) => msg,
            ApiError::TooManyRequests(msg) => msg,
            ApiError::DecodeFailed(msg) => msg,
            ApiError::EncodeFailed(msg) => msg,
            ApiError::ArtifactWriteFailed(msg) => msg,
            ApiError::InternalError(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::MissingFile(_) => "MISSING_FILE",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
            ApiError::TooManyRequests(_) => "TOO_MANY_REQUESTS",
            ApiError::DecodeFailed(_) => "DECODE_FAILED",
            ApiError::EncodeFailed(_) => "ENCODE_FAILED",
            ApiError::ArtifactWriteFailed(_) => "ARTIFACT_WRITE_FAILED",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn missing_file(message: impl Into<String>) -> Self {
        ApiError::MissingFile(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        ApiError::PayloadTooLarge(message.into())
    }

    pub fn unsupported_media_type(message: impl Into<String>) -> Self {
        ApiError::UnsupportedMediaType(message.into())
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        ApiError::TooManyRequests(message.into())
    }

    pub fn decode_failed(message: impl Into<String>) -> Self {
        ApiError::DecodeFailed(message.into())
    }

    pub fn encode_failed(message: impl Into<String>) -> Self {
        ApiError::EncodeFailed(message.into())
    }

    pub fn artifact_write_failed(message: impl Into<String>) -> Self {
        ApiError::ArtifactWriteFailed(message.into())
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        ApiError::InternalError(message.into())
    }
}

// Convert domain error types to ApiError
impl From<TransformError> for ApiError {
    fn from(err: TransformError) -> Self {
        match err {
            TransformError::EmptyInput => ApiError::missing_file("No image file provided"),
            TransformError::Decode(msg) => {
                ApiError::decode_failed(format!("Image optimization failed: {}", msg))
            }
            TransformError::Encode { format, message } => {
                ApiError::encode_failed(format!("{} encode failed: {}", format, message))
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        // Log the real I/O error but return a generic message
        tracing::error!("temp artifact write failed: {}", err);
        ApiError::artifact_write_failed("Failed to store optimized image")
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(
                stage = %Stage::Errored,
                code = self.error_code(),
                message = self.message(),
                "request failed"
            );
        } else {
            tracing::warn!(
                stage = %Stage::Errored,
                code = self.error_code(),
                message = self.message(),
                "request rejected"
            );
        }
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_match_taxonomy() {
        assert_eq!(ApiError::missing_file("x").status_code(), 400);
        assert_eq!(ApiError::unauthorized("x").status_code(), 401);
        assert_eq!(ApiError::payload_too_large("x").status_code(), 413);
        assert_eq!(ApiError::unsupported_media_type("x").status_code(), 415);
        assert_eq!(ApiError::too_many_requests("x").status_code(), 429);
        assert_eq!(ApiError::decode_failed("x").status_code(), 500);
        assert_eq!(ApiError::encode_failed("x").status_code(), 500);
        assert_eq!(ApiError::artifact_write_failed("x").status_code(), 500);
        assert_eq!(ApiError::internal_error("x").status_code(), 500);
    }

    #[test]
    fn test_json_body_shape() {
        let body = ApiError::unauthorized("Unauthorized - Invalid API key").to_json();
        assert_eq!(body["error"], true);
        assert_eq!(body["code"], "UNAUTHORIZED");
        assert_eq!(body["message"], "Unauthorized - Invalid API key");
    }

    #[test]
    fn test_transform_error_mapping() {
        let err: ApiError = TransformError::EmptyInput.into();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "MISSING_FILE");

        let err: ApiError = TransformError::Decode("bad magic".to_string()).into();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.error_code(), "DECODE_FAILED");
        assert!(err.message().contains("bad magic"));

        let err: ApiError = TransformError::Encode {
            format: "webp".to_string(),
            message: "boom".to_string(),
        }
        .into();
        assert_eq!(err.error_code(), "ENCODE_FAILED");
    }
}
