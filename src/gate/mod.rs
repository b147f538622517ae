//! Request gate: admit/reject checks that run before any decode work.
//!
//! Each gate is a plain function so the contract stays testable without a
//! web framework; the handler composes them in order (auth, rate limit,
//! payload size, media type).

pub mod rate_limit;

pub use rate_limit::FixedWindowLimiter;

use crate::error::ApiError;

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// MIME types the upload filter admits. SVG passes the filter for parity
/// with the original service even though the pipeline has no raster decode
/// path for it; such uploads fail later as a decode error.
pub const ALLOWED_MIME_TYPES: [&str; 4] =
    ["image/jpeg", "image/png", "image/gif", "image/svg+xml"];

/// Reject unless the provided key matches the configured secret exactly.
pub fn check_api_key(provided: Option<&str>, expected: &str) -> Result<(), ApiError> {
    match provided {
        Some(key) if constant_time_eq(key.as_bytes(), expected.as_bytes()) => Ok(()),
        _ => Err(ApiError::unauthorized("Unauthorized - Invalid API key")),
    }
}

// Accumulates the XOR over all bytes instead of short-circuiting on the
// first mismatch. Length is not hidden.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Reject payloads above the configured cap.
pub fn check_payload_size(len: usize, max_bytes: usize) -> Result<(), ApiError> {
    if len > max_bytes {
        return Err(ApiError::payload_too_large(format!(
            "Maximum file size is {}MB",
            max_bytes / (1024 * 1024)
        )));
    }
    Ok(())
}

/// Reject declared MIME types outside the allowlist. Parameters after a
/// semicolon are ignored for the comparison.
pub fn check_media_type(mime: &str) -> Result<(), ApiError> {
    let essence = mime.split(';').next().unwrap_or("").trim();
    if ALLOWED_MIME_TYPES.contains(&essence) {
        Ok(())
    } else {
        Err(ApiError::unsupported_media_type(format!(
            "Only image files are allowed, got {}",
            essence
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_api_key_accepts_match() {
        assert!(check_api_key(Some("secret"), "secret").is_ok());
    }

    #[test]
    fn test_check_api_key_rejects_missing_and_wrong() {
        assert_eq!(
            check_api_key(None, "secret").unwrap_err().status_code(),
            401
        );
        assert_eq!(
            check_api_key(Some("wrong"), "secret")
                .unwrap_err()
                .status_code(),
            401
        );
        // Same length, different content
        assert!(check_api_key(Some("secreT"), "secret").is_err());
    }

    #[test]
    fn test_check_payload_size() {
        assert!(check_payload_size(100, 5 * 1024 * 1024).is_ok());
        assert!(check_payload_size(5 * 1024 * 1024, 5 * 1024 * 1024).is_ok());
        let err = check_payload_size(5 * 1024 * 1024 + 1, 5 * 1024 * 1024).unwrap_err();
        assert_eq!(err.status_code(), 413);
        assert!(err.message().contains("5MB"));
    }

    #[test]
    fn test_check_media_type_allowlist() {
        assert!(check_media_type("image/jpeg").is_ok());
        assert!(check_media_type("image/png").is_ok());
        assert!(check_media_type("image/gif").is_ok());
        assert!(check_media_type("image/svg+xml").is_ok());
        assert!(check_media_type("image/jpeg; charset=utf-8").is_ok());

        assert_eq!(
            check_media_type("text/plain").unwrap_err().status_code(),
            415
        );
        assert!(check_media_type("image/webp").is_err());
        assert!(check_media_type("application/octet-stream").is_err());
    }
}
