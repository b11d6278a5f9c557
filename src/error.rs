//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// This enum represents all possible errors that can occur in the application.
/// Each variant maps to a specific HTTP status code and error message.
///
/// # Error Categories
///
/// - **Database Errors**: Any sqlx::Error from key store operations
/// - **Configuration Errors**: Invalid service settings or a provisioning
///   collision; these are startup-fatal and abort before the server binds
/// - **Authentication Errors**: Missing or mismatched API keys (the caller's
///   fault, reported as 401)
/// - **Lookup Errors**: The authenticating service's own credential is not
///   registered (our fault, reported as 500, never as 401)
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Key store operation failed (e.g., connection error, query error).
    ///
    /// This wraps any sqlx::Error using the `#[from]` attribute, which
    /// automatically implements `From<sqlx::Error> for AppError`.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Service settings are missing or invalid, or startup provisioning
    /// collided with an existing, differently-identified registration.
    ///
    /// Fatal at startup: the process must not begin serving traffic.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// No registered service matched a credential lookup.
    ///
    /// At request time this means the authenticating service itself has no
    /// row in the key store (or the configured name no longer matches it),
    /// which is our misconfiguration rather than the caller's. Returns
    /// HTTP 500, deliberately not 401.
    #[error("Service not found")]
    ServiceNotFound,

    /// API key header was present but did not match the registered key.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid Api Key")]
    InvalidApiKey,

    /// No API key header was presented (or the value was blank).
    ///
    /// Returns HTTP 401 Unauthorized. Kept distinct from `InvalidApiKey`
    /// so absence and mismatch remain distinguishable outcomes.
    #[error("Missing Api Key")]
    MissingApiKey,

    /// Inserting a service violated a uniqueness constraint on the key
    /// store (`service_id`, `service_name`, or `api_key`).
    ///
    /// Surfaced distinctly from a generic database failure because the
    /// provisioning routine must tell an existing registration apart from
    /// a broken store.
    #[error("Service already registered")]
    DuplicateService,
}

/// Convert AppError into an HTTP response.
///
/// This implementation allows Axum handlers to return `Result<T, AppError>`
/// and have errors automatically converted to proper HTTP responses.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// # Status Code Mapping
///
/// - `MissingApiKey` → 401 Unauthorized
/// - `InvalidApiKey` → 401 Unauthorized
/// - `DuplicateService` → 409 Conflict
/// - `ServiceNotFound` → 500 Internal Server Error (hides details from client)
/// - `Configuration` → 500 Internal Server Error (hides details from client)
/// - `Database` → 500 Internal Server Error (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Map each error variant to (HTTP status, error code, message)
        let (status, code, message) = match self {
            AppError::MissingApiKey => (
                StatusCode::UNAUTHORIZED,
                "missing_api_key",
                self.to_string(),
            ),
            AppError::InvalidApiKey => (
                StatusCode::UNAUTHORIZED,
                "invalid_api_key",
                self.to_string(),
            ),
            AppError::DuplicateService => {
                (StatusCode::CONFLICT, "duplicate_service", self.to_string())
            }
            // Our own faults: mask details from the caller
            AppError::ServiceNotFound | AppError::Configuration(_) | AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred".to_string(),
            ),
        };

        // Build JSON response body
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        // Return the response with status code and JSON body
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_invalid_key_are_unauthorized_but_distinct() {
        assert_eq!(
            AppError::MissingApiKey.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::InvalidApiKey.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        // Distinguishable outcomes even though both map to 401
        assert_ne!(
            AppError::MissingApiKey.to_string(),
            AppError::InvalidApiKey.to_string()
        );
    }

    #[test]
    fn own_faults_are_masked_server_errors() {
        assert_eq!(
            AppError::ServiceNotFound.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Configuration("bad".to_string())
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
