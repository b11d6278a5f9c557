//! Registered-service endpoints.
//!
//! This module implements the service-facing API:
//! - GET /api/v1/services - Roster of registered services (gated)
//! - GET /api/v1/identity - Echo of the authenticated caller (extractor)

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{
    error::AppError,
    middleware::auth::ApiKeyAuth,
    models::service_identity::{IdentityResponse, ServiceResponse},
    services::key_cache::KeyCacheService,
};

/// List all registered services.
///
/// # Endpoint
///
/// `GET /api/v1/services`
///
/// # Authentication
///
/// Sits behind the API key gate.
///
/// # Response
///
/// - **Success (200 OK)**: Array of registered services, API keys stripped
/// - **Error (401)**: Missing or invalid API key
/// - **Error (500)**: Key store unreachable, or no services registered at
///   all (which cannot happen once provisioning has run)
///
/// ```json
/// [
///   {
///     "service_id": "550e8400-e29b-41d4-a716-446655440000",
///     "service_name": "jobs-api",
///     "endpoint_url": "https://jobs.example.com"
///   }
/// ]
/// ```
///
/// Served from the credential cache's roster slot after the first call.
pub async fn list_services(
    State(cache): State<Arc<KeyCacheService>>,
) -> Result<Json<Vec<ServiceResponse>>, AppError> {
    let services = cache.list_services().await?;

    // Convert each ServiceRecord to ServiceResponse (removes api_key)
    let responses: Vec<ServiceResponse> = services.into_iter().map(Into::into).collect();

    Ok(Json(responses))
}

/// Report the authenticated caller's identity.
///
/// # Endpoint
///
/// `GET /api/v1/identity`
///
/// # Authentication
///
/// Uses the [`ApiKeyAuth`] extractor directly rather than the gate; the
/// route demonstrates the per-route integration point.
///
/// # Response
///
/// - **Success (200 OK)**: The principal established by the credential check
/// - **Error (401)**: Missing or invalid API key
pub async fn identity(ApiKeyAuth(principal): ApiKeyAuth) -> Json<IdentityResponse> {
    Json(IdentityResponse {
        service_id: principal.service_id,
        service_name: principal.service_name,
    })
}
