//! API key authentication adapters.
//!
//! Two thin integration points over the one authentication decision in
//! [`crate::services::authentication`]:
//!
//! 1. [`require_api_key`] - a hard gate applied to a whole route group;
//!    any request without a matching key is answered 401 and never reaches
//!    the handler
//! 2. [`ApiKeyAuth`] - a per-route extractor for handlers that opt in and
//!    want the authenticated principal as an argument
//!
//! Both report absence and mismatch as distinguishable 401s.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use crate::{
    error::AppError,
    services::authentication::{ApiKeyAuthenticator, AuthOutcome, ServicePrincipal},
};

/// API key authentication middleware function (the hard gate).
///
/// # Flow
///
/// 1. Run the credential check against the request headers
/// 2. If accepted: insert the `ServicePrincipal` into the request's
///    extensions and call the next handler
/// 3. If rejected or no key was presented: return 401 Unauthorized
///
/// # Headers
///
/// Expected header format:
/// ```
/// X-Api-Key: 6edcd9c9-6e3a-4b2a-9f0f-2f58d0a0b6c1
/// ```
///
/// # Arguments
///
/// * `State(authenticator)` - Authentication decision injected by Axum
/// * `request` - Incoming HTTP request (mutable to add extensions)
/// * `next` - Next middleware/handler in the chain
///
/// # Returns
///
/// - `Ok(Response)` if authenticated successfully (calls next handler)
/// - `Err(AppError::InvalidApiKey)` on a mismatched key (401)
/// - `Err(AppError::MissingApiKey)` on an absent/blank key (401)
pub async fn require_api_key(
    State(authenticator): State<ApiKeyAuthenticator>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match authenticator.authenticate(request.headers()).await? {
        AuthOutcome::Accepted(principal) => {
            // Route handlers can extract this via Extension<ServicePrincipal>
            request.extensions_mut().insert(principal);
            Ok(next.run(request).await)
        }
        AuthOutcome::Rejected => Err(AppError::InvalidApiKey),
        AuthOutcome::NoCredential => Err(AppError::MissingApiKey),
    }
}

/// Extractor that requires a valid API key on a single route.
///
/// Use this in handlers that authenticate per-route instead of sitting
/// behind the gate:
/// ```ignore
/// async fn whoami(ApiKeyAuth(principal): ApiKeyAuth) -> Json<IdentityResponse> {
///     // principal identifies the authenticated service
/// }
/// ```
///
/// Routes that do not use this extractor are untouched by it, so another
/// authentication scheme can coexist on the same router; that is the
/// difference from [`require_api_key`], which gates everything below it.
#[derive(Debug, Clone)]
pub struct ApiKeyAuth(pub ServicePrincipal);

impl<S> FromRequestParts<S> for ApiKeyAuth
where
    ApiKeyAuthenticator: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let authenticator = ApiKeyAuthenticator::from_ref(state);

        match authenticator.authenticate(&parts.headers).await? {
            AuthOutcome::Accepted(principal) => Ok(ApiKeyAuth(principal)),
            AuthOutcome::Rejected => Err(AppError::InvalidApiKey),
            AuthOutcome::NoCredential => Err(AppError::MissingApiKey),
        }
    }
}
