//! Authentication decision - the per-request credential check.
//!
//! One state machine shared by both integration points (the hard-gate
//! middleware and the per-route extractor): extract the `X-Api-Key` header,
//! resolve our registered credential through the cache, compare, decide.

use std::sync::Arc;

use axum::http::HeaderMap;
use uuid::Uuid;

use crate::{config::KeyAuthSettings, error::AppError, services::key_cache::KeyCacheService};

/// Request header carrying the caller's API key.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Identity attached to a request that authenticated successfully.
///
/// Carries the service's name as the subject; no further claims are issued.
#[derive(Debug, Clone)]
pub struct ServicePrincipal {
    pub service_id: Uuid,
    pub service_name: String,
}

/// Tri-state result of a credential check.
#[derive(Debug)]
pub enum AuthOutcome {
    /// Header value matched the registered key
    Accepted(ServicePrincipal),

    /// Header was present but did not match (explicit failure)
    Rejected,

    /// No header was presented, or its value was blank; distinct from
    /// `Rejected` so a caller using another scheme is not hard-failed here
    NoCredential,
}

/// Per-request authentication decision over the credential cache.
///
/// Cheap to clone (the cache is shared behind an `Arc`); the settings are
/// the immutable value resolved once at startup.
#[derive(Clone)]
pub struct ApiKeyAuthenticator {
    cache: Arc<KeyCacheService>,
    settings: KeyAuthSettings,
}

impl ApiKeyAuthenticator {
    pub fn new(cache: Arc<KeyCacheService>, settings: KeyAuthSettings) -> Self {
        Self { cache, settings }
    }

    /// Run the credential check against a request's headers.
    ///
    /// # Flow
    ///
    /// 1. Absent, undecodable, or blank `X-Api-Key` header → `NoCredential`
    /// 2. Resolve our own registered credential through the cache
    /// 3. Exact string comparison of the presented value against the
    ///    registered key → `Accepted` or `Rejected`
    ///
    /// # Errors
    ///
    /// `ServiceNotFound` (and store failures) propagate as errors: a missing
    /// registration for ourselves is this service's misconfiguration, never
    /// the caller's, and must not be reported as a rejection.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<AuthOutcome, AppError> {
        let Some(value) = headers.get(API_KEY_HEADER) else {
            return Ok(AuthOutcome::NoCredential);
        };

        // A value that does not decode as visible ASCII cannot equal any
        // stored key; treat it like a blank header
        let presented = value.to_str().unwrap_or("");
        if presented.trim().is_empty() {
            return Ok(AuthOutcome::NoCredential);
        }

        let service = self
            .cache
            .get_service(self.settings.service_id, &self.settings.service_name)
            .await?;

        if service.api_key == presented {
            Ok(AuthOutcome::Accepted(ServicePrincipal {
                service_id: service.service_id,
                service_name: service.service_name,
            }))
        } else {
            Ok(AuthOutcome::Rejected)
        }
    }
}
