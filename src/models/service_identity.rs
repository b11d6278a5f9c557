//! Service identity model for API key authentication.
//!
//! A service identity is one registered caller of the system: an immutable
//! id, a unique human-readable name, and the opaque API key it presents in
//! the `X-Api-Key` header. Keys are stored and compared as plain opaque
//! strings; they are generated independently of the id and name.

use serde::Serialize;
use uuid::Uuid;

/// Maximum length of a service name, enforced by the store schema.
pub const SERVICE_NAME_MAX_LEN: usize = 50;

/// Maximum length of an API key, enforced by the store schema.
pub const API_KEY_MAX_LEN: usize = 36;

/// Represents a registered service row from the key store.
///
/// # Database Table
///
/// Maps to the `services` table with columns:
/// - `service_id`: Unique identifier (UUID), primary key, immutable
/// - `service_name`: Human-readable label, unique, max 50 characters
/// - `api_key`: Opaque secret string, unique, max 36 characters
/// - `endpoint_url`: Optional informational URL, never used in
///   authentication decisions
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ServiceIdentity {
    /// Unique identifier for this service
    pub service_id: Uuid,

    /// Human-readable name of the service
    pub service_name: String,

    /// The opaque API key this service presents when calling us
    pub api_key: String,

    /// Informational URL associated with the service, if any
    pub endpoint_url: Option<String>,
}

/// Read-only projection of a [`ServiceIdentity`] held by the credential
/// cache.
///
/// The cache hands out this shape (never the raw entity) so nothing
/// downstream can confuse a cached credential with a live store row. It is
/// cheap to clone and carries everything the authentication decision needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecord {
    /// Unique identifier for this service
    pub service_id: Uuid,

    /// Human-readable name of the service
    pub service_name: String,

    /// The opaque API key registered for this service
    pub api_key: String,

    /// Informational URL associated with the service, if any
    pub endpoint_url: Option<String>,
}

impl From<ServiceIdentity> for ServiceRecord {
    fn from(identity: ServiceIdentity) -> Self {
        Self {
            service_id: identity.service_id,
            service_name: identity.service_name,
            api_key: identity.api_key,
            endpoint_url: identity.endpoint_url,
        }
    }
}

/// Service representation returned by the roster endpoint.
///
/// The API key is deliberately stripped: callers get to see who is
/// registered and where they live, never each other's secrets.
#[derive(Debug, Serialize)]
pub struct ServiceResponse {
    pub service_id: Uuid,
    pub service_name: String,
    pub endpoint_url: Option<String>,
}

impl From<ServiceRecord> for ServiceResponse {
    fn from(record: ServiceRecord) -> Self {
        Self {
            service_id: record.service_id,
            service_name: record.service_name,
            endpoint_url: record.endpoint_url,
        }
    }
}

/// Response body for the authenticated identity endpoint.
#[derive(Debug, Serialize)]
pub struct IdentityResponse {
    pub service_id: Uuid,
    pub service_name: String,
}
