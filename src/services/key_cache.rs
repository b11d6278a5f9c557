//! Credential cache - cache-aside layer in front of the key store.
//!
//! Serves credential lookups with at most one store round-trip per distinct
//! key, amortizing repeated authentication checks for the same service.
//! Entries never expire: the store is the source of truth, entries are
//! populated on first miss, and only a process restart discards them.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::service_identity::ServiceRecord,
    repository::ServiceRepository,
};

/// Build the composite cache key for a `(service_id, service_name)` pair.
fn cache_key(service_id: Uuid, service_name: &str) -> String {
    format!("{service_id}-{service_name}")
}

/// Cache-aside credential store shared by all request handlers.
///
/// # Concurrency
///
/// Lock guards are only held around the in-memory check and the populate,
/// never across the store round-trip. Two concurrent misses for the same key
/// may therefore both query the store and both populate the entry; that is
/// harmless, since both writes carry the same row, and there is deliberately
/// no single-flight machinery here.
pub struct KeyCacheService {
    repository: Arc<dyn ServiceRepository>,

    /// Per-service records, keyed by `"{service_id}-{service_name}"`
    services: RwLock<HashMap<String, ServiceRecord>>,

    /// The full roster, cached under its own fixed slot, independent of the
    /// per-service entries
    roster: RwLock<Option<Vec<ServiceRecord>>>,
}

impl KeyCacheService {
    pub fn new(repository: Arc<dyn ServiceRepository>) -> Self {
        Self {
            repository,
            services: RwLock::new(HashMap::new()),
            roster: RwLock::new(None),
        }
    }

    /// Resolve the credential record for a `(service_id, service_name)` pair.
    ///
    /// On a cache miss the store is queried by `service_id` alone, and the
    /// resolved row's name is then checked against the requested one: an id
    /// that resolves under a different name is treated as not found rather
    /// than silently authenticating under a stale name.
    ///
    /// # Errors
    ///
    /// - `ServiceNotFound` if no row matches (never cached, so a later
    ///   registration becomes visible on the next call)
    /// - `Database` if the store round-trip fails
    pub async fn get_service(
        &self,
        service_id: Uuid,
        service_name: &str,
    ) -> Result<ServiceRecord, AppError> {
        let key = cache_key(service_id, service_name);

        if let Some(record) = self.services.read().get(&key).cloned() {
            return Ok(record);
        }

        // Guard released above; the store round-trip happens lock-free
        let identity = self
            .repository
            .find_by_id(service_id)
            .await?
            .ok_or(AppError::ServiceNotFound)?;

        if identity.service_name != service_name {
            return Err(AppError::ServiceNotFound);
        }

        let record = ServiceRecord::from(identity);
        self.services.write().insert(key, record.clone());

        Ok(record)
    }

    /// Fetch all registered services, from the roster slot when warm.
    ///
    /// # Errors
    ///
    /// - `ServiceNotFound` if the store holds zero rows (not cached)
    /// - `Database` if the store round-trip fails
    pub async fn list_services(&self) -> Result<Vec<ServiceRecord>, AppError> {
        if let Some(records) = self.roster.read().clone() {
            return Ok(records);
        }

        let identities = self.repository.list_all().await?;
        if identities.is_empty() {
            return Err(AppError::ServiceNotFound);
        }

        let records: Vec<ServiceRecord> =
            identities.into_iter().map(ServiceRecord::from).collect();
        *self.roster.write() = Some(records.clone());

        Ok(records)
    }
}
