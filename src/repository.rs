//! Key store repository for registered service identities.
//!
//! The repository is the only component that talks to the `services` table.
//! It is defined as a trait so the cache, provisioning, and the tests can
//! work against the contract rather than against PostgreSQL; the production
//! implementation is [`PgServiceRepository`].

use async_trait::async_trait;
use uuid::Uuid;

use crate::{db::DbPool, error::AppError, models::service_identity::ServiceIdentity};

/// Abstract contract over the persistent key store.
///
/// All reads are idempotent snapshots; `insert` is transactional and must
/// surface a uniqueness violation as [`AppError::DuplicateService`],
/// distinct from a generic failure, because provisioning treats "already
/// exists" differently from "store is broken".
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServiceRepository: Send + Sync {
    /// Look up a service by its identifier.
    async fn find_by_id(&self, service_id: Uuid) -> Result<Option<ServiceIdentity>, AppError>;

    /// Look up a service by identifier and name; both must match.
    async fn find_by_id_and_name(
        &self,
        service_id: Uuid,
        service_name: &str,
    ) -> Result<Option<ServiceIdentity>, AppError>;

    /// Fetch all registered services (snapshot at call time).
    async fn list_all(&self) -> Result<Vec<ServiceIdentity>, AppError>;

    /// Insert a new service registration.
    async fn insert(&self, service: &ServiceIdentity) -> Result<(), AppError>;

    /// Check whether a service with this identifier is registered.
    async fn exists(&self, service_id: Uuid) -> Result<bool, AppError>;
}

/// PostgreSQL-backed repository over the `services` table.
#[derive(Debug, Clone)]
pub struct PgServiceRepository {
    pool: DbPool,
}

impl PgServiceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ServiceRepository for PgServiceRepository {
    async fn find_by_id(&self, service_id: Uuid) -> Result<Option<ServiceIdentity>, AppError> {
        let service = sqlx::query_as::<_, ServiceIdentity>(
            r#"
            SELECT service_id, service_name, api_key, endpoint_url
            FROM services
            WHERE service_id = $1
            "#,
        )
        .bind(service_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(service)
    }

    async fn find_by_id_and_name(
        &self,
        service_id: Uuid,
        service_name: &str,
    ) -> Result<Option<ServiceIdentity>, AppError> {
        let service = sqlx::query_as::<_, ServiceIdentity>(
            r#"
            SELECT service_id, service_name, api_key, endpoint_url
            FROM services
            WHERE service_id = $1 AND service_name = $2
            "#,
        )
        .bind(service_id)
        .bind(service_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(service)
    }

    async fn list_all(&self) -> Result<Vec<ServiceIdentity>, AppError> {
        let services = sqlx::query_as::<_, ServiceIdentity>(
            r#"
            SELECT service_id, service_name, api_key, endpoint_url
            FROM services
            ORDER BY service_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(services)
    }

    async fn insert(&self, service: &ServiceIdentity) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO services (service_id, service_name, api_key, endpoint_url)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(service.service_id)
        .bind(&service.service_name)
        .bind(&service.api_key)
        .bind(&service.endpoint_url)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            // A uniqueness violation on service_id, service_name or api_key
            // is a distinct outcome, not a generic store failure
            if err
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                AppError::DuplicateService
            } else {
                AppError::Database(err)
            }
        })?;

        Ok(())
    }

    async fn exists(&self, service_id: Uuid) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM services WHERE service_id = $1)")
                .bind(service_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }
}

/// In-memory repository used by tests.
///
/// Enforces the same three uniqueness constraints as the `services` table so
/// provisioning races and constraint handling can be exercised without a
/// running PostgreSQL instance.
#[cfg(test)]
pub struct InMemoryServiceRepository {
    services: parking_lot::RwLock<Vec<ServiceIdentity>>,
}

#[cfg(test)]
impl InMemoryServiceRepository {
    pub fn new() -> Self {
        Self {
            services: parking_lot::RwLock::new(Vec::new()),
        }
    }

    pub fn with_services(services: Vec<ServiceIdentity>) -> Self {
        Self {
            services: parking_lot::RwLock::new(services),
        }
    }

    pub fn len(&self) -> usize {
        self.services.read().len()
    }
}

#[cfg(test)]
#[async_trait]
impl ServiceRepository for InMemoryServiceRepository {
    async fn find_by_id(&self, service_id: Uuid) -> Result<Option<ServiceIdentity>, AppError> {
        Ok(self
            .services
            .read()
            .iter()
            .find(|s| s.service_id == service_id)
            .cloned())
    }

    async fn find_by_id_and_name(
        &self,
        service_id: Uuid,
        service_name: &str,
    ) -> Result<Option<ServiceIdentity>, AppError> {
        Ok(self
            .services
            .read()
            .iter()
            .find(|s| s.service_id == service_id && s.service_name == service_name)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<ServiceIdentity>, AppError> {
        Ok(self.services.read().clone())
    }

    async fn insert(&self, service: &ServiceIdentity) -> Result<(), AppError> {
        let mut services = self.services.write();

        let violates_constraint = services.iter().any(|s| {
            s.service_id == service.service_id
                || s.service_name == service.service_name
                || s.api_key == service.api_key
        });
        if violates_constraint {
            return Err(AppError::DuplicateService);
        }

        services.push(service.clone());
        Ok(())
    }

    async fn exists(&self, service_id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .services
            .read()
            .iter()
            .any(|s| s.service_id == service_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(name: &str, key: &str) -> ServiceIdentity {
        ServiceIdentity {
            service_id: Uuid::new_v4(),
            service_name: name.to_string(),
            api_key: key.to_string(),
            endpoint_url: None,
        }
    }

    #[tokio::test]
    async fn duplicate_name_violates_uniqueness() {
        let repository = InMemoryServiceRepository::new();
        repository.insert(&identity("jobs-api", "key-1")).await.unwrap();

        // Same name, different id and key
        let result = repository.insert(&identity("jobs-api", "key-2")).await;

        assert!(matches!(result, Err(AppError::DuplicateService)));
        assert_eq!(repository.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_id_and_key_violate_uniqueness() {
        let repository = InMemoryServiceRepository::new();
        let first = identity("jobs-api", "key-1");
        repository.insert(&first).await.unwrap();

        let same_id = ServiceIdentity {
            service_name: "accounts-api".to_string(),
            api_key: "key-2".to_string(),
            ..first.clone()
        };
        assert!(matches!(
            repository.insert(&same_id).await,
            Err(AppError::DuplicateService)
        ));

        let same_key = identity("accounts-api", "key-1");
        assert!(matches!(
            repository.insert(&same_key).await,
            Err(AppError::DuplicateService)
        ));
    }

    #[tokio::test]
    async fn find_by_id_and_name_requires_both_to_match() {
        let service = identity("jobs-api", "key-1");
        let repository = InMemoryServiceRepository::with_services(vec![service.clone()]);

        assert!(
            repository
                .find_by_id_and_name(service.service_id, "jobs-api")
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            repository
                .find_by_id_and_name(service.service_id, "accounts-api")
                .await
                .unwrap()
                .is_none()
        );
    }
}
