//! Startup provisioning - ensure this service has a registered API key.
//!
//! Runs exactly once, synchronously, after migrations and before the server
//! starts accepting requests. Idempotent: if a registration for the
//! configured service id already exists, it is left untouched (including its
//! key), so restarting the process never rotates credentials.

use crate::{
    config::KeyAuthSettings,
    error::AppError,
    models::service_identity::ServiceIdentity,
    repository::ServiceRepository,
    services::key_generator,
};

/// Guarantee the configured service has a key store registration.
///
/// # Process
///
/// 1. Validate the settings (an empty or overlong name, or a nil id, fails
///    before any store access)
/// 2. If a row with the configured service id exists, return immediately
/// 3. Otherwise generate a fresh key and insert the registration
///
/// # Errors
///
/// - `Configuration` if the settings are invalid, or if the insert collides
///   with an existing row (same name or key under a different id, or a
///   concurrent provisioner won the race). Collisions are fatal by design:
///   a conflicting registration is an operator problem, not a transient
///   fault to retry around
/// - `Database` for any other store failure
pub async fn ensure_service_registered(
    repository: &dyn ServiceRepository,
    settings: &KeyAuthSettings,
) -> Result<(), AppError> {
    settings.validate()?;

    if repository.exists(settings.service_id).await? {
        tracing::info!(service_name = %settings.service_name, "service already registered");
        return Ok(());
    }

    let service = ServiceIdentity {
        service_id: settings.service_id,
        service_name: settings.service_name.clone(),
        api_key: key_generator::generate_api_key(),
        endpoint_url: None,
    };

    match repository.insert(&service).await {
        Ok(()) => {
            tracing::info!(service_name = %settings.service_name, "registered new service api key");
            Ok(())
        }
        Err(AppError::DuplicateService) => Err(AppError::Configuration(format!(
            "service '{}' collides with an existing registration in the key store",
            settings.service_name
        ))),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::models::service_identity::API_KEY_MAX_LEN;
    use crate::repository::{InMemoryServiceRepository, MockServiceRepository};

    fn settings() -> KeyAuthSettings {
        KeyAuthSettings {
            service_id: Uuid::new_v4(),
            service_name: "jobs-api".to_string(),
        }
    }

    #[tokio::test]
    async fn existing_registration_is_a_no_op() {
        let mut repository = MockServiceRepository::new();
        repository.expect_exists().times(1).returning(|_| Ok(true));
        // No expect_insert: an insert attempt would panic the mock

        let result = ensure_service_registered(&repository, &settings()).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn missing_registration_inserts_with_generated_key() {
        let settings = settings();
        let expected_id = settings.service_id;

        let mut repository = MockServiceRepository::new();
        repository.expect_exists().times(1).returning(|_| Ok(false));
        repository
            .expect_insert()
            .times(1)
            .withf(move |service| {
                service.service_id == expected_id
                    && service.service_name == "jobs-api"
                    && service.api_key.len() == API_KEY_MAX_LEN
                    && service.endpoint_url.is_none()
            })
            .returning(|_| Ok(()));

        let result = ensure_service_registered(&repository, &settings).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn invalid_settings_fail_before_any_store_access() {
        // Mock has no expectations: any repository call would panic
        let repository = MockServiceRepository::new();

        let empty_name = KeyAuthSettings {
            service_id: Uuid::new_v4(),
            service_name: String::new(),
        };
        assert!(matches!(
            ensure_service_registered(&repository, &empty_name).await,
            Err(AppError::Configuration(_))
        ));

        let nil_id = KeyAuthSettings {
            service_id: Uuid::nil(),
            service_name: "jobs-api".to_string(),
        };
        assert!(matches!(
            ensure_service_registered(&repository, &nil_id).await,
            Err(AppError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn insert_collision_is_a_fatal_configuration_error() {
        let mut repository = MockServiceRepository::new();
        repository.expect_exists().times(1).returning(|_| Ok(false));
        repository
            .expect_insert()
            .times(1)
            .returning(|_| Err(AppError::DuplicateService));

        let result = ensure_service_registered(&repository, &settings()).await;

        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[tokio::test]
    async fn provisioning_twice_leaves_exactly_one_row() {
        let repository = InMemoryServiceRepository::new();
        let settings = settings();

        ensure_service_registered(&repository, &settings).await.unwrap();
        let key_after_first = repository
            .find_by_id(settings.service_id)
            .await
            .unwrap()
            .unwrap()
            .api_key;

        ensure_service_registered(&repository, &settings).await.unwrap();

        assert_eq!(repository.len(), 1);
        // The second run must not rotate the key
        let key_after_second = repository
            .find_by_id(settings.service_id)
            .await
            .unwrap()
            .unwrap()
            .api_key;
        assert_eq!(key_after_first, key_after_second);
    }

    #[tokio::test]
    async fn name_collision_with_different_id_aborts_startup() {
        let repository = InMemoryServiceRepository::new();

        // A pre-existing row holds the name under another id
        let other = KeyAuthSettings {
            service_id: Uuid::new_v4(),
            service_name: "jobs-api".to_string(),
        };
        ensure_service_registered(&repository, &other).await.unwrap();

        let result = ensure_service_registered(&repository, &settings()).await;

        assert!(matches!(result, Err(AppError::Configuration(_))));
        assert_eq!(repository.len(), 1);
    }
}
