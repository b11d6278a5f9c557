//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables
//! into type-safe structs: general server settings in [`Config`], and the
//! API key authentication section in [`KeyAuthSettings`].

use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::service_identity::SERVICE_NAME_MAX_LEN;

/// Prefix for the API key authentication configuration section.
///
/// Section fields are bound from `KEY_AUTH_SERVICE_ID` / `KEY_AUTH_SERVICE_NAME`.
pub const KEY_AUTH_SECTION_PREFIX: &str = "KEY_AUTH_";

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `KEYSTORE_DATABASE_URL` (required): PostgreSQL connection string for the key store
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub keystore_database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., KEYSTORE_DATABASE_URL)
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Parse environment variables into Config struct
        // Field names are automatically converted: keystore_database_url -> KEYSTORE_DATABASE_URL
        envy::from_env::<Config>()
    }
}

/// Identity this process authenticates under and self-registers at startup.
///
/// Bound once from the `KEY_AUTH_` section, then adjusted by the
/// `ServiceId` / `ServiceName` process overrides, and passed by reference
/// into provisioning and the authenticator. There is no ambient settings
/// state anywhere else in the application.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyAuthSettings {
    pub service_id: Uuid,
    pub service_name: String,
}

impl KeyAuthSettings {
    /// Load the key authentication section and apply process overrides.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Configuration` if the section is missing or
    /// malformed, or if a `ServiceName` override is present without a
    /// parseable `ServiceId` alongside it.
    pub fn from_env() -> Result<Self, AppError> {
        let section = envy::prefixed(KEY_AUTH_SECTION_PREFIX)
            .from_env::<KeyAuthSettings>()
            .map_err(|err| {
                AppError::Configuration(format!("key authentication settings: {err}"))
            })?;

        section.with_overrides(
            std::env::var("ServiceId").ok().as_deref(),
            std::env::var("ServiceName").ok().as_deref(),
        )
    }

    /// Apply the `ServiceId` / `ServiceName` environment overrides.
    ///
    /// The precedence is deliberately asymmetric and matches the historical
    /// deployment contract: a non-empty `ServiceName` activates BOTH
    /// overrides, at which point `ServiceId` must be present and parseable;
    /// a `ServiceId` on its own is ignored. Do not "fix" this without
    /// revising the configuration contract for every deployment.
    fn with_overrides(
        self,
        service_id: Option<&str>,
        service_name: Option<&str>,
    ) -> Result<Self, AppError> {
        match service_name {
            Some(name) if !name.is_empty() => {
                let raw_id = service_id.ok_or_else(|| {
                    AppError::Configuration(
                        "ServiceId must be set when the ServiceName override is present"
                            .to_string(),
                    )
                })?;
                let service_id = Uuid::parse_str(raw_id).map_err(|err| {
                    AppError::Configuration(format!("ServiceId is not a valid UUID: {err}"))
                })?;

                Ok(Self {
                    service_id,
                    service_name: name.to_string(),
                })
            }
            _ => Ok(self),
        }
    }

    /// Check the provisioning preconditions.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Configuration` if the service name is empty or
    /// exceeds the store's column bound, or if the service identifier is
    /// the nil UUID. Called before any key store access at startup.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.service_name.is_empty() || self.service_id.is_nil() {
            return Err(AppError::Configuration(
                "service name and service id are required".to_string(),
            ));
        }

        if self.service_name.len() > SERVICE_NAME_MAX_LEN {
            return Err(AppError::Configuration(format!(
                "service name exceeds {SERVICE_NAME_MAX_LEN} characters"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section() -> KeyAuthSettings {
        KeyAuthSettings {
            service_id: Uuid::parse_str("6f3b3c44-3f6c-4dbb-9d5e-6a2e2f1c0b11").unwrap(),
            service_name: "jobs-api".to_string(),
        }
    }

    #[test]
    fn no_overrides_keeps_section_values() {
        let settings = section().with_overrides(None, None).unwrap();

        assert_eq!(settings.service_name, "jobs-api");
        assert_eq!(
            settings.service_id,
            Uuid::parse_str("6f3b3c44-3f6c-4dbb-9d5e-6a2e2f1c0b11").unwrap()
        );
    }

    #[test]
    fn service_name_override_replaces_both_values() {
        let id = Uuid::new_v4();
        let settings = section()
            .with_overrides(Some(&id.to_string()), Some("accounts-api"))
            .unwrap();

        assert_eq!(settings.service_name, "accounts-api");
        assert_eq!(settings.service_id, id);
    }

    #[test]
    fn service_id_alone_is_ignored() {
        // The asymmetry: without ServiceName, ServiceId is never read
        let settings = section()
            .with_overrides(Some(&Uuid::new_v4().to_string()), None)
            .unwrap();

        assert_eq!(settings.service_name, "jobs-api");
        assert_eq!(
            settings.service_id,
            Uuid::parse_str("6f3b3c44-3f6c-4dbb-9d5e-6a2e2f1c0b11").unwrap()
        );
    }

    #[test]
    fn empty_service_name_override_is_ignored() {
        let settings = section()
            .with_overrides(Some(&Uuid::new_v4().to_string()), Some(""))
            .unwrap();

        assert_eq!(settings.service_name, "jobs-api");
    }

    #[test]
    fn service_name_override_without_id_fails() {
        let result = section().with_overrides(None, Some("accounts-api"));

        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn unparseable_id_override_fails() {
        let result = section().with_overrides(Some("not-a-uuid"), Some("accounts-api"));

        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn validate_rejects_empty_name_and_nil_id() {
        let empty_name = KeyAuthSettings {
            service_id: Uuid::new_v4(),
            service_name: String::new(),
        };
        assert!(matches!(
            empty_name.validate(),
            Err(AppError::Configuration(_))
        ));

        let nil_id = KeyAuthSettings {
            service_id: Uuid::nil(),
            service_name: "jobs-api".to_string(),
        };
        assert!(matches!(nil_id.validate(), Err(AppError::Configuration(_))));

        assert!(section().validate().is_ok());
    }

    #[test]
    fn validate_rejects_an_overlong_name() {
        let overlong = KeyAuthSettings {
            service_id: Uuid::new_v4(),
            service_name: "x".repeat(SERVICE_NAME_MAX_LEN + 1),
        };

        assert!(matches!(
            overlong.validate(),
            Err(AppError::Configuration(_))
        ));
    }
}
