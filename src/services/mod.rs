//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers:
//! the authentication decision, the credential cache in front of the key
//! store, key generation, and startup provisioning.

pub mod authentication;
pub mod key_cache;
pub mod key_generator;
pub mod provisioning;
