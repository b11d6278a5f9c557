//! API key generation.

use uuid::Uuid;

use crate::models::service_identity::API_KEY_MAX_LEN;

/// Generate a new opaque API key.
///
/// The key is a hyphenated v4 UUID: 36 characters, exactly the store's
/// column bound, and unique with overwhelming probability. The value is
/// never derived from the service id or name.
pub fn generate_api_key() -> String {
    let key = Uuid::new_v4().to_string();
    debug_assert_eq!(key.len(), API_KEY_MAX_LEN);
    key
}
