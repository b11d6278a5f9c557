//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables.

/// Registered service identity and its cached projection
pub mod service_identity;
