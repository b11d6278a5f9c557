//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Performs business logic (key store queries, cache lookups)
//! 3. Returns HTTP response (JSON, status code)

/// Health check endpoint
pub mod health;
/// Registered-service endpoints
pub mod services;
