//! Session token management.
//!
//! Sessions are opaque random tokens stored server-side and carried in an
//! HttpOnly cookie. Expiry is enforced by the store (30 days).

use std::fmt::Write;

use rand::Rng;

use crate::model::User;
use crate::store::{Store, StoreError};

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Create a session for the given user, returning the token.
///
/// # Errors
///
/// Returns a store error if the insert fails.
pub async fn create_session(store: &dyn Store, user_id: i64) -> Result<String, StoreError> {
    let token = generate_token();
    store.create_session(&token, user_id).await?;
    Ok(token)
}

/// Validate a session token and return the associated user.
///
/// # Errors
///
/// Returns a store error if the lookup fails.
pub async fn validate_session(store: &dyn Store, token: &str) -> Result<Option<User>, StoreError> {
    if token.is_empty() {
        return Ok(None);
    }
    store.session_user(token).await
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
