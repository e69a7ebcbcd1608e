//! Data store: durable records behind a single trait.
//!
//! DESIGN
//! ======
//! Handlers and services talk to `dyn Store` so persistence stays swappable
//! in tests. Production uses `PgStore`; every call goes straight to Postgres,
//! nothing is cached in process.
//!
//! ERROR HANDLING
//! ==============
//! Missing rows surface as `StoreError::NotFound`, uniqueness violations as
//! `StoreError::Conflict`. Everything else is a database error and maps to a
//! 500 at the route layer.

pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;

use crate::model::{
    Account, AccountChanges, NewAccount, NewServiceRequest, ServiceRequest, ServiceRequestChanges, User,
};

pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: i64 },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid row: {0}")]
    InvalidRow(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    // -- users / sessions ----------------------------------------------------

    /// Insert or refresh a user keyed by normalized email. `grant_staff`
    /// promotes the user; it never demotes an existing staff member.
    async fn upsert_user(&self, email: &str, name: &str, grant_staff: bool) -> Result<User, StoreError>;

    async fn create_session(&self, token: &str, user_id: i64) -> Result<(), StoreError>;

    /// Resolve an unexpired session token to its user.
    async fn session_user(&self, token: &str) -> Result<Option<User>, StoreError>;

    async fn delete_session(&self, token: &str) -> Result<(), StoreError>;

    // -- login codes ---------------------------------------------------------

    /// Replace any outstanding code for `email` with a fresh hashed one.
    async fn replace_login_code(&self, email: &str, code_hash: &str) -> Result<(), StoreError>;

    /// Consume the latest live code if the hash matches. A mismatch counts a
    /// failed attempt and burns the code once `max_attempts` is reached.
    async fn consume_login_code(&self, email: &str, code_hash: &str, max_attempts: i32) -> Result<bool, StoreError>;

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    // -- service requests ----------------------------------------------------

    /// Persist a new request owned by `user_id`, status `Pending`, `created_at` now.
    async fn create_request(&self, user_id: i64, new: &NewServiceRequest) -> Result<ServiceRequest, StoreError>;

    /// All requests owned by `user_id`, newest first.
    async fn list_requests_for_user(&self, user_id: i64) -> Result<Vec<ServiceRequest>, StoreError>;

    /// Lookup by identifier alone; ownership is not checked here.
    async fn get_request(&self, id: i64) -> Result<ServiceRequest, StoreError>;

    async fn list_requests(&self) -> Result<Vec<ServiceRequest>, StoreError>;

    async fn update_request(&self, id: i64, changes: &ServiceRequestChanges) -> Result<ServiceRequest, StoreError>;

    async fn delete_request(&self, id: i64) -> Result<(), StoreError>;

    // -- accounts ------------------------------------------------------------

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError>;

    async fn get_account(&self, id: i64) -> Result<Account, StoreError>;

    /// Fails with `Conflict` when the user already has an account.
    async fn create_account(&self, new: &NewAccount) -> Result<Account, StoreError>;

    async fn update_account(&self, id: i64, changes: &AccountChanges) -> Result<Account, StoreError>;

    async fn delete_account(&self, id: i64) -> Result<(), StoreError>;
}
