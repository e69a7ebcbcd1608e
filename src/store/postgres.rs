//! Postgres-backed `Store`.

use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;

use super::{Store, StoreError};
use crate::model::{
    Account, AccountChanges, NewAccount, NewServiceRequest, RequestStatus, ServiceRequest, ServiceRequestChanges,
    User,
};

type RequestTuple = (i64, i64, String, String, String, OffsetDateTime);
type AccountTuple = (i64, i64, String, String);
type UserTuple = (i64, String, String, bool);

const REQUEST_COLUMNS: &str = "id, user_id, request_type, description, status, created_at";

fn request_from_tuple((id, user_id, request_type, description, status, created_at): RequestTuple) -> Result<ServiceRequest, StoreError> {
    let status = status
        .parse::<RequestStatus>()
        .map_err(|e| StoreError::InvalidRow(e.to_string()))?;
    Ok(ServiceRequest { id, user_id, request_type, description, status, created_at })
}

fn account_from_tuple((id, user_id, address, phone_number): AccountTuple) -> Account {
    Account { id, user_id, address, phone_number }
}

fn user_from_tuple((id, email, name, is_staff): UserTuple) -> User {
    User { id, email, name, is_staff }
}

/// Translate constraint violations into domain errors.
fn classify(err: sqlx::Error, kind: &'static str, id: i64) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::Conflict(format!("{kind} already exists for user {id}"));
        }
        if db.is_foreign_key_violation() {
            return StoreError::NotFound { kind: "user", id };
        }
    }
    StoreError::Database(err)
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn upsert_user(&self, email: &str, name: &str, grant_staff: bool) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserTuple>(
            r"INSERT INTO users (email, name, is_staff)
              VALUES ($1, $2, $3)
              ON CONFLICT (email) DO UPDATE SET is_staff = users.is_staff OR EXCLUDED.is_staff
              RETURNING id, email, name, is_staff",
        )
        .bind(email)
        .bind(name)
        .bind(grant_staff)
        .fetch_one(&self.pool)
        .await?;
        Ok(user_from_tuple(row))
    }

    async fn create_session(&self, token: &str, user_id: i64) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO sessions (token, user_id) VALUES ($1, $2)")
            .bind(token)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn session_user(&self, token: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserTuple>(
            r"SELECT u.id, u.email, u.name, u.is_staff
              FROM sessions s
              JOIN users u ON u.id = s.user_id
              WHERE s.token = $1 AND s.expires_at > now()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(user_from_tuple))
    }

    async fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn replace_login_code(&self, email: &str, code_hash: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM email_login_codes WHERE email = $1 AND consumed_at IS NULL")
            .bind(email)
            .execute(&self.pool)
            .await?;
        sqlx::query("INSERT INTO email_login_codes (email, code_hash) VALUES ($1, $2)")
            .bind(email)
            .bind(code_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn consume_login_code(&self, email: &str, code_hash: &str, max_attempts: i32) -> Result<bool, StoreError> {
        let consumed = sqlx::query_scalar::<_, i64>(
            r"UPDATE email_login_codes
              SET consumed_at = now()
              WHERE id = (
                  SELECT id
                  FROM email_login_codes
                  WHERE email = $1
                    AND consumed_at IS NULL
                    AND expires_at > now()
                  ORDER BY created_at DESC
                  LIMIT 1
              )
              AND code_hash = $2
              RETURNING id",
        )
        .bind(email)
        .bind(code_hash)
        .fetch_optional(&self.pool)
        .await?;

        if consumed.is_some() {
            return Ok(true);
        }

        sqlx::query(
            r"UPDATE email_login_codes
              SET attempts = attempts + 1,
                  consumed_at = CASE WHEN attempts + 1 >= $2 THEN now() ELSE consumed_at END
              WHERE id = (
                  SELECT id
                  FROM email_login_codes
                  WHERE email = $1
                    AND consumed_at IS NULL
                    AND expires_at > now()
                  ORDER BY created_at DESC
                  LIMIT 1
              )",
        )
        .bind(email)
        .bind(max_attempts)
        .execute(&self.pool)
        .await?;
        Ok(false)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserTuple>("SELECT id, email, name, is_staff FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(user_from_tuple))
    }

    async fn create_request(&self, user_id: i64, new: &NewServiceRequest) -> Result<ServiceRequest, StoreError> {
        let row = sqlx::query_as::<_, RequestTuple>(&format!(
            "INSERT INTO service_requests (user_id, request_type, description)
             VALUES ($1, $2, $3)
             RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&new.request_type)
        .bind(&new.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "service request", user_id))?;
        request_from_tuple(row)
    }

    async fn list_requests_for_user(&self, user_id: i64) -> Result<Vec<ServiceRequest>, StoreError> {
        let rows = sqlx::query_as::<_, RequestTuple>(&format!(
            "SELECT {REQUEST_COLUMNS}
             FROM service_requests
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(request_from_tuple).collect()
    }

    async fn get_request(&self, id: i64) -> Result<ServiceRequest, StoreError> {
        let row = sqlx::query_as::<_, RequestTuple>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM service_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound { kind: "service request", id })?;
        request_from_tuple(row)
    }

    async fn list_requests(&self) -> Result<Vec<ServiceRequest>, StoreError> {
        let rows = sqlx::query_as::<_, RequestTuple>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM service_requests ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(request_from_tuple).collect()
    }

    async fn update_request(&self, id: i64, changes: &ServiceRequestChanges) -> Result<ServiceRequest, StoreError> {
        let row = sqlx::query_as::<_, RequestTuple>(&format!(
            "UPDATE service_requests
             SET request_type = COALESCE($2, request_type),
                 description = COALESCE($3, description),
                 status = COALESCE($4, status)
             WHERE id = $1
             RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.request_type.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.status.map(RequestStatus::as_str))
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound { kind: "service request", id })?;
        request_from_tuple(row)
    }

    async fn delete_request(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM service_requests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { kind: "service request", id });
        }
        Ok(())
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let rows = sqlx::query_as::<_, AccountTuple>(
            "SELECT id, user_id, address, phone_number FROM accounts ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(account_from_tuple).collect())
    }

    async fn get_account(&self, id: i64) -> Result<Account, StoreError> {
        let row = sqlx::query_as::<_, AccountTuple>(
            "SELECT id, user_id, address, phone_number FROM accounts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound { kind: "account", id })?;
        Ok(account_from_tuple(row))
    }

    async fn create_account(&self, new: &NewAccount) -> Result<Account, StoreError> {
        let row = sqlx::query_as::<_, AccountTuple>(
            r"INSERT INTO accounts (user_id, address, phone_number)
              VALUES ($1, $2, $3)
              RETURNING id, user_id, address, phone_number",
        )
        .bind(new.user_id)
        .bind(&new.address)
        .bind(&new.phone_number)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "account", new.user_id))?;
        Ok(account_from_tuple(row))
    }

    async fn update_account(&self, id: i64, changes: &AccountChanges) -> Result<Account, StoreError> {
        let row = sqlx::query_as::<_, AccountTuple>(
            r"UPDATE accounts
              SET address = COALESCE($2, address),
                  phone_number = COALESCE($3, phone_number)
              WHERE id = $1
              RETURNING id, user_id, address, phone_number",
        )
        .bind(id)
        .bind(changes.address.as_deref())
        .bind(changes.phone_number.as_deref())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound { kind: "account", id })?;
        Ok(account_from_tuple(row))
    }

    async fn delete_account(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { kind: "account", id });
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "live-db-tests"))]
#[path = "postgres_test.rs"]
mod tests;
