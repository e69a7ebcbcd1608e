//! In-memory `Store` for tests. Mirrors the Postgres constraints that the
//! handlers rely on (one account per user, newest-first listing).

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use time::OffsetDateTime;

use super::{Store, StoreError};
use crate::model::{
    Account, AccountChanges, NewAccount, NewServiceRequest, RequestStatus, ServiceRequest, ServiceRequestChanges,
    User,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    sessions: HashMap<String, i64>,
    codes: HashMap<String, (String, i32)>,
    requests: Vec<ServiceRequest>,
    accounts: Vec<Account>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    record_ops: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of service-request/account operations performed so far.
    pub fn record_ops(&self) -> usize {
        self.record_ops.load(Ordering::SeqCst)
    }

    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store mutex poisoned")
    }

    fn touch(&self) {
        self.record_ops.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn upsert_user(&self, email: &str, name: &str, grant_staff: bool) -> Result<User, StoreError> {
        let mut tables = self.tables();
        if let Some(user) = tables.users.iter_mut().find(|u| u.email == email) {
            user.is_staff |= grant_staff;
            return Ok(user.clone());
        }
        let id = tables.next_id();
        let user = User { id, email: email.to_owned(), name: name.to_owned(), is_staff: grant_staff };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn create_session(&self, token: &str, user_id: i64) -> Result<(), StoreError> {
        self.tables().sessions.insert(token.to_owned(), user_id);
        Ok(())
    }

    async fn session_user(&self, token: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables();
        let Some(user_id) = tables.sessions.get(token) else {
            return Ok(None);
        };
        Ok(tables.users.iter().find(|u| u.id == *user_id).cloned())
    }

    async fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        self.tables().sessions.remove(token);
        Ok(())
    }

    async fn replace_login_code(&self, email: &str, code_hash: &str) -> Result<(), StoreError> {
        self.tables()
            .codes
            .insert(email.to_owned(), (code_hash.to_owned(), 0));
        Ok(())
    }

    async fn consume_login_code(&self, email: &str, code_hash: &str, max_attempts: i32) -> Result<bool, StoreError> {
        let mut tables = self.tables();
        let (matched, burned) = match tables.codes.get_mut(email) {
            None => return Ok(false),
            Some((stored, _)) if stored.as_str() == code_hash => (true, true),
            Some((_, attempts)) => {
                *attempts += 1;
                (false, *attempts >= max_attempts)
            }
        };
        if burned {
            tables.codes.remove(email);
        }
        Ok(matched)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.tables().users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_request(&self, user_id: i64, new: &NewServiceRequest) -> Result<ServiceRequest, StoreError> {
        self.touch();
        let mut tables = self.tables();
        if !tables.users.iter().any(|u| u.id == user_id) {
            return Err(StoreError::NotFound { kind: "user", id: user_id });
        }
        let id = tables.next_id();
        let request = ServiceRequest {
            id,
            user_id,
            request_type: new.request_type.clone(),
            description: new.description.clone(),
            status: RequestStatus::Pending,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.requests.push(request.clone());
        Ok(request)
    }

    async fn list_requests_for_user(&self, user_id: i64) -> Result<Vec<ServiceRequest>, StoreError> {
        self.touch();
        Ok(self
            .tables()
            .requests
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_request(&self, id: i64) -> Result<ServiceRequest, StoreError> {
        self.touch();
        self.tables()
            .requests
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StoreError::NotFound { kind: "service request", id })
    }

    async fn list_requests(&self) -> Result<Vec<ServiceRequest>, StoreError> {
        self.touch();
        Ok(self.tables().requests.iter().rev().cloned().collect())
    }

    async fn update_request(&self, id: i64, changes: &ServiceRequestChanges) -> Result<ServiceRequest, StoreError> {
        self.touch();
        let mut tables = self.tables();
        let request = tables
            .requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound { kind: "service request", id })?;
        if let Some(request_type) = &changes.request_type {
            request.request_type.clone_from(request_type);
        }
        if let Some(description) = &changes.description {
            request.description.clone_from(description);
        }
        if let Some(status) = changes.status {
            request.status = status;
        }
        Ok(request.clone())
    }

    async fn delete_request(&self, id: i64) -> Result<(), StoreError> {
        self.touch();
        let mut tables = self.tables();
        let before = tables.requests.len();
        tables.requests.retain(|r| r.id != id);
        if tables.requests.len() == before {
            return Err(StoreError::NotFound { kind: "service request", id });
        }
        Ok(())
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        self.touch();
        Ok(self.tables().accounts.clone())
    }

    async fn get_account(&self, id: i64) -> Result<Account, StoreError> {
        self.touch();
        self.tables()
            .accounts
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or(StoreError::NotFound { kind: "account", id })
    }

    async fn create_account(&self, new: &NewAccount) -> Result<Account, StoreError> {
        self.touch();
        let mut tables = self.tables();
        if !tables.users.iter().any(|u| u.id == new.user_id) {
            return Err(StoreError::NotFound { kind: "user", id: new.user_id });
        }
        if tables.accounts.iter().any(|a| a.user_id == new.user_id) {
            return Err(StoreError::Conflict(format!("account already exists for user {}", new.user_id)));
        }
        let id = tables.next_id();
        let account = Account {
            id,
            user_id: new.user_id,
            address: new.address.clone(),
            phone_number: new.phone_number.clone(),
        };
        tables.accounts.push(account.clone());
        Ok(account)
    }

    async fn update_account(&self, id: i64, changes: &AccountChanges) -> Result<Account, StoreError> {
        self.touch();
        let mut tables = self.tables();
        let account = tables
            .accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound { kind: "account", id })?;
        if let Some(address) = &changes.address {
            account.address.clone_from(address);
        }
        if let Some(phone_number) = &changes.phone_number {
            account.phone_number.clone_from(phone_number);
        }
        Ok(account.clone())
    }

    async fn delete_account(&self, id: i64) -> Result<(), StoreError> {
        self.touch();
        let mut tables = self.tables();
        let before = tables.accounts.len();
        tables.accounts.retain(|a| a.id != id);
        if tables.accounts.len() == before {
            return Err(StoreError::NotFound { kind: "account", id });
        }
        Ok(())
    }
}
