//! Domain records shared by the store, services, and routes.
//!
//! DESIGN
//! ======
//! Rows are plain structs mirroring the Postgres tables. Status is stored as
//! TEXT guarded by a CHECK constraint, so `RequestStatus` owns the mapping
//! between the three labels and the enum.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub const REQUEST_TYPE_MAX_CHARS: usize = 100;
pub const ADDRESS_MAX_CHARS: usize = 255;
pub const PHONE_NUMBER_MAX_CHARS: usize = 15;

// =============================================================================
// STATUS
// =============================================================================

/// Lifecycle of a service request. New requests always start as `Pending`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    #[default]
    #[serde(rename = "Pending")]
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
}

impl RequestStatus {
    pub const ALL: [Self; 3] = [Self::Pending, Self::InProgress, Self::Completed];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown request status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for RequestStatus {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == raw)
            .ok_or_else(|| UnknownStatus(raw.to_owned()))
    }
}

// =============================================================================
// RECORDS
// =============================================================================

/// Authenticated identity. Created on first login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub is_staff: bool,
}

/// A user-submitted utility issue. Mirrors the `service_requests` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceRequest {
    pub id: i64,
    pub user_id: i64,
    pub request_type: String,
    pub description: String,
    pub status: RequestStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Contact details, at most one per user. Mirrors the `accounts` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub address: String,
    pub phone_number: String,
}

/// Validated fields for a new service request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewServiceRequest {
    pub request_type: String,
    pub description: String,
}

/// Partial update applied from the admin console. `created_at` is never writable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceRequestChanges {
    pub request_type: Option<String>,
    pub description: Option<String>,
    pub status: Option<RequestStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub user_id: i64,
    pub address: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountChanges {
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
