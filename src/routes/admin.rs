//! Staff-only admin API for service requests and accounts.
//!
//! JSON in, JSON out. Bodies reject unknown fields, so `id`, `user_id` on
//! update, and `created_at` cannot be written through this surface.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use super::auth::StaffUser;
use super::store_error_to_status;
use crate::model::{
    ADDRESS_MAX_CHARS, Account, AccountChanges, NewAccount, NewServiceRequest, PHONE_NUMBER_MAX_CHARS,
    REQUEST_TYPE_MAX_CHARS, RequestStatus, ServiceRequest, ServiceRequestChanges,
};
use crate::services::form::{DESCRIPTION, FormErrors, REQUEST_TYPE, clean_text};
use crate::state::AppState;
use crate::store::StoreError;

const ADDRESS: &str = "address";
const PHONE_NUMBER: &str = "phone_number";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/requests", get(list_requests).post(create_request))
        .route("/requests/{id}", get(get_request).patch(update_request).delete(delete_request))
        .route("/accounts", get(list_accounts).post(create_account))
        .route("/accounts/{id}", get(get_account).patch(update_account).delete(delete_account))
}

// =============================================================================
// ERRORS
// =============================================================================

pub enum AdminError {
    Status(StatusCode),
    Invalid(FormErrors),
}

impl From<StoreError> for AdminError {
    fn from(err: StoreError) -> Self {
        let status = store_error_to_status(&err);
        if status.is_server_error() {
            error!(error = %err, "admin store operation failed");
        }
        Self::Status(status)
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        match self {
            Self::Status(status) => status.into_response(),
            Self::Invalid(errors) => (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "errors": errors }))).into_response(),
        }
    }
}

/// Check an optional update field; absent means unchanged.
fn clean_change(errors: &mut FormErrors, field: &'static str, value: Option<&str>, max: Option<usize>) -> Option<String> {
    value.and_then(|v| clean_text(errors, field, Some(v), max))
}

fn finish<T>(errors: FormErrors, value: T) -> Result<T, AdminError> {
    if errors.is_empty() { Ok(value) } else { Err(AdminError::Invalid(errors)) }
}

// =============================================================================
// SERVICE REQUESTS
// =============================================================================

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateRequestBody {
    user_id: i64,
    request_type: Option<String>,
    description: Option<String>,
    status: Option<RequestStatus>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateRequestBody {
    request_type: Option<String>,
    description: Option<String>,
    status: Option<RequestStatus>,
}

/// `GET /admin/api/requests`: every request, newest first.
pub async fn list_requests(State(state): State<AppState>, _staff: StaffUser) -> Result<Json<Vec<ServiceRequest>>, AdminError> {
    Ok(Json(state.store.list_requests().await?))
}

/// `POST /admin/api/requests`: create a request on behalf of a user.
pub async fn create_request(
    State(state): State<AppState>,
    staff: StaffUser,
    Json(body): Json<CreateRequestBody>,
) -> Result<(StatusCode, Json<ServiceRequest>), AdminError> {
    let mut errors = FormErrors::default();
    let request_type = clean_text(&mut errors, REQUEST_TYPE, body.request_type.as_deref(), Some(REQUEST_TYPE_MAX_CHARS));
    let description = clean_text(&mut errors, DESCRIPTION, body.description.as_deref(), None);
    let (Some(request_type), Some(description)) = (request_type, description) else {
        return Err(AdminError::Invalid(errors));
    };

    let mut request = state
        .store
        .create_request(body.user_id, &NewServiceRequest { request_type, description })
        .await?;
    if let Some(status) = body.status.filter(|s| *s != request.status) {
        let changes = ServiceRequestChanges { status: Some(status), ..ServiceRequestChanges::default() };
        request = state.store.update_request(request.id, &changes).await?;
    }

    info!(request_id = request.id, staff_id = staff.user.id, "admin created service request");
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn get_request(
    State(state): State<AppState>,
    _staff: StaffUser,
    Path(id): Path<i64>,
) -> Result<Json<ServiceRequest>, AdminError> {
    Ok(Json(state.store.get_request(id).await?))
}

/// `PATCH /admin/api/requests/{id}`: edit type, description, or status.
pub async fn update_request(
    State(state): State<AppState>,
    staff: StaffUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateRequestBody>,
) -> Result<Json<ServiceRequest>, AdminError> {
    let mut errors = FormErrors::default();
    let changes = ServiceRequestChanges {
        request_type: clean_change(&mut errors, REQUEST_TYPE, body.request_type.as_deref(), Some(REQUEST_TYPE_MAX_CHARS)),
        description: clean_change(&mut errors, DESCRIPTION, body.description.as_deref(), None),
        status: body.status,
    };
    let changes = finish(errors, changes)?;

    let request = state.store.update_request(id, &changes).await?;
    info!(request_id = id, staff_id = staff.user.id, status = %request.status, "admin updated service request");
    Ok(Json(request))
}

pub async fn delete_request(State(state): State<AppState>, staff: StaffUser, Path(id): Path<i64>) -> Result<StatusCode, AdminError> {
    state.store.delete_request(id).await?;
    info!(request_id = id, staff_id = staff.user.id, "admin deleted service request");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// ACCOUNTS
// =============================================================================

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateAccountBody {
    user_id: i64,
    address: Option<String>,
    phone_number: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateAccountBody {
    address: Option<String>,
    phone_number: Option<String>,
}

pub async fn list_accounts(State(state): State<AppState>, _staff: StaffUser) -> Result<Json<Vec<Account>>, AdminError> {
    Ok(Json(state.store.list_accounts().await?))
}

/// `POST /admin/api/accounts`: 409 when the user already has one.
pub async fn create_account(
    State(state): State<AppState>,
    staff: StaffUser,
    Json(body): Json<CreateAccountBody>,
) -> Result<(StatusCode, Json<Account>), AdminError> {
    let mut errors = FormErrors::default();
    let address = clean_text(&mut errors, ADDRESS, body.address.as_deref(), Some(ADDRESS_MAX_CHARS));
    let phone_number = clean_text(&mut errors, PHONE_NUMBER, body.phone_number.as_deref(), Some(PHONE_NUMBER_MAX_CHARS));
    let (Some(address), Some(phone_number)) = (address, phone_number) else {
        return Err(AdminError::Invalid(errors));
    };

    let account = state
        .store
        .create_account(&NewAccount { user_id: body.user_id, address, phone_number })
        .await?;
    info!(account_id = account.id, user_id = account.user_id, staff_id = staff.user.id, "admin created account");
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn get_account(State(state): State<AppState>, _staff: StaffUser, Path(id): Path<i64>) -> Result<Json<Account>, AdminError> {
    Ok(Json(state.store.get_account(id).await?))
}

pub async fn update_account(
    State(state): State<AppState>,
    staff: StaffUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateAccountBody>,
) -> Result<Json<Account>, AdminError> {
    let mut errors = FormErrors::default();
    let changes = AccountChanges {
        address: clean_change(&mut errors, ADDRESS, body.address.as_deref(), Some(ADDRESS_MAX_CHARS)),
        phone_number: clean_change(&mut errors, PHONE_NUMBER, body.phone_number.as_deref(), Some(PHONE_NUMBER_MAX_CHARS)),
    };
    let changes = finish(errors, changes)?;

    let account = state.store.update_account(id, &changes).await?;
    info!(account_id = id, staff_id = staff.user.id, "admin updated account");
    Ok(Json(account))
}

pub async fn delete_account(State(state): State<AppState>, staff: StaffUser, Path(id): Path<i64>) -> Result<StatusCode, AdminError> {
    state.store.delete_account(id).await?;
    info!(account_id = id, staff_id = staff.user.id, "admin deleted account");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "admin_test.rs"]
mod tests;
