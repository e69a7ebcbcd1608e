//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The three request pages, the login flow, and the staff-only admin API
//! share one Axum router. The route table is static.

pub mod admin;
pub mod auth;
pub mod requests;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::state::AppState;
use crate::store::StoreError;
use crate::views;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/submit_request/", get(requests::submit_request_form).post(requests::submit_request))
        .route("/request_list/", get(requests::request_list))
        .route("/request_detail/{id}/", get(requests::request_detail))
        .route("/login/", get(auth::login_form).post(auth::request_code))
        .route("/login/verify/", post(auth::verify_code))
        .route("/logout/", post(auth::logout))
        .nest("/admin/api", admin::routes())
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Rendered error page with the given status.
pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    let title = status.canonical_reason().unwrap_or("Error");
    (status, Html(views::error_page(title, message))).into_response()
}

pub(crate) fn store_error_to_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::Conflict(_) => StatusCode::CONFLICT,
        StoreError::InvalidRow(_) | StoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Log server-side failures and render the matching page.
pub(crate) fn store_error_page(err: &StoreError) -> Response {
    let status = store_error_to_status(err);
    if status.is_server_error() {
        error!(error = %err, "store operation failed");
        return error_response(status, "Something went wrong. Please try again later.");
    }
    if err.is_not_found() {
        return error_response(status, "The page you asked for does not exist.");
    }
    error_response(status, "That change conflicts with existing data.")
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
