//! Service request pages.
//!
//! Every handler takes `AuthUser` first, so an anonymous request is turned
//! away before its body is read or the store is touched.

use axum::Form;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};

use super::auth::AuthUser;
use super::{error_response, store_error_page};
use crate::services::form::{FormErrors, SubmissionForm};
use crate::services::requests::{self, SubmitError, SubmitOutcome};
use crate::state::AppState;
use crate::views;

const LIST_PATH: &str = "/request_list/";

/// `GET /submit_request/`: empty form.
pub async fn submit_request_form(_auth: AuthUser) -> Html<String> {
    Html(views::submit_request_page(&SubmissionForm::default(), &FormErrors::default()))
}

/// `POST /submit_request/`: save, notify the submitter, then redirect to the list.
pub async fn submit_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Form(form): Form<SubmissionForm>,
) -> Response {
    match requests::submit(&state, &auth.user, &form).await {
        Ok(SubmitOutcome::Created(_)) => Redirect::to(LIST_PATH).into_response(),
        Ok(SubmitOutcome::Invalid(errors)) => Html(views::submit_request_page(&form, &errors)).into_response(),
        Err(SubmitError::Store(e)) => store_error_page(&e),
        Err(SubmitError::Notify { .. }) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Your request was saved, but we could not send the confirmation email.",
        ),
    }
}

/// `GET /request_list/`: the caller's own requests.
pub async fn request_list(State(state): State<AppState>, auth: AuthUser) -> Response {
    match requests::list_for_user(state.store.as_ref(), &auth.user).await {
        Ok(list) => Html(views::request_list_page(&list)).into_response(),
        Err(e) => store_error_page(&e),
    }
}

/// `GET /request_detail/{id}/`: one request by id.
pub async fn request_detail(State(state): State<AppState>, _auth: AuthUser, Path(id): Path<String>) -> Response {
    let Ok(id) = id.parse::<i64>() else {
        return error_response(StatusCode::NOT_FOUND, "The page you asked for does not exist.");
    };
    match requests::detail(state.store.as_ref(), id).await {
        Ok(request) => Html(views::request_detail_page(&request)).into_response(),
        Err(e) => store_error_page(&e),
    }
}
