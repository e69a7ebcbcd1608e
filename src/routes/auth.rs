//! Auth routes: email-code login, logout, and the session extractors.

use axum::extract::{FromRef, FromRequestParts, Query, State};
use axum::http::StatusCode;
use axum::http::uri::PathAndQuery;
use axum::http::request::Parts;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use time::Duration;
use tracing::{error, info};

use super::error_response;
use crate::model::User;
use crate::services::email_auth::{self, EmailAuthError};
use crate::services::session;
use crate::state::AppState;
use crate::views;

pub(crate) const COOKIE_NAME: &str = "session_token";
const DEFAULT_NEXT: &str = "/request_list/";
const SESSION_DAYS: i64 = 30;

fn session_token(parts: &Parts) -> String {
    CookieJar::from_headers(&parts.headers)
        .get(COOKIE_NAME)
        .map(|c| c.value().to_owned())
        .unwrap_or_default()
}

/// Only same-site absolute paths are accepted as post-login targets.
/// Browsers drop control characters from a `Location`, so `/\t/host` would
/// turn into a protocol-relative URL.
pub(crate) fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(char::is_control) =>
        {
            path
        }
        _ => DEFAULT_NEXT,
    }
}

/// `{login_url}?next=<target>` with the target form-encoded.
pub(crate) fn login_redirect_target(login_url: &str, next: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("next", next)
        .finish();
    format!("{login_url}?{query}")
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::days(SESSION_DAYS))
        .build()
}

// =============================================================================
// EXTRACTORS
// =============================================================================

/// Signed-in user for HTML pages. Anonymous callers are redirected to the
/// login page with `next` pointing back at the requested path.
pub struct AuthUser {
    pub user: User,
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let token = session_token(parts);

        let user = session::validate_session(app_state.store.as_ref(), &token)
            .await
            .map_err(|e| {
                error!(error = %e, "session lookup failed");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong. Please try again later.")
            })?;

        match user {
            Some(user) => Ok(Self { user }),
            None => {
                let requested = parts.uri.path_and_query().map_or("/", PathAndQuery::as_str);
                let target = login_redirect_target(&app_state.config.login_url, requested);
                Err(Redirect::to(&target).into_response())
            }
        }
    }
}

/// Signed-in staff member for the admin API: 401 without a session, 403
/// for non-staff users.
pub struct StaffUser {
    pub user: User,
}

impl<S> FromRequestParts<S> for StaffUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let token = session_token(parts);

        let user = session::validate_session(app_state.store.as_ref(), &token)
            .await
            .map_err(|e| {
                error!(error = %e, "session lookup failed");
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        if !user.is_staff {
            return Err(StatusCode::FORBIDDEN);
        }
        Ok(Self { user })
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Deserialize)]
pub struct NextQuery {
    next: Option<String>,
}

/// `GET /login/`: show the sign-in page.
pub async fn login_form(Query(query): Query<NextQuery>) -> Html<String> {
    Html(views::login_page(safe_next(query.next.as_deref()), "", ""))
}

#[derive(Deserialize)]
pub struct RequestCodeForm {
    email: Option<String>,
    next: Option<String>,
}

/// `POST /login/`: mail a fresh access code.
pub async fn request_code(State(state): State<AppState>, Form(form): Form<RequestCodeForm>) -> Response {
    let next = safe_next(form.next.as_deref());
    let email = form.email.unwrap_or_default();

    match email_auth::request_access_code(&state, &email).await {
        Ok(()) => {
            let normalized = email_auth::normalize_email(&email).unwrap_or_default();
            let message = format!("We sent a sign-in code to {normalized}.");
            Html(views::login_page(next, &normalized, &message)).into_response()
        }
        Err(EmailAuthError::InvalidEmail) => {
            Html(views::login_page(next, &email, "Enter a valid email address.")).into_response()
        }
        Err(e) => {
            error!(error = %e, "access code request failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "We could not send a sign-in code. Please try again later.")
        }
    }
}

#[derive(Deserialize)]
pub struct VerifyCodeForm {
    email: Option<String>,
    code: Option<String>,
    next: Option<String>,
}

/// `POST /login/verify/`: exchange a code for a session cookie.
pub async fn verify_code(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<VerifyCodeForm>,
) -> Response {
    let next = safe_next(form.next.as_deref()).to_owned();
    let email = form.email.unwrap_or_default();
    let code = form.code.unwrap_or_default();

    let user = match email_auth::verify_access_code(state.store.as_ref(), &email, &code).await {
        Ok(user) => user,
        Err(EmailAuthError::InvalidEmail | EmailAuthError::InvalidCode | EmailAuthError::VerificationFailed) => {
            let message = "That code is not valid. Request a new one if it has expired.";
            return Html(views::login_page(&next, &email, message)).into_response();
        }
        Err(e) => {
            error!(error = %e, "access code verification failed");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong. Please try again later.");
        }
    };

    let token = match session::create_session(state.store.as_ref(), user.id).await {
        Ok(token) => token,
        Err(e) => {
            error!(error = %e, "session creation failed");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong. Please try again later.");
        }
    };

    info!(user_id = user.id, "user signed in");
    let jar = jar.add(session_cookie(token, state.config.cookie_secure));
    (jar, Redirect::to(&next)).into_response()
}

/// `POST /logout/`: delete the session and clear the cookie.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(COOKIE_NAME) {
        if let Err(e) = state.store.delete_session(cookie.value()).await {
            error!(error = %e, "session delete failed");
        }
    }

    let cleared = Cookie::build((COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.cookie_secure)
        .max_age(Duration::ZERO)
        .build();
    (jar.add(cleared), Redirect::to(&state.config.login_url)).into_response()
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
