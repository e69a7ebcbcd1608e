//! Service request operations used by the request pages.
//!
//! DESIGN
//! ======
//! Submission is two-phase: the record is committed first, then the
//! confirmation email is sent. A failed send never rolls the record back;
//! `NotifyFailurePolicy` decides whether the failure reaches the caller.
//!
//! Detail lookup is by identifier only. Any signed-in user can read any
//! request whose id they know; this matches the behavior of the system this
//! service replaced and is kept until ownership rules are agreed.

use tracing::{error, info, warn};

use crate::config::NotifyFailurePolicy;
use crate::model::{ServiceRequest, User};
use crate::services::form::{FormErrors, SubmissionForm, validate_submission};
use crate::services::notify::{MailError, submission_notice};
use crate::state::AppState;
use crate::store::{Store, StoreError};

#[derive(Debug)]
pub enum SubmitOutcome {
    Created(ServiceRequest),
    Invalid(FormErrors),
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("service request {request_id} saved but notification failed: {source}")]
    Notify {
        request_id: i64,
        #[source]
        source: MailError,
    },
}

/// Validate, persist, then notify.
///
/// # Errors
///
/// Returns `SubmitError::Store` if persistence fails (nothing is sent), or
/// `SubmitError::Notify` under the strict policy when the send fails after
/// the record was committed.
pub async fn submit(state: &AppState, user: &User, form: &SubmissionForm) -> Result<SubmitOutcome, SubmitError> {
    let new = match validate_submission(form) {
        Ok(new) => new,
        Err(errors) => return Ok(SubmitOutcome::Invalid(errors)),
    };

    let request = state.store.create_request(user.id, &new).await?;
    info!(request_id = request.id, user_id = user.id, request_type = %request.request_type, "service request created");

    let notice = submission_notice(&state.config.mail.from, &user.email);
    if let Err(source) = state.mailer.send(&notice).await {
        match state.config.notify_failure {
            NotifyFailurePolicy::Strict => {
                error!(request_id = request.id, error = %source, "submission notice failed");
                return Err(SubmitError::Notify { request_id: request.id, source });
            }
            NotifyFailurePolicy::BestEffort => {
                warn!(request_id = request.id, error = %source, "submission notice failed; continuing");
            }
        }
    }

    Ok(SubmitOutcome::Created(request))
}

/// Requests owned by `user`, newest first.
///
/// # Errors
///
/// Returns a store error if the query fails.
pub async fn list_for_user(store: &dyn Store, user: &User) -> Result<Vec<ServiceRequest>, StoreError> {
    store.list_requests_for_user(user.id).await
}

/// Single request by id, regardless of owner.
///
/// # Errors
///
/// Returns `StoreError::NotFound` when no request has this id.
pub async fn detail(store: &dyn Store, id: i64) -> Result<ServiceRequest, StoreError> {
    store.get_request(id).await
}

#[cfg(test)]
#[path = "requests_test.rs"]
mod tests;
