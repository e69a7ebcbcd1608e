//! Email access-code login.
//!
//! Creates and verifies short-lived six-character codes linked to an email.
//! Codes are stored hashed; a code dies after five wrong guesses or ten
//! minutes, whichever comes first.

use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::model::User;
use crate::services::notify::{MailError, OutgoingEmail};
use crate::services::session::bytes_to_hex;
use crate::state::AppState;
use crate::store::{Store, StoreError};

const CODE_LEN: usize = 6;
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const MAX_FAILED_ATTEMPTS: i32 = 5;
const LOGIN_CODE_SUBJECT: &str = "Your service desk sign-in code";
const LOGIN_CODE_TEMPLATE: &str = include_str!("../../templates/login_code_email.html");

#[derive(Debug, thiserror::Error)]
pub enum EmailAuthError {
    #[error("invalid email")]
    InvalidEmail,
    #[error("invalid code")]
    InvalidCode,
    #[error("expired or incorrect code")]
    VerificationFailed,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    EmailDelivery(#[from] MailError),
}

#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    let (local, domain) = normalized.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') || normalized.contains('\0') {
        return None;
    }
    Some(normalized)
}

#[must_use]
pub fn normalize_code(code: &str) -> Option<String> {
    let normalized = code.trim().to_ascii_uppercase();
    if normalized.len() != CODE_LEN || !normalized.bytes().all(|c| CODE_ALPHABET.contains(&c)) {
        return None;
    }
    Some(normalized)
}

#[must_use]
pub fn generate_access_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET[idx] as char
        })
        .collect()
}

#[must_use]
pub fn hash_access_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    bytes_to_hex(&hasher.finalize())
}

fn name_from_email(email: &str) -> String {
    email
        .split('@')
        .next()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or("user")
        .to_owned()
}

#[must_use]
pub fn render_login_code_email(email: &str, code: &str) -> String {
    LOGIN_CODE_TEMPLATE
        .replace("{{EMAIL}}", &crate::views::escape_html(email))
        .replace("{{CODE}}", code)
}

/// Register the email if new, issue a fresh code, and mail it.
///
/// # Errors
///
/// Returns `InvalidEmail` for malformed addresses, or the store/mail error.
pub async fn request_access_code(state: &AppState, email: &str) -> Result<(), EmailAuthError> {
    let normalized = normalize_email(email).ok_or(EmailAuthError::InvalidEmail)?;
    let grant_staff = state.config.is_admin_email(&normalized);
    let user = state
        .store
        .upsert_user(&normalized, &name_from_email(&normalized), grant_staff)
        .await?;

    let code = generate_access_code();
    state
        .store
        .replace_login_code(&normalized, &hash_access_code(&code))
        .await?;

    let email = OutgoingEmail {
        from: state.config.mail.from.clone(),
        to: normalized.clone(),
        subject: LOGIN_CODE_SUBJECT.to_owned(),
        text: format!("Your sign-in code is {code}. It expires in 10 minutes."),
        html: Some(render_login_code_email(&normalized, &code)),
    };
    state.mailer.send(&email).await?;
    info!(user_id = user.id, "login code issued");
    Ok(())
}

/// Check a code and return the user it signs in.
///
/// # Errors
///
/// Returns `VerificationFailed` for a wrong, expired, or spent code.
pub async fn verify_access_code(store: &dyn Store, email: &str, code: &str) -> Result<User, EmailAuthError> {
    let normalized_email = normalize_email(email).ok_or(EmailAuthError::InvalidEmail)?;
    let normalized_code = normalize_code(code).ok_or(EmailAuthError::InvalidCode)?;

    let consumed = store
        .consume_login_code(&normalized_email, &hash_access_code(&normalized_code), MAX_FAILED_ATTEMPTS)
        .await?;
    if !consumed {
        return Err(EmailAuthError::VerificationFailed);
    }

    store
        .user_by_email(&normalized_email)
        .await?
        .ok_or(EmailAuthError::VerificationFailed)
}

#[cfg(test)]
#[path = "email_auth_test.rs"]
mod tests;
