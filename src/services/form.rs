//! Submission form validation.
//!
//! Only `request_type` and `description` are read from a posted form; any
//! other field is ignored. Values are trimmed before checking, and the
//! trimmed values are what gets stored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{NewServiceRequest, REQUEST_TYPE_MAX_CHARS};

pub const REQUEST_TYPE: &str = "request_type";
pub const DESCRIPTION: &str = "description";

const REQUIRED_MESSAGE: &str = "This field is required.";
const NULL_CHARACTER_MESSAGE: &str = "Null characters are not allowed.";

/// Raw form body as posted by the browser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SubmissionForm {
    pub request_type: Option<String>,
    pub description: Option<String>,
}

/// Per-field error messages, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(transparent)]
#[error("submission failed validation: {fields:?}")]
pub struct FormErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
}

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn for_field(&self, field: &str) -> &[String] {
        self.fields.get(field).map_or(&[], Vec::as_slice)
    }
}

/// Message for a value longer than `max` characters, if it is.
#[must_use]
pub fn max_chars_error(value: &str, max: usize) -> Option<String> {
    let len = value.chars().count();
    (len > max).then(|| format!("Ensure this value has at most {max} characters (it has {len})."))
}

/// Trim `value` and check it is present, free of NUL characters, and at
/// most `max_chars` long.
/// Problems are recorded under `field`; the cleaned text is returned only
/// when it passed.
pub fn clean_text(
    errors: &mut FormErrors,
    field: &'static str,
    value: Option<&str>,
    max_chars: Option<usize>,
) -> Option<String> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        errors.add(field, REQUIRED_MESSAGE);
        return None;
    };
    if value.contains('\0') {
        errors.add(field, NULL_CHARACTER_MESSAGE);
        return None;
    }
    if let Some(message) = max_chars.and_then(|max| max_chars_error(value, max)) {
        errors.add(field, message);
        return None;
    }
    Some(value.to_owned())
}

/// Validate and normalize a posted submission.
///
/// # Errors
///
/// Returns every field problem found; nothing should be persisted on error.
pub fn validate_submission(form: &SubmissionForm) -> Result<NewServiceRequest, FormErrors> {
    let mut errors = FormErrors::default();
    let request_type = clean_text(&mut errors, REQUEST_TYPE, form.request_type.as_deref(), Some(REQUEST_TYPE_MAX_CHARS));
    let description = clean_text(&mut errors, DESCRIPTION, form.description.as_deref(), None);

    match (request_type, description) {
        (Some(request_type), Some(description)) => Ok(NewServiceRequest { request_type, description }),
        _ => Err(errors),
    }
}

#[cfg(test)]
#[path = "form_test.rs"]
mod tests;
