//! HTML views for the request pages.
//!
//! Templates live in `templates/` and are embedded at compile time. Slots
//! are written `{{NAME}}` and filled in a single pass, so user text that
//! happens to contain a slot marker is never expanded. Every value coming
//! from a user is escaped before it is placed.

use std::fmt::Write;

use time::macros::format_description;

use crate::model::ServiceRequest;
use crate::services::form::{DESCRIPTION, FormErrors, REQUEST_TYPE, SubmissionForm};

const SUBMIT_REQUEST_TEMPLATE: &str = include_str!("../templates/submit_request.html");
const REQUEST_LIST_TEMPLATE: &str = include_str!("../templates/request_list.html");
const REQUEST_DETAIL_TEMPLATE: &str = include_str!("../templates/request_detail.html");
const LOGIN_TEMPLATE: &str = include_str!("../templates/login.html");
const ERROR_TEMPLATE: &str = include_str!("../templates/error.html");

#[must_use]
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Fill `{{NAME}}` slots from `vars`. Unknown slots are left as-is.
fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let key = &after[..end];
        match vars.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => out.push_str(value),
            None => {
                out.push_str("{{");
                out.push_str(key);
                out.push_str("}}");
            }
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

fn error_list(messages: &[String]) -> String {
    if messages.is_empty() {
        return String::new();
    }
    let mut html = String::from("<ul class=\"errorlist\">");
    for message in messages {
        let _ = write!(html, "<li>{}</li>", escape_html(message));
    }
    html.push_str("</ul>");
    html
}

fn format_timestamp(request: &ServiceRequest) -> String {
    request
        .created_at
        .format(format_description!("[year]-[month]-[day] [hour]:[minute] UTC"))
        .unwrap_or_else(|_| request.created_at.to_string())
}

/// `submit_request.html`: empty on first load, refilled with errors after a failed post.
#[must_use]
pub fn submit_request_page(form: &SubmissionForm, errors: &FormErrors) -> String {
    let request_type = escape_html(form.request_type.as_deref().unwrap_or_default());
    let description = escape_html(form.description.as_deref().unwrap_or_default());
    let request_type_errors = error_list(errors.for_field(REQUEST_TYPE));
    let description_errors = error_list(errors.for_field(DESCRIPTION));
    fill(
        SUBMIT_REQUEST_TEMPLATE,
        &[
            ("REQUEST_TYPE_VALUE", request_type.as_str()),
            ("REQUEST_TYPE_ERRORS", request_type_errors.as_str()),
            ("DESCRIPTION_VALUE", description.as_str()),
            ("DESCRIPTION_ERRORS", description_errors.as_str()),
        ],
    )
}

/// `request_list.html`.
#[must_use]
pub fn request_list_page(requests: &[ServiceRequest]) -> String {
    let mut rows = String::new();
    if requests.is_empty() {
        rows.push_str("<tr><td colspan=\"4\">You have not submitted any requests yet.</td></tr>");
    }
    for request in requests {
        let _ = write!(
            rows,
            "<tr><td><a href=\"/request_detail/{id}/\">#{id}</a></td><td>{kind}</td><td>{status}</td><td>{created}</td></tr>",
            id = request.id,
            kind = escape_html(&request.request_type),
            status = request.status,
            created = format_timestamp(request),
        );
    }
    fill(REQUEST_LIST_TEMPLATE, &[("ROWS", rows.as_str())])
}

/// `request_detail.html`.
#[must_use]
pub fn request_detail_page(request: &ServiceRequest) -> String {
    let id = request.id.to_string();
    let request_type = escape_html(&request.request_type);
    let description = escape_html(&request.description);
    let created = format_timestamp(request);
    fill(
        REQUEST_DETAIL_TEMPLATE,
        &[
            ("ID", id.as_str()),
            ("REQUEST_TYPE", request_type.as_str()),
            ("DESCRIPTION", description.as_str()),
            ("STATUS", request.status.as_str()),
            ("CREATED_AT", created.as_str()),
        ],
    )
}

/// `login.html`. `email` pre-fills both steps once a code has been sent.
#[must_use]
pub fn login_page(next: &str, email: &str, message: &str) -> String {
    let next = escape_html(next);
    let email = escape_html(email);
    let message = if message.is_empty() {
        String::new()
    } else {
        format!("<p class=\"notice\">{}</p>", escape_html(message))
    };
    fill(LOGIN_TEMPLATE, &[("NEXT", next.as_str()), ("EMAIL", email.as_str()), ("MESSAGE", message.as_str())])
}

#[must_use]
pub fn error_page(title: &str, message: &str) -> String {
    fill(ERROR_TEMPLATE, &[("TITLE", escape_html(title).as_str()), ("MESSAGE", escape_html(message).as_str())])
}

#[cfg(test)]
#[path = "views_test.rs"]
mod tests;
