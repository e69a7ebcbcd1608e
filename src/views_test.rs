use super::*;
use crate::model::RequestStatus;
use crate::services::form::validate_submission;

fn sample_request() -> ServiceRequest {
    ServiceRequest {
        id: 42,
        user_id: 1,
        request_type: "Leak".into(),
        description: "Gas smell in kitchen".into(),
        status: RequestStatus::InProgress,
        created_at: time::macros::datetime!(2026-03-01 08:05:00 UTC),
    }
}

#[test]
fn escape_html_covers_markup_characters() {
    assert_eq!(escape_html(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;");
    assert_eq!(escape_html("plain"), "plain");
}

#[test]
fn fill_is_single_pass() {
    let out = fill("{{A}}-{{B}}", &[("A", "{{B}}"), ("B", "b")]);
    assert_eq!(out, "{{B}}-b");
}

#[test]
fn fill_keeps_unknown_and_unterminated_slots() {
    assert_eq!(fill("x {{NOPE}} y", &[]), "x {{NOPE}} y");
    assert_eq!(fill("x {{OPEN", &[("OPEN", "v")]), "x {{OPEN");
}

#[test]
fn empty_submit_form_has_no_errors_or_values() {
    let html = submit_request_page(&SubmissionForm::default(), &FormErrors::default());
    assert!(html.contains("name=\"request_type\""));
    assert!(html.contains("name=\"description\""));
    assert!(!html.contains("errorlist"));
    assert!(!html.contains("{{"));
}

#[test]
fn rerendered_form_keeps_values_and_shows_errors() {
    let form = SubmissionForm { request_type: Some("<Leak>".into()), description: None };
    let errors = validate_submission(&form).unwrap_err();
    let html = submit_request_page(&form, &errors);
    assert!(html.contains("value=\"&lt;Leak&gt;\""));
    assert!(html.contains("<li>This field is required.</li>"));
}

#[test]
fn request_list_links_each_request() {
    let html = request_list_page(&[sample_request()]);
    assert!(html.contains("href=\"/request_detail/42/\""));
    assert!(html.contains("In Progress"));
    assert!(html.contains("2026-03-01 08:05 UTC"));
}

#[test]
fn request_list_empty_state() {
    let html = request_list_page(&[]);
    assert!(html.contains("You have not submitted any requests yet."));
}

#[test]
fn request_detail_escapes_user_text() {
    let mut request = sample_request();
    request.description = "<script>alert(1)</script> {{STATUS}}".into();
    let html = request_detail_page(&request);
    assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt; {{STATUS}}"));
    assert!(html.contains("Service request #42"));
    assert!(!html.contains("<script>"));
}

#[test]
fn login_page_carries_next_and_message() {
    let html = login_page("/submit_request/", "a@b.c", "Check your inbox.");
    assert!(html.contains("value=\"/submit_request/\""));
    assert!(html.contains("value=\"a@b.c\""));
    assert!(html.contains("<p class=\"notice\">Check your inbox.</p>"));
}

#[test]
fn error_page_escapes_message() {
    let html = error_page("Not found", "<none>");
    assert!(html.contains("<title>Not found</title>"));
    assert!(html.contains("&lt;none&gt;"));
}
