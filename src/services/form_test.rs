use super::*;

fn form(request_type: Option<&str>, description: Option<&str>) -> SubmissionForm {
    SubmissionForm { request_type: request_type.map(str::to_owned), description: description.map(str::to_owned) }
}

#[test]
fn valid_submission_is_trimmed() {
    let valid = validate_submission(&form(Some("  Leak "), Some("\nGas smell in kitchen  "))).unwrap();
    assert_eq!(valid.request_type, "Leak");
    assert_eq!(valid.description, "Gas smell in kitchen");
}

#[test]
fn missing_fields_report_required() {
    let errors = validate_submission(&form(None, None)).unwrap_err();
    assert_eq!(errors.for_field(REQUEST_TYPE), ["This field is required."]);
    assert_eq!(errors.for_field(DESCRIPTION), ["This field is required."]);
}

#[test]
fn whitespace_only_counts_as_missing() {
    let errors = validate_submission(&form(Some("   "), Some("ok"))).unwrap_err();
    assert_eq!(errors.for_field(REQUEST_TYPE).len(), 1);
    assert!(errors.for_field(DESCRIPTION).is_empty());
}

#[test]
fn missing_description_alone_fails() {
    let errors = validate_submission(&form(Some("Leak"), Some(""))).unwrap_err();
    assert!(errors.for_field(REQUEST_TYPE).is_empty());
    assert_eq!(errors.for_field(DESCRIPTION), ["This field is required."]);
}

#[test]
fn request_type_length_limit_is_inclusive() {
    let exactly = "x".repeat(100);
    assert!(validate_submission(&form(Some(&exactly), Some("d"))).is_ok());

    let over = "x".repeat(101);
    let errors = validate_submission(&form(Some(&over), Some("d"))).unwrap_err();
    assert_eq!(
        errors.for_field(REQUEST_TYPE),
        ["Ensure this value has at most 100 characters (it has 101)."]
    );
}

#[test]
fn request_type_length_counts_characters_not_bytes() {
    // 100 two-byte characters: 200 bytes, still within the limit.
    let accented = "é".repeat(100);
    assert!(validate_submission(&form(Some(&accented), Some("d"))).is_ok());
}

#[test]
fn long_description_is_accepted() {
    let description = "leak ".repeat(2_000);
    assert!(validate_submission(&form(Some("Leak"), Some(&description))).is_ok());
}

#[test]
fn unknown_form_fields_are_ignored() {
    let parsed: SubmissionForm =
        serde_json::from_str(r#"{"request_type":"Leak","description":"d","status":"Completed","user_id":9}"#)
            .unwrap();
    assert_eq!(parsed, form(Some("Leak"), Some("d")));
}

#[test]
fn max_chars_error_only_when_over() {
    assert_eq!(max_chars_error("abc", 3), None);
    assert_eq!(
        max_chars_error("abcd", 3).as_deref(),
        Some("Ensure this value has at most 3 characters (it has 4).")
    );
}

#[test]
fn null_characters_are_rejected() {
    let errors = validate_submission(&form(Some("Leak"), Some("a\0b"))).unwrap_err();
    assert_eq!(errors.for_field(DESCRIPTION), ["Null characters are not allowed."]);
    assert!(errors.for_field(REQUEST_TYPE).is_empty());

    let errors = validate_submission(&form(Some("Le\0ak"), Some("d"))).unwrap_err();
    assert_eq!(errors.for_field(REQUEST_TYPE), ["Null characters are not allowed."]);
}
