use super::*;

#[test]
fn status_defaults_to_pending() {
    assert_eq!(RequestStatus::default(), RequestStatus::Pending);
}

#[test]
fn status_labels_round_trip_through_from_str() {
    for status in RequestStatus::ALL {
        assert_eq!(status.as_str().parse::<RequestStatus>(), Ok(status));
    }
}

#[test]
fn status_rejects_unknown_and_differently_cased_labels() {
    assert!("pending".parse::<RequestStatus>().is_err());
    assert!("InProgress".parse::<RequestStatus>().is_err());
    assert!("".parse::<RequestStatus>().is_err());
}

#[test]
fn status_serializes_with_display_label() {
    let json = serde_json::to_string(&RequestStatus::InProgress).unwrap();
    assert_eq!(json, "\"In Progress\"");
    let back: RequestStatus = serde_json::from_str("\"Completed\"").unwrap();
    assert_eq!(back, RequestStatus::Completed);
}

#[test]
fn service_request_serializes_created_at_as_rfc3339() {
    let req = ServiceRequest {
        id: 7,
        user_id: 1,
        request_type: "Leak".into(),
        description: "Gas smell in kitchen".into(),
        status: RequestStatus::Pending,
        created_at: time::macros::datetime!(2026-03-01 12:30:00 UTC),
    };
    let value = serde_json::to_value(&req).unwrap();
    assert_eq!(value["status"], "Pending");
    assert_eq!(value["created_at"], "2026-03-01T12:30:00Z");
}
