use super::*;
use crate::state::test_helpers::test_app;

// =============================================================================
// bytes_to_hex
// =============================================================================

#[test]
fn bytes_to_hex_empty() {
    assert_eq!(bytes_to_hex(&[]), "");
}

#[test]
fn bytes_to_hex_leading_zero() {
    assert_eq!(bytes_to_hex(&[0x0a]), "0a");
}

#[test]
fn bytes_to_hex_multi_byte() {
    assert_eq!(bytes_to_hex(&[0xde, 0xad, 0xbe, 0xef]), "deadbeef");
}

// =============================================================================
// generate_token
// =============================================================================

#[test]
fn generate_token_is_64_hex_chars() {
    let token = generate_token();
    assert_eq!(token.len(), 64);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn generate_token_two_calls_differ() {
    assert_ne!(generate_token(), generate_token());
}

// =============================================================================
// create / validate
// =============================================================================

#[tokio::test]
async fn created_session_resolves_to_its_user() {
    let app = test_app();
    let user = app.seed_user("alice@example.com").await;

    let token = create_session(app.state.store.as_ref(), user.id).await.unwrap();
    let found = validate_session(app.state.store.as_ref(), &token).await.unwrap();
    assert_eq!(found, Some(user));
}

#[tokio::test]
async fn unknown_or_empty_token_has_no_user() {
    let app = test_app();
    assert_eq!(validate_session(app.state.store.as_ref(), "nope").await.unwrap(), None);
    assert_eq!(validate_session(app.state.store.as_ref(), "").await.unwrap(), None);
}
