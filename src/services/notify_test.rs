use super::*;

#[test]
fn submission_notice_has_fixed_subject_and_body() {
    let email = submission_notice("noreply@example.test", "alice@example.com");
    assert_eq!(email.subject, "Service Request Submitted");
    assert_eq!(email.text, "Your request has been submitted.");
    assert_eq!(email.from, "noreply@example.test");
    assert_eq!(email.to, "alice@example.com");
    assert!(email.html.is_none());
}

#[test]
fn build_message_accepts_valid_addresses() {
    let email = submission_notice("Desk <noreply@example.test>", "alice@example.com");
    assert!(build_message(&email).is_ok());
}

#[test]
fn build_message_with_html_alternative() {
    let mut email = submission_notice("noreply@example.test", "alice@example.com");
    email.html = Some("<p>hi</p>".into());
    assert!(build_message(&email).is_ok());
}

#[test]
fn build_message_rejects_bad_recipient() {
    let email = submission_notice("noreply@example.test", "not an address");
    let err = build_message(&email).unwrap_err();
    assert!(matches!(err, MailError::InvalidAddress { ref address, .. } if address == "not an address"));
}

#[tokio::test]
async fn log_transport_always_accepts() {
    let config = MailConfig { from: "noreply@example.test".into(), transport: MailTransport::Log };
    let mailer = build_mailer(&config).unwrap();
    mailer
        .send(&submission_notice(&config.from, "alice@example.com"))
        .await
        .unwrap();
}

#[tokio::test]
async fn plaintext_smtp_transport_builds_without_connecting() {
    let smtp = SmtpConfig {
        host: "localhost".into(),
        port: 2525,
        username: Some("mailer".into()),
        password: Some("s3cret".into()),
        tls: false,
    };
    assert!(SmtpMailer::new(&smtp).is_ok());
}
