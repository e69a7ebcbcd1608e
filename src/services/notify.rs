//! Notification sender: outbound email over a pluggable transport.
//!
//! DESIGN
//! ======
//! Handlers depend on `dyn Mailer`. The concrete transport is picked from
//! `MailConfig` at startup: SMTP through `lettre`, the Resend HTTP API, or a
//! log-only transport for local development.
//!
//! ERROR HANDLING
//! ==============
//! Sends are synchronous from the caller's point of view and never retried.
//! Transient and permanent failures are reported the same way; what happens
//! next is the caller's policy.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use resend_rs::Resend;
use resend_rs::types::CreateEmailBaseOptions;
use tracing::info;

use crate::config::{MailConfig, MailTransport, SmtpConfig};

pub const SUBMISSION_SUBJECT: &str = "Service Request Submitted";
pub const SUBMISSION_BODY: &str = "Your request has been submitted.";

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("message build failed: {0}")]
    Build(String),
    #[error("mail transport setup failed: {0}")]
    Setup(String),
    #[error("mail delivery failed: {0}")]
    Delivery(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
}

/// Fixed confirmation sent after a service request is saved.
#[must_use]
pub fn submission_notice(from: &str, to: &str) -> OutgoingEmail {
    OutgoingEmail {
        from: from.to_owned(),
        to: to.to_owned(),
        subject: SUBMISSION_SUBJECT.to_owned(),
        text: SUBMISSION_BODY.to_owned(),
        html: None,
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Hand one message to the transport, returning once it is accepted or rejected.
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// Build the transport named by `config`.
///
/// # Errors
///
/// Returns an error if the SMTP relay cannot be configured.
pub fn build_mailer(config: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    Ok(match &config.transport {
        MailTransport::Log => Arc::new(LogMailer),
        MailTransport::Smtp(smtp) => Arc::new(SmtpMailer::new(smtp)?),
        MailTransport::Resend { api_key } => Arc::new(ResendMailer::new(api_key)),
    })
}

// =============================================================================
// LOG
// =============================================================================

pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        info!(from = %email.from, to = %email.to, subject = %email.subject, body = %email.text, "mail (log transport)");
        Ok(())
    }
}

// =============================================================================
// SMTP
// =============================================================================

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// # Errors
    ///
    /// Returns an error if the STARTTLS relay cannot be set up for `config.host`.
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let builder = if config.tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| MailError::Setup(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };
        let mut builder = builder.port(config.port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }
        Ok(Self { transport: builder.build() })
    }
}

fn mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| MailError::InvalidAddress { address: address.to_owned(), reason: e.to_string() })
}

pub(crate) fn build_message(email: &OutgoingEmail) -> Result<Message, MailError> {
    let builder = Message::builder()
        .from(mailbox(&email.from)?)
        .to(mailbox(&email.to)?)
        .subject(email.subject.clone());
    let message = match &email.html {
        Some(html) => builder.multipart(MultiPart::alternative_plain_html(email.text.clone(), html.clone())),
        None => builder.body(email.text.clone()),
    };
    message.map_err(|e| MailError::Build(e.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let message = build_message(email)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Delivery(e.to_string()))?;
        Ok(())
    }
}

// =============================================================================
// RESEND
// =============================================================================

pub struct ResendMailer {
    client: Resend,
}

impl ResendMailer {
    #[must_use]
    pub fn new(api_key: &str) -> Self {
        Self { client: Resend::new(api_key) }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let to = [email.to.as_str()];
        let mut options = CreateEmailBaseOptions::new(&email.from, to, &email.subject).with_text(&email.text);
        if let Some(html) = &email.html {
            options = options.with_html(html);
        }
        self.client
            .emails
            .send(options)
            .await
            .map_err(|e| MailError::Delivery(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "notify_test.rs"]
mod tests;
