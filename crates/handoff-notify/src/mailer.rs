// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound mail delivery.
//!
//! The worker talks to a [`Mailer`] trait object so tests can record sends
//! and a disabled deployment can drain the queue without an SMTP relay.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use handoff_config::{NotifyConfig, SmtpConfig};
use handoff_core::HandoffError;

use crate::email::RenderedEmail;

/// A single outbound send request.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: Vec<String>,
    pub rendered: RenderedEmail,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), HandoffError>;
}

/// Mailer used when notification delivery is disabled: jobs are drained and
/// the send is logged, never delivered.
pub struct NullMailer;

#[async_trait]
impl Mailer for NullMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), HandoffError> {
        debug!(subject = %email.rendered.subject, recipients = email.to.len(),
            "notification delivery disabled; dropping email");
        Ok(())
    }
}

/// SMTP mailer over STARTTLS with optional credentials.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    reply_to: Option<Mailbox>,
}

impl SmtpMailer {
    pub fn from_config(notify: &NotifyConfig, smtp: &SmtpConfig) -> Result<Self, HandoffError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
            .map_err(|e| HandoffError::Notify {
                message: format!("invalid SMTP relay `{}`", smtp.host),
                source: Some(Box::new(e)),
            })?
            .port(smtp.port);
        if let (Some(username), Some(password)) = (&smtp.username, &smtp.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let from = parse_mailbox(&notify.from_email, Some(&notify.from_name))?;
        let reply_to = notify
            .reply_to
            .as_deref()
            .map(|addr| parse_mailbox(addr, None))
            .transpose()?;

        Ok(Self {
            transport: builder.build(),
            from,
            reply_to,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), HandoffError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(&email.rendered.subject);
        if let Some(reply_to) = &self.reply_to {
            builder = builder.reply_to(reply_to.clone());
        }
        for recipient in &email.to {
            builder = builder.to(parse_mailbox(recipient, None)?);
        }

        let message = builder
            .header(ContentType::TEXT_HTML)
            .body(email.rendered.body.clone())
            .map_err(|e| HandoffError::Notify {
                message: "failed to build notification email".to_string(),
                source: Some(Box::new(e)),
            })?;

        self.transport
            .send(message)
            .await
            .map_err(|e| HandoffError::Notify {
                message: "SMTP send failed".to_string(),
                source: Some(Box::new(e)),
            })?;
        Ok(())
    }
}

fn parse_mailbox(address: &str, name: Option<&str>) -> Result<Mailbox, HandoffError> {
    let parsed = address.parse().map_err(|e| HandoffError::Notify {
        message: format!("invalid email address `{address}`"),
        source: Some(Box::new(e)),
    })?;
    Ok(Mailbox::new(name.map(str::to_string), parsed))
}
