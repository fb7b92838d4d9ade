// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Outbound email notifications.
//!
//! Request handlers hand a [`Notification`] to the [`NotificationDispatcher`]
//! and return immediately. A background task renders and sends each message;
//! delivery failures are logged and dropped.

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::config::SmtpConfig;
use crate::error::AppError;

const PROJECT_NAME: &str = "Sportify App";

/// Port for SMTP over implicit TLS; other ports use STARTTLS.
const SMTPS_PORT: u16 = 465;

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), String>;
}

/// Sends mail through an authenticated SMTP relay.
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailSender {
    pub fn new(smtp: &SmtpConfig, from: &str) -> Result<Self, AppError> {
        let from: Mailbox = from
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid MAIL_FROM address: {}", e))?;

        let builder = match smtp.port {
            SMTPS_PORT => AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host),
            _ => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host),
        };
        let builder =
            builder.map_err(|e| anyhow::anyhow!("Invalid SMTP host {}: {}", smtp.host, e))?;

        let transport = builder
            .port(smtp.port)
            .credentials(Credentials::new(
                smtp.username.clone(),
                smtp.password.clone(),
            ))
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), String> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(to.parse().map_err(|e| format!("Invalid recipient: {:?}", e))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body.to_string())
            .map_err(|e| e.to_string())?;

        self.transport
            .send(email)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

/// Stand-in used when SMTP is not configured. Nothing leaves the process.
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send_email(&self, to: &str, subject: &str, _body: &str) -> Result<(), String> {
        tracing::info!(to, subject, "SMTP not configured, email not sent");
        Ok(())
    }
}

/// Messages the service knows how to send.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    LoginCode { to: String, code: String },
    PasswordResetCode { to: String, code: String },
}

/// A rendered email.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn render(&self, expiry_minutes: i64) -> RenderedEmail {
        match self {
            Notification::LoginCode { to, code } => RenderedEmail {
                to: to.clone(),
                subject: format!("[{}] Your 2FA Login Code", PROJECT_NAME),
                body: format!(
                    "<html><body>\
                     <p>Hello,</p>\
                     <p>Your 2FA login code for {} is: <strong>{}</strong></p>\
                     <p>This code will expire in {} minutes.</p>\
                     <p>If you did not request this, please ignore this email.</p>\
                     </body></html>",
                    PROJECT_NAME, code, expiry_minutes
                ),
            },
            Notification::PasswordResetCode { to, code } => RenderedEmail {
                to: to.clone(),
                subject: format!("[{}] Your Password Reset Code", PROJECT_NAME),
                body: format!(
                    "<html><body>\
                     <p>Hello,</p>\
                     <p>You requested a password reset for your account with {}.</p>\
                     <p>Your password reset code is: <strong>{}</strong></p>\
                     <p>This code will expire in {} minutes.</p>\
                     <p>If you did not request a password reset, please ignore this email.</p>\
                     </body></html>",
                    PROJECT_NAME, code, expiry_minutes
                ),
            },
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Notification::LoginCode { .. } => "login_code",
            Notification::PasswordResetCode { .. } => "password_reset_code",
        }
    }
}

/// Fire-and-forget handle onto the delivery queue.
#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::UnboundedSender<Notification>,
}

impl NotificationDispatcher {
    /// Start the delivery worker. Must be called inside a tokio runtime.
    pub fn spawn(sender: Arc<dyn EmailSender>, expiry_minutes: i64) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Notification>();

        tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                let email = notification.render(expiry_minutes);
                match sender
                    .send_email(&email.to, &email.subject, &email.body)
                    .await
                {
                    Ok(()) => tracing::info!(kind = notification.kind(), "Notification sent"),
                    Err(e) => tracing::error!(
                        kind = notification.kind(),
                        error = %e,
                        "Failed to send notification"
                    ),
                }
            }
            tracing::debug!("Notification worker stopped");
        });

        Self { tx }
    }

    /// Queue a notification. Never fails from the caller's point of view.
    pub fn dispatch(&self, notification: Notification) {
        if let Err(e) = self.tx.send(notification) {
            tracing::error!(kind = e.0.kind(), "Notification queue closed, message dropped");
        }
    }
}
