//! SMTP transport built on lettre.

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

use super::{BodyFormat, MailError, Mailer, OutgoingMail};
use crate::config::MailConfig;

/// STARTTLS relay with PLAIN credentials
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Option<Mailbox>,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.relay)
            .with_context(|| format!("Invalid SMTP relay {}", config.relay))?
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        } else {
            tracing::warn!("MAIL_USER/MAIL_PASS not set, relay will be used unauthenticated");
        }

        let from = match config.username.as_deref() {
            Some(user) => Some(parse_mailbox(user).context("MAIL_USER is not a valid address")?),
            None => None,
        };

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    fn build(&self, mail: &OutgoingMail) -> Result<Message, MailError> {
        let from = self
            .from
            .clone()
            .ok_or(MailError::NotConfigured("sender address (MAIL_USER)"))?;

        let mut builder = Message::builder()
            .from(from)
            .to(parse_mailbox(&mail.to)?)
            .subject(mail.subject.as_str())
            .header(match mail.format {
                BodyFormat::Plain => ContentType::TEXT_PLAIN,
                BodyFormat::Html => ContentType::TEXT_HTML,
            });

        if let Some(reply_to) = mail.reply_to.as_deref() {
            builder = builder.reply_to(parse_mailbox(reply_to)?);
        }

        builder
            .body(mail.body.clone())
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let message = self.build(mail)?;
        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| MailError::Transport(e.to_string()))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse::<Mailbox>().map_err(|e| MailError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> MailConfig {
        MailConfig {
            username: Some("contact@example.org".to_string()),
            password: Some("hunter2".to_string()),
            ..Default::default()
        }
    }

    fn admin_mail() -> OutgoingMail {
        OutgoingMail {
            to: "admin@example.org".to_string(),
            reply_to: Some("jane@example.net".to_string()),
            subject: "Prise de contact de Jane".to_string(),
            body: "Nom: Jane".to_string(),
            format: BodyFormat::Plain,
        }
    }

    #[tokio::test]
    async fn test_build_sets_reply_to_and_content_type() {
        let mailer = SmtpMailer::new(&configured()).unwrap();
        let message = mailer.build(&admin_mail()).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("From: contact@example.org"));
        assert!(raw.contains("Reply-To: jane@example.net"));
        assert!(raw.contains("Content-Type: text/plain"));
    }

    #[tokio::test]
    async fn test_build_without_sender_is_not_configured() {
        let mailer = SmtpMailer::new(&MailConfig::default()).unwrap();
        assert!(matches!(
            mailer.build(&admin_mail()),
            Err(MailError::NotConfigured(_))
        ));
    }

    #[tokio::test]
    async fn test_bad_recipient_is_address_error() {
        let mailer = SmtpMailer::new(&configured()).unwrap();
        let mail = OutgoingMail {
            to: "not an address".to_string(),
            ..admin_mail()
        };
        assert!(matches!(mailer.build(&mail), Err(MailError::Address { .. })));
    }
}
