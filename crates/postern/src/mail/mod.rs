//! Outbound mail: transport port, SMTP adapter, templates, and the
//! two-leg notification dispatcher.

mod dispatcher;
mod smtp;
pub mod templates;

pub use dispatcher::{NotificationDispatcher, settle};
pub use smtp::SmtpMailer;

use async_trait::async_trait;
use thiserror::Error;

/// Body encoding of an outgoing message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Plain,
    Html,
}

/// Transport-neutral message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
    pub format: BodyFormat,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address {address:?}: {reason}")]
    Address { address: String, reason: String },

    #[error("message could not be built: {0}")]
    Build(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("mail not configured: {0}")]
    NotConfigured(&'static str),
}

/// Sends one message
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}
