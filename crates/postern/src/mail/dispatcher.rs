//! Two-leg notification: administrator first, then the submitter.
//!
//! Admin delivery is the required side effect. The acknowledgment is
//! best-effort: its failure is logged and never changes the response.

use std::sync::Arc;
use tracing::{error, info, warn};

use postern_common::{ContactError, DispatchOutcome, SubmittedForm};

use super::templates::{render_admin_notification, render_auto_reply, success_text};
use super::{BodyFormat, Mailer, OutgoingMail};

pub struct NotificationDispatcher {
    mailer: Arc<dyn Mailer>,
    admin_to: Option<String>,
    brand: String,
}

impl NotificationDispatcher {
    pub fn new(mailer: Arc<dyn Mailer>, admin_to: Option<String>, brand: String) -> Self {
        Self {
            mailer,
            admin_to,
            brand,
        }
    }

    /// Send both legs and report each one independently.
    ///
    /// The acknowledgment is not attempted when the admin leg fails.
    pub async fn deliver(&self, form: &SubmittedForm) -> DispatchOutcome {
        let mut outcome = DispatchOutcome {
            user_facing_message: success_text(form.language).to_string(),
            ..Default::default()
        };

        let Some(admin_to) = self.admin_to.as_deref() else {
            outcome.admin_error = Some("administrator address (ADMIN_TO) not configured".to_string());
            return outcome;
        };

        let (subject, body) = render_admin_notification(form);
        let admin_mail = OutgoingMail {
            to: admin_to.to_string(),
            reply_to: Some(form.email.clone()),
            subject,
            body,
            format: BodyFormat::Plain,
        };

        if let Err(e) = self.mailer.send(&admin_mail).await {
            outcome.admin_error = Some(e.to_string());
            return outcome;
        }
        outcome.admin_sent = true;

        let reply = render_auto_reply(&form.name, &form.message, form.language, &self.brand);
        let reply_mail = OutgoingMail {
            to: form.email.clone(),
            reply_to: None,
            subject: reply.subject,
            body: reply.body,
            format: BodyFormat::Html,
        };

        match self.mailer.send(&reply_mail).await {
            Ok(()) => outcome.reply_sent = true,
            Err(e) => outcome.reply_error = Some(e.to_string()),
        }
        outcome.user_facing_message = reply.success_text;

        outcome
    }

    /// `deliver` followed by `settle`
    pub async fn dispatch(&self, form: &SubmittedForm) -> Result<String, ContactError> {
        settle(self.deliver(form).await, &form.email)
    }
}

/// Failure policy: a failed admin leg is fatal, a failed acknowledgment is
/// logged only.
pub fn settle(outcome: DispatchOutcome, recipient: &str) -> Result<String, ContactError> {
    if !outcome.admin_sent {
        let cause = outcome
            .admin_error
            .unwrap_or_else(|| "administrator notification not sent".to_string());
        error!(error = %cause, "Administrator notification failed");
        return Err(ContactError::DeliveryFailed(cause));
    }

    if outcome.reply_failed() {
        let cause = outcome.reply_error.as_deref().unwrap_or_default();
        warn!(recipient = %recipient, error = %cause, "Acknowledgment failed");
    } else {
        info!(recipient = %recipient, "Acknowledgment sent");
    }

    Ok(outcome.user_facing_message)
}
