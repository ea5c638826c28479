//! Core types shared across Postern components.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Language of the submitter, used to pick the acknowledgment variant.
///
/// Anything other than `nl` or `en` (case-insensitive) falls back to French.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Fr,
    Nl,
    En,
}

impl Language {
    /// Parse a submitted language code, defaulting to French
    pub fn from_code(code: Option<&str>) -> Self {
        match code.map(|c| c.trim().to_ascii_lowercase()).as_deref() {
            Some("nl") => Self::Nl,
            Some("en") => Self::En,
            _ => Self::Fr,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Fr => "fr",
            Self::Nl => "nl",
            Self::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A contact form that passed structural validation.
///
/// Built once per request by the intake stage and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedForm {
    /// Submitter display name
    pub name: String,

    /// Submitter address (acknowledgment recipient, admin Reply-To)
    pub email: String,

    /// Optional phone number, empty when absent
    pub phone: String,

    /// Acknowledgment language
    pub language: Language,

    /// Free-text message
    pub message: String,
}

/// Result of the two-leg notification.
///
/// Errors are kept as rendered strings so the outcome can cross crate
/// boundaries without dragging transport types along.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    pub admin_sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_error: Option<String>,
    pub reply_sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_error: Option<String>,
    /// Localized success text shown to the submitter
    pub user_facing_message: String,
}

impl DispatchOutcome {
    /// True when the acknowledgment leg was attempted and failed
    pub fn reply_failed(&self) -> bool {
        self.reply_error.is_some()
    }
}
