//! Rejection taxonomy for contact submissions.

use thiserror::Error;

/// Structural field constraint violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name must be {min}-{max} characters, got {actual}")]
    NameLength { min: usize, max: usize, actual: usize },

    #[error("invalid email address")]
    InvalidEmail,

    #[error("phone must be at most {max} characters, got {actual}")]
    PhoneLength { max: usize, actual: usize },

    #[error("message must be {min}-{max} characters, got {actual}")]
    MessageLength { min: usize, max: usize, actual: usize },
}

/// Content filter verdicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContentRejection {
    #[error("name is blacklisted")]
    BlacklistedName,

    #[error("message contains a disallowed alphabet")]
    DisallowedAlphabet,

    #[error("message contains a link")]
    LinkDetected,
}

/// Every way a contact submission can end without success
#[derive(Debug, Error)]
pub enum ContactError {
    /// Too many submissions from this identity in the window
    #[error("rate limit exceeded")]
    RateLimited,

    /// Wrong Content-Type, oversized or undecodable body
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Field constraints not met
    #[error("validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// Bot challenge missing, rejected, or unverifiable
    #[error("challenge failed: {0}")]
    ChallengeFailed(String),

    /// Blacklist, alphabet or link check tripped
    #[error("content rejected: {0}")]
    ContentRejected(#[from] ContentRejection),

    /// Administrator notification could not be sent
    #[error("delivery failed: {0}")]
    DeliveryFailed(String),
}

impl ContactError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::RateLimited => 429,
            Self::MalformedInput(_)
            | Self::ValidationFailed(_)
            | Self::ChallengeFailed(_)
            | Self::ContentRejected(_) => 400,
            Self::DeliveryFailed(_) => 500,
        }
    }

    /// Text shown to the submitter. Never carries internal detail.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::RateLimited => "Trop de requêtes. Réessayez plus tard.",
            Self::MalformedInput(_) | Self::ValidationFailed(_) => "Champs invalides",
            Self::ChallengeFailed(_) => "Vérification Turnstile échouée.",
            Self::ContentRejected(ContentRejection::BlacklistedName) => {
                "Ce nom n'est pas autorisé."
            }
            Self::ContentRejected(ContentRejection::DisallowedAlphabet) => {
                "Caractères non autorisés dans le message."
            }
            Self::ContentRejected(ContentRejection::LinkDetected) => {
                "L'envoi de liens n'est pas autorisé."
            }
            Self::DeliveryFailed(_) => "Erreur lors de l'envoi.",
        }
    }

    /// Server-side faults, as opposed to client-attributable rejections
    pub fn is_server_fault(&self) -> bool {
        matches!(self, Self::DeliveryFailed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ContactError::RateLimited.status_code(), 429);
        assert_eq!(ContactError::MalformedInput("bad".into()).status_code(), 400);
        assert_eq!(
            ContactError::from(ValidationError::InvalidEmail).status_code(),
            400
        );
        assert_eq!(ContactError::ChallengeFailed("no token".into()).status_code(), 400);
        assert_eq!(
            ContactError::from(ContentRejection::LinkDetected).status_code(),
            400
        );
        assert_eq!(ContactError::DeliveryFailed("smtp".into()).status_code(), 500);
    }

    #[test]
    fn test_public_message_hides_detail() {
        let err = ContactError::DeliveryFailed("535 authentication failed".into());
        assert!(!err.public_message().contains("535"));
        assert!(err.is_server_fault());

        let err = ContactError::MalformedInput("expected value at line 1".into());
        assert_eq!(err.public_message(), "Champs invalides");
        assert!(!err.is_server_fault());
    }
}
