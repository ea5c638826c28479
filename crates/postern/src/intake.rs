//! Request body decoding and structural validation.

use axum::body::Body;
use email_address::EmailAddress;
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use tracing::debug;

use postern_common::constants::{fields, media};
use postern_common::{ContactError, Language, SubmittedForm, ValidationError};

use crate::config::ValidationConfig;

/// Submitted fields before validation. Missing fields decode as empty.
/// Explicit JSON `null`s decode like missing fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawSubmission {
    #[serde(deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub tel: String,
    pub language: Option<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub message: String,
    #[serde(rename = "cf-turnstile-response")]
    pub challenge_token: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl RawSubmission {
    fn from_form_pairs(bytes: &[u8]) -> Self {
        let mut raw = Self::default();
        let mut seen = HashSet::new();
        for (key, value) in url::form_urlencoded::parse(bytes) {
            // First occurrence wins, even when empty
            if !seen.insert(key.clone()) {
                continue;
            }
            match &*key {
                fields::NAME => raw.name = value.into_owned(),
                fields::EMAIL => raw.email = value.into_owned(),
                fields::PHONE => raw.tel = value.into_owned(),
                fields::LANGUAGE => raw.language = Some(value.into_owned()),
                fields::MESSAGE => raw.message = value.into_owned(),
                fields::CHALLENGE_TOKEN => raw.challenge_token = Some(value.into_owned()),
                _ => {}
            }
        }
        raw
    }
}

/// First challenge token carried in a raw query string
pub fn query_token(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == fields::CHALLENGE_TOKEN)
        .map(|(_, value)| value.into_owned())
}

/// Read at most `max_bytes` of `body` and decode it according to `content_type`.
pub async fn decode(
    content_type: Option<&str>,
    body: Body,
    max_bytes: usize,
) -> Result<RawSubmission, ContactError> {
    let media_type = content_type
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
        .unwrap_or_default();

    if media_type != media::JSON && media_type != media::FORM {
        return Err(ContactError::MalformedInput(format!(
            "unsupported content type {media_type:?}"
        )));
    }

    let bytes = axum::body::to_bytes(body, max_bytes)
        .await
        .map_err(|e| ContactError::MalformedInput(format!("unreadable body: {e}")))?;

    if media_type == media::JSON {
        serde_json::from_slice(&bytes)
            .map_err(|e| ContactError::MalformedInput(format!("invalid JSON: {e}")))
    } else {
        Ok(RawSubmission::from_form_pairs(&bytes))
    }
}

/// Structural field validation
#[derive(Debug, Clone)]
pub struct FormValidator {
    config: ValidationConfig,
}

impl FormValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Check field bounds and build the immutable form.
    ///
    /// Lengths are counted in characters, not bytes.
    pub fn validate(&self, raw: RawSubmission) -> Result<SubmittedForm, ValidationError> {
        let c = &self.config;

        let name_len = raw.name.chars().count();
        if name_len < c.name_min_chars || name_len > c.name_max_chars {
            return Err(ValidationError::NameLength {
                min: c.name_min_chars,
                max: c.name_max_chars,
                actual: name_len,
            });
        }

        if !EmailAddress::is_valid(&raw.email) {
            debug!(email = %raw.email, "Rejected email address");
            return Err(ValidationError::InvalidEmail);
        }

        let phone_len = raw.tel.chars().count();
        if phone_len > c.phone_max_chars {
            return Err(ValidationError::PhoneLength {
                max: c.phone_max_chars,
                actual: phone_len,
            });
        }

        let message_len = raw.message.chars().count();
        if message_len < c.message_min_chars || message_len > c.message_max_chars {
            return Err(ValidationError::MessageLength {
                min: c.message_min_chars,
                max: c.message_max_chars,
                actual: message_len,
            });
        }

        Ok(SubmittedForm {
            name: raw.name,
            email: raw.email,
            phone: raw.tel,
            language: Language::from_code(raw.language.as_deref()),
            message: raw.message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use postern_common::constants::limits;

    fn raw() -> RawSubmission {
        RawSubmission {
            name: "Jane Doe".to_string(),
            email: "jane@example.org".to_string(),
            tel: "0470 00 00 00".to_string(),
            language: Some("en".to_string()),
            message: "Bonjour".to_string(),
            challenge_token: None,
        }
    }

    fn validator() -> FormValidator {
        FormValidator::new(ValidationConfig::default())
    }

    #[tokio::test]
    async fn test_decode_json() {
        let body = Body::from(
            r#"{"name":"Jane","email":"jane@example.org","message":"Hello","language":"nl","cf-turnstile-response":"tok"}"#,
        );
        let raw = decode(Some("application/json; charset=utf-8"), body, 1024).await.unwrap();

        assert_eq!(raw.name, "Jane");
        assert_eq!(raw.tel, "");
        assert_eq!(raw.language.as_deref(), Some("nl"));
        assert_eq!(raw.challenge_token.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn test_decode_form() {
        let body = Body::from("name=Jane+Doe&email=jane%40example.org&tel=&message=Hi%0Athere&cf-turnstile-response=abc");
        let raw = decode(Some("application/x-www-form-urlencoded"), body, 1024).await.unwrap();

        assert_eq!(raw.name, "Jane Doe");
        assert_eq!(raw.email, "jane@example.org");
        assert_eq!(raw.message, "Hi\nthere");
        assert_eq!(raw.language, None);
        assert_eq!(raw.challenge_token.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_decode_json_nulls_as_empty() {
        let body = Body::from(
            r#"{"name":"Jane","email":"jane@example.org","tel":null,"message":"Hello","language":null}"#,
        );
        let raw = decode(Some("application/json"), body, 1024).await.unwrap();
        assert_eq!(raw.tel, "");
        assert_eq!(raw.language, None);
        assert!(validator().validate(raw).is_ok());

        let body = Body::from(r#"{"name":null,"email":"jane@example.org","message":"Hello"}"#);
        let raw = decode(Some("application/json"), body, 1024).await.unwrap();
        assert!(matches!(
            validator().validate(raw),
            Err(ValidationError::NameLength { actual: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_decode_form_keeps_empty_first_value() {
        let body = Body::from("name=&name=Jane+Doe&email=jane%40example.org&email=other%40example.org");
        let raw = decode(Some("application/x-www-form-urlencoded"), body, 1024).await.unwrap();

        assert_eq!(raw.name, "");
        assert_eq!(raw.email, "jane@example.org");
    }

    #[test]
    fn test_query_token() {
        let query = "lang=fr&cf-turnstile-response=abc&cf-turnstile-response=zzz";
        assert_eq!(query_token(Some(query)).as_deref(), Some("abc"));
        assert_eq!(query_token(Some("lang=fr")), None);
        assert_eq!(query_token(None), None);
    }

    #[tokio::test]
    async fn test_decode_rejects_other_content_types() {
        for ct in [Some("text/plain"), Some("multipart/form-data"), None] {
            let result = decode(ct, Body::from("name=x"), 1024).await;
            assert!(matches!(result, Err(ContactError::MalformedInput(_))), "{ct:?}");
        }
    }

    #[tokio::test]
    async fn test_decode_rejects_oversized_and_broken_bodies() {
        let big = Body::from(vec![b'a'; 2048]);
        assert!(matches!(
            decode(Some("application/x-www-form-urlencoded"), big, 1024).await,
            Err(ContactError::MalformedInput(_))
        ));

        assert!(matches!(
            decode(Some("application/json"), Body::from("{not json"), 1024).await,
            Err(ContactError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_valid_form() {
        let form = validator().validate(raw()).unwrap();
        assert_eq!(form.language, Language::En);
        assert_eq!(form.phone, "0470 00 00 00");
    }

    #[test]
    fn test_language_defaults_to_french() {
        let form = validator()
            .validate(RawSubmission { language: Some("xx".to_string()), ..raw() })
            .unwrap();
        assert_eq!(form.language, Language::Fr);

        let form = validator().validate(RawSubmission { language: None, ..raw() }).unwrap();
        assert_eq!(form.language, Language::Fr);
    }

    #[test]
    fn test_name_bounds() {
        let v = validator();
        assert!(v.validate(RawSubmission { name: "J".to_string(), ..raw() }).is_err());
        assert!(v.validate(RawSubmission { name: "Jo".to_string(), ..raw() }).is_ok());
        assert!(v.validate(RawSubmission { name: "é".repeat(80), ..raw() }).is_ok());
        assert!(matches!(
            v.validate(RawSubmission { name: "é".repeat(81), ..raw() }),
            Err(ValidationError::NameLength { actual: 81, .. })
        ));
    }

    #[test]
    fn test_email_phone_message_bounds() {
        let v = validator();
        assert_eq!(
            v.validate(RawSubmission { email: "not-an-email".to_string(), ..raw() }),
            Err(ValidationError::InvalidEmail)
        );
        assert!(matches!(
            v.validate(RawSubmission { tel: "1".repeat(41), ..raw() }),
            Err(ValidationError::PhoneLength { .. })
        ));
        assert!(matches!(
            v.validate(RawSubmission { message: "Hi".to_string(), ..raw() }),
            Err(ValidationError::MessageLength { .. })
        ));
        assert!(v.validate(RawSubmission { message: "x".repeat(5000), ..raw() }).is_ok());
        assert!(v.validate(RawSubmission { message: "x".repeat(5001), ..raw() }).is_err());
    }

    #[test]
    fn test_strict_message_minimum() {
        let strict = FormValidator::new(ValidationConfig {
            message_min_chars: limits::MESSAGE_MIN_STRICT,
            ..Default::default()
        });
        assert!(strict.validate(RawSubmission { message: "Bonjour".to_string(), ..raw() }).is_err());
        assert!(strict.validate(RawSubmission { message: "Bonjour à vous".to_string(), ..raw() }).is_ok());
    }
}
