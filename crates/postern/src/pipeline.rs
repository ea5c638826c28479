//! Request admission pipeline.
//!
//! ```text
//! Received ─► rate limit ─► decode + validate ─► [challenge | content]* ─► dispatch
//!                 │                │                      │                  │
//!            RateLimited   Malformed/Invalid   ChallengeFailed/Rejected  DeliveryFailed
//! ```
//!
//! Every gate is final: a rejection stops the request and nothing is
//! rolled back. The rate-limit slot stays consumed even when a later gate
//! rejects.

use axum::body::Body;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use postern_common::{ContactError, SubmittedForm};

use crate::challenge::ChallengeVerifier;
use crate::config::AppConfig;
use crate::filter::ContentFilter;
use crate::intake::{self, FormValidator};
use crate::limiter::RateLimiter;
use crate::mail::{Mailer, NotificationDispatcher};

/// Gates that run after structural validation, in configured order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Bot challenge verification
    Challenge,
    /// Blacklist / alphabet / link checks
    Content,
}

pub struct RequestPipeline {
    limiter: Arc<RateLimiter>,
    validator: FormValidator,
    verifier: Arc<dyn ChallengeVerifier>,
    filter: ContentFilter,
    dispatcher: NotificationDispatcher,
    stages: Vec<Stage>,
    max_body_bytes: usize,
}

impl RequestPipeline {
    pub fn new(
        config: &AppConfig,
        limiter: Arc<RateLimiter>,
        verifier: Arc<dyn ChallengeVerifier>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            limiter,
            validator: FormValidator::new(config.validation.clone()),
            verifier,
            filter: ContentFilter::new(&config.filter),
            dispatcher: NotificationDispatcher::new(
                mailer,
                config.mail.admin_to.clone(),
                config.mail.brand.clone(),
            ),
            stages: config.pipeline.stages.clone(),
            max_body_bytes: config.max_body_bytes,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Run one submission through every gate.
    ///
    /// `query` is the raw request query string. Its challenge token is
    /// used when the body carries none.
    ///
    /// Returns the localized success text, or the first rejection.
    pub async fn handle(
        &self,
        identity: &str,
        content_type: Option<&str>,
        query: Option<&str>,
        body: Body,
    ) -> Result<String, ContactError> {
        if !self.limiter.admit(identity) {
            warn!(client = %identity, "Rate limit exceeded");
            return Err(ContactError::RateLimited);
        }

        let raw = intake::decode(content_type, body, self.max_body_bytes)
            .await
            .inspect_err(|e| info!(client = %identity, error = %e, "Malformed submission"))?;

        let token = raw
            .challenge_token
            .clone()
            .or_else(|| intake::query_token(query));
        let form = self
            .validator
            .validate(raw)
            .inspect_err(|e| info!(client = %identity, error = %e, "Submission failed validation"))?;

        for stage in &self.stages {
            match stage {
                Stage::Challenge => self.check_challenge(token.as_deref(), identity).await?,
                Stage::Content => self.filter.inspect(&form)?,
            }
        }

        self.complete(identity, &form).await
    }

    async fn check_challenge(&self, token: Option<&str>, identity: &str) -> Result<(), ContactError> {
        let token = match token.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => {
                info!(client = %identity, "Challenge token missing");
                return Err(ContactError::ChallengeFailed("missing token".to_string()));
            }
        };

        if !self.verifier.verify(token, identity).await {
            info!(client = %identity, "Challenge verification failed");
            return Err(ContactError::ChallengeFailed("verification rejected".to_string()));
        }
        Ok(())
    }

    async fn complete(&self, identity: &str, form: &SubmittedForm) -> Result<String, ContactError> {
        let text = self.dispatcher.dispatch(form).await?;
        info!(
            client = %identity,
            language = %form.language,
            "Contact submission delivered"
        );
        Ok(text)
    }
}
