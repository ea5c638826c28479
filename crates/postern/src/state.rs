//! Application state and shared resources.

use anyhow::Result;
use std::sync::Arc;

use crate::challenge::{ChallengeVerifier, TurnstileVerifier};
use crate::config::AppConfig;
use crate::limiter::RateLimiter;
use crate::mail::{Mailer, SmtpMailer};
use crate::pipeline::RequestPipeline;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,

    /// Rate table shared by the pipeline and the idle sweep
    pub limiter: Arc<RateLimiter>,

    /// Admission pipeline
    pub pipeline: Arc<RequestPipeline>,
}

impl AppState {
    /// Create application state with the SMTP and Turnstile adapters
    pub fn new(config: AppConfig) -> Result<Self> {
        let verifier = Arc::new(TurnstileVerifier::new(&config.challenge)?);
        let mailer = Arc::new(SmtpMailer::new(&config.mail)?);
        let limiter = Arc::new(RateLimiter::new(&config.rate_limit));

        Ok(Self::with_services(config, limiter, verifier, mailer))
    }

    /// Create application state around caller-supplied services
    pub fn with_services(
        config: AppConfig,
        limiter: Arc<RateLimiter>,
        verifier: Arc<dyn ChallengeVerifier>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let pipeline = Arc::new(RequestPipeline::new(&config, limiter.clone(), verifier, mailer));

        Self {
            config: Arc::new(config),
            limiter,
            pipeline,
        }
    }
}
