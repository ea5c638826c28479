//! Test doubles and fixtures shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use postern::challenge::ChallengeVerifier;
use postern::config::AppConfig;
use postern::limiter::{ManualClock, RateLimiter};
use postern::mail::{MailError, Mailer, OutgoingMail};
use postern::{AppState, RequestPipeline};

pub const ADMIN: &str = "admin@example.org";
pub const SUBMITTER: &str = "jane@example.net";

/// Records every message and fails sends to the listed recipients
#[derive(Default)]
pub struct RecordingMailer {
    failing: Vec<String>,
    sent: Mutex<Vec<OutgoingMail>>,
}

impl RecordingMailer {
    pub fn failing_for(recipients: &[&str]) -> Self {
        Self {
            failing: recipients.iter().map(|r| r.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(mail.clone());
        if self.failing.contains(&mail.to) {
            return Err(MailError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

/// Returns a fixed verdict and counts calls
pub struct FixedVerifier {
    verdict: bool,
    calls: AtomicUsize,
}

impl FixedVerifier {
    pub fn new(verdict: bool) -> Self {
        Self {
            verdict,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChallengeVerifier for FixedVerifier {
    async fn verify(&self, _token: &str, _client_identity: &str) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.verdict
    }
}

/// Default configuration with an administrator address set
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.mail.admin_to = Some(ADMIN.to_string());
    config
}

/// Everything a test needs to drive and observe the service
pub struct Fixture {
    pub config: AppConfig,
    pub clock: ManualClock,
    pub limiter: Arc<RateLimiter>,
    pub verifier: Arc<FixedVerifier>,
    pub mailer: Arc<RecordingMailer>,
}

impl Fixture {
    pub fn new(config: AppConfig) -> Self {
        Self::with(config, FixedVerifier::new(true), RecordingMailer::default())
    }

    pub fn with(config: AppConfig, verifier: FixedVerifier, mailer: RecordingMailer) -> Self {
        let clock = ManualClock::default();
        let limiter = Arc::new(RateLimiter::with_clock(
            &config.rate_limit,
            Arc::new(clock.clone()),
        ));
        Self {
            config,
            clock,
            limiter,
            verifier: Arc::new(verifier),
            mailer: Arc::new(mailer),
        }
    }

    pub fn pipeline(&self) -> RequestPipeline {
        RequestPipeline::new(
            &self.config,
            self.limiter.clone(),
            self.verifier.clone(),
            self.mailer.clone(),
        )
    }

    pub fn state(&self) -> AppState {
        AppState::with_services(
            self.config.clone(),
            self.limiter.clone(),
            self.verifier.clone(),
            self.mailer.clone(),
        )
    }
}

/// JSON body of a valid submission
pub fn json_form(language: &str, message: &str) -> String {
    serde_json::json!({
        "name": "Jane Doe",
        "email": SUBMITTER,
        "tel": "+32 470 00 00 00",
        "language": language,
        "message": message,
        "cf-turnstile-response": "XXXX.DUMMY.TOKEN",
    })
    .to_string()
}
