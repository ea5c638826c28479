//! Configuration management for Postern.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use postern_common::constants::{
    DEFAULT_CONTACT_PATH, DEFAULT_LISTEN_ADDR, DEFAULT_MAX_BODY_BYTES, DEFAULT_SMTP_PORT,
    DEFAULT_SMTP_RELAY, RATE_MAX_REQUESTS, RATE_WINDOW_SECS, TURNSTILE_VERIFY_URL, limits,
};

use crate::filter::{ContentCheck, ScriptRange};
use crate::pipeline::Stage;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Path of the contact endpoint
    #[serde(default = "default_contact_path")]
    pub contact_path: String,

    /// Bodies larger than this are rejected as malformed
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Header carrying the real client address when behind a proxy
    /// (e.g. `CF-Connecting-IP`). The socket peer address is used otherwise.
    #[serde(default)]
    pub client_ip_header: Option<String>,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub challenge: ChallengeConfig,

    #[serde(default)]
    pub mail: MailConfig,
}

/// Sliding-window rate limiting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Window length in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Admissions per identity within the window
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,

    /// Interval of the idle-identity sweep. Unset means identities are never evicted.
    #[serde(default)]
    pub idle_sweep_secs: Option<u64>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            max_requests: default_max_requests(),
            idle_sweep_secs: None,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Structural field bounds, counted in characters
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_name_min")]
    pub name_min_chars: usize,
    #[serde(default = "default_name_max")]
    pub name_max_chars: usize,
    #[serde(default = "default_phone_max")]
    pub phone_max_chars: usize,
    #[serde(default = "default_message_min")]
    pub message_min_chars: usize,
    #[serde(default = "default_message_max")]
    pub message_max_chars: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            name_min_chars: default_name_min(),
            name_max_chars: default_name_max(),
            phone_max_chars: default_phone_max(),
            message_min_chars: default_message_min(),
            message_max_chars: default_message_max(),
        }
    }
}

/// Content filter configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// Checks to run, in precedence order
    #[serde(default = "default_checks")]
    pub checks: Vec<ContentCheck>,

    /// Names rejected after lower-casing and whitespace removal
    #[serde(default = "default_forbidden_names")]
    pub forbidden_names: Vec<String>,

    /// Code point ranges not allowed in messages
    #[serde(default = "default_disallowed_ranges")]
    pub disallowed_ranges: Vec<ScriptRange>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            checks: default_checks(),
            forbidden_names: default_forbidden_names(),
            disallowed_ranges: default_disallowed_ranges(),
        }
    }
}

/// Ordering of the gates that follow structural validation
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Omitting `challenge` disables bot verification
    #[serde(default = "default_stages")]
    pub stages: Vec<Stage>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stages: default_stages(),
        }
    }
}

/// Bot challenge (Turnstile) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ChallengeConfig {
    #[serde(default = "default_verify_url")]
    pub verify_url: String,

    #[serde(default = "default_challenge_timeout")]
    pub timeout_secs: u64,

    /// Shared secret. Missing secret makes every verification fail.
    #[serde(default)]
    pub secret: Option<String>,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            verify_url: default_verify_url(),
            timeout_secs: default_challenge_timeout(),
            secret: None,
        }
    }
}

/// Outbound mail configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    #[serde(default = "default_relay")]
    pub relay: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// SMTP login, also used as the From address
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Administrator mailbox receiving every accepted submission
    #[serde(default)]
    pub admin_to: Option<String>,

    #[serde(default = "default_mail_timeout")]
    pub timeout_secs: u64,

    /// Signature used in acknowledgments
    #[serde(default = "default_brand")]
    pub brand: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            relay: default_relay(),
            port: default_port(),
            username: None,
            password: None,
            admin_to: None,
            timeout_secs: default_mail_timeout(),
            brand: default_brand(),
        }
    }
}

// Default value functions
fn default_listen_addr() -> String { DEFAULT_LISTEN_ADDR.to_string() }
fn default_contact_path() -> String { DEFAULT_CONTACT_PATH.to_string() }
fn default_max_body_bytes() -> usize { DEFAULT_MAX_BODY_BYTES }
fn default_window_secs() -> u64 { RATE_WINDOW_SECS }
fn default_max_requests() -> usize { RATE_MAX_REQUESTS }
fn default_name_min() -> usize { limits::NAME_MIN }
fn default_name_max() -> usize { limits::NAME_MAX }
fn default_phone_max() -> usize { limits::PHONE_MAX }
fn default_message_min() -> usize { limits::MESSAGE_MIN }
fn default_message_max() -> usize { limits::MESSAGE_MAX }
fn default_checks() -> Vec<ContentCheck> {
    vec![ContentCheck::Blacklist, ContentCheck::Alphabet, ContentCheck::Link]
}
fn default_forbidden_names() -> Vec<String> { vec!["robertves".to_string()] }
fn default_disallowed_ranges() -> Vec<ScriptRange> { vec![ScriptRange::CYRILLIC] }
fn default_stages() -> Vec<Stage> { vec![Stage::Challenge, Stage::Content] }
fn default_verify_url() -> String { TURNSTILE_VERIFY_URL.to_string() }
fn default_challenge_timeout() -> u64 { 10 }
fn default_relay() -> String { DEFAULT_SMTP_RELAY.to_string() }
fn default_port() -> u16 { DEFAULT_SMTP_PORT }
fn default_mail_timeout() -> u64 { 30 }
fn default_brand() -> String { "Eldocam".to_string() }

/// Values taken from the command line or environment, applied over the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub listen: Option<String>,
    pub mail_user: Option<String>,
    pub mail_pass: Option<String>,
    pub admin_to: Option<String>,
    pub turnstile_secret: Option<String>,
}

impl AppConfig {
    /// Load configuration from file, with CLI/env overrides
    pub fn load(config_path: &str, overrides: &ConfigOverrides) -> Result<Self> {
        let mut config = if Path::new(config_path).exists() {
            let settings = config::Config::builder()
                .add_source(config::File::with_name(config_path))
                .build()
                .context("Failed to load config file")?;

            settings
                .try_deserialize()
                .context("Failed to parse config")?
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Self::default()
        };

        config.apply(overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref listen) = overrides.listen {
            self.listen_addr = listen.clone();
        }
        if let Some(ref user) = overrides.mail_user {
            self.mail.username = Some(user.clone());
        }
        if let Some(ref pass) = overrides.mail_pass {
            self.mail.password = Some(pass.clone());
        }
        if let Some(ref admin) = overrides.admin_to {
            self.mail.admin_to = Some(admin.clone());
        }
        if let Some(ref secret) = overrides.turnstile_secret {
            self.challenge.secret = Some(secret.clone());
        }
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.rate_limit.window_secs == 0 || self.rate_limit.max_requests == 0 {
            bail!("rate_limit.window_secs and rate_limit.max_requests must be positive");
        }
        if self.rate_limit.idle_sweep_secs == Some(0) {
            bail!("rate_limit.idle_sweep_secs must be positive when set");
        }
        if self.validation.name_min_chars > self.validation.name_max_chars
            || self.validation.message_min_chars > self.validation.message_max_chars
        {
            bail!("validation minimums must not exceed maximums");
        }
        for stage in [Stage::Challenge, Stage::Content] {
            if self.pipeline.stages.iter().filter(|s| **s == stage).count() > 1 {
                bail!("pipeline stage {:?} listed more than once", stage);
            }
        }
        for range in &self.filter.disallowed_ranges {
            if range.start > range.end {
                bail!("disallowed range {:#06x}-{:#06x} is inverted", range.start, range.end);
            }
        }
        if !self.contact_path.starts_with('/') {
            bail!("contact_path must start with '/'");
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            contact_path: default_contact_path(),
            max_body_bytes: default_max_body_bytes(),
            client_ip_header: None,
            rate_limit: RateLimitConfig::default(),
            validation: ValidationConfig::default(),
            filter: FilterConfig::default(),
            pipeline: PipelineConfig::default(),
            challenge: ChallengeConfig::default(),
            mail: MailConfig::default(),
        }
    }
}
