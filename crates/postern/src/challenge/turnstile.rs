//! Cloudflare Turnstile siteverify adapter.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::ChallengeVerifier;
use crate::config::ChallengeConfig;

/// Siteverify response body. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// Turnstile verifier service
pub struct TurnstileVerifier {
    client: reqwest::Client,
    verify_url: String,
    secret: Option<String>,
}

impl TurnstileVerifier {
    pub fn new(config: &ChallengeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build challenge HTTP client")?;

        if config.secret.is_none() {
            tracing::warn!("TURNSTILE_SECRET not set, every challenge will fail");
        }

        Ok(Self {
            client,
            verify_url: config.verify_url.clone(),
            secret: config.secret.clone(),
        })
    }

    async fn siteverify(
        &self,
        secret: &str,
        token: &str,
        remote_ip: &str,
    ) -> Result<SiteVerifyResponse> {
        let response = self
            .client
            .post(&self.verify_url)
            .form(&[("secret", secret), ("response", token), ("remoteip", remote_ip)])
            .send()
            .await
            .context("siteverify request failed")?;

        response
            .json::<SiteVerifyResponse>()
            .await
            .context("siteverify response not decodable")
    }
}

#[async_trait]
impl ChallengeVerifier for TurnstileVerifier {
    async fn verify(&self, token: &str, client_identity: &str) -> bool {
        let Some(secret) = self.secret.as_deref() else {
            tracing::warn!("Challenge rejected: no Turnstile secret configured");
            return false;
        };

        match self.siteverify(secret, token, client_identity).await {
            Ok(verdict) if verdict.success => true,
            Ok(verdict) => {
                tracing::info!(
                    client = %client_identity,
                    error_codes = ?verdict.error_codes,
                    "Turnstile rejected token"
                );
                false
            }
            Err(e) => {
                tracing::warn!(
                    client = %client_identity,
                    error = %format!("{e:#}"),
                    "Turnstile verification error"
                );
                false
            }
        }
    }
}
