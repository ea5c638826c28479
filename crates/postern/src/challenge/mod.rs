//! Bot-challenge verification.
//!
//! The pipeline only sees the [`ChallengeVerifier`] port; the Turnstile
//! adapter talks to Cloudflare. Every failure mode collapses to `false`.

mod turnstile;

pub use turnstile::TurnstileVerifier;

use async_trait::async_trait;

/// Verifies a client-supplied challenge token
#[async_trait]
pub trait ChallengeVerifier: Send + Sync {
    /// `true` only on an explicit positive verdict from the verification service
    async fn verify(&self, token: &str, client_identity: &str) -> bool;
}
